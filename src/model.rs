#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

pub struct Document {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub line_spacing: f32, // auto line spacing factor (e.g. 276/240)
    pub default_font_size: f32,
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn text_width(&self) -> f32 {
        (self.page_width - self.margin_left - self.margin_right).max(1.0)
    }
}

pub struct Paragraph {
    pub runs: Vec<Run>,
    pub space_before: f32,
    pub space_after: f32,
    pub alignment: Alignment,
    pub indent_left: f32,
    pub indent_hanging: f32,
    pub list_label: String,
    pub page_break_before: bool,
    pub line_spacing: Option<f32>, // per-paragraph override
}

#[derive(Clone, Debug)]
pub struct Run {
    pub text: String, // may contain '\t' and '\n' (soft line break)
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<[u8; 3]>, // None = automatic (black)
}

impl Paragraph {
    /// Font size used for the line height of an empty paragraph.
    pub fn nominal_font_size(&self, fallback: f32) -> f32 {
        self.runs
            .iter()
            .map(|r| r.font_size)
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))))
            .unwrap_or(fallback)
    }
}
