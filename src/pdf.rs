use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{self, FontKey, FontSet};
use crate::model::{Alignment, Document, Paragraph};

const TAB_STOP: f32 = 36.0;
const LINE_HEIGHT: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Style {
    key: FontKey,
    size: f32,
    color: Option<[u8; 3]>,
}

enum Piece {
    Word(Vec<u8>, Style),
    Space(Vec<u8>, Style),
    Tab(Style),
    Break,
}

/// Text positioned on a page; `y` is the baseline.
#[derive(Debug)]
struct Fragment {
    x: f32,
    y: f32,
    style: Style,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct PageLayout {
    fragments: Vec<Fragment>,
}

#[derive(Default)]
struct Line {
    fragments: Vec<Fragment>, // x relative to line start, y unset
    width: f32,
    trailing: f32,
    max_size: f32,
    words: usize,
    split: bool,
}

impl Line {
    fn push(&mut self, bytes: &[u8], style: Style, width: f32) {
        match self.fragments.last_mut() {
            Some(last) if !self.split && last.style == style => {
                last.bytes.extend_from_slice(bytes);
            }
            _ => self.fragments.push(Fragment {
                x: self.width,
                y: 0.0,
                style,
                bytes: bytes.to_vec(),
            }),
        }
        self.split = false;
        self.width += width;
        self.max_size = self.max_size.max(style.size);
    }
}

fn tokenize(para: &Paragraph, dropped: &mut usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for run in &para.runs {
        let style = Style {
            key: FontKey::for_run(run),
            size: run.font_size,
            color: run.color,
        };
        let mut flush = |buf: &mut String, is_space: bool, pieces: &mut Vec<Piece>| {
            if buf.is_empty() {
                return;
            }
            let (bytes, lost) = fonts::to_winansi_bytes(buf);
            *dropped += lost;
            buf.clear();
            if bytes.is_empty() {
                return;
            }
            pieces.push(if is_space {
                Piece::Space(bytes, style)
            } else {
                Piece::Word(bytes, style)
            });
        };

        let mut buf = String::new();
        let mut in_space = false;
        for c in run.text.chars() {
            match c {
                '\t' => {
                    flush(&mut buf, in_space, &mut pieces);
                    pieces.push(Piece::Tab(style));
                }
                '\n' => {
                    flush(&mut buf, in_space, &mut pieces);
                    pieces.push(Piece::Break);
                }
                c => {
                    let is_space = c == ' ' || c == '\u{a0}';
                    if is_space != in_space {
                        flush(&mut buf, in_space, &mut pieces);
                        in_space = is_space;
                    }
                    buf.push(c);
                }
            }
        }
        flush(&mut buf, in_space, &mut pieces);
    }
    pieces
}

/// Greedy word wrap; a word wider than the line is left to overflow.
fn break_lines(pieces: Vec<Piece>, first_avail: f32, rest_avail: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut avail = first_avail;

    for piece in pieces {
        match piece {
            Piece::Break => {
                lines.push(std::mem::take(&mut line));
                avail = rest_avail;
            }
            Piece::Tab(style) => {
                let stop = ((line.width / TAB_STOP).floor() + 1.0) * TAB_STOP;
                if stop > avail && line.words > 0 {
                    lines.push(std::mem::take(&mut line));
                    avail = rest_avail;
                } else {
                    line.width = stop;
                }
                line.trailing = 0.0;
                line.max_size = line.max_size.max(style.size);
                line.split = true;
            }
            Piece::Space(bytes, style) => {
                if line.fragments.is_empty() && line.width == 0.0 {
                    continue;
                }
                let w = style.key.text_width(&bytes, style.size);
                line.push(&bytes, style, w);
                line.trailing += w;
            }
            Piece::Word(bytes, style) => {
                let w = style.key.text_width(&bytes, style.size);
                if line.words > 0 && line.width - line.trailing + w > avail + 0.01 {
                    // drop the spaces that ended the previous line
                    if line.trailing > 0.0 {
                        trim_trailing(&mut line);
                    }
                    lines.push(std::mem::take(&mut line));
                    avail = rest_avail;
                }
                line.push(&bytes, style, w);
                line.trailing = 0.0;
                line.words += 1;
            }
        }
    }
    if !line.fragments.is_empty() || line.width > 0.0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn trim_trailing(line: &mut Line) {
    while let Some(last) = line.fragments.last_mut() {
        let keep = last.bytes.iter().rposition(|&b| b != b' ' && b != 0xA0);
        match keep {
            Some(i) => {
                last.bytes.truncate(i + 1);
                break;
            }
            None => {
                line.fragments.pop();
            }
        }
    }
    line.width -= line.trailing;
    line.trailing = 0.0;
}

fn layout(doc: &Document) -> Vec<PageLayout> {
    let top = doc.page_height - doc.margin_top;
    let text_width = doc.text_width();
    let mut pages = vec![PageLayout::default()];
    let mut cursor_y = top;
    let mut dropped = 0;

    for para in &doc.paragraphs {
        let at_top = cursor_y >= top - 0.01;
        if para.page_break_before && !at_top {
            pages.push(PageLayout::default());
            cursor_y = top;
        }
        if cursor_y < top - 0.01 {
            cursor_y -= para.space_before;
        }

        let rest_start = para.indent_left.max(0.0);
        let first_start = if para.list_label.is_empty() {
            (para.indent_left - para.indent_hanging).max(0.0)
        } else {
            rest_start
        };
        let nominal = para.nominal_font_size(doc.default_font_size);
        let factor = para.line_spacing.unwrap_or(doc.line_spacing);

        let lines = break_lines(
            tokenize(para, &mut dropped),
            (text_width - first_start).max(1.0),
            (text_width - rest_start).max(1.0),
        );

        for (i, line) in lines.into_iter().enumerate() {
            let size = if line.max_size > 0.0 { line.max_size } else { nominal };
            let line_h = size * LINE_HEIGHT * factor;
            if cursor_y - line_h < doc.margin_bottom && cursor_y < top - 0.01 {
                pages.push(PageLayout::default());
                cursor_y = top;
            }
            let baseline = cursor_y - size;
            let start = if i == 0 { first_start } else { rest_start };
            let used = line.width - line.trailing;
            let slack = (text_width - start - used).max(0.0);
            let shift = match para.alignment {
                Alignment::Center => slack / 2.0,
                Alignment::Right => slack,
                Alignment::Left | Alignment::Justify => 0.0,
            };

            let Some(page) = pages.last_mut() else {
                break;
            };
            if i == 0 && !para.list_label.is_empty() {
                let style = line
                    .fragments
                    .first()
                    .map(|f| f.style)
                    .unwrap_or(Style {
                        key: para
                            .runs
                            .first()
                            .map(FontKey::for_run)
                            .unwrap_or(FontKey {
                                family: fonts::Family::Helvetica,
                                bold: false,
                                italic: false,
                            }),
                        size,
                        color: None,
                    });
                let (bytes, lost) = fonts::to_winansi_bytes(&para.list_label);
                dropped += lost;
                page.fragments.push(Fragment {
                    x: doc.margin_left + (para.indent_left - para.indent_hanging).max(0.0),
                    y: baseline,
                    style,
                    bytes,
                });
            }
            for frag in line.fragments {
                page.fragments.push(Fragment {
                    x: doc.margin_left + start + shift + frag.x,
                    y: baseline,
                    ..frag
                });
            }
            cursor_y -= line_h;
        }

        cursor_y -= para.space_after;
    }

    if dropped > 0 {
        log::warn!("{dropped} character(s) have no WinAnsi glyph and were left out");
    }
    pages
}

pub fn render(doc: &Document) -> Result<Vec<u8>, Error> {
    let pages = layout(doc);

    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let info_id = Ref::new(3);
    let mut next_id = 4;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };

    let mut fonts = FontSet::default();
    let mut page_ids = Vec::with_capacity(pages.len());

    for page in &pages {
        let page_id = alloc();
        let content_id = alloc();
        page_ids.push(page_id);

        let mut content = Content::new();
        let mut fill: Option<[u8; 3]> = None;
        for frag in &page.fragments {
            if frag.bytes.is_empty() {
                continue;
            }
            let color = frag.style.color.unwrap_or([0, 0, 0]);
            if fill != Some(color) {
                content.set_fill_rgb(
                    f32::from(color[0]) / 255.0,
                    f32::from(color[1]) / 255.0,
                    f32::from(color[2]) / 255.0,
                );
                fill = Some(color);
            }
            let font_name = fonts.name_for(frag.style.key, &mut alloc);
            content
                .begin_text()
                .set_font(Name(font_name.as_bytes()), frag.style.size)
                .next_line(frag.x, frag.y)
                .show(Str(&frag.bytes))
                .end_text();
        }
        pdf.stream(content_id, &content.finish());

        let mut page_writer = pdf.page(page_id);
        page_writer
            .media_box(Rect::new(0.0, 0.0, doc.page_width, doc.page_height))
            .parent(pages_id)
            .contents(content_id);
        let mut resources = page_writer.resources();
        let mut font_dict = resources.fonts();
        for (_, entry) in fonts.iter() {
            font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
        }
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .producer(TextStr(concat!("pdf-docx-convert ", env!("CARGO_PKG_VERSION"))));
    fonts.write(&mut pdf);

    log::debug!("Rendered {} page(s)", page_ids.len());
    Ok(pdf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Run;

    fn para(text: &str) -> Paragraph {
        Paragraph {
            runs: vec![Run {
                text: text.to_string(),
                font_size: 12.0,
                font_name: "Arial".to_string(),
                bold: false,
                italic: false,
                color: None,
            }],
            space_before: 0.0,
            space_after: 0.0,
            alignment: Alignment::Left,
            indent_left: 0.0,
            indent_hanging: 0.0,
            list_label: String::new(),
            page_break_before: false,
            line_spacing: None,
        }
    }

    fn doc(paragraphs: Vec<Paragraph>) -> Document {
        Document {
            page_width: 612.0,
            page_height: 792.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            line_spacing: 1.0,
            default_font_size: 12.0,
            paragraphs,
        }
    }

    #[test]
    fn long_paragraph_wraps_inside_margins() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let pages = layout(&doc(vec![para(text.trim_end())]));
        let baselines: std::collections::BTreeSet<i64> = pages[0]
            .fragments
            .iter()
            .map(|f| f.y as i64)
            .collect();
        assert!(baselines.len() > 5);
        for frag in &pages[0].fragments {
            let right = frag.x + frag.style.key.text_width(&frag.bytes, 12.0);
            assert!(right <= 540.5, "fragment overflows: {right}");
        }
    }

    #[test]
    fn paginates_and_honours_page_breaks() {
        let many: Vec<Paragraph> = (0..80).map(|i| para(&format!("line {i}"))).collect();
        assert!(layout(&doc(many)).len() >= 2);

        let mut second = para("second");
        second.page_break_before = true;
        let pages = layout(&doc(vec![para("first"), second]));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].fragments[0].bytes, b"second");
    }

    #[test]
    fn right_alignment_ends_at_margin() {
        let mut p = para("end");
        p.alignment = Alignment::Right;
        let pages = layout(&doc(vec![p]));
        let frag = &pages[0].fragments[0];
        let right = frag.x + frag.style.key.text_width(&frag.bytes, 12.0);
        assert!((right - 540.0).abs() < 0.01);
    }

    #[test]
    fn list_label_hangs_before_text() {
        let mut p = para("item");
        p.list_label = "1.".into();
        p.indent_left = 36.0;
        p.indent_hanging = 18.0;
        let pages = layout(&doc(vec![p]));
        assert_eq!(pages[0].fragments[0].bytes, b"1.");
        assert_eq!(pages[0].fragments[0].x, 90.0);
        assert_eq!(pages[0].fragments[1].x, 108.0);
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let bytes = render(&doc(Vec::new())).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(layout(&doc(Vec::new())).len(), 1);
    }
}
