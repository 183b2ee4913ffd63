use std::collections::HashMap;

use pdf_writer::{Name, Pdf, Ref};

use crate::model::Run;

/// PDF base-14 families; only these are used so nothing has to be embedded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Family {
    Helvetica,
    Times,
    Courier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FontKey {
    pub(crate) family: Family,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
}

impl FontKey {
    pub(crate) fn for_run(run: &Run) -> Self {
        FontKey {
            family: family_for(&run.font_name),
            bold: run.bold,
            italic: run.italic,
        }
    }

    pub(crate) fn base_font(self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (Family::Helvetica, false, false) => "Helvetica",
            (Family::Helvetica, true, false) => "Helvetica-Bold",
            (Family::Helvetica, false, true) => "Helvetica-Oblique",
            (Family::Helvetica, true, true) => "Helvetica-BoldOblique",
            (Family::Times, false, false) => "Times-Roman",
            (Family::Times, true, false) => "Times-Bold",
            (Family::Times, false, true) => "Times-Italic",
            (Family::Times, true, true) => "Times-BoldItalic",
            (Family::Courier, false, false) => "Courier",
            (Family::Courier, true, false) => "Courier-Bold",
            (Family::Courier, false, true) => "Courier-Oblique",
            (Family::Courier, true, true) => "Courier-BoldOblique",
        }
    }

    /// Advance of a WinAnsi byte at 1000 units/em.
    pub(crate) fn char_width_1000(self, byte: u8) -> f32 {
        match self.family {
            Family::Courier => 600.0,
            Family::Helvetica => {
                let w = helvetica_width(byte);
                if self.bold { w * 1.06 } else { w }
            }
            // Times is close to a condensed Helvetica for layout purposes.
            Family::Times => {
                let w = helvetica_width(byte) * 0.9;
                if self.bold { w * 1.04 } else { w }
            }
        }
    }

    pub(crate) fn text_width(self, bytes: &[u8], font_size: f32) -> f32 {
        bytes
            .iter()
            .map(|&b| self.char_width_1000(b))
            .sum::<f32>()
            * font_size
            / 1000.0
    }
}

pub(crate) fn primary_font_name(name: &str) -> &str {
    name.split(';').next().unwrap_or(name).trim()
}

fn family_for(font_name: &str) -> Family {
    let name = primary_font_name(font_name).to_lowercase();
    const MONO: &[&str] = &["courier", "consolas", "mono", "menlo", "lucida console"];
    const SERIF: &[&str] = &[
        "times", "cambria", "georgia", "garamond", "serif", "palatino", "book antiqua",
        "century",
    ];
    if MONO.iter().any(|m| name.contains(m)) {
        Family::Courier
    } else if SERIF.iter().any(|s| name.contains(s)) && !name.contains("sans") {
        Family::Times
    } else {
        Family::Helvetica
    }
}

/// Helvetica AFM widths for printable ASCII; Latin-1 letters reuse their base letter.
fn helvetica_width(byte: u8) -> f32 {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // :..@
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778,
        722, 667, 611, 722, 667, 944, 667, 667, 611, // A-Z
        278, 278, 278, 469, 556, 333, // [..`
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556,
        333, 500, 278, 556, 500, 722, 500, 500, 500, // a-z
        334, 260, 334, 584, // {..~
    ];
    match byte {
        32..=126 => f32::from(ASCII[usize::from(byte - 32)]),
        0x95 => 350.0,        // bullet
        0x96 => 556.0,        // en dash
        0x97 => 1000.0,       // em dash
        0x85 => 1000.0,       // ellipsis
        0x91..=0x94 => 333.0, // curly quotes
        0xC0..=0xC5 => 667.0,
        0xC8..=0xCB => 667.0,
        0xCC..=0xCF => 278.0,
        0xD2..=0xD6 | 0xD8 => 778.0,
        0xD9..=0xDC => 722.0,
        0xE0..=0xE5 | 0xE8..=0xEB | 0xF2..=0xF6 | 0xF9..=0xFC => 556.0,
        0xEC..=0xEF => 278.0,
        _ => 556.0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are dropped and counted.
pub(crate) fn to_winansi_bytes(s: &str) -> (Vec<u8>, usize) {
    let mut dropped = 0;
    let bytes = s
        .chars()
        .filter_map(|c| {
            let byte = match c as u32 {
                0x0020..=0x007E => Some(c as u8),
                0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
                0x20AC => Some(0x80),
                0x201A => Some(0x82),
                0x0192 => Some(0x83),
                0x201E => Some(0x84),
                0x2026 => Some(0x85),
                0x2020 => Some(0x86),
                0x2021 => Some(0x87),
                0x02C6 => Some(0x88),
                0x2030 => Some(0x89),
                0x0160 => Some(0x8A),
                0x2039 => Some(0x8B),
                0x0152 => Some(0x8C),
                0x017D => Some(0x8E),
                0x2018 => Some(0x91),
                0x2019 => Some(0x92),
                0x201C => Some(0x93),
                0x201D => Some(0x94),
                0x2022 => Some(0x95),
                0x2013 => Some(0x96),
                0x2014 => Some(0x97),
                0x02DC => Some(0x98),
                0x2122 => Some(0x99),
                0x0161 => Some(0x9A),
                0x203A => Some(0x9B),
                0x0153 => Some(0x9C),
                0x017E => Some(0x9E),
                0x0178 => Some(0x9F),
                _ => None,
            };
            if byte.is_none() {
                dropped += 1;
            }
            byte
        })
        .collect();
    (bytes, dropped)
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
}

/// Fonts referenced by the rendered pages, keyed by base font.
#[derive(Default)]
pub(crate) struct FontSet {
    entries: HashMap<FontKey, FontEntry>,
    order: Vec<FontKey>,
}

impl FontSet {
    pub(crate) fn name_for(&mut self, key: FontKey, alloc: &mut impl FnMut() -> Ref) -> String {
        if let Some(entry) = self.entries.get(&key) {
            return entry.pdf_name.clone();
        }
        let pdf_name = format!("F{}", self.order.len() + 1);
        self.entries.insert(
            key,
            FontEntry {
                pdf_name: pdf_name.clone(),
                font_ref: alloc(),
            },
        );
        self.order.push(key);
        pdf_name
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (FontKey, &FontEntry)> {
        self.order.iter().filter_map(|k| self.entries.get(k).map(|e| (*k, e)))
    }

    pub(crate) fn write(&self, pdf: &mut Pdf) {
        for (key, entry) in self.iter() {
            pdf.type1_font(entry.font_ref)
                .base_font(Name(key.base_font().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(font: &str) -> Run {
        Run {
            text: String::new(),
            font_size: 12.0,
            font_name: font.to_string(),
            bold: true,
            italic: false,
            color: None,
        }
    }

    #[test]
    fn picks_family_from_font_name() {
        assert_eq!(FontKey::for_run(&run("Times New Roman")).base_font(), "Times-Bold");
        assert_eq!(FontKey::for_run(&run("Consolas")).family, Family::Courier);
        assert_eq!(FontKey::for_run(&run("Calibri")).family, Family::Helvetica);
        assert_eq!(FontKey::for_run(&run("PT Sans Serif")).family, Family::Helvetica);
    }

    #[test]
    fn winansi_maps_specials_and_drops_the_rest() {
        let (bytes, dropped) = to_winansi_bytes("a\u{2022}\u{e9}\u{4e2d}");
        assert_eq!(bytes, vec![b'a', 0x95, 0xE9]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn courier_is_monospaced() {
        let key = FontKey { family: Family::Courier, bold: false, italic: false };
        assert_eq!(key.text_width(b"iiii", 10.0), key.text_width(b"MMMM", 10.0));
    }
}
