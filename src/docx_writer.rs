use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::Error;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style></w:styles>"#;

const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

/// Builds a minimal WordprocessingML package in memory.
pub(crate) struct DocxBuilder {
    title: String,
    body: String,
    paragraphs: usize,
}

impl DocxBuilder {
    pub(crate) fn new(title: &str) -> Self {
        DocxBuilder {
            title: title.to_string(),
            body: String::new(),
            paragraphs: 0,
        }
    }

    pub(crate) fn paragraph(&mut self, text: &str) {
        self.body.push_str("<w:p><w:r>");
        for (i, part) in text.split('\t').enumerate() {
            if i > 0 {
                self.body.push_str("<w:tab/>");
            }
            if !part.is_empty() {
                self.body.push_str(r#"<w:t xml:space="preserve">"#);
                self.body.push_str(&escape_xml(part));
                self.body.push_str("</w:t>");
            }
        }
        self.body.push_str("</w:r></w:p>");
        self.paragraphs += 1;
    }

    pub(crate) fn page_break(&mut self) {
        self.body
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    pub(crate) fn paragraph_count(&self) -> usize {
        self.paragraphs
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, Error> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}{SECTION}</w:body></w:document>"#,
            self.body
        );
        let core = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>pdf-docx-convert</dc:creator></cp:coreProperties>"#,
            escape_xml(&self.title)
        );

        // Fixed timestamps keep repeated conversions byte-identical.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", PACKAGE_RELS),
            ("word/document.xml", document.as_str()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
            ("word/styles.xml", STYLES),
            ("docProps/core.xml", core.as_str()),
        ] {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }
        zip.finish()?;
        Ok(buffer)
    }
}

/// Escapes markup characters and strips control characters XML 1.0 forbids.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{fffe}' || c == '\u{ffff}' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn escapes_markup_and_drops_control_chars() {
        assert_eq!(escape_xml("a<b> & \"c\"\u{0}\u{b}"), "a&lt;b&gt; &amp; &quot;c&quot;");
    }

    #[test]
    fn package_contains_required_parts() {
        let mut builder = DocxBuilder::new("Report");
        builder.paragraph("first\tsecond");
        builder.page_break();
        builder.paragraph("R&D");
        assert_eq!(builder.paragraph_count(), 2);
        let bytes = builder.finish().unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "docProps/core.xml",
        ] {
            assert!(zip.by_name(part).is_ok(), "missing {part}");
        }
        let mut document = String::new();
        zip.by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(roxmltree::Document::parse(&document).is_ok());
        assert!(document.contains("<w:tab/>"));
        assert!(document.contains(r#"<w:br w:type="page"/>"#));
        assert!(document.contains("R&amp;D"));
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            let mut builder = DocxBuilder::new("same");
            builder.paragraph("text");
            builder.finish().unwrap()
        };
        assert_eq!(build(), build());
    }
}
