#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::Path;

use assert_cmd::Command;

pub const USAGE: &str = "Usage: pdf-docx-convert [pdf2docx|docx2pdf] input_file output_file";

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn cli() -> Command {
    Command::cargo_bin("pdf-docx-convert").expect("Failed to find pdf-docx-convert binary")
}

/// Writes a bare DOCX with one paragraph per entry.
pub fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    write_docx_body(path, &body);
}

/// Writes a bare DOCX whose `w:body` holds `body`.
pub fn write_docx_body(path: &Path, body: &str) {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{WML_NS}"><w:body>{body}</w:body></w:document>"#
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}

pub fn read_document_xml(docx: &Path) -> String {
    let file = std::fs::File::open(docx).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut xml = String::new();
    zip.by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}
