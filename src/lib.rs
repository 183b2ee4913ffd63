mod backend;
mod docx;
mod docx_writer;
mod error;
mod extract;
mod fonts;
mod model;
pub mod office;
mod pdf;

pub use backend::{Converter, Invocation, Library, Mode, Office};
pub use error::Error;
pub use extract::PdfConverter;

use std::path::Path;

/// Converts the DOCX at `input` to PDF, writing straight to `output`.
pub fn convert_docx_to_pdf(input: &Path, output: &Path) -> Result<(), Error> {
    let doc = docx::parse(input)?;
    let bytes = pdf::render(&doc)?;
    std::fs::write(output, bytes)?;
    log::info!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

/// Converts every page of `input` to DOCX.
pub fn convert_pdf_to_docx(input: &Path, output: &Path) -> Result<(), Error> {
    let converter = PdfConverter::open(input)?;
    let result = converter.convert(output, 0, None);
    converter.close();
    result
}
