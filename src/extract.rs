use std::panic;
use std::path::{Path, PathBuf};

use crate::docx_writer::DocxBuilder;
use crate::error::Error;

/// A PDF opened for conversion to DOCX.
///
/// Text is extracted per page when the converter is opened; [`PdfConverter::close`]
/// releases it. Pages are 0-based and ranges are half-open.
pub struct PdfConverter {
    source: PathBuf,
    pages: Vec<String>,
}

impl PdfConverter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        // pdf-extract panics on some malformed files instead of returning an error.
        let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .map_err(|_| Error::Pdf(format!("could not parse {}", path.display())))?;
        let pages = extracted.map_err(|e| Error::Pdf(e.to_string()))?;

        log::debug!("Opened {} ({} page(s))", path.display(), pages.len());
        Ok(PdfConverter {
            source: path.to_path_buf(),
            pages,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Writes pages `start..end` (`None` = through the last page) to `output` as DOCX.
    pub fn convert(
        &self,
        output: impl AsRef<Path>,
        start: usize,
        end: Option<usize>,
    ) -> Result<(), Error> {
        let output = output.as_ref();
        let range = self.page_range(start, end)?;

        let title = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut builder = DocxBuilder::new(&title);

        for (i, page) in self.pages[range.clone()].iter().enumerate() {
            if i > 0 {
                builder.page_break();
            }
            for line in page.lines().map(str::trim).filter(|l| !l.is_empty()) {
                builder.paragraph(line);
            }
        }

        let paragraphs = builder.paragraph_count();
        if paragraphs == 0 && !range.is_empty() {
            log::warn!(
                "No text found in {}; the PDF may contain only images",
                self.source.display()
            );
        }

        let bytes = builder.finish()?;
        std::fs::write(output, bytes)?;
        log::info!(
            "Wrote {} paragraph(s) from page(s) {}..{} to {}",
            paragraphs,
            range.start,
            range.end,
            output.display()
        );
        Ok(())
    }

    pub fn close(self) {
        log::debug!("Closed {}", self.source.display());
    }

    fn page_range(&self, start: usize, end: Option<usize>) -> Result<std::ops::Range<usize>, Error> {
        let pages = self.pages.len();
        let stop = end.map_or(pages, |e| e.min(pages));
        if pages == 0 && start == 0 {
            return Ok(0..0);
        }
        if start >= pages || start >= stop {
            return Err(Error::PageRange { start, end, pages });
        }
        Ok(start..stop)
    }
}
