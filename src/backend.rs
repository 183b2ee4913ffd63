use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;
use crate::office;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Pdf2Docx,
    Docx2Pdf,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf2docx" => Ok(Mode::Pdf2Docx),
            "docx2pdf" => Ok(Mode::Docx2Pdf),
            _ => Err(Error::InvalidMode),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Pdf2Docx => write!(f, "pdf2docx"),
            Mode::Docx2Pdf => write!(f, "docx2pdf"),
        }
    }
}

/// One conversion request, taken from the command line.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub mode: Mode,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Invocation {
    /// Runs exactly one conversion with the given strategy.
    pub fn run(&self, converter: &dyn Converter) -> Result<(), Error> {
        log::debug!(
            "{} {} -> {} using {}",
            self.mode,
            self.input.display(),
            self.output.display(),
            converter.name()
        );
        match self.mode {
            Mode::Pdf2Docx => converter.pdf_to_docx(&self.input, &self.output),
            Mode::Docx2Pdf => converter.docx_to_pdf(&self.input, &self.output),
        }
    }
}

/// A way of carrying out both conversion directions.
pub trait Converter {
    fn name(&self) -> &'static str;
    fn pdf_to_docx(&self, input: &Path, output: &Path) -> Result<(), Error>;
    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error>;
}

/// Converts in-process and writes straight to the requested path.
#[derive(Clone, Copy, Debug, Default)]
pub struct Library;

impl Converter for Library {
    fn name(&self) -> &'static str {
        "library"
    }

    fn pdf_to_docx(&self, input: &Path, output: &Path) -> Result<(), Error> {
        crate::convert_pdf_to_docx(input, output)
    }

    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error> {
        crate::convert_docx_to_pdf(input, output)
    }
}

/// Creates output directories and hands DOCX→PDF to a headless office suite.
#[derive(Clone, Debug)]
pub struct Office {
    pub binary: PathBuf,
}

impl Default for Office {
    fn default() -> Self {
        Office {
            binary: PathBuf::from(office::DEFAULT_OFFICE_BINARY),
        }
    }
}

impl Converter for Office {
    fn name(&self) -> &'static str {
        "office"
    }

    fn pdf_to_docx(&self, input: &Path, output: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(office::output_dir(output))?;
        crate::convert_pdf_to_docx(input, output)
    }

    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error> {
        office::convert_docx_to_pdf(&self.binary, input, output)
    }
}
