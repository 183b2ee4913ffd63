use std::fmt;

#[derive(Debug)]
pub enum Error {
    InvalidMode,
    InvalidDocx(String),
    Pdf(String),
    PageRange {
        start: usize,
        end: Option<usize>,
        pages: usize,
    },
    Office(String),
    MissingOutput,
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMode => write!(f, "Invalid mode. Use pdf2docx or docx2pdf"),
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Pdf(e) => write!(f, "PDF error: {e}"),
            Error::PageRange { start, end, pages } => match end {
                Some(end) => write!(
                    f,
                    "invalid page range {start}..{end} for a document with {pages} page(s)"
                ),
                None => write!(
                    f,
                    "invalid page range {start}.. for a document with {pages} page(s)"
                ),
            },
            Error::Office(details) => write!(f, "LibreOffice conversion failed: {details}"),
            Error::MissingOutput => write!(f, "Expected output PDF was not created"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
