/// List of all errors the driver can produce, composing the lower
/// layers' error types (see `usvg::Error`'s `From`-composition style,
/// which this mirrors).
#[derive(Debug)]
pub enum Error {
    Dvi(dvi_core::Error),

    /// A page-range expression didn't match `R := N | N-N | -N | N- | R,R`.
    InvalidRangeExpression(String),

    /// `bboxFormatString` named a paper size or length list that could
    /// not be resolved.
    InvalidPaperSize(String),

    /// A `transformCommands` expression failed to parse or evaluate.
    InvalidTransformExpression(String),

    /// A special handler reported a (by default non-fatal) error.
    SpecialError(String),

    Io(std::io::Error),
}

impl From<dvi_core::Error> for Error {
    fn from(e: dvi_core::Error) -> Self {
        Error::Dvi(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Dvi(e) => write!(f, "{}", e),
            Error::InvalidRangeExpression(s) => write!(f, "invalid page range expression: {}", s),
            Error::InvalidPaperSize(s) => write!(f, "invalid paper size: {}", s),
            Error::InvalidTransformExpression(s) => write!(f, "invalid transform expression: {}", s),
            Error::SpecialError(s) => write!(f, "special handler error: {}", s),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
