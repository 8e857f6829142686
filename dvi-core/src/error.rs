/// List of all errors a DVI decode can produce.
#[derive(Debug)]
pub enum Error {
    /// A read ran past the end of the stream.
    UnexpectedEof,

    /// An opcode outside the set legal for the file's format version.
    UnsupportedOpcode(u8),

    /// The pre-amble declared a format byte we don't know how to interpret.
    UnsupportedVersion(u8),

    /// A `pop` (142) was executed with an empty register stack.
    StackUnderflow,

    /// The run was cancelled via the cooperative cancellation flag.
    Cancelled,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::UnexpectedEof => write!(f, "unexpected end of DVI stream"),
            Error::UnsupportedOpcode(op) => write!(f, "unsupported opcode {}", op),
            Error::UnsupportedVersion(v) => write!(f, "unsupported DVI format version {}", v),
            Error::StackUnderflow => write!(f, "pop executed on an empty register stack"),
            Error::Cancelled => write!(f, "execution was cancelled"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
