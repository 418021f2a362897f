use std::error;
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    ParseError(String),
    UnknownIdentifier(String),
    NoProductions,
    /// A lexer rule pattern that failed to compile.
    Pattern(String, parsegen::Error),
    Processing(parsegen::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ParseError(ref s) => write!(f, "failed to parse: {}", s),
            Error::UnknownIdentifier(ref s) => write!(f, "unknown identifier '{}'", s),
            Error::NoProductions => write!(f, "grammar has no productions"),
            Error::Pattern(ref p, ref err) => write!(f, "invalid pattern {:?}: {}", p, err),
            Error::Processing(ref err) => write!(f, "{}", err),
        }
    }
}

/// Wrapped errors are part of the message, so there is no source chain.
impl error::Error for Error {}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Error {
        Error::ParseError(format!("{:?}", err))
    }
}

impl From<parsegen::Error> for Error {
    fn from(err: parsegen::Error) -> Error {
        Error::Processing(err)
    }
}
