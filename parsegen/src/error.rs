use std::error;
use std::fmt::{self, Display};

use crate::location::Location;

/// A failure to process some input.
///
/// Errors optionally carry the location they occurred at. Sibling failures
/// are combined with [`Error::aggregate`], which keeps only the ones that got
/// furthest into the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    msg: String,
    location: Option<Location>,
}

impl Error {
    pub fn new(msg: impl Into<String>) -> Self {
        Error {
            msg: msg.into(),
            location: None,
        }
    }

    pub fn at(msg: impl Into<String>, location: Location) -> Self {
        Error {
            msg: msg.into(),
            location: Some(location),
        }
    }

    pub fn with_location(msg: impl Into<String>, location: Option<Location>) -> Self {
        Error {
            msg: msg.into(),
            location,
        }
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Combine errors, keeping those at the maximum location.
    pub fn aggregate(errors: Vec<Error>) -> Error {
        Self::aggregate_by(errors, |locations| locations.iter().max().copied())
    }

    /// Combine errors, keeping those at the location chosen by `furthest`.
    ///
    /// `furthest` receives the locations of every located error. Errors
    /// without a location only contribute when no error is located.
    pub fn aggregate_by<F>(errors: Vec<Error>, furthest: F) -> Error
    where
        F: FnOnce(&[Location]) -> Option<Location>,
    {
        if errors.is_empty() {
            return Error::new("unknown error");
        }

        let locations: Vec<Location> = errors.iter().filter_map(|e| e.location).collect();
        match furthest(&locations) {
            Some(location) => {
                let group = errors
                    .into_iter()
                    .filter(|e| e.location == Some(location))
                    .collect();
                Error::at(join_messages(group), location)
            }
            None => Error::new(join_messages(errors)),
        }
    }
}

fn join_messages(errors: Vec<Error>) -> String {
    let mut msgs: Vec<String> = Vec::with_capacity(errors.len());
    for error in errors {
        if !msgs.contains(&error.msg) {
            msgs.push(error.msg);
        }
    }
    if msgs.len() == 1 {
        msgs.remove(0)
    } else {
        format!("[{}]", msgs.join(", "))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}: {}", location, self.msg),
            None => write!(f, "{}", self.msg),
        }
    }
}

impl error::Error for Error {}
