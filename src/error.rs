use std::{error, fmt};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The requested time window is empty or reversed.
    InvalidRange,
    InvalidArgument,
    /// A stats backend query failed.
    Query,
    Decode,
    Io,
    Other,
}

pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn error::Error>>,
}

impl Error {
    pub fn new(message: &str) -> Self {
        Self::with_kind(ErrorKind::Other, message)
    }

    pub fn with_kind(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_range(message: &str) -> Self {
        Self::with_kind(ErrorKind::InvalidRange, message)
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::with_kind(ErrorKind::InvalidArgument, message)
    }

    pub fn query(message: &str) -> Self {
        Self::with_kind(ErrorKind::Query, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_invalid_range(&self) -> bool {
        self.kind == ErrorKind::InvalidRange
    }

    pub fn into_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} error: {}", self.kind, self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(err) => write!(f, "{}. Source error: {}", self.message, err),
            None => write!(f, "{}", self.message),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.source {
            Some(ref err) => Some(&**err),
            None => None,
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            source: None,
        }
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl<E: error::Error + 'static> From<(String, E)> for Error {
    fn from((message, err): (String, E)) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            source: Some(Box::new(err)),
        }
    }
}

impl<E: error::Error + 'static> From<(&str, E)> for Error {
    fn from((message, err): (&str, E)) -> Self {
        Self {
            kind: ErrorKind::Other,
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        format!("{}", err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
