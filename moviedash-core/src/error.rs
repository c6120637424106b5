use std::{error, fmt, io};

#[derive(Debug)]
pub enum Error {
    NotFound,
    UnexpectedResponse { status: u16 },
    NetworkError(Box<dyn error::Error + Send + Sync>),
    DecodeError(Box<dyn error::Error + Send + Sync>),
    StorageError(Box<dyn error::Error + Send + Sync>),
    ConfigError(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found in catalog"),
            Self::UnexpectedResponse { status } => {
                write!(f, "Unexpected catalog response: HTTP {status}")
            }
            Self::NetworkError(err) => write!(f, "Network error: {err}"),
            Self::DecodeError(err) => write!(f, "Malformed payload: {err}"),
            Self::StorageError(err) => write!(f, "Storage error: {err}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::StorageError(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::DecodeError(Box::new(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::ConfigError(err.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Error {
        match err {
            ureq::Error::StatusCode(404) => Error::NotFound,
            ureq::Error::StatusCode(status) => Error::UnexpectedResponse { status },
            ureq::Error::Json(err) => Error::DecodeError(Box::new(err)),
            err => Error::NetworkError(Box::new(err)),
        }
    }
}
