use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::string::FromUtf8Error;
use std::time::Duration;

use http::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a refresh of the access token did not produce a new token.
///
/// Cloneable so that every caller waiting on the same refresh observes the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-2xx status.
    Rejected { status: u16, message: String },
    /// The refresh endpoint answered 2xx, but without `data.access_token`.
    Malformed(String),
    /// The refresh call never got a response.
    Transport(String),
}

impl Display for RefreshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::Rejected { status, message } => write!(f, "refresh rejected ({status}): {message}"),
            RefreshError::Malformed(reason) => write!(f, "malformed refresh response: {reason}"),
            RefreshError::Transport(reason) => write!(f, "refresh request failed: {reason}"),
        }
    }
}

impl StdError for RefreshError {}

pub enum Error {
    Custom(String),
    Http(http::Error),
    InvalidUri(http::uri::InvalidUri),
    HttpProtocol(hyper::Error),
    Transport(hyper_util::client::legacy::Error),
    JsonEncoding(serde_json::Error),
    Utf8Error(FromUtf8Error),
    IoError(std::io::Error),
    Timeout(Duration),
    Config(config::ConfigError),
    /// A non-2xx response (or a 401 that survived the single retry).
    RequestFailed { status: Option<StatusCode>, message: String },
    /// The access token could not be refreshed. Unless the refresh failed in transport, the
    /// session has been expired.
    RefreshFailed(RefreshError),
    /// A 2xx response that does not follow the `{ message, data }` envelope.
    ContractViolation(String),
}

impl Error {
    pub fn custom(msg: &str) -> Self {
        Error::Custom(msg.to_string())
    }

    pub(crate) fn request_failed(status: StatusCode, message: String) -> Self {
        Error::RequestFailed { status: Some(status), message }
    }

    /// Get the error status code.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RequestFailed { status, .. } => *status,
            Error::RefreshFailed(RefreshError::Rejected { status, .. }) => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }

    /// The human-readable message, suitable for direct display.
    pub fn message(&self) -> String {
        match self {
            Error::RequestFailed { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }

    /// True when the failure means the caller is not (or no longer) authenticated.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Error::RefreshFailed(RefreshError::Transport(_)) => false,
            Error::RefreshFailed(_) => true,
            _ => self.status() == Some(StatusCode::UNAUTHORIZED),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Custom(msg) => write!(f, "Custom: {}", msg),
            Error::Http(e) => write!(f, "HttpError: {:?}", e),
            Error::InvalidUri(e) => write!(f, "InvalidUri: {:?}", e),
            Error::HttpProtocol(e) => write!(f, "HttpProtocolError: {:?}", e),
            Error::Transport(e) => write!(f, "TransportError: {:?}", e),
            Error::JsonEncoding(e) => write!(f, "JsonEncodingError: {:?}", e),
            Error::Utf8Error(e) => write!(f, "Utf8Error: {:?}", e),
            Error::IoError(e) => write!(f, "IoError: {:?}", e),
            Error::Timeout(d) => write!(f, "Timeout {{ after: {:?} }}", d),
            Error::Config(e) => write!(f, "ConfigError: {:?}", e),
            Error::RequestFailed { status, message } => {
                write!(f, "RequestFailed {{ status: {:?}, message: {:?} }}", status, message)
            }
            Error::RefreshFailed(e) => write!(f, "RefreshFailed({:?})", e),
            Error::ContractViolation(msg) => write!(f, "ContractViolation: {}", msg),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Custom(msg) => write!(f, "{}", msg),
            Error::Http(e) => write!(f, "HttpError: {}", e),
            Error::InvalidUri(e) => write!(f, "InvalidUri: {}", e),
            Error::HttpProtocol(e) => write!(f, "HttpProtocolError: {}", e),
            Error::Transport(e) => write!(f, "TransportError: {}", e),
            Error::JsonEncoding(e) => write!(f, "JsonEncodingError: {}", e),
            Error::Utf8Error(e) => write!(f, "Utf8Error: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::Timeout(d) => write!(f, "Request timed out after {}ms", d.as_millis()),
            Error::Config(e) => write!(f, "ConfigError: {}", e),
            Error::RequestFailed { message, .. } => write!(f, "{}", message),
            Error::RefreshFailed(e) => write!(f, "{}", e),
            Error::ContractViolation(msg) => write!(f, "Response violates the envelope contract: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::InvalidUri(e) => Some(e),
            Error::HttpProtocol(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::JsonEncoding(e) => Some(e),
            Error::Utf8Error(e) => Some(e),
            Error::IoError(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::RefreshFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JsonEncoding(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::IoError(value)
    }
}

impl From<hyper::Error> for Error {
    fn from(value: hyper::Error) -> Self {
        Error::HttpProtocol(value)
    }
}

impl From<hyper_util::client::legacy::Error> for Error {
    fn from(value: hyper_util::client::legacy::Error) -> Self {
        Error::Transport(value)
    }
}

impl From<http::Error> for Error {
    fn from(value: http::Error) -> Self {
        Error::Http(value)
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(value: http::uri::InvalidUri) -> Self {
        Error::InvalidUri(value)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Utf8Error(value)
    }
}

impl From<config::ConfigError> for Error {
    fn from(value: config::ConfigError) -> Self {
        Error::Config(value)
    }
}

impl From<RefreshError> for Error {
    fn from(value: RefreshError) -> Self {
        Error::RefreshFailed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_displays_bare_message() {
        let err = Error::request_failed(StatusCode::BAD_REQUEST, "bad email".to_string());
        assert_eq!(err.to_string(), "bad email");
        assert_eq!(err.message(), "bad email");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_refresh_failure_is_auth_failure() {
        let err: Error = RefreshError::Rejected { status: 401, message: "expired".into() }.into();
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

        let offline: Error = RefreshError::Transport("connection refused".into()).into();
        assert!(!offline.is_auth_failure());
    }
}
