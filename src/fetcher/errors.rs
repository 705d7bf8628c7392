use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("connection failure: {0}")]
    Connect(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http { status: StatusCode, retriable: bool },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn http(status: StatusCode) -> Self {
        Self::Http {
            status,
            retriable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn should_retry(&self) -> bool {
        match self {
            // Fatal errors - don't retry
            Self::InvalidUrl(_) => false,
            Self::UnsupportedScheme(_) => false,
            Self::BodyTooLarge(_) => false,
            Self::UnsupportedContentType(_) => false,
            Self::Charset(_) => false,
            Self::RedirectLoop => false,
            Self::Http { retriable, .. } => *retriable,

            // Temporary errors - retry
            Self::Connect(_) => true,
            Self::ConnectTimeout => true,
            Self::RequestTimeout => true,
            Self::Io(_) => true,
            Self::Unknown(_) => true,
        }
    }

    /// Upstream HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::http(status)
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Io(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}
