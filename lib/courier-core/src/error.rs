//! Error types for courier.

use bytes::Bytes;
use derive_more::{Display, Error, From};

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// I/O failure while connecting, writing the request or reading the response.
    #[display("transport error: {_0}")]
    #[from]
    Transport(std::io::Error),

    /// The response status is not one of the accepted codes.
    #[display("{status}, {message}")]
    #[from(skip)]
    Status {
        /// HTTP status code.
        status: u16,
        /// HTTP status message.
        message: String,
        /// Error body, if the server sent one.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// Response body is not valid UTF-8.
    #[display("invalid UTF-8 response: {_0}")]
    #[from]
    Utf8(std::string::FromUtf8Error),

    /// TLS trust configuration error.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>, body: Option<Bytes>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            body,
        }
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the HTTP status code if this is a status error.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP status message if this is a status error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns the error body if this is a status error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Map the error body into a typed error object.
    ///
    /// `transform` is only called when a body is present.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::Error;
    ///
    /// let err = Error::status(404, "Not Found", Some("missing".into()));
    /// let text = err.error_object(|body| String::from_utf8_lossy(body).into_owned());
    /// assert_eq!(text.as_deref(), Some("missing"));
    ///
    /// let err = Error::status(404, "Not Found", None);
    /// assert_eq!(err.error_object(|_| unreachable!()), None::<String>);
    /// ```
    pub fn error_object<T>(&self, transform: impl FnOnce(&Bytes) -> T) -> Option<T> {
        self.body().map(transform)
    }

    /// Try to decode the error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not a status error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.error_object(|body| crate::from_json(body))
    }
}
