//! Response decoders.
//!
//! A [`ResponseDecoder`] declares the `Accept` media type and turns the
//! response body into a value of the requested type.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::connection::{ACCEPT, Connection, read_fully};
use crate::encoder::APPLICATION_JSON;
use crate::Result;

/// Plain text media type.
pub const TEXT_PLAIN: &str = "text/plain";

/// Strategy decoding a response body into `T`.
pub trait ResponseDecoder<T> {
    /// Media type sent as `Accept`.
    fn accept(&self) -> &str;

    /// Consume the whole input and produce a value.
    fn read_value(&self, input: &mut dyn Read) -> Result<T>;

    /// Set `Accept` on the connection.
    fn set_accept(&self, connection: &mut dyn Connection) -> Result<()> {
        connection.set_header(ACCEPT, self.accept())?;
        Ok(())
    }
}

/// Decodes JSON bodies into any deserializable type.
///
/// A single instance serves every target type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl<T: serde::de::DeserializeOwned> ResponseDecoder<T> for JsonDecoder {
    fn accept(&self) -> &str {
        APPLICATION_JSON
    }

    fn read_value(&self, input: &mut dyn Read) -> Result<T> {
        let bytes = read_fully(input)?;
        from_json(&bytes)
    }
}

/// Decodes UTF-8 text bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringDecoder;

impl ResponseDecoder<String> for StringDecoder {
    fn accept(&self) -> &str {
        TEXT_PLAIN
    }

    fn read_value(&self, input: &mut dyn Read) -> Result<String> {
        let bytes = read_fully(input)?;
        String::from_utf8(bytes).map_err(Into::into)
    }
}

/// Returns the raw body bytes.
#[derive(Debug, Clone)]
pub struct BytesDecoder {
    accept: String,
}

impl BytesDecoder {
    /// Create a decoder advertising `accept`.
    pub fn new(accept: impl Into<String>) -> Self {
        Self {
            accept: accept.into(),
        }
    }
}

impl ResponseDecoder<Bytes> for BytesDecoder {
    fn accept(&self) -> &str {
        &self.accept
    }

    fn read_value(&self, input: &mut dyn Read) -> Result<Bytes> {
        read_fully(input).map(Bytes::from).map_err(Into::into)
    }
}

/// Streams the body into a file and returns its path.
///
/// The file is created, or truncated if it exists.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    accept: String,
    path: PathBuf,
}

impl FileDecoder {
    /// Create a decoder advertising `accept` and writing to `path`.
    pub fn new(accept: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            accept: accept.into(),
            path: path.into(),
        }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseDecoder<PathBuf> for FileDecoder {
    fn accept(&self) -> &str {
        &self.accept
    }

    fn read_value(&self, input: &mut dyn Read) -> Result<PathBuf> {
        let mut file = File::create(&self.path)?;
        io::copy(input, &mut file)?;
        file.flush()?;
        Ok(self.path.clone())
    }
}

/// Streams the body into a sink obtained from a factory.
///
/// The factory is called once per decoded response; the sink is dropped
/// before `read_value` returns, whatever the outcome.
pub struct StreamDecoder<F> {
    accept: String,
    sink: F,
}

impl<F> StreamDecoder<F> {
    /// Create a decoder advertising `accept` and writing into sinks built by `sink`.
    pub fn new(accept: impl Into<String>, sink: F) -> Self {
        Self {
            accept: accept.into(),
            sink,
        }
    }
}

impl<F> fmt::Debug for StreamDecoder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("accept", &self.accept)
            .finish_non_exhaustive()
    }
}

impl<F, W> ResponseDecoder<bool> for StreamDecoder<F>
where
    F: Fn() -> io::Result<W>,
    W: Write,
{
    fn accept(&self) -> &str {
        &self.accept
    }

    fn read_value(&self, input: &mut dyn Read) -> Result<bool> {
        let mut sink = (self.sink)()?;
        io::copy(input, &mut sink)?;
        sink.flush()?;
        Ok(true)
    }
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })?;
    deserializer
        .end()
        .map_err(|e| crate::Error::json_deserialization(".", e.to_string()))?;
    Ok(value)
}
