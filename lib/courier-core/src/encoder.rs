//! Request body encoders.
//!
//! A [`BodyEncoder`] turns a typed payload into wire bytes and declares the
//! matching `Content-Type`. When no body is given, encoders leave the
//! connection untouched: no header, no output, no write.

use std::io::Write;

use bytes::Bytes;

use crate::connection::{CONTENT_TYPE, Connection};
use crate::Result;

/// JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// Form URL-encoded media type.
pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Strategy serializing a request body of type `B`.
pub trait BodyEncoder<B: ?Sized> {
    /// Media type sent as `Content-Type`.
    fn content_type(&self) -> &str;

    /// Serialize the body into bytes.
    fn encode(&self, body: &B) -> Result<Bytes>;

    /// Set `Content-Type` on the connection when a body is present.
    fn set_content_type(&self, connection: &mut dyn Connection, body: Option<&B>) -> Result<()> {
        if body.is_some() {
            connection.set_header(CONTENT_TYPE, self.content_type())?;
        }
        Ok(())
    }

    /// Write the encoded body when one is present.
    ///
    /// The body is encoded before output is enabled, so an encoding failure
    /// leaves the connection untouched.
    fn write(&self, connection: &mut dyn Connection, body: Option<&B>) -> Result<()> {
        let Some(body) = body else {
            return Ok(());
        };
        let bytes = self.encode(body)?;
        connection.enable_output();
        let mut output = connection.output_stream()?;
        output.write_all(&bytes)?;
        output.flush()?;
        Ok(())
    }
}

/// Encodes bodies as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl<B: serde::Serialize + ?Sized> BodyEncoder<B> for JsonEncoder {
    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn encode(&self, body: &B) -> Result<Bytes> {
        to_json(body)
    }
}

/// Encodes flat string maps (or sequences of pairs) as
/// `application/x-www-form-urlencoded`.
///
/// Entries keep the iteration order of the input. Any entry that cannot be
/// represented as a form field fails the whole body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoder;

impl<B: serde::Serialize + ?Sized> BodyEncoder<B> for FormEncoder {
    fn content_type(&self) -> &str {
        APPLICATION_FORM_URLENCODED
    }

    fn encode(&self, body: &B) -> Result<Bytes> {
        to_form(body)
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Example
///
/// ```
/// use courier_core::to_form;
///
/// let login = vec![("username", "a b"), ("password", "p@ss")];
/// let bytes = to_form(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"username=a+b&password=p%40ss");
/// ```
pub fn to_form<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_urlencoded::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}
