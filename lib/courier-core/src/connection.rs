//! Transport boundary.
//!
//! - [`Connection`] - one HTTP exchange, driven step by step
//! - [`Connector`] - opens a fresh [`Connection`] for every call
//!
//! The executor only talks to these traits, so any blocking HTTP primitive can
//! back it. All fallible operations return [`std::io::Result`]; the executor
//! reports those failures as [`crate::Error::Transport`].

use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// `Accept` header name.
pub const ACCEPT: &str = "Accept";

/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";

/// A single HTTP exchange.
///
/// The exchange happens lazily: request-side operations (method, headers,
/// output) are only valid until the first call to [`Connection::response_code`],
/// [`Connection::response_message`] or one of the stream getters.
pub trait Connection {
    /// Set the request method (`GET`, `POST`, ...).
    fn set_method(&mut self, method: &str) -> io::Result<()>;

    /// Set a request header, replacing any previous value for `name`.
    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Current value of a request header.
    fn header(&self, name: &str) -> Option<&str>;

    /// Allow writing a request body.
    fn enable_output(&mut self);

    /// Writer for the request body.
    ///
    /// Fails if [`Connection::enable_output`] was not called.
    fn output_stream(&mut self) -> io::Result<Box<dyn Write + '_>>;

    /// Response status code, performing the exchange if needed.
    fn response_code(&mut self) -> io::Result<u16>;

    /// Response status message, performing the exchange if needed.
    fn response_message(&mut self) -> io::Result<String>;

    /// Response body, or `None` when the response carries no body.
    fn input_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>>;

    /// Error body, or `None` when the server sent no error payload.
    fn error_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>>;

    /// Release the underlying resources.
    fn disconnect(&mut self);
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn set_method(&mut self, method: &str) -> io::Result<()> {
        (**self).set_method(method)
    }

    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        (**self).set_header(name, value)
    }

    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }

    fn enable_output(&mut self) {
        (**self).enable_output();
    }

    fn output_stream(&mut self) -> io::Result<Box<dyn Write + '_>> {
        (**self).output_stream()
    }

    fn response_code(&mut self) -> io::Result<u16> {
        (**self).response_code()
    }

    fn response_message(&mut self) -> io::Result<String> {
        (**self).response_message()
    }

    fn input_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        (**self).input_stream()
    }

    fn error_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        (**self).error_stream()
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

/// Opens connections.
pub trait Connector {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Open a connection to an absolute URL.
    fn connect(&self, url: &str) -> io::Result<Self::Connection>;
}

impl<C: Connector + ?Sized> Connector for &C {
    type Connection = C::Connection;

    fn connect(&self, url: &str) -> io::Result<Self::Connection> {
        (**self).connect(url)
    }
}

/// Owns a connection for the duration of one call and disconnects it on drop.
#[derive(Debug)]
pub struct ConnectionGuard<C: Connection> {
    connection: C,
}

impl<C: Connection> ConnectionGuard<C> {
    /// Take ownership of `connection`.
    pub fn new(connection: C) -> Self {
        Self { connection }
    }
}

impl<C: Connection> Deref for ConnectionGuard<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl<C: Connection> DerefMut for ConnectionGuard<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}

/// Read a stream to the end.
pub(crate) fn read_fully(input: &mut dyn Read) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    input.read_to_end(&mut buffer)?;
    Ok(buffer)
}
