//! JSON convenience layer.

use std::io;

use crate::decoder::{JsonDecoder, ResponseDecoder};
use crate::encoder::{BodyEncoder, JsonEncoder};
use crate::executor::{Headers, RestExecutor};
use crate::Result;

/// Wraps an executor and fixes both strategies to JSON.
///
/// Everything else is forwarded unchanged, including persistent headers, so a
/// bearer token set through the wrapper is seen by the wrapped executor.
///
/// Wrap a `&mut RestClient` to keep using the client directly afterwards.
///
/// # Example
///
/// ```ignore
/// use courier::{HyperConnector, JsonClient, RestClient};
///
/// let mut client = RestClient::new("https://localhost:8443/nifi-api", HyperConnector::new()?);
/// let json = JsonClient::new(&mut client);
/// let diagnostics: Option<serde_json::Value> =
///     json.request("GET", "/system-diagnostics", None, &[])?;
/// ```
#[derive(Debug, Clone)]
pub struct JsonClient<E> {
    inner: E,
    encoder: JsonEncoder,
    decoder: JsonDecoder,
}

impl<E: RestExecutor> JsonClient<E> {
    /// Wrap `inner`.
    pub const fn new(inner: E) -> Self {
        Self {
            inner,
            encoder: JsonEncoder,
            decoder: JsonDecoder,
        }
    }

    /// Wrapped executor.
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    /// Wrapped executor, mutably.
    pub const fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    /// Unwrap the executor.
    pub fn into_inner(self) -> E {
        self.inner
    }

    /// Execute a request without a body and decode a JSON response.
    pub fn request<R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        url_suffix: &str,
        headers: Option<&Headers>,
        accepted: &[u16],
    ) -> Result<Option<R>> {
        self.inner.execute::<(), R>(
            method,
            url_suffix,
            None,
            None,
            Some(&self.decoder),
            headers,
            accepted,
        )
    }

    /// Execute a request with a JSON body and decode a JSON response.
    pub fn request_with_body<B: serde::Serialize + ?Sized, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        url_suffix: &str,
        body: &B,
        headers: Option<&Headers>,
        accepted: &[u16],
    ) -> Result<Option<R>> {
        self.inner.execute(
            method,
            url_suffix,
            Some(body),
            Some(&self.encoder),
            Some(&self.decoder),
            headers,
            accepted,
        )
    }
}

impl<E: RestExecutor> RestExecutor for JsonClient<E> {
    type Connection = E::Connection;

    fn connection(&self, url_suffix: &str) -> io::Result<Self::Connection> {
        self.inner.connection(url_suffix)
    }

    fn execute<B: ?Sized, R>(
        &self,
        method: &str,
        url_suffix: &str,
        body: Option<&B>,
        encoder: Option<&dyn BodyEncoder<B>>,
        decoder: Option<&dyn ResponseDecoder<R>>,
        headers: Option<&Headers>,
        accepted: &[u16],
    ) -> Result<Option<R>> {
        self.inner
            .execute(method, url_suffix, body, encoder, decoder, headers, accepted)
    }

    fn set_bearer_token(&mut self, token: &str) {
        self.inner.set_bearer_token(token);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.inner.set_header(name, value);
    }

    fn remove_header(&mut self, name: &str) {
        self.inner.remove_header(name);
    }

    fn remove_headers(&mut self) {
        self.inner.remove_headers();
    }
}
