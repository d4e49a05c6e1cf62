//! Request execution.
//!
//! - [`RestExecutor`] - the execution contract shared by [`RestClient`] and
//!   decorators such as [`crate::JsonClient`]
//! - [`RestClient`] - base URL, persistent headers and a [`Connector`]
//!
//! One call opens one connection, applies headers and strategies, reads the
//! status, classifies it against the accepted codes and decodes the body. The
//! connection is disconnected on every exit path.
//!
//! # Header precedence
//!
//! Per-call headers are applied first and persistent headers second, so a
//! persistent header wins over a per-call header with the same name. This is
//! what lets [`RestExecutor::set_bearer_token`] override an `Authorization`
//! header passed for a single call.

use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::connection::{AUTHORIZATION, Connection, ConnectionGuard, Connector, read_fully};
use crate::decoder::ResponseDecoder;
use crate::encoder::BodyEncoder;
use crate::{Error, Result};

/// Status accepted when a call lists no accepted codes.
pub const OK: u16 = 200;

/// Header map used for persistent and per-call headers.
pub type Headers = HashMap<String, String>;

/// Execution contract.
pub trait RestExecutor {
    /// Connection type opened by this executor.
    type Connection: Connection;

    /// Open a raw connection for `url_suffix`.
    fn connection(&self, url_suffix: &str) -> io::Result<Self::Connection>;

    /// Execute a request.
    ///
    /// - `body`/`encoder`: written only when both are present.
    /// - `decoder`: sets `Accept`; decodes the body on success. Without a
    ///   decoder, or when the response has no body, the result is `Ok(None)`.
    /// - `headers`: applied before persistent headers.
    /// - `accepted`: success statuses; empty means `[200]`.
    #[allow(clippy::too_many_arguments)]
    fn execute<B: ?Sized, R>(
        &self,
        method: &str,
        url_suffix: &str,
        body: Option<&B>,
        encoder: Option<&dyn BodyEncoder<B>>,
        decoder: Option<&dyn ResponseDecoder<R>>,
        headers: Option<&Headers>,
        accepted: &[u16],
    ) -> Result<Option<R>>;

    /// Execute a request without a body.
    fn execute_without_body<R>(
        &self,
        method: &str,
        url_suffix: &str,
        decoder: Option<&dyn ResponseDecoder<R>>,
        headers: Option<&Headers>,
        accepted: &[u16],
    ) -> Result<Option<R>> {
        self.execute::<(), R>(method, url_suffix, None, None, decoder, headers, accepted)
    }

    /// Set the persistent `Authorization: Bearer <token>` header.
    fn set_bearer_token(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, &format!("Bearer {token}"));
    }

    /// Set a persistent header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Remove a persistent header. Unknown names are ignored.
    fn remove_header(&mut self, name: &str);

    /// Remove every persistent header.
    fn remove_headers(&mut self);
}

impl<E: RestExecutor + ?Sized> RestExecutor for &mut E {
    type Connection = E::Connection;

    fn connection(&self, url_suffix: &str) -> io::Result<Self::Connection> {
        (**self).connection(url_suffix)
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
        (**self).execute(method, url_suffix, body, encoder, decoder, headers, accepted)
    }

    fn set_bearer_token(&mut self, token: &str) {
        (**self).set_bearer_token(token);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        (**self).set_header(name, value);
    }

    fn remove_header(&mut self, name: &str) {
        (**self).remove_header(name);
    }

    fn remove_headers(&mut self) {
        (**self).remove_headers();
    }
}

/// Blocking REST client.
///
/// Persistent headers live as long as the client and are only changed through
/// `&mut self` methods, so a client shared between threads must be wrapped by
/// the caller (for example in a `Mutex`).
///
/// # Example
///
/// ```ignore
/// use courier::{HyperConnector, RestClient, RestExecutor, StringDecoder};
///
/// let mut client = RestClient::new("https://api.example.com", HyperConnector::new()?);
/// client.set_bearer_token("secret");
/// let text = client.execute_without_body("GET", "/status", Some(&StringDecoder), None, &[])?;
/// ```
#[derive(Debug, Clone)]
pub struct RestClient<C> {
    base_url: String,
    connector: C,
    headers: Headers,
}

impl<C: Connector> RestClient<C> {
    /// Create a client sending requests to `base_url` followed by each call's suffix.
    pub fn new(base_url: impl Into<String>, connector: C) -> Self {
        Self {
            base_url: base_url.into(),
            connector,
            headers: Headers::new(),
        }
    }

    /// Base URL every suffix is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Persistent headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Underlying connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    fn apply_headers(
        &self,
        connection: &mut dyn Connection,
        headers: Option<&Headers>,
    ) -> Result<()> {
        for (name, value) in headers.into_iter().flatten().chain(&self.headers) {
            connection.set_header(name, value)?;
        }
        Ok(())
    }
}

impl<C: Connector> RestExecutor for RestClient<C> {
    type Connection = C::Connection;

    fn connection(&self, url_suffix: &str) -> io::Result<Self::Connection> {
        // Suffixes are appended verbatim; callers encode them.
        let url = format!("{}{url_suffix}", self.base_url);
        self.connector.connect(&url)
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
        debug!(%method, base_url = %self.base_url, %url_suffix, "sending request");

        let mut guard = ConnectionGuard::new(self.connection(url_suffix)?);
        let connection: &mut dyn Connection = &mut *guard;

        connection.set_method(method)?;
        self.apply_headers(connection, headers)?;

        if let Some(encoder) = encoder {
            encoder.set_content_type(connection, body)?;
        }
        if let Some(decoder) = decoder {
            decoder.set_accept(connection)?;
        }
        if let Some(encoder) = encoder {
            encoder.write(connection, body)?;
        }

        check_status(connection, accepted)?;

        match decoder {
            Some(decoder) => read_body(connection, decoder),
            None => Ok(None),
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    fn remove_headers(&mut self) {
        self.headers.clear();
    }
}

/// Fail with [`Error::Status`] when the status is not accepted.
fn check_status(connection: &mut dyn Connection, accepted: &[u16]) -> Result<u16> {
    let status = connection.response_code()?;
    let accepted = if accepted.is_empty() { &[OK][..] } else { accepted };
    if accepted.contains(&status) {
        debug!(status, "request completed");
        return Ok(status);
    }

    let message = connection.response_message()?;
    let body = match connection.error_stream()? {
        Some(mut errors) => Some(Bytes::from(read_fully(&mut errors)?)),
        None => None,
    };
    warn!(status, %message, ?accepted, "unexpected response status");
    Err(Error::status(status, message, body))
}

/// Decode the response body; a missing body decodes to `None`.
fn read_body<R>(
    connection: &mut dyn Connection,
    decoder: &dyn ResponseDecoder<R>,
) -> Result<Option<R>> {
    let Some(mut input) = connection.input_stream()? else {
        return Ok(None);
    };
    decoder.read_value(&mut input).map(Some)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::decoder::StringDecoder;
    use crate::encoder::{FormEncoder, JsonEncoder};
    use crate::testing::{MockConnector, MockResponse};

    const BASE_URL: &str = "http://localhost";

    fn client(response: MockResponse) -> RestClient<MockConnector> {
        RestClient::new(BASE_URL, MockConnector::new(response))
    }

    #[test]
    fn put_with_body_returns_decoded_result() {
        let mut client = client(MockResponse::new(201, "Created").body(b"result"));
        client.set_header("actual", "actual value");
        client.set_header("deleted", "deleted value");
        client.set_bearer_token("token");
        client.remove_header("deleted");

        let mut headers = Headers::new();
        headers.insert("name".to_string(), "getting of statistic".to_string());

        let result = client
            .execute::<u64, String>(
                "PUT",
                "/statistic",
                Some(&1_265_898_u64),
                Some(&JsonEncoder),
                Some(&StringDecoder),
                Some(&headers),
                &[201],
            )
            .expect("success");

        check!(result.as_deref() == Some("result"));

        let log = client.connector().log();
        check!(log.urls == vec!["http://localhost/statistic".to_string()]);
        check!(log.methods == vec!["PUT".to_string()]);
        let header = |name: &str, value: &str| (name.to_string(), value.to_string());
        check!(log.header_calls.contains(&header("name", "getting of statistic")));
        check!(log.header_calls.contains(&header("actual", "actual value")));
        check!(log.header_calls.contains(&header("Authorization", "Bearer token")));
        check!(log.header_calls.contains(&header("Content-Type", "application/json")));
        check!(log.header_calls.contains(&header("Accept", "text/plain")));
        check!(!log.header_calls.iter().any(|(name, _)| name == "deleted"));
        check!(log.output_enabled);
        check!(log.written == b"1265898");
        check!(log.status_reads == 1);
        check!(log.input_reads == 1);
        check!(log.disconnects == 1);
    }

    #[test]
    fn persistent_header_overrides_per_call_header() {
        let mut client = client(MockResponse::new(200, "OK"));
        client.set_header("name", "override");

        let mut headers = Headers::new();
        headers.insert("name".to_string(), "value".to_string());

        client
            .execute_without_body::<String>("GET", "/", None, Some(&headers), &[])
            .expect("success");

        let log = client.connector().log();
        let applied: Vec<_> = log
            .header_calls
            .iter()
            .filter(|(name, _)| name == "name")
            .map(|(_, value)| value.as_str())
            .collect();
        check!(applied == vec!["value", "override"]);
    }

    #[test]
    fn bearer_token_set_and_removed() {
        let mut client = client(MockResponse::new(200, "OK"));
        client.set_bearer_token("token");
        check!(client.headers().get(AUTHORIZATION).map(String::as_str) == Some("Bearer token"));

        client.remove_header(AUTHORIZATION);
        check!(client.headers().get(AUTHORIZATION).is_none());

        // removing twice is a no-op
        client.remove_header(AUTHORIZATION);
        client.set_header("a", "1");
        client.set_header("b", "2");
        client.remove_headers();
        check!(client.headers().is_empty());
    }

    #[test]
    fn empty_accepted_codes_mean_ok_only() {
        let client200 = client(MockResponse::new(200, "OK").body(b"fine"));
        let result = client200
            .execute_without_body::<String>("GET", "/", Some(&StringDecoder), None, &[])
            .expect("200 accepted");
        check!(result.as_deref() == Some("fine"));

        let client204 = client(MockResponse::new(204, "No Content"));
        let result =
            client204.execute_without_body::<String>("GET", "/", Some(&StringDecoder), None, &[]);
        let_assert!(Err(Error::Status { status: 204, .. }) = result);
        check!(client204.connector().log().disconnects == 1);
    }

    #[test]
    fn any_accepted_code_is_success() {
        for status in [200, 201, 202] {
            let client = client(MockResponse::new(status, "Fine"));
            let result = client.execute_without_body::<String>(
                "DELETE",
                "/item",
                None,
                None,
                &[200, 201, 202],
            );
            check!(result.is_ok(), "status {status} should be accepted");
        }
    }

    #[test]
    fn rejected_status_carries_error_body() {
        let client = client(MockResponse::new(404, "Not Found").error_body(b"test"));

        let result = client.execute_without_body::<String>("GET", "/missing", None, None, &[]);

        let_assert!(Err(err) = result);
        check!(err.status_code() == Some(404));
        check!(err.message() == Some("Not Found"));
        check!(err.body().map(|body| body.to_vec()) == Some(b"test".to_vec()));

        let log = client.connector().log();
        check!(log.message_reads == 1);
        check!(log.error_reads == 1);
        check!(log.input_reads == 0);
        check!(log.disconnects == 1);
    }

    #[test]
    fn rejected_status_without_error_stream() {
        let client = client(MockResponse::new(500, "Internal Server Error"));

        let result = client.execute_without_body::<String>("GET", "/", None, None, &[]);

        let_assert!(Err(err) = result);
        check!(err.is_server_error());
        check!(err.body().is_none());
    }

    #[test]
    fn bodyless_request_sets_no_content_type() {
        let client = client(MockResponse::new(200, "OK").body(b"{}"));

        let result = client
            .execute::<serde_json::Value, String>(
                "GET",
                "/",
                None,
                Some(&JsonEncoder),
                Some(&StringDecoder),
                None,
                &[],
            )
            .expect("success");
        check!(result.as_deref() == Some("{}"));

        let log = client.connector().log();
        check!(!log.header_calls.iter().any(|(name, _)| name == "Content-Type"));
        check!(!log.output_enabled);
        check!(log.output_requests == 0);
    }

    #[test]
    fn absent_input_stream_skips_decoder() {
        let client = client(MockResponse::new(200, "OK"));
        let result = client
            .execute_without_body::<String>("GET", "/", Some(&StringDecoder), None, &[])
            .expect("success");
        check!(result.is_none());
        check!(client.connector().log().input_reads == 1);
    }

    #[test]
    fn no_decoder_skips_input_stream() {
        let client = client(MockResponse::new(200, "OK").body(b"ignored"));
        let result = client
            .execute_without_body::<String>("GET", "/", None, None, &[])
            .expect("success");
        check!(result.is_none());

        let log = client.connector().log();
        check!(log.input_reads == 0);
        check!(!log.header_calls.iter().any(|(name, _)| name == "Accept"));
    }

    #[test]
    fn transport_failure_still_disconnects() {
        let client = client(MockResponse::new(200, "OK").fail_status());
        let result = client.execute_without_body::<String>("GET", "/", None, None, &[]);

        let_assert!(Err(Error::Transport(err)) = result);
        check!(err.kind() == io::ErrorKind::ConnectionRefused);
        check!(client.connector().log().disconnects == 1);
    }

    #[test]
    fn write_failure_still_disconnects() {
        let client = client(MockResponse::new(200, "OK").fail_output());
        let body = vec![("key", "value")];

        let result = client.execute::<_, String>(
            "POST",
            "/form",
            Some(&body),
            Some(&FormEncoder),
            None,
            None,
            &[],
        );

        let_assert!(Err(Error::Transport(_)) = result);
        let log = client.connector().log();
        check!(log.status_reads == 0);
        check!(log.disconnects == 1);
    }

    #[test]
    fn encode_failure_still_disconnects() {
        let client = client(MockResponse::new(200, "OK"));
        let body = vec![("tags", vec!["a", "b"])];

        let result = client.execute::<_, String>(
            "POST",
            "/form",
            Some(&body),
            Some(&FormEncoder),
            None,
            None,
            &[],
        );

        let_assert!(Err(Error::FormSerialization(_)) = result);
        let log = client.connector().log();
        check!(log.status_reads == 0);
        check!(log.disconnects == 1);
    }

    #[test]
    fn connect_failure_is_transport_error() {
        let client = RestClient::new(BASE_URL, MockConnector::refusing());
        let result = client.execute_without_body::<String>("GET", "/down", None, None, &[]);

        let_assert!(Err(Error::Transport(_)) = result);
        check!(client.connector().log().urls == vec!["http://localhost/down".to_string()]);
    }

    #[test]
    fn suffix_is_appended_verbatim() {
        let client = client(MockResponse::new(200, "OK"));
        let connection = client.connection("/search?q=a b").expect("connection");
        drop(connection);
        check!(client.connector().log().urls == vec!["http://localhost/search?q=a b".to_string()]);
    }
}
