//! Blocking connector over hyper and rustls.
//!
//! Every [`HyperConnection`] performs exactly one exchange. The request body
//! is buffered until the response is first needed, then the whole exchange
//! runs on the connector's own tokio runtime and the response body is buffered
//! in memory.
//!
//! The connector drives its runtime with `block_on`. When the caller is itself
//! running on a tokio runtime, the exchange is driven from a scoped thread
//! instead, and the caller's thread blocks until it completes.

use std::fmt;
use std::future::Future;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use bytes::Bytes;
use courier_core::{Connection, Connector, Result, RestClient};
use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use http::{Method, StatusCode};
use hyper::ext::ReasonPhrase;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, trace};
use url::Url;

use crate::config::ConnectorConfig;
use crate::tls;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Opens [`HyperConnection`]s.
///
/// Cloning is cheap; clones share the runtime and the client.
///
/// # Example
///
/// ```ignore
/// use courier::{HyperConnector, RestClient};
///
/// let connector = HyperConnector::new()?;
/// let client = RestClient::new("https://localhost:8443/nifi-api", connector);
/// ```
#[derive(Clone)]
pub struct HyperConnector {
    client: HttpsClient,
    runtime: Arc<BlockingRuntime>,
    config: Arc<ConnectorConfig>,
}

impl HyperConnector {
    /// Create a connector with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ConnectorConfig::default())
    }

    /// Create a connector with a custom configuration.
    ///
    /// The TLS trust installed through [`crate::tls`] at this point is used,
    /// or the bundled webpki roots if none is.
    pub fn with_config(config: ConnectorConfig) -> Result<Self> {
        let runtime = BlockingRuntime::new()?;

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(https_connector(&config));

        debug!(
            https_only = config.https_only,
            http2 = config.http2,
            custom_trust = tls::is_installed(),
            "created connector"
        );

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
            config: Arc::new(config),
        })
    }

    /// Connector configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Wrap this connector into a [`RestClient`] rooted at `base_url`.
    pub fn into_client(self, base_url: impl Into<String>) -> RestClient<Self> {
        RestClient::new(base_url, self)
    }
}

/// Current-thread runtime owned by a connector.
struct BlockingRuntime {
    runtime: Option<Runtime>,
}

impl BlockingRuntime {
    fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Run `future` to completion from synchronous code.
    fn block_on<F>(&self, future: F) -> io::Result<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| io::Error::other("runtime is shut down"))?;

        if Handle::try_current().is_err() {
            return Ok(runtime.block_on(future));
        }

        // A runtime thread cannot start another runtime.
        std::thread::scope(|scope| scope.spawn(|| runtime.block_on(future)).join())
            .map_err(|_| io::Error::other("exchange thread panicked"))
    }
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        // Unlike a plain drop, this is allowed from within an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn https_connector(config: &ConnectorConfig) -> HttpsConnector<HttpConnector> {
    let builder = HttpsConnectorBuilder::new().with_tls_config(tls::client_config());
    let builder = if config.https_only {
        builder.https_only()
    } else {
        builder.https_or_http()
    };

    if config.http2 {
        builder.enable_http1().enable_http2().build()
    } else {
        builder.enable_http1().build()
    }
}

impl fmt::Debug for HyperConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Connector for HyperConnector {
    type Connection = HyperConnection;

    fn connect(&self, url: &str) -> io::Result<Self::Connection> {
        let url = Url::parse(url).map_err(|err| invalid_input(format!("{url}: {err}")))?;
        if self.config.https_only && url.scheme() != "https" {
            return Err(invalid_input(format!("{url}: only https is allowed")));
        }
        trace!(%url, "opening connection");
        Ok(HyperConnection::new(self.clone(), url))
    }
}

/// Buffered response of an exchange.
#[derive(Debug)]
struct Exchange {
    status: StatusCode,
    reason: Option<String>,
    body: Bytes,
}

/// One HTTP exchange over hyper.
///
/// Method and headers are configurable until the response is first read.
pub struct HyperConnection {
    connector: HyperConnector,
    url: Url,
    method: Method,
    headers: HeaderMap,
    output_enabled: bool,
    body: Vec<u8>,
    exchange: Option<Exchange>,
}

impl HyperConnection {
    fn new(connector: HyperConnector, url: Url) -> Self {
        Self {
            connector,
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            output_enabled: false,
            body: Vec::new(),
            exchange: None,
        }
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Whether the exchange has been performed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.exchange.is_some()
    }

    fn ensure_not_connected(&self) -> io::Result<()> {
        if self.is_connected() {
            return Err(io::Error::other(format!("{}: already connected", self.url)));
        }
        Ok(())
    }

    fn exchange(&mut self) -> io::Result<&Exchange> {
        if self.exchange.is_none() {
            let exchange = self.perform()?;
            self.exchange = Some(exchange);
        }
        self.exchange
            .as_ref()
            .ok_or_else(|| io::Error::other("no response"))
    }

    fn perform(&mut self) -> io::Result<Exchange> {
        let mut headers = self.headers.clone();
        if !headers.contains_key(USER_AGENT)
            && let Some(agent) = &self.connector.config.user_agent
        {
            let agent = HeaderValue::from_str(agent).map_err(invalid_input)?;
            headers.insert(USER_AGENT, agent);
        }

        let body = Bytes::from(std::mem::take(&mut self.body));
        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .body(Full::new(body))
            .map_err(invalid_input)?;
        *request.headers_mut() = headers;

        debug!(method = %self.method, url = %self.url, "sending request");

        let client = self.connector.client.clone();
        let exchange = self.connector.runtime.block_on(async move {
            let response = client.request(request).await.map_err(map_client_error)?;
            let status = response.status();
            let reason = response
                .extensions()
                .get::<ReasonPhrase>()
                .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(io::Error::other)?
                .to_bytes();
            Ok::<_, io::Error>(Exchange {
                status,
                reason,
                body,
            })
        })??;

        debug!(
            method = %self.method,
            url = %self.url,
            status = exchange.status.as_u16(),
            body_len = exchange.body.len(),
            "received response"
        );
        Ok(exchange)
    }
}

impl fmt::Debug for HyperConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperConnection")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Connection for HyperConnection {
    fn set_method(&mut self, method: &str) -> io::Result<()> {
        self.ensure_not_connected()?;
        self.method = Method::from_bytes(method.as_bytes())
            .map_err(|err| invalid_input(format!("{method:?}: {err}")))?;
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.ensure_not_connected()?;
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| invalid_input(format!("{name:?}: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| invalid_input(format!("value of {name:?}: {err}")))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn enable_output(&mut self) {
        self.output_enabled = true;
    }

    fn output_stream(&mut self) -> io::Result<Box<dyn Write + '_>> {
        self.ensure_not_connected()?;
        if !self.output_enabled {
            return Err(io::Error::other(format!(
                "{}: output is not enabled",
                self.url
            )));
        }
        Ok(Box::new(&mut self.body))
    }

    fn response_code(&mut self) -> io::Result<u16> {
        Ok(self.exchange()?.status.as_u16())
    }

    fn response_message(&mut self) -> io::Result<String> {
        let exchange = self.exchange()?;
        let message = match &exchange.reason {
            Some(reason) => reason.clone(),
            None => exchange
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
        };
        Ok(message)
    }

    fn input_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        let status = self.exchange()?.status;
        if !may_have_body(&self.method, status) {
            return Ok(None);
        }
        let body = self
            .exchange
            .as_ref()
            .map(|exchange| exchange.body.clone())
            .unwrap_or_default();
        Ok(Some(Box::new(Cursor::new(body))))
    }

    fn error_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        let exchange = self.exchange()?;
        let failed = exchange.status.is_client_error() || exchange.status.is_server_error();
        if !failed || exchange.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(Cursor::new(exchange.body.clone()))))
    }

    fn disconnect(&mut self) {
        trace!(url = %self.url, "disconnecting");
        self.body = Vec::new();
        if let Some(exchange) = &mut self.exchange {
            exchange.body = Bytes::new();
        }
    }
}

/// Whether a response to `method` with `status` can carry a body.
///
/// Other responses always have an input stream, possibly empty.
fn may_have_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !status.is_informational()
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

fn invalid_input(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

fn map_client_error(err: hyper_util::client::legacy::Error) -> io::Error {
    if err.is_connect() {
        io::Error::new(io::ErrorKind::ConnectionRefused, err)
    } else {
        io::Error::other(err)
    }
}
