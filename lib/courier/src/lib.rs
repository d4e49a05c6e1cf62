//! Blocking HTTP request executor with pluggable body encoders and response
//! decoders.
//!
//! Each call opens one connection, applies headers, encodes the optional body,
//! checks the status against an accepted set and decodes the response.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct Diagnostics {
//!     #[serde(rename = "systemDiagnostics")]
//!     system_diagnostics: serde_json::Value,
//! }
//!
//! let mut client = HyperConnector::new()?.into_client("https://localhost:8443/nifi-api");
//! client.set_bearer_token(&token);
//!
//! let json = JsonClient::new(&mut client);
//! let diagnostics: Option<Diagnostics> =
//!     json.request("GET", "/system-diagnostics", None, &[])?;
//! ```

mod config;
mod connector;
pub mod prelude;
pub mod tls;

// Re-export transport types
pub use config::{ConnectorConfig, ConnectorConfigBuilder, DEFAULT_USER_AGENT};
pub use connector::{HyperConnection, HyperConnector};

// Re-export core types
pub use courier_core::{
    ACCEPT, APPLICATION_FORM_URLENCODED, APPLICATION_JSON, AUTHORIZATION, BodyEncoder,
    BytesDecoder, CONTENT_TYPE, Connection, ConnectionGuard, Connector, Error, FileDecoder,
    FormEncoder, Headers, JsonClient, JsonDecoder, JsonEncoder, OK, ResponseDecoder, Result,
    RestClient, RestExecutor, StreamDecoder, StringDecoder, TEXT_PLAIN, from_json, to_form,
    to_json,
};

/// Create a [`RestClient`] over a default [`HyperConnector`].
pub fn client(base_url: impl Into<String>) -> Result<RestClient<HyperConnector>> {
    Ok(HyperConnector::new()?.into_client(base_url))
}
