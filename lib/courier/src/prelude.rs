//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits
//! for easy glob importing:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    BodyEncoder, BytesDecoder, ConnectorConfig, Error, FileDecoder, FormEncoder, Headers,
    HyperConnector, JsonClient, JsonDecoder, JsonEncoder, ResponseDecoder, Result, RestClient,
    RestExecutor, StreamDecoder, StringDecoder,
};
