//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits
//! for easy glob importing:
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    BodyEncoder, BytesDecoder, Connection, Connector, Error, FileDecoder, FormEncoder, Headers,
    JsonClient, JsonDecoder, JsonEncoder, ResponseDecoder, Result, RestClient, RestExecutor,
    StreamDecoder, StringDecoder,
};
