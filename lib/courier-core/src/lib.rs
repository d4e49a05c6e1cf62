//! Core traits, strategies and request executor for courier.
//!
//! This crate provides the transport-independent part of courier:
//! - [`Connection`] and [`Connector`] - the transport boundary
//! - [`BodyEncoder`] with [`JsonEncoder`] and [`FormEncoder`] - request bodies
//! - [`ResponseDecoder`] with [`JsonDecoder`], [`StringDecoder`], [`BytesDecoder`],
//!   [`FileDecoder`] and [`StreamDecoder`] - response bodies
//! - [`RestExecutor`] and [`RestClient`] - the request executor
//! - [`JsonClient`] - JSON convenience layer over any [`RestExecutor`]
//! - [`Error`] and [`Result`] - error handling

mod connection;
mod decoder;
mod encoder;
mod error;
mod executor;
mod json;
pub mod prelude;
#[cfg(test)]
mod testing;

pub use connection::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, Connection, ConnectionGuard, Connector};
pub use decoder::{
    BytesDecoder, FileDecoder, JsonDecoder, ResponseDecoder, StreamDecoder, StringDecoder,
    TEXT_PLAIN, from_json,
};
pub use encoder::{
    APPLICATION_FORM_URLENCODED, APPLICATION_JSON, BodyEncoder, FormEncoder, JsonEncoder, to_form,
    to_json,
};
pub use error::{Error, Result};
pub use executor::{Headers, OK, RestClient, RestExecutor};
pub use json::JsonClient;
