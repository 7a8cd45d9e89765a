//! Broker Management Transport
//!
//! This crate provides the HTTP transport used to talk to a message
//! broker's management API. It knows nothing about federation resources;
//! it only executes a method against a path and hands back the status and
//! body.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{HttpTransport, ManagementClientConfig};
pub use error::TransportError;
pub use transport::{RawResponse, Transport};
