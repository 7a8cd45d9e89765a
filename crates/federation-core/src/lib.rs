//! Federation Upstream Management
//!
//! This crate manages federation upstreams and federation upstream sets
//! through a broker's HTTP management API: the wire codec for the
//! `{"value": ...}` parameter envelope, resource paths, error
//! classification and the read-modify-write set merge.

pub mod codec;
pub mod error;
pub mod manager;
pub mod paths;

pub use codec::{AckMode, ParseError, Upstream, UpstreamDefinition, UpstreamSet, UpstreamSetMember};
pub use error::ManagementError;
pub use federation_proxy::{RawResponse, Transport, TransportError};
pub use manager::FederationManager;
