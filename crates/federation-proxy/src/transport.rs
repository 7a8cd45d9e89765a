//! Transport trait

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;

use crate::error::TransportError;

/// Status and body of a completed management API call
///
/// Any status code is a completed call here; deciding what a 404 or a 500
/// means is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Management API transport
///
/// Implementations issue one request per call and report only
/// connection-level failures as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `method` against `path`, relative to the API root
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<RawResponse, TransportError>;
}
