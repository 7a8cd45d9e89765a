//! Federation upstream and upstream set management
//!
//! Every operation is a fresh round trip through the injected transport;
//! nothing is cached between calls. Responses are classified as success
//! (2xx), [`ManagementError::NotFound`] (404) or
//! [`ManagementError::Broker`] (anything else).

use std::sync::Arc;

use bytes::Bytes;
use federation_proxy::{RawResponse, Transport};
use http::{Method, StatusCode};
use tracing::{debug, info, warn};

use crate::codec::{self, Upstream, UpstreamDefinition};
use crate::error::ManagementError;
use crate::paths;

/// Manages federation upstreams and upstream sets on a broker
pub struct FederationManager {
    transport: Arc<dyn Transport>,
}

impl FederationManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute a request and classify the response
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<RawResponse, ManagementError> {
        let response = self.transport.execute(method, path, body).await?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::NOT_FOUND.as_u16() {
            return Err(ManagementError::NotFound(path.to_string()));
        }

        Err(ManagementError::Broker {
            status: response.status,
            message: response.text(),
        })
    }

    fn decode_error(path: &str) -> impl FnOnce(serde_json::Error) -> ManagementError {
        move |source| ManagementError::Decode {
            path: path.to_string(),
            source,
        }
    }

    /// Create or replace a federation upstream
    pub async fn put_upstream(
        &self,
        vhost: &str,
        name: &str,
        definition: &UpstreamDefinition,
    ) -> Result<RawResponse, ManagementError> {
        let path = paths::upstream_path(vhost, name);
        let body = codec::encode_upstream(definition).map_err(ManagementError::Encode)?;

        info!("Putting federation upstream {} in vhost {}", name, vhost);
        self.send(Method::PUT, &path, Some(body)).await
    }

    /// Fetch a single federation upstream definition
    pub async fn get_upstream(
        &self,
        vhost: &str,
        name: &str,
    ) -> Result<UpstreamDefinition, ManagementError> {
        let path = paths::upstream_path(vhost, name);

        debug!("Fetching federation upstream {} in vhost {}", name, vhost);
        let response = self.send(Method::GET, &path, None).await?;
        codec::decode_upstream(&response.body).map_err(Self::decode_error(&path))
    }

    /// List the federation upstreams of a vhost
    pub async fn list_upstreams(&self, vhost: &str) -> Result<Vec<Upstream>, ManagementError> {
        let path = paths::upstreams_path(vhost);

        debug!("Listing federation upstreams in vhost {}", vhost);
        let response = self.send(Method::GET, &path, None).await?;
        codec::decode_upstream_list(&response.body).map_err(Self::decode_error(&path))
    }

    /// Delete a federation upstream
    ///
    /// Deleting an upstream that does not exist fails with `NotFound`.
    pub async fn delete_upstream(
        &self,
        vhost: &str,
        name: &str,
    ) -> Result<RawResponse, ManagementError> {
        let path = paths::upstream_path(vhost, name);

        info!("Deleting federation upstream {} in vhost {}", name, vhost);
        self.send(Method::DELETE, &path, None).await
    }

    /// Fetch the member names of an upstream set, in stored order
    pub async fn get_upstream_set(
        &self,
        vhost: &str,
        name: &str,
    ) -> Result<Vec<String>, ManagementError> {
        let path = paths::upstream_set_path(vhost, name);

        debug!("Fetching federation upstream set {} in vhost {}", name, vhost);
        let response = self.send(Method::GET, &path, None).await?;
        codec::decode_upstream_set(&response.body).map_err(Self::decode_error(&path))
    }

    /// Replace an upstream set with exactly `upstreams`
    pub async fn put_upstream_set(
        &self,
        vhost: &str,
        name: &str,
        upstreams: &[String],
    ) -> Result<RawResponse, ManagementError> {
        let path = paths::upstream_set_path(vhost, name);
        let body = codec::encode_upstream_set(upstreams).map_err(ManagementError::Encode)?;

        info!(
            "Putting federation upstream set {} in vhost {} ({} members)",
            name,
            vhost,
            upstreams.len()
        );
        self.send(Method::PUT, &path, Some(body)).await
    }

    /// Append `upstream` to an upstream set, creating the set if absent
    ///
    /// The management API has no append verb, so this reads the set and
    /// writes it back with `upstream` at the tail. Names already present are
    /// appended again. Two concurrent callers on the same set can lose one
    /// of the additions; callers that need both must serialize calls for a
    /// given `(vhost, name)` themselves.
    ///
    /// A failed read other than `NotFound` is returned without writing. A
    /// failed write after a successful read is wrapped in
    /// [`ManagementError::SetUpdate`].
    pub async fn add_upstream_to_set(
        &self,
        vhost: &str,
        name: &str,
        upstream: &str,
    ) -> Result<RawResponse, ManagementError> {
        let mut upstreams = match self.get_upstream_set(vhost, name).await {
            Ok(upstreams) => upstreams,
            Err(ManagementError::NotFound(_)) => {
                warn!(
                    "Federation upstream set {} in vhost {} not found, creating it",
                    name, vhost
                );
                return self
                    .put_upstream_set(vhost, name, &[upstream.to_string()])
                    .await;
            }
            Err(e) => return Err(e),
        };

        upstreams.push(upstream.to_string());

        self.put_upstream_set(vhost, name, &upstreams)
            .await
            .map_err(|e| ManagementError::SetUpdate {
                vhost: vhost.to_string(),
                set: name.to_string(),
                source: Box::new(e),
            })
    }
}
