//! Broker management HTTP client

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::TransportError;
use crate::transport::{RawResponse, Transport};

/// Management client configuration
#[derive(Clone, Debug)]
pub struct ManagementClientConfig {
    /// Base URL of the broker management interface (without `/api`)
    pub url: String,
    /// Username for basic authentication
    pub username: Option<String>,
    /// Password for basic authentication
    pub password: Option<String>,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// reqwest-backed management API transport
pub struct HttpTransport {
    config: ManagementClientConfig,
    api_root: String,
    client: Client,
}

impl HttpTransport {
    /// Create a new transport
    pub fn new(config: ManagementClientConfig) -> Result<Self, TransportError> {
        let parsed = Url::parse(&config.url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TransportError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let mut builder = Client::builder();

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build()?;
        let api_root = format!("{}/api", config.url.trim_end_matches('/'));

        info!("Created management client for {}", config.url);

        Ok(Self {
            config,
            api_root,
            client,
        })
    }

    /// Full URL for an API-relative path
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<RawResponse, TransportError> {
        let url = self.api_url(path);

        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connection(e.to_string())
            } else {
                TransportError::Http(e)
            }
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!("{} returned {} ({} bytes)", url, status, body.len());

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        path: String,
        authorization: Option<String>,
        content_type: Option<String>,
        body: Bytes,
    }

    type SeenLog = Arc<Mutex<Vec<Seen>>>;

    async fn record(
        State(log): State<SeenLog>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, String) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        log.lock().push(Seen {
            method,
            path: uri.path().to_string(),
            authorization: header("authorization"),
            content_type: header("content-type"),
            body,
        });

        if uri.path().ends_with("/missing") {
            (StatusCode::NOT_FOUND, r#"{"error":"Object Not Found"}"#.to_string())
        } else {
            (StatusCode::OK, r#"{"value":[]}"#.to_string())
        }
    }

    async fn spawn_broker() -> (String, SeenLog) {
        let log: SeenLog = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(record).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), log)
    }

    fn config(url: &str) -> ManagementClientConfig {
        ManagementClientConfig {
            url: url.to_string(),
            username: Some("guest".to_string()),
            password: Some("guest".to_string()),
            skip_tls_verify: false,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn test_api_url_joins_paths() {
        let transport = HttpTransport::new(config("http://broker:15672/")).unwrap();
        assert_eq!(
            transport.api_url("parameters/federation-upstream/%2F/a"),
            "http://broker:15672/api/parameters/federation-upstream/%2F/a"
        );
        assert_eq!(
            transport.api_url("/overview"),
            "http://broker:15672/api/overview"
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(matches!(
            HttpTransport::new(config("not a url")),
            Err(TransportError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpTransport::new(config("amqp://broker:5672")),
            Err(TransportError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_put_sends_body_and_basic_auth() {
        let (url, log) = spawn_broker().await;
        let transport = HttpTransport::new(config(&url)).unwrap();

        let response = transport
            .execute(
                Method::PUT,
                "parameters/federation-upstream-set/%2F/set1",
                Some(Bytes::from_static(br#"{"value":[]}"#)),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_success());

        let seen = log.lock().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::PUT);
        assert_eq!(seen[0].path, "/api/parameters/federation-upstream-set/%2F/set1");
        assert_eq!(
            seen[0].authorization.as_deref(),
            Some("Basic Z3Vlc3Q6Z3Vlc3Q=")
        );
        assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(&seen[0].body[..], br#"{"value":[]}"#);
    }

    #[tokio::test]
    async fn test_not_found_is_a_response_not_an_error() {
        let (url, log) = spawn_broker().await;
        let transport = HttpTransport::new(config(&url)).unwrap();

        let response = transport
            .execute(Method::DELETE, "parameters/federation-upstream/%2F/missing", None)
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.text().contains("Object Not Found"));

        let seen = log.lock().clone();
        assert_eq!(seen[0].method, Method::DELETE);
        assert!(seen[0].content_type.is_none());
        assert!(seen[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(config(&format!("http://{}", addr))).unwrap();
        let result = transport
            .execute(Method::GET, "parameters/federation-upstream/%2F", None)
            .await;
        assert!(matches!(
            result,
            Err(TransportError::Connection(_)) | Err(TransportError::Http(_))
        ));
    }
}
