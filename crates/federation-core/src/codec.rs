//! Federation parameter records and their wire encoding
//!
//! The management API stores every runtime parameter under a
//! `{"value": ...}` envelope. Reads may carry extra fields next to `value`
//! (`name`, `vhost`, `component`), which are ignored unless listed.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing enum values from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidAckMode(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidAckMode(s) => write!(
                f,
                "Invalid ack mode: {} (expected on-confirm, on-publish or no-ack)",
                s
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Acknowledgement mode used by a federation link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    OnConfirm,
    OnPublish,
    NoAck,
}

impl AckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::OnConfirm => "on-confirm",
            AckMode::OnPublish => "on-publish",
            AckMode::NoAck => "no-ack",
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AckMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-confirm" => Ok(AckMode::OnConfirm),
            "on-publish" => Ok(AckMode::OnPublish),
            "no-ack" => Ok(AckMode::NoAck),
            _ => Err(ParseError::InvalidAckMode(s.to_string())),
        }
    }
}

/// Connection parameters of a federation upstream
///
/// Plain value object. Setting both `exchange` and `queue` is accepted here;
/// which one matters depends on the policy that references the upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct UpstreamDefinition {
    /// AMQP URI of the remote broker
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ttl: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_count: Option<u32>,
    /// Seconds to wait before reconnecting a failed link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_mode: Option<AckMode>,
    #[serde(default)]
    pub trust_user_id: bool,
    /// Upstream exchange name, for exchange federation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Upstream queue name, for queue federation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

impl UpstreamDefinition {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

/// A named upstream in a vhost
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Upstream {
    pub vhost: String,
    pub name: String,
    pub definition: UpstreamDefinition,
}

/// A single reference inside an upstream set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamSetMember {
    pub upstream: String,
}

impl UpstreamSetMember {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
        }
    }
}

/// A named, ordered set of upstream references in a vhost
///
/// Duplicate members are kept as-is.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpstreamSet {
    pub vhost: String,
    pub name: String,
    pub members: Vec<UpstreamSetMember>,
}

impl UpstreamSet {
    /// Member names in stored order
    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.upstream.clone()).collect()
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
}

/// Element of a parameter listing
#[derive(Deserialize)]
struct ParameterRecord<T> {
    name: String,
    vhost: String,
    value: T,
}

/// Encode `{"value": definition}`
pub fn encode_upstream(definition: &UpstreamDefinition) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(&Envelope { value: definition }).map(Bytes::from)
}

/// Decode a single upstream envelope
pub fn decode_upstream(body: &[u8]) -> Result<UpstreamDefinition, serde_json::Error> {
    let envelope: Envelope<UpstreamDefinition> = serde_json::from_slice(body)?;
    Ok(envelope.value)
}

/// Decode a vhost's upstream listing
pub fn decode_upstream_list(body: &[u8]) -> Result<Vec<Upstream>, serde_json::Error> {
    let records: Vec<ParameterRecord<UpstreamDefinition>> = serde_json::from_slice(body)?;
    Ok(records
        .into_iter()
        .map(|r| Upstream {
            vhost: r.vhost,
            name: r.name,
            definition: r.value,
        })
        .collect())
}

/// Encode `{"value": [{"upstream": name}, ...]}`, preserving order
pub fn encode_upstream_set(names: &[String]) -> Result<Bytes, serde_json::Error> {
    let members: Vec<UpstreamSetMember> = names.iter().map(UpstreamSetMember::new).collect();
    serde_json::to_vec(&Envelope { value: members }).map(Bytes::from)
}

/// Decode an upstream set envelope into member names, preserving order
pub fn decode_upstream_set(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let envelope: Envelope<Vec<UpstreamSetMember>> = serde_json::from_slice(body)?;
    Ok(envelope.value.into_iter().map(|m| m.upstream).collect())
}
