//! Management API resource paths
//!
//! Every vhost and name segment is percent-escaped on its own, so the
//! default vhost `/` becomes `%2F` instead of adding a path level.

use std::borrow::Cow;

const UPSTREAM_COMPONENT: &str = "federation-upstream";
const UPSTREAM_SET_COMPONENT: &str = "federation-upstream-set";

/// Percent-escape a single path segment
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::encode(segment)
}

/// `parameters/federation-upstream/{vhost}`
pub fn upstreams_path(vhost: &str) -> String {
    format!("parameters/{}/{}", UPSTREAM_COMPONENT, escape_segment(vhost))
}

/// `parameters/federation-upstream/{vhost}/{name}`
pub fn upstream_path(vhost: &str, name: &str) -> String {
    format!("{}/{}", upstreams_path(vhost), escape_segment(name))
}

/// `parameters/federation-upstream-set/{vhost}/{name}`
pub fn upstream_set_path(vhost: &str, name: &str) -> String {
    format!(
        "parameters/{}/{}/{}",
        UPSTREAM_SET_COMPONENT,
        escape_segment(vhost),
        escape_segment(name)
    )
}
