//! Endpoint table shared by the HTTP service and the client.
//!
//! Paths use the `:name` parameter syntax understood by the axum router, so
//! the service mounts these constants verbatim and the client expands them
//! with [`build_url`].

use reqwest::Method;

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

pub const CREATE_ALERT: Endpoint = Endpoint {
    method: Method::POST,
    path: "/api/alerts",
};

pub const LIST_ACTIVE: Endpoint = Endpoint {
    method: Method::GET,
    path: "/api/alerts/active",
};

pub const UPDATE_LOCATION: Endpoint = Endpoint {
    method: Method::PATCH,
    path: "/api/alerts/:id/location",
};

pub const UPDATE_STATUS: Endpoint = Endpoint {
    method: Method::PATCH,
    path: "/api/alerts/:id/status",
};

/// Substitute `:name` segments of `path` with the matching values.
///
/// Parameters that do not appear in the path are ignored.
pub fn build_url(path: &str, params: &[(&str, String)]) -> String {
    path.split('/')
        .map(|segment| {
            segment
                .strip_prefix(':')
                .and_then(|name| params.iter().find(|(key, _)| *key == name))
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}
