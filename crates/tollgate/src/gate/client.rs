//! Caller identity observed at the edge.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

use tollgate_common::constants::headers::{CF_CONNECTING_IP, X_FORWARDED_FOR};

/// What the gate knows about the caller.
///
/// The IP is taken from `CF-Connecting-IP`, then the first
/// `X-Forwarded-For` hop, then the socket peer. The headers are only
/// trustworthy when the gate sits behind a proxy that overwrites them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: Option<IpAddr>,
}

impl ClientContext {
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let ip = header_ip(headers, CF_CONNECTING_IP)
            .or_else(|| forwarded_for(headers))
            .or_else(|| peer.map(|addr| addr.ip()));

        Self { ip }
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let raw = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    raw.split(',').next()?.trim().parse().ok()
}
