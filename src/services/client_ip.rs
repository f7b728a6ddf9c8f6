//! Caller IP extraction from proxy headers.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Returned when no header or remote address yields a usable value.
pub const FALLBACK_IP: &str = "8.8.8.8";

/// Headers consulted before the transport's remote address, in order.
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "proxy-client-ip", "wl-proxy-client-ip"];

/// Transport-level view of the caller.
#[derive(Debug, Clone, Copy)]
pub struct CallerSource<'a> {
    pub headers: &'a HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

/// Determine the caller's IP address.
///
/// Header values are used verbatim; empty values and the literal
/// `unknown` are skipped. With no source at all the fallback is returned.
pub fn extract_client_ip(source: Option<&CallerSource<'_>>) -> String {
    let Some(source) = source else {
        return FALLBACK_IP.to_string();
    };

    let remote_ip = source.remote_addr.map(|addr| addr.ip().to_string());

    IP_HEADERS
        .iter()
        .filter_map(|name| source.headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .chain(remote_ip.as_deref())
        .find(|candidate| is_usable(candidate))
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_IP.to_string())
}

fn is_usable(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case("unknown")
}
