//! Client identification utilities
//!
//! Identity-provider hooks forward the requester address either in the hook
//! payload or as the proxy chain in `X-Forwarded-For`.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Parse a single textual IP address, tolerating surrounding whitespace.
pub fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse::<IpAddr>().ok()
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to the direct IP if one is known.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(parse_client_ip)
        .or(direct_ip)
}

/// Resolve the requester IP for a hook call.
///
/// An explicit address in the payload wins; an unparseable one is treated as
/// absent rather than falling through to the headers.
pub fn resolve_hook_ip(body_ip: Option<&str>, headers: &HeaderMap) -> Option<IpAddr> {
    match body_ip {
        Some(raw) if !raw.trim().is_empty() => parse_client_ip(raw),
        _ => extract_client_ip(headers, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }

    #[test]
    fn test_resolve_hook_ip_prefers_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));

        assert_eq!(
            resolve_hook_ip(Some(" 1.2.3.4 "), &headers),
            Some("1.2.3.4".parse().unwrap())
        );
        assert_eq!(
            resolve_hook_ip(None, &headers),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(resolve_hook_ip(Some("nonsense"), &headers), None);
    }

    #[test]
    fn test_resolve_hook_ip_ipv6() {
        let headers = HeaderMap::new();
        assert_eq!(
            resolve_hook_ip(Some("2001:db8::1"), &headers),
            Some("2001:db8::1".parse().unwrap())
        );
        assert_eq!(resolve_hook_ip(None, &headers), None);
    }
}
