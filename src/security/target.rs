//! Target URL validation (SSRF guard).
//!
//! # Responsibilities
//! - Parse the caller-supplied target
//! - Accept only `http`/`https`
//! - Reject loopback, private, link-local and `.local` hosts before any fetch
//!
//! # Design Decisions
//! - Checks the literal host only; names are not resolved, so a public name
//!   pointing at a private address is not caught
//! - IPv4 spellings like `0x7f.1` are normalized by the URL parser first

use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use crate::error::ProxyError;

/// Parse and validate a target URL.
pub fn parse_target(raw: &str, allow_private: bool) -> Result<Url, ProxyError> {
    let url = Url::parse(raw.trim())?;
    check_target(&url, allow_private)?;
    Ok(url)
}

/// Enforce the scheme and address policy on an already parsed URL.
pub fn check_target(url: &Url, allow_private: bool) -> Result<(), ProxyError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::ProtocolNotAllowed);
    }
    if allow_private {
        return Ok(());
    }
    match url.host() {
        Some(host) if is_blocked_host(&host) => Err(ProxyError::LocalAddressBlocked),
        Some(_) => Ok(()),
        // http(s) URLs always carry a host; treat anything else as local.
        None => Err(ProxyError::LocalAddressBlocked),
    }
}

/// Whether a host is off-limits as a proxy target.
pub fn is_blocked_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_ascii_lowercase();
            name == "localhost" || name.ends_with(".local")
        }
        Host::Ipv4(ip) => is_blocked_v4(ip),
        Host::Ipv6(ip) => is_blocked_v6(ip),
    }
}

fn is_blocked_v4(ip: &Ipv4Addr) -> bool {
    ip.is_unspecified() || ip.is_loopback() || ip.is_private() || ip.is_link_local()
}

fn is_blocked_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(&v4);
    }
    let first = ip.segments()[0];
    ip.is_unspecified()
        || ip.is_loopback()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(raw: &str) -> bool {
        matches!(parse_target(raw, false), Err(ProxyError::LocalAddressBlocked))
    }

    #[test]
    fn test_blocks_local_targets() {
        for raw in [
            "http://127.0.0.1/",
            "http://localhost:3000/",
            "http://LOCALHOST/",
            "http://0.0.0.0/",
            "http://10.1.2.3/",
            "http://192.168.0.1/",
            "http://172.16.0.1/",
            "http://172.31.255.255/",
            "http://x.local/",
            "http://printer.LOCAL./",
            "http://127.8.9.10/",
            "http://169.254.169.254/latest/meta-data",
            "http://[::1]/",
            "http://[::ffff:10.0.0.1]/",
            "http://[fd00::1]/",
            "http://0x7f.1/",
        ] {
            assert!(blocked(raw), "{raw} should be blocked");
        }
    }

    #[test]
    fn test_allows_public_targets() {
        for raw in [
            "https://example.com/",
            "http://172.15.0.1/",
            "http://172.32.0.1/",
            "http://11.0.0.1/",
            "https://local.example.com/",
            "http://[2001:db8::1]/",
        ] {
            assert!(parse_target(raw, false).is_ok(), "{raw} should be allowed");
        }
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for raw in ["ftp://example.com/", "file:///etc/passwd", "javascript:alert(1)"] {
            assert!(matches!(parse_target(raw, false), Err(ProxyError::ProtocolNotAllowed)));
        }
    }

    #[test]
    fn test_unparseable_target() {
        assert!(matches!(parse_target("not a url", false), Err(ProxyError::InvalidUrl(_))));
    }

    #[test]
    fn test_allow_private_still_checks_scheme() {
        assert!(parse_target("http://127.0.0.1:9/", true).is_ok());
        assert!(matches!(parse_target("file:///x", true), Err(ProxyError::ProtocolNotAllowed)));
    }
}
