//! Target URL validation
//!
//! Only public http(s) targets may be fetched. Loopback, private and
//! link-local addresses are refused so the fetcher (and the size prober)
//! cannot be pointed at internal network resources.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use super::error::ScanError;

/// Parse and validate a scan target.
///
/// Errors are always [`ScanError::Validation`], which is never retried.
pub fn validate_target(raw: &str) -> Result<Url, ScanError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScanError::Validation(format!("'{}' is not a valid URL ({})", raw, e)))?;
    check_url(&url)?;
    Ok(url)
}

/// Validate an already parsed URL
pub fn check_url(url: &Url) -> Result<(), ScanError> {
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScanError::Validation(format!(
                "unsupported scheme '{}', only http and https are allowed",
                other
            )))
        }
    }

    let blocked = match url.host() {
        None => {
            return Err(ScanError::Validation(format!("'{}' has no host", url)));
        }
        Some(Host::Domain(domain)) => is_internal_hostname(domain),
        Some(Host::Ipv4(ip)) => is_internal_ipv4(ip),
        Some(Host::Ipv6(ip)) => is_internal_ipv6(ip),
    };

    if blocked {
        return Err(ScanError::Validation(format!(
            "'{}' targets a local or private network address",
            url
        )));
    }

    Ok(())
}

/// Whether an IP address is loopback, private, link-local or unspecified
pub fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_ipv4(v4),
        IpAddr::V6(v6) => is_internal_ipv6(v6),
    }
}

fn is_internal_hostname(domain: &str) -> bool {
    let host = domain.trim_end_matches('.').to_ascii_lowercase();
    host == "localhost" || host.ends_with(".localhost")
}

fn is_internal_ipv4(ip: Ipv4Addr) -> bool {
    // 10/8, 172.16/12 and 192.168/16 are covered by is_private
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_internal_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_ipv4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00 // unique local fc00::/7
        || (first & 0xffc0) == 0xfe80 // link-local fe80::/10
}
