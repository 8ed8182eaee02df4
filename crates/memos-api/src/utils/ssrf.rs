//! Outbound link checks for external-link downloads.
//!
//! Rejects loopback, private, link-local and internal-looking hosts, both as
//! written in the link and after DNS resolution.

use memos_core::AppError;
use reqwest::Url;
use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

/// Check that `url` does not point into the server's own network.
///
/// A no-op when `allow_private_ips` is set.
pub async fn validate_external_host(url: &Url, allow_private_ips: bool) -> Result<(), AppError> {
    if allow_private_ips {
        return Ok(());
    }

    let host = url
        .host_str()
        .ok_or_else(|| AppError::Validation("External link must have a host".to_string()))?;
    // IPv6 literals keep their brackets in `host_str`.
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(rejected(host));
        }
        return Ok(());
    }

    let host_lower = host.to_ascii_lowercase();
    if host_lower == "localhost"
        || host_lower.ends_with(".localhost")
        || host_lower.ends_with(".local")
        || host_lower.ends_with(".internal")
        || host_lower.ends_with(".corp")
    {
        return Err(rejected(host));
    }

    let port = url.port_or_known_default().unwrap_or(80);
    match lookup_host((host, port)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_private_ip(&addr.ip()) {
                    tracing::warn!(host, ip = %addr.ip(), "External link resolves to a private address");
                    return Err(rejected(host));
                }
            }
        }
        // The fetch itself reports unreachable hosts.
        Err(e) => tracing::warn!(host, error = %e, "Failed to resolve external link host"),
    }

    Ok(())
}

fn rejected(host: &str) -> AppError {
    AppError::Validation(format!(
        "External link host {} is a private or internal address",
        host
    ))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_ip(&IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || is_ipv6_link_local(v6)
                    || is_ipv6_unique_local(v6)
            }
        },
    }
}

// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    async fn check(link: &str) -> Result<(), AppError> {
        validate_external_host(&Url::parse(link).unwrap(), false).await
    }

    #[tokio::test]
    async fn test_rejects_loopback_and_private_literals() {
        for link in [
            "http://127.0.0.1:8080/a.png",
            "http://[::1]/a.png",
            "http://10.1.2.3/a.png",
            "http://172.16.0.1/a.png",
            "http://192.168.1.1/a.png",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/a.png",
            "http://[::ffff:127.0.0.1]/a.png",
        ] {
            assert!(
                matches!(check(link).await, Err(AppError::Validation(_))),
                "{} should be rejected",
                link
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_internal_hostnames() {
        for link in [
            "http://localhost/a.png",
            "http://printer.local/a.png",
            "http://db.internal/a.png",
            "http://wiki.corp/a.png",
        ] {
            assert!(matches!(check(link).await, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_public_literal_passes() {
        assert!(check("https://93.184.215.14/a.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_allow_private_skips_checks() {
        let url = Url::parse("http://127.0.0.1/a.png").unwrap();
        assert!(validate_external_host(&url, true).await.is_ok());
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
        assert!(is_private_ip(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(is_private_ip(&"fd00::1".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));
        assert!(!is_private_ip(&"2606:4700::1111".parse().unwrap()));
    }
}
