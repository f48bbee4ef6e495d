//! Service URL validation
//!
//! Two levels of checking:
//! - [`parse_service_url`]: the structural rule applied every time a request
//!   is built (absolute URL, http/https/ftp scheme, non-empty host).
//! - [`validate_service_url`]: the stricter rule applied before a URL is
//!   persisted to settings (public-range IPv4 or a real domain name, optional
//!   2-5 digit port).

use std::net::Ipv4Addr;

use regex::Regex;
use reqwest::Url;

use crate::error::{CoreError, CoreResult};

/// Schemes accepted for the annotation service base URL
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Host names and TLD shape accepted at save time (ASCII/punycode form)
const DOMAIN_PATTERN: &str =
    r"^(?:[a-z0-9](?:[a-z0-9_-]{0,62}[a-z0-9])?\.)+(?:[a-z]{2,}|xn--[a-z0-9-]{2,})\.?$";

/// Parses a service base URL, applying the structural rule.
pub fn parse_service_url(raw: &str) -> CoreResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidServiceUrl("URL is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| CoreError::InvalidServiceUrl(format!("{}: {}", trimmed, e)))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(CoreError::InvalidServiceUrl(format!(
            "unsupported scheme '{}' (expected http, https or ftp)",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(CoreError::InvalidServiceUrl(format!(
            "{} has no host",
            trimmed
        ))),
    }
}

/// Validates a service base URL before it is saved to settings.
pub fn validate_service_url(raw: &str) -> CoreResult<Url> {
    if raw.chars().any(char::is_whitespace) {
        return Err(CoreError::ValidationError(
            "service URL must not contain whitespace".to_string(),
        ));
    }

    let url = parse_service_url(raw).map_err(|e| CoreError::ValidationError(e.to_string()))?;

    let host = url.host_str().unwrap_or_default();
    if host.starts_with('[') {
        return Err(CoreError::ValidationError(
            "IPv6 hosts are not supported".to_string(),
        ));
    }
    match host.parse::<Ipv4Addr>() {
        Ok(addr) => validate_ipv4_host(addr)?,
        Err(_) => validate_domain_host(host)?,
    }

    if let Some(port) = url.port() {
        if port < 10 {
            return Err(CoreError::ValidationError(format!(
                "port {} is out of range",
                port
            )));
        }
    }

    Ok(url)
}

fn validate_ipv4_host(addr: Ipv4Addr) -> CoreResult<()> {
    let [a, b, _, d] = addr.octets();

    let private = a == 10
        || (a == 169 && b == 254)
        || (a == 192 && b == 168)
        || (a == 172 && (16..=31).contains(&b));
    if private {
        return Err(CoreError::ValidationError(format!(
            "{} is a private network address",
            addr
        )));
    }

    if a == 0 || a > 223 || d == 0 || d == 255 {
        return Err(CoreError::ValidationError(format!(
            "{} is a reserved, network or broadcast address",
            addr
        )));
    }

    Ok(())
}

fn validate_domain_host(domain: &str) -> CoreResult<()> {
    if domain.eq_ignore_ascii_case("localhost") {
        return Ok(());
    }

    let pattern = Regex::new(DOMAIN_PATTERN)
        .map_err(|e| CoreError::Internal(format!("Invalid domain pattern: {}", e)))?;
    if pattern.is_match(&domain.to_ascii_lowercase()) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "'{}' is not a valid host name",
            domain
        )))
    }
}
