//! Nameserver selection.
//!
//! TLSA queries go to a single nameserver: the one given on the command line,
//! or the first one configured on the system.

use std::net::{IpAddr, SocketAddr};

use hickory_resolver::config::ResolverConfig;

use crate::config::DNS_PORT;
use crate::error_handling::ConfigError;

/// Parses an explicit nameserver given as `IP` or `IP:PORT`.
///
/// IPv6 addresses with a port use the bracketed form, e.g. `[2001:db8::53]:5353`.
pub fn parse_nameserver(value: &str) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ConfigError::InvalidNameserver(value.to_string()))
}

/// Returns the nameserver TLSA queries are sent to.
///
/// Without an explicit nameserver the system configuration (`/etc/resolv.conf`
/// on Unix) is read; if that fails, hickory's default upstream is used.
///
/// # Errors
///
/// - `ConfigError::InvalidNameserver` if `explicit` is not an address
/// - `ConfigError::NoNameserver` if no nameserver is configured at all
pub fn nameserver_address(explicit: Option<&str>) -> Result<SocketAddr, ConfigError> {
    if let Some(value) = explicit {
        return parse_nameserver(value);
    }

    let config = match hickory_resolver::system_conf::read_system_conf() {
        Ok((config, _opts)) => config,
        Err(e) => {
            log::warn!("Failed to read system DNS configuration ({e}), using default nameservers");
            ResolverConfig::default()
        }
    };
    let addr = config
        .name_servers()
        .first()
        .map(|ns| ns.socket_addr)
        .ok_or(ConfigError::NoNameserver)?;
    log::debug!("Using system nameserver {addr}");
    Ok(addr)
}
