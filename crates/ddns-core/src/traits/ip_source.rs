// # IP Source Trait
//
// Defines the interface for discovering the caller's current public address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     match source.current().await? {
//         Some(ip) => println!("Public {} address: {}", source.version(), ip),
//         None => println!("No {} address available", source.version()),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Whether `ip` belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for IP source implementations
///
/// A source answers one question, once per run: what is the caller's public
/// address in this family right now.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform network I/O against the configured lookup endpoint
/// - ✅ Parse and validate the returned address
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Retry or poll (a run performs exactly one lookup per family)
/// - ❌ Decide whether records need changing (owned by the reconciler)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: The current address, always of [`IpSource::version`]
    /// - `Ok(None)`: The service answered but had no address to give
    /// - `Err(Error)`: The lookup failed
    async fn current(&self) -> Result<Option<IpAddr>, crate::Error>;

    /// The address family this source reports
    fn version(&self) -> IpVersion;

    /// Where the address is looked up (shown to the operator before any
    /// external request is made)
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_family() {
        let v4: IpAddr = "192.0.2.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(IpVersion::V4.matches(&v4));
        assert!(!IpVersion::V4.matches(&v6));
        assert!(IpVersion::V6.matches(&v6));
        assert!(!IpVersion::V6.matches(&v4));
    }
}
