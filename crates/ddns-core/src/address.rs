//! Public address resolution
//!
//! Both families are looked up concurrently. A family whose source is absent
//! (disabled by the operator) is never queried; a failed lookup is logged and
//! treated the same as a lookup that returned no address.

use crate::traits::{IpSource, IpVersion};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{info, warn};

/// Addresses observed for this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddresses {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl ResolvedAddresses {
    pub fn new(v4: Option<Ipv4Addr>, v6: Option<Ipv6Addr>) -> Self {
        Self { v4, v6 }
    }

    /// The resolved address of the given family, if any
    pub fn get(&self, version: IpVersion) -> Option<IpAddr> {
        match version {
            IpVersion::V4 => self.v4.map(IpAddr::V4),
            IpVersion::V6 => self.v6.map(IpAddr::V6),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_none() && self.v6.is_none()
    }
}

/// Look up the current public addresses
pub async fn resolve_addresses(
    v4_source: Option<&dyn IpSource>,
    v6_source: Option<&dyn IpSource>,
) -> ResolvedAddresses {
    let (v4, v6) = tokio::join!(lookup(v4_source), lookup(v6_source));

    ResolvedAddresses {
        v4: match v4 {
            Some(IpAddr::V4(ip)) => Some(ip),
            _ => None,
        },
        v6: match v6 {
            Some(IpAddr::V6(ip)) => Some(ip),
            _ => None,
        },
    }
}

async fn lookup(source: Option<&dyn IpSource>) -> Option<IpAddr> {
    let source = source?;
    let version = source.version();

    match source.current().await {
        Ok(Some(ip)) if version.matches(&ip) => {
            info!("Received '{}' as {} address", ip, version);
            Some(ip)
        }
        Ok(Some(ip)) => {
            warn!(
                "{} returned {} which is not an {} address, ignoring it",
                source.endpoint(),
                ip,
                version
            );
            None
        }
        Ok(None) => {
            info!("No {} address obtained from {}", version, source.endpoint());
            None
        }
        Err(e) => {
            warn!("{} lookup via {} failed: {}", version, source.endpoint(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedSource {
        version: IpVersion,
        answer: Option<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl IpSource for FixedSource {
        async fn current(&self) -> crate::Result<Option<IpAddr>> {
            if self.fail {
                return Err(crate::Error::ip_source("connection refused"));
            }
            Ok(self.answer.map(|a| a.parse().unwrap()))
        }

        fn version(&self) -> IpVersion {
            self.version
        }

        fn endpoint(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn both_families_resolved() {
        let v4 = FixedSource { version: IpVersion::V4, answer: Some("192.0.2.7"), fail: false };
        let v6 = FixedSource { version: IpVersion::V6, answer: Some("2001:db8::7"), fail: false };

        let addresses = resolve_addresses(Some(&v4), Some(&v6)).await;
        assert_eq!(addresses.v4, Some("192.0.2.7".parse().unwrap()));
        assert_eq!(addresses.v6, Some("2001:db8::7".parse().unwrap()));
    }

    #[tokio::test]
    async fn disabled_family_is_absent() {
        let v4 = FixedSource { version: IpVersion::V4, answer: Some("192.0.2.7"), fail: false };

        let addresses = resolve_addresses(Some(&v4), None).await;
        assert!(addresses.v4.is_some());
        assert_eq!(addresses.v6, None);
        assert_eq!(addresses.get(IpVersion::V6), None);
    }

    #[tokio::test]
    async fn failed_or_empty_lookup_is_unavailable() {
        let v4 = FixedSource { version: IpVersion::V4, answer: None, fail: true };
        let v6 = FixedSource { version: IpVersion::V6, answer: None, fail: false };

        let addresses = resolve_addresses(Some(&v4), Some(&v6)).await;
        assert!(addresses.is_empty());
    }

    #[tokio::test]
    async fn wrong_family_is_discarded() {
        let v6 = FixedSource { version: IpVersion::V6, answer: Some("192.0.2.7"), fail: false };

        let addresses = resolve_addresses(None, Some(&v6)).await;
        assert!(addresses.is_empty());
    }
}
