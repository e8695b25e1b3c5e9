//! Zone index and request routing
//!
//! Every zone the credentials can see is indexed by its provider key. Each
//! request is then routed to the zone that is authoritative for it: the zone
//! whose dns name is the longest label-aligned suffix of the hostname.

use crate::record::{DnsRequest, normalize_fqdn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle for a provider-managed DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Stable provider key (e.g. the managed zone name)
    pub key: String,
    /// Canonical, dot-terminated domain suffix
    pub dns_name: String,
}

impl Zone {
    pub fn new(key: impl Into<String>, dns_name: &str) -> Self {
        Self {
            key: key.into(),
            dns_name: normalize_fqdn(dns_name),
        }
    }

    /// Whether this zone is authoritative for `hostname`
    ///
    /// Both names must be normalized. Matching is label-aligned, so the zone
    /// `example.com.` covers `www.example.com.` but not `evilexample.com.`.
    pub fn contains(&self, hostname: &str) -> bool {
        if self.dns_name == "." {
            return true;
        }
        hostname == self.dns_name
            || hostname
                .strip_suffix(self.dns_name.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Number of labels in the zone name, used to prefer the deepest zone
    fn depth(&self) -> usize {
        self.dns_name.split('.').filter(|l| !l.is_empty()).count()
    }
}

/// Lookup structure over all zones visible to the caller
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: BTreeMap<String, Zone>,
}

impl ZoneIndex {
    /// Index every zone by its provider key
    ///
    /// No filtering is applied; an empty listing yields an empty index.
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Self {
        Self {
            zones: zones.into_iter().map(|z| (z.key.clone(), z)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Zone> {
        self.zones.get(key)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Find the zone authoritative for `hostname`
    ///
    /// The deepest matching zone wins; among equally deep zones (two managed
    /// zones for the same name) the smallest key wins, so the choice never
    /// depends on listing order.
    pub fn find_authoritative(&self, hostname: &str) -> Option<&Zone> {
        let hostname = normalize_fqdn(hostname);
        self.zones
            .values()
            .filter(|zone| zone.contains(&hostname))
            .fold(None, |best: Option<&Zone>, zone| match best {
                Some(current) if current.depth() >= zone.depth() => Some(current),
                _ => Some(zone),
            })
    }
}

/// Requests partitioned by authoritative zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedRequests {
    /// Zone key → requests routed to that zone, in input order
    pub zones_to_edit: BTreeMap<String, Vec<DnsRequest>>,
    /// Hostname → request, for requests no zone is authoritative for
    pub unmatched: BTreeMap<String, DnsRequest>,
}

impl RoutedRequests {
    pub fn routed_count(&self) -> usize {
        self.zones_to_edit.values().map(Vec::len).sum()
    }
}

/// Partition requests by authoritative zone
pub fn route_requests(index: &ZoneIndex, requests: &[DnsRequest]) -> RoutedRequests {
    let mut routed = RoutedRequests::default();

    for request in requests {
        match index.find_authoritative(request.hostname()) {
            Some(zone) => {
                tracing::debug!("Routing {} to zone {}", request.key(), zone.key);
                routed
                    .zones_to_edit
                    .entry(zone.key.clone())
                    .or_default()
                    .push(request.clone());
            }
            None => {
                routed
                    .unmatched
                    .insert(request.hostname().to_string(), request.clone());
            }
        }
    }

    routed
}
