//! Record reconciliation
//!
//! Given the record sets currently published in one zone, the requests routed
//! to that zone and the freshly observed addresses, compute the deletions and
//! creations that bring the zone to the desired state. This module performs no
//! I/O.
//!
//! ## Rules
//!
//! For each request, in order:
//!
//! 1. An existing record set with more than one value, or one served through
//!    a routing policy, is protected: nothing is deleted or created for that
//!    key. An A or AAAA request for a name that holds a CNAME is protected
//!    the same way, since the two cannot coexist.
//! 2. If there is no desired value (the address family was not resolved, or
//!    the type is not address-backed) the request is skipped.
//! 3. No existing record set: create.
//! 4. Existing record set with a different TTL: delete and recreate.
//! 5. Existing value equals the desired address: unchanged.
//! 6. Otherwise: delete and recreate.
//!
//! An update is always a delete/create pair sharing the same [`RecordKey`].

use crate::address::ResolvedAddresses;
use crate::record::{DnsRequest, RecordKey, RecordSet, RecordType};
use crate::traits::IpVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use tracing::debug;

/// Why a request produced no change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Address-backed type whose family was disabled or not resolved
    AddressUnavailable,
    /// Type for which no desired value can be derived
    NoValueSource,
}

/// Classification of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    /// Existing record set is multi-valued and left alone
    Protected,
    Skipped(SkipReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => f.write_str("create"),
            Outcome::Updated => f.write_str("update"),
            Outcome::Unchanged => f.write_str("unchanged"),
            Outcome::Protected => f.write_str("protected (operator-managed)"),
            Outcome::Skipped(SkipReason::AddressUnavailable) => {
                f.write_str("skipped (address unavailable)")
            }
            Outcome::Skipped(SkipReason::NoValueSource) => {
                f.write_str("skipped (no value source for type)")
            }
        }
    }
}

/// The outcome recorded for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub key: RecordKey,
    pub outcome: Outcome,
}

/// Per-outcome request counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub protected: usize,
    pub skipped: usize,
}

impl PlanCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Protected => self.protected += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.protected + self.skipped
    }

    /// Accumulate another zone's counts
    pub fn merge(&mut self, other: &PlanCounts) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.protected += other.protected;
        self.skipped += other.skipped;
    }
}

/// Changes required for one zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Existing record sets to remove
    pub to_delete: BTreeMap<RecordKey, RecordSet>,
    /// Record sets to publish, fully resolved
    pub to_create: BTreeMap<RecordKey, RecordSet>,
    /// One entry per distinct request, in request order
    pub decisions: Vec<Decision>,
    pub counts: PlanCounts,
}

impl ReconciliationPlan {
    /// Whether applying this plan would touch the zone at all
    pub fn is_noop(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }

    pub fn deletions(&self) -> Vec<RecordSet> {
        self.to_delete.values().cloned().collect()
    }

    pub fn creations(&self) -> Vec<RecordSet> {
        self.to_create.values().cloned().collect()
    }

    fn decide(&mut self, key: RecordKey, outcome: Outcome) {
        debug!("{}: {}", key, outcome);
        self.counts.record(outcome);
        self.decisions.push(Decision { key, outcome });
    }
}

/// Compute the plan for one zone
///
/// `existing` is the zone's current record sets, `requests` the requests
/// routed to the zone and `ttl` the TTL every managed record should carry.
/// Repeated requests for the same key are considered once.
pub fn reconcile(
    existing: &[RecordSet],
    requests: &[DnsRequest],
    addresses: &ResolvedAddresses,
    ttl: u32,
) -> ReconciliationPlan {
    let aliased: HashSet<&str> = existing
        .iter()
        .filter(|rs| rs.record_type == RecordType::Cname)
        .map(|rs| rs.name.as_str())
        .collect();
    let existing: HashMap<RecordKey, &RecordSet> =
        existing.iter().map(|rs| (rs.key(), rs)).collect();
    let mut seen = HashSet::new();
    let mut plan = ReconciliationPlan::default();

    for request in requests {
        let key = request.key();
        if !seen.insert(key.clone()) {
            debug!("Ignoring repeated request for {}", key);
            continue;
        }

        let current = existing.get(&key).copied();

        let under_cname =
            request.record_type().is_address() && aliased.contains(key.name.as_str());
        if under_cname || current.is_some_and(RecordSet::is_protected) {
            plan.decide(key, Outcome::Protected);
            continue;
        }

        let desired = match desired_address(request.record_type(), addresses) {
            Ok(ip) => ip,
            Err(reason) => {
                plan.decide(key, Outcome::Skipped(reason));
                continue;
            }
        };

        let outcome = match current {
            None => Outcome::Created,
            Some(rs) if rs.ttl != ttl => Outcome::Updated,
            Some(rs) if rs.sole_value().is_some_and(|v| same_address(v, desired)) => {
                Outcome::Unchanged
            }
            Some(_) => Outcome::Updated,
        };

        if outcome == Outcome::Updated
            && let Some(rs) = current
        {
            plan.to_delete.insert(key.clone(), rs.clone());
        }
        if matches!(outcome, Outcome::Created | Outcome::Updated) {
            plan.to_create.insert(
                key.clone(),
                RecordSet::new(&key.name, key.record_type, ttl, vec![desired.to_string()]),
            );
        }
        plan.decide(key, outcome);
    }

    plan
}

fn desired_address(
    record_type: RecordType,
    addresses: &ResolvedAddresses,
) -> Result<IpAddr, SkipReason> {
    let version = match record_type {
        RecordType::A => IpVersion::V4,
        RecordType::Aaaa => IpVersion::V6,
        _ => return Err(SkipReason::NoValueSource),
    };
    addresses
        .get(version)
        .ok_or(SkipReason::AddressUnavailable)
}

/// Compare a published value with the desired address
///
/// Published values are compared as addresses when they parse, so that
/// differently written forms of the same IPv6 address are equal.
fn same_address(published: &str, desired: IpAddr) -> bool {
    match published.trim().parse::<IpAddr>() {
        Ok(ip) => ip == desired,
        Err(_) => published == desired.to_string(),
    }
}
