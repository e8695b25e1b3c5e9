//! Test doubles and common utilities for contract tests
//!
//! The in-memory provider behaves like a real zone API: it holds record sets
//! per zone, rejects deletions that do not exactly match a published record
//! set and additions that collide with one, and reports changes as pending
//! for a configurable number of polls.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{Change, ChangeBatch, ChangeStatus, DnsProvider};
use ddns_core::{DnsRequest, EngineConfig, RecordSet, RecordType, Zone};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    zones: Vec<Zone>,
    records: BTreeMap<String, Vec<RecordSet>>,
    submitted: Vec<(String, ChangeBatch)>,
    polls_remaining: HashMap<String, usize>,
    next_change_id: u64,
    pending_polls: usize,
    never_done: bool,
    fail_zone_listing: bool,
    fail_record_listing: HashSet<String>,
    fail_additions: bool,
    list_zones_calls: usize,
    get_change_calls: usize,
}

/// In-memory DNS provider; clones share state
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone with its current record sets
    pub fn with_zone(self, key: &str, dns_name: &str, records: Vec<RecordSet>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.zones.push(Zone::new(key, dns_name));
            state.records.insert(key.to_string(), records);
        }
        self
    }

    /// Report each change as pending for `polls` status requests
    pub fn with_pending_polls(self, polls: usize) -> Self {
        self.state.lock().unwrap().pending_polls = polls;
        self
    }

    /// Changes never reach the done state
    pub fn never_completing(self) -> Self {
        self.state.lock().unwrap().never_done = true;
        self
    }

    pub fn failing_zone_listing(self) -> Self {
        self.state.lock().unwrap().fail_zone_listing = true;
        self
    }

    pub fn failing_record_listing(self, zone_key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_record_listing
            .insert(zone_key.to_string());
        self
    }

    /// Reject every batch containing additions
    pub fn failing_additions(self) -> Self {
        self.state.lock().unwrap().fail_additions = true;
        self
    }

    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }

    /// Every accepted batch, in submission order, with its zone key
    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn records(&self, zone_key: &str) -> Vec<RecordSet> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone_key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_zones_calls(&self) -> usize {
        self.state.lock().unwrap().list_zones_calls
    }

    pub fn get_change_calls(&self) -> usize {
        self.state.lock().unwrap().get_change_calls
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.list_zones_calls += 1;
        if state.fail_zone_listing {
            return Err(Error::auth("permission denied listing zones"));
        }
        Ok(state.zones.clone())
    }

    async fn list_record_sets(&self, zone: &Zone) -> Result<Vec<RecordSet>> {
        let state = self.state.lock().unwrap();
        if state.fail_record_listing.contains(&zone.key) {
            return Err(Error::provider("mock", format!("cannot list {}", zone.key)));
        }
        state
            .records
            .get(&zone.key)
            .cloned()
            .ok_or_else(|| Error::not_found(zone.key.clone()))
    }

    async fn submit_change(&self, zone: &Zone, batch: &ChangeBatch) -> Result<Change> {
        let mut state = self.state.lock().unwrap();

        if state.fail_additions && !batch.additions.is_empty() {
            return Err(Error::provider("mock", "additions rejected"));
        }
        if batch.is_empty() {
            return Err(Error::invalid_input("empty change batch"));
        }

        let records = state
            .records
            .get(&zone.key)
            .cloned()
            .ok_or_else(|| Error::not_found(zone.key.clone()))?;

        let mut updated = records;
        for deletion in &batch.deletions {
            let position = updated
                .iter()
                .position(|rs| rs == deletion)
                .ok_or_else(|| Error::provider("mock", format!("deletion does not match: {:?}", deletion)))?;
            updated.remove(position);
        }
        for addition in &batch.additions {
            if updated.iter().any(|rs| rs.key() == addition.key()) {
                return Err(Error::provider("mock", format!("already exists: {}", addition.key())));
            }
            updated.push(addition.clone());
        }

        state.records.insert(zone.key.clone(), updated);
        state.submitted.push((zone.key.clone(), batch.clone()));
        state.next_change_id += 1;
        let id = state.next_change_id.to_string();

        let pending = state.never_done || state.pending_polls > 0;
        let polls = state.pending_polls;
        state.polls_remaining.insert(id.clone(), polls);

        Ok(Change {
            id,
            status: if pending { ChangeStatus::Pending } else { ChangeStatus::Done },
            additions: batch.additions.len(),
            deletions: batch.deletions.len(),
        })
    }

    async fn get_change(&self, _zone: &Zone, change_id: &str) -> Result<Change> {
        let mut state = self.state.lock().unwrap();
        state.get_change_calls += 1;
        let never_done = state.never_done;

        let index: usize = change_id
            .parse()
            .map_err(|_| Error::not_found(change_id.to_string()))?;
        let (_, batch) = state
            .submitted
            .get(index - 1)
            .cloned()
            .ok_or_else(|| Error::not_found(change_id.to_string()))?;

        let remaining = state
            .polls_remaining
            .get_mut(change_id)
            .ok_or_else(|| Error::not_found(change_id.to_string()))?;
        *remaining = remaining.saturating_sub(1);
        let done = !never_done && *remaining == 0;

        Ok(Change {
            id: change_id.to_string(),
            status: if done { ChangeStatus::Done } else { ChangeStatus::Pending },
            additions: batch.additions.len(),
            deletions: batch.deletions.len(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A single-valued record set
pub fn record(name: &str, record_type: RecordType, ttl: u32, value: &str) -> RecordSet {
    RecordSet::new(name, record_type, ttl, vec![value.to_string()])
}

pub fn request(host: &str, record_type: RecordType) -> DnsRequest {
    DnsRequest::new(host, record_type).expect("valid request")
}

/// Engine settings with fast polling for tests
pub fn fast_engine_config() -> EngineConfig {
    EngineConfig {
        poll_interval_ms: 1,
        apply_timeout_secs: 5,
        ..EngineConfig::default()
    }
}
