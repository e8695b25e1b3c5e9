//! Core DDNS engine
//!
//! The DdnsEngine is responsible for one complete run:
//! - Enumerating the zones visible to the provider credentials
//! - Routing requests to their authoritative zones
//! - Reconciling each zone against the observed addresses
//! - Applying the resulting plans through the [`ChangeApplier`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   zones    ┌─────────────┐  requests  ┌──────────────┐
//! │ DnsProvider │──────────▶│  ZoneIndex  │──────────▶│ route_requests│
//! └─────────────┘            └─────────────┘            └──────────────┘
//!        ▲                                                      │ per zone
//!        │ change batches                                       ▼
//! ┌──────────────┐              plan               ┌──────────────┐
//! │ChangeApplier │◀───────────────────────────────│  reconcile   │
//! └──────────────┘                                 └──────────────┘
//! ```
//!
//! ## Zone Flow
//!
//! Zones are processed one at a time. A zone whose record listing or apply
//! fails is recorded in the [`RunSummary`] and the run continues with the
//! next zone.

mod apply;

pub use apply::{ApplyReport, ChangeApplier};

use crate::address::ResolvedAddresses;
use crate::config::{EngineConfig, MAX_TTL};
use crate::error::{Error, Result};
use crate::reconcile::{Decision, PlanCounts, reconcile};
use crate::record::DnsRequest;
use crate::traits::DnsProvider;
use crate::zone::{Zone, ZoneIndex, route_requests};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run started
    Started { requests_count: usize },

    /// Zones enumerated
    ZonesListed { zones_count: usize },

    /// No visible zone is authoritative for this hostname
    Unmatched { hostname: String },

    /// Gathering records for a zone
    ZoneStarted { zone: String, dns_name: String },

    /// Plan computed for a zone
    PlanComputed {
        zone: String,
        counts: PlanCounts,
        dry_run: bool,
    },

    /// Plan applied to a zone
    ZoneApplied { zone: String, report: ApplyReport },

    /// Zone already in the desired state
    ZoneUpToDate { zone: String },

    /// Zone processing failed
    ZoneFailed { zone: String, error: String },

    /// Run finished
    Finished { counts: PlanCounts, failed_zones: usize },
}

/// Result of processing one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneReport {
    pub zone: String,
    pub dns_name: String,
    pub counts: PlanCounts,
    pub decisions: Vec<Decision>,
    /// `None` when nothing was submitted (no-op plan or dry run)
    pub applied: Option<ApplyReport>,
}

/// A zone that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneFailure {
    pub zone: String,
    pub dns_name: String,
    pub error: String,
}

/// Outcome of a complete run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub zones: Vec<ZoneReport>,
    pub failures: Vec<ZoneFailure>,
    /// Hostnames no zone was found for
    pub unmatched: Vec<String>,
    /// Counts across all successfully planned zones
    pub counts: PlanCounts,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Resolve addresses (see [`crate::resolve_addresses`])
/// 3. Call [`DdnsEngine::run()`] once
///
/// Nothing is cached between runs; every run reads zones and record sets
/// fresh from the provider.
pub struct DdnsEngine {
    /// DNS provider for zone access
    provider: Box<dyn DnsProvider>,

    /// TTL applied to created and updated records
    ttl: u32,

    /// Engine settings
    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ttl: u32,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;
        if ttl == 0 || ttl > MAX_TTL {
            return Err(Error::config(format!("Invalid TTL: {}", ttl)));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            provider,
            ttl,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one reconciliation pass over every zone
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: The run completed; individual zones may have failed
    /// - `Err(Error)`: Zones could not be listed, nothing was changed
    pub async fn run(
        &self,
        requests: &[DnsRequest],
        addresses: &ResolvedAddresses,
    ) -> Result<RunSummary> {
        self.emit_event(EngineEvent::Started {
            requests_count: requests.len(),
        });

        let zones = self.provider.list_zones().await.map_err(|e| {
            error!("Failed to list zones from {}: {}", self.provider.provider_name(), e);
            e
        })?;
        let index = ZoneIndex::new(zones);
        info!("Found {} zone(s)", index.len());
        self.emit_event(EngineEvent::ZonesListed {
            zones_count: index.len(),
        });

        let routed = route_requests(&index, requests);
        let mut summary = RunSummary::default();

        for hostname in routed.unmatched.keys() {
            warn!("No zone found for {}, discarding it", hostname);
            self.emit_event(EngineEvent::Unmatched {
                hostname: hostname.clone(),
            });
            summary.unmatched.push(hostname.clone());
        }

        for (zone_key, zone_requests) in &routed.zones_to_edit {
            let Some(zone) = index.get(zone_key) else {
                continue;
            };

            match self.process_zone(zone, zone_requests, addresses).await {
                Ok(report) => {
                    summary.counts.merge(&report.counts);
                    summary.zones.push(report);
                }
                Err(e) => {
                    error!("Zone {} failed: {}", zone.dns_name, e);
                    self.emit_event(EngineEvent::ZoneFailed {
                        zone: zone.key.clone(),
                        error: e.to_string(),
                    });
                    summary.failures.push(ZoneFailure {
                        zone: zone.key.clone(),
                        dns_name: zone.dns_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.emit_event(EngineEvent::Finished {
            counts: summary.counts,
            failed_zones: summary.failures.len(),
        });

        Ok(summary)
    }

    /// Reconcile and apply a single zone
    async fn process_zone(
        &self,
        zone: &Zone,
        requests: &[DnsRequest],
        addresses: &ResolvedAddresses,
    ) -> Result<ZoneReport> {
        info!("Gathering records for {}", zone.dns_name);
        self.emit_event(EngineEvent::ZoneStarted {
            zone: zone.key.clone(),
            dns_name: zone.dns_name.clone(),
        });

        let existing = self.provider.list_record_sets(zone).await?;
        debug!("{} has {} record set(s)", zone.dns_name, existing.len());

        let plan = reconcile(&existing, requests, addresses, self.ttl);
        info!(
            "Plan for {}: {} to delete, {} to create ({:?})",
            zone.dns_name,
            plan.to_delete.len(),
            plan.to_create.len(),
            plan.counts
        );
        self.emit_event(EngineEvent::PlanComputed {
            zone: zone.key.clone(),
            counts: plan.counts,
            dry_run: self.config.dry_run,
        });

        let applied = if plan.is_noop() {
            info!("All given records for {} are up to date", zone.dns_name);
            self.emit_event(EngineEvent::ZoneUpToDate {
                zone: zone.key.clone(),
            });
            None
        } else if self.config.dry_run {
            for rs in plan.to_delete.values() {
                info!("[DRY-RUN] Would delete {} {} {:?}", rs.name, rs.record_type, rs.values);
            }
            for rs in plan.to_create.values() {
                info!("[DRY-RUN] Would create {} {} {:?}", rs.name, rs.record_type, rs.values);
            }
            None
        } else {
            let applier = ChangeApplier::new(
                self.provider.as_ref(),
                self.config.poll_interval(),
                self.config.apply_timeout(),
            );
            let report = applier.apply(zone, &plan).await?;
            info!(
                "Applied changes to {}: {} deleted, {} created",
                zone.dns_name, report.deleted, report.created
            );
            self.emit_event(EngineEvent::ZoneApplied {
                zone: zone.key.clone(),
                report,
            });
            Some(report)
        };

        Ok(ZoneReport {
            zone: zone.key.clone(),
            dns_name: zone.dns_name.clone(),
            counts: plan.counts,
            decisions: plan.decisions,
            applied,
        })
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_event_clone() {
        let event = EngineEvent::ZoneFailed {
            zone: "example-com".to_string(),
            error: "boom".to_string(),
        };

        assert_eq!(event.clone(), event);
    }

    #[test]
    fn summary_failure_flag() {
        let mut summary = RunSummary::default();
        assert!(!summary.has_failures());

        summary.failures.push(ZoneFailure {
            zone: "example-com".to_string(),
            dns_name: "example.com.".to_string(),
            error: "permission denied".to_string(),
        });
        assert!(summary.has_failures());
    }
}
