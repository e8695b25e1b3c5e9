//! Two-phase change application
//!
//! A plan is applied to a zone as two provider change batches: all deletions
//! first, then all creations. An update deletes and recreates a record set
//! under the same name, so the two halves are never combined in one batch.
//! Each batch is polled until the provider reports it done, bounded by a
//! timeout.

use crate::error::{Error, Result};
use crate::reconcile::ReconciliationPlan;
use crate::traits::{Change, ChangeBatch, ChangeStatus, DnsProvider};
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// What was applied to a zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Record sets removed by the deletion batch
    pub deleted: usize,
    /// Record sets added by the creation batch
    pub created: usize,
}

/// Submits plans to a provider and waits for them to complete
pub struct ChangeApplier<'a> {
    provider: &'a dyn DnsProvider,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a> ChangeApplier<'a> {
    /// Create an applier
    ///
    /// # Parameters
    ///
    /// - `poll_interval`: Delay between change status polls
    /// - `timeout`: Upper bound on waiting for a single batch
    pub fn new(provider: &'a dyn DnsProvider, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            provider,
            poll_interval,
            timeout,
        }
    }

    /// Apply a plan to `zone`
    ///
    /// Empty halves of the plan are not submitted. If the creation batch
    /// fails after deletions completed, the error says so: those record sets
    /// are gone from the zone until the next successful run.
    pub async fn apply(&self, zone: &Zone, plan: &ReconciliationPlan) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        if !plan.to_delete.is_empty() {
            let change = self
                .submit_and_wait(zone, ChangeBatch::deletions(plan.deletions()))
                .await?;
            report.deleted = change.deletions;
        }

        if !plan.to_create.is_empty() {
            let change = self
                .submit_and_wait(zone, ChangeBatch::additions(plan.creations()))
                .await
                .map_err(|e| {
                    if report.deleted > 0 {
                        Error::dns_provider(format!(
                            "zone {}: {} record set(s) were deleted but not recreated: {}",
                            zone.dns_name, report.deleted, e
                        ))
                    } else {
                        e
                    }
                })?;
            report.created = change.additions;
        }

        Ok(report)
    }

    async fn submit_and_wait(&self, zone: &Zone, batch: ChangeBatch) -> Result<Change> {
        debug!(
            "Submitting change to {}: {} addition(s), {} deletion(s)",
            zone.dns_name,
            batch.additions.len(),
            batch.deletions.len()
        );

        let change = self.provider.submit_change(zone, &batch).await?;
        info!("Change {} submitted to {} ({:?})", change.id, zone.dns_name, change.status);

        self.wait_for_change(zone, change).await
    }

    /// Poll until the change is done or the timeout elapses
    async fn wait_for_change(&self, zone: &Zone, change: Change) -> Result<Change> {
        let id = change.id.clone();

        let poll = async {
            let mut change = change;
            while change.status != ChangeStatus::Done {
                tokio::time::sleep(self.poll_interval).await;
                change = self.provider.get_change(zone, &id).await?;
                debug!("Change {} in {} is {:?}", id, zone.dns_name, change.status);
            }
            Ok::<_, Error>(change)
        };

        tokio::time::timeout(self.timeout, poll).await.map_err(|_| {
            Error::timeout(format!(
                "change {} in zone {} not done after {:?}",
                id, zone.dns_name, self.timeout
            ))
        })?
    }
}
