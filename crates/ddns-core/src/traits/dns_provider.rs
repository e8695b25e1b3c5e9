// # DNS Provider Trait
//
// Defines the interface to a DNS provider's zone API.
//
// ## Implementations
//
// - Google Cloud DNS: `ddns-provider-gcloud` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{ChangeBatch, DnsProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for zone in provider.list_zones().await? {
//         let record_sets = provider.list_record_sets(&zone).await?;
//         println!("{}: {} record sets", zone.dns_name, record_sets.len());
//     }
//
//     Ok(())
// }
// ```

use crate::record::RecordSet;
use crate::zone::Zone;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider-reported status of a submitted change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// Accepted but not yet propagated
    Pending,
    /// Terminal: the change is live
    Done,
}

/// A submitted change batch as tracked by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Provider-assigned change identifier
    pub id: String,
    pub status: ChangeStatus,
    /// Number of record sets added by this change
    pub additions: usize,
    /// Number of record sets deleted by this change
    pub deletions: usize,
}

/// A batch of record-set additions and deletions applied atomically by the
/// provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub additions: Vec<RecordSet>,
    pub deletions: Vec<RecordSet>,
}

impl ChangeBatch {
    pub fn additions(additions: Vec<RecordSet>) -> Self {
        Self {
            additions,
            deletions: Vec::new(),
        }
    }

    pub fn deletions(deletions: Vec<RecordSet>) -> Self {
        Self {
            additions: Vec::new(),
            deletions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Trait for DNS provider implementations
///
/// This trait is a thin adapter over a provider's zone API. It translates
/// between the plain [`Zone`]/[`RecordSet`] values used by the reconciler and
/// the provider's native objects, and nothing more.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Authenticate and cache their own access token
/// - ✅ Parse provider-specific responses
///
/// ## Forbidden Capabilities
/// - ❌ Decide which records to change (owned by the reconciler)
/// - ❌ Wait for change completion (owned by `ChangeApplier`)
/// - ❌ Retry failed calls (errors are reported to the engine)
/// - ❌ Spawn tasks or threads
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every zone the credentials can see
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List the record sets currently published in `zone`
    ///
    /// Record sets of types this system does not manage may be omitted.
    async fn list_record_sets(&self, zone: &Zone) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a change batch to `zone`
    ///
    /// Returns as soon as the provider has accepted the batch; the returned
    /// change may still be [`ChangeStatus::Pending`].
    async fn submit_change(&self, zone: &Zone, batch: &ChangeBatch)
    -> Result<Change, crate::Error>;

    /// Fetch the current state of a previously submitted change
    async fn get_change(&self, zone: &Zone, change_id: &str) -> Result<Change, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
