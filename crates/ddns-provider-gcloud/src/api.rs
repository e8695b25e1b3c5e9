//! Cloud DNS v1 wire types
//!
//! Only the fields this provider reads or writes are modelled; everything
//! else in the responses is ignored.

use ddns_core::{Change, ChangeBatch, ChangeStatus, Error, RecordSet, RecordType, Result, Zone};
use serde::{Deserialize, Serialize};

/// One page of a list response
pub(crate) trait Page {
    type Item;

    /// Split into the page's items and the token of the next page
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

/// Fetch pages until the next page token is absent or empty
///
/// `fetch` receives `None` for the first page and the previous page's
/// token afterwards. The first error ends the listing.
pub(crate) async fn collect_pages<P, F, Fut>(mut fetch: F) -> Result<Vec<P::Item>>
where
    P: Page,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<P>>,
{
    let mut items = Vec::new();
    let mut page_token = None;

    loop {
        let (page_items, next_page_token) = fetch(page_token.take()).await?.into_parts();
        items.extend(page_items);

        match next_page_token {
            Some(next) if !next.is_empty() => page_token = Some(next),
            _ => break,
        }
    }

    Ok(items)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ManagedZone {
    pub name: String,
    pub dns_name: String,
}

impl From<ManagedZone> for Zone {
    fn from(zone: ManagedZone) -> Self {
        Zone::new(zone.name, &zone.dns_name)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ManagedZonesListResponse {
    #[serde(default)]
    pub managed_zones: Vec<ManagedZone>,
    pub next_page_token: Option<String>,
}

impl Page for ManagedZonesListResponse {
    type Item = ManagedZone;

    fn into_parts(self) -> (Vec<ManagedZone>, Option<String>) {
        (self.managed_zones, self.next_page_token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceRecordSet {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub rrdatas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<serde_json::Value>,
}

impl ResourceRecordSet {
    /// Convert to a plain record set
    ///
    /// Returns `None` for types that are never managed. Sets that carry a
    /// routing policy are kept but marked, so they are never reconciled.
    pub fn into_record_set(self) -> Option<RecordSet> {
        let record_type: RecordType = self.record_type.parse().ok()?;
        let record_set = RecordSet::new(&self.name, record_type, self.ttl, self.rrdatas);

        if self.routing_policy.is_some() {
            tracing::debug!(
                "{} {} uses a routing policy and will be left alone",
                self.name,
                self.record_type
            );
            return Some(record_set.with_routing_policy());
        }

        Some(record_set)
    }
}

impl From<&RecordSet> for ResourceRecordSet {
    fn from(rs: &RecordSet) -> Self {
        Self {
            name: rs.name.clone(),
            record_type: rs.record_type.as_str().to_string(),
            ttl: rs.ttl,
            rrdatas: rs.values.clone(),
            routing_policy: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RrsetsListResponse {
    #[serde(default)]
    pub rrsets: Vec<ResourceRecordSet>,
    pub next_page_token: Option<String>,
}

impl Page for RrsetsListResponse {
    type Item = ResourceRecordSet;

    fn into_parts(self) -> (Vec<ResourceRecordSet>, Option<String>) {
        (self.rrsets, self.next_page_token)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangeRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<ResourceRecordSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<ResourceRecordSet>,
}

impl From<&ChangeBatch> for ChangeRequest {
    fn from(batch: &ChangeBatch) -> Self {
        Self {
            additions: batch.additions.iter().map(ResourceRecordSet::from).collect(),
            deletions: batch.deletions.iter().map(ResourceRecordSet::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangeResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub additions: Vec<ResourceRecordSet>,
    #[serde(default)]
    pub deletions: Vec<ResourceRecordSet>,
}

impl TryFrom<ChangeResponse> for Change {
    type Error = Error;

    fn try_from(response: ChangeResponse) -> Result<Self> {
        let status = match response.status.as_str() {
            "pending" => ChangeStatus::Pending,
            "done" => ChangeStatus::Done,
            other => {
                return Err(Error::provider(
                    "gcloud",
                    format!("Change {} has unknown status '{}'", response.id, other),
                ));
            }
        };

        Ok(Change {
            id: response.id,
            status,
            additions: response.additions.len(),
            deletions: response.deletions.len(),
        })
    }
}
