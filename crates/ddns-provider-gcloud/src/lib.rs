// # Google Cloud DNS Provider
//
// This crate provides a Google Cloud DNS provider implementation for the DDNS system.
//
// ## Implementation Status
//
// - ✅ Service-account authentication (JWT bearer grant, token cached until near expiry)
// - ✅ Paginated zone and record-set listing
// - ✅ Change submission and change status lookup
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409/412, 429, 5xx)
// - ❌ NO retry logic (a failed zone is reported by DdnsEngine)
// - ❌ NO change polling (owned by ChangeApplier)
// - ❌ NO routing policies (such record sets are listed but marked operator-managed)
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to Google endpoints only
// - ✅ Cache its own access token
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Decide which records change (owned by the reconciler)
// - ❌ Wait for changes to complete (owned by ChangeApplier)
//
// ## Security Requirements
//
// - The private key and access tokens NEVER appear in logs
// - Credentials are read from a service-account key file only
//
// ## API Reference
//
// - Cloud DNS API v1: https://cloud.google.com/dns/docs/reference/rest/v1
// - List zones: GET `/projects/:project/managedZones`
// - List record sets: GET `/projects/:project/managedZones/:zone/rrsets`
// - Create change: POST `/projects/:project/managedZones/:zone/changes`
// - Get change: GET `/projects/:project/managedZones/:zone/changes/:id`

mod api;
mod auth;

pub use auth::{CLOUD_DNS_SCOPE, ServiceAccountKey, TokenSource};

use api::{
    ChangeRequest, ChangeResponse, ManagedZonesListResponse, RrsetsListResponse, collect_pages,
};
use async_trait::async_trait;
use ddns_core::{Change, ChangeBatch, DnsProvider, Error, RecordSet, Result, Zone};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

/// Cloud DNS API base URL
const CLOUD_DNS_API_BASE: &str = "https://dns.googleapis.com/dns/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "gcloud";

/// Google Cloud DNS provider
///
/// # Trust Level: Untrusted
///
/// One instance serves one project: the project named in the service-account
/// key. All coordination (ordering, waiting, failure handling) is owned by
/// `DdnsEngine` and `ChangeApplier`.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose credentials.
pub struct GoogleCloudDnsProvider {
    /// Project owning the managed zones
    project_id: String,

    /// Bearer token issuer
    /// ⚠️ NEVER log tokens obtained from it
    tokens: TokenSource,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL (overridable for tests)
    api_base: String,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for GoogleCloudDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCloudDnsProvider")
            .field("project_id", &self.project_id)
            .field("client_email", &self.tokens.key().client_email)
            .field("credentials", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GoogleCloudDnsProvider {
    /// Create a provider for the project named in `key`
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project_id: key.project_id.clone(),
            tokens: TokenSource::new(key, client.clone()),
            client,
            api_base: CLOUD_DNS_API_BASE.to_string(),
        })
    }

    /// Create a provider from a service-account key file
    ///
    /// A missing or invalid file is a configuration error.
    pub fn from_service_account_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }

    /// Use a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn zones_url(&self) -> String {
        format!("{}/projects/{}/managedZones", self.api_base, self.project_id)
    }

    fn zone_url(&self, zone: &Zone, resource: &str) -> String {
        format!("{}/{}/{}", self.zones_url(), zone.key, resource)
    }

    /// GET a JSON resource, optionally continuing from a page token
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        page_token: Option<String>,
        context: &str,
    ) -> Result<T> {
        let token = self.tokens.token().await?;

        let mut request = self.client.get(url).bearer_auth(&token);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", context, e)))?;

        let response = check_status(response, context).await?;
        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("{}: failed to parse response: {}", context, e)))
    }
}

/// Map an unsuccessful response to an error
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(status_error(status.as_u16(), context, &error_text))
}

fn status_error(status: u16, context: &str, error_text: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{}: invalid credentials or insufficient permissions. Status: {} - {}",
            context, status, error_text
        )),
        404 => Error::not_found(format!("{}: {}", context, error_text)),
        409 | 412 => Error::provider(
            PROVIDER_NAME,
            format!(
                "{}: conflicting change, the zone was modified concurrently. Status: {} - {}",
                context, status, error_text
            ),
        ),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Please retry later. Status: {}",
            context, status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: Cloud DNS server error (transient): {} - {}", context, status, error_text),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{}: request failed: {} - {}", context, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsProvider for GoogleCloudDnsProvider {
    /// List all managed zones in the project
    ///
    /// ```http
    /// GET /projects/:project/managedZones?pageToken=...
    /// Authorization: Bearer <token>
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = self.zones_url();
        let url = url.as_str();

        let zones: Vec<Zone> = collect_pages(move |token| {
            self.get_json::<ManagedZonesListResponse>(url, token, "list managed zones")
        })
        .await?
        .into_iter()
        .map(Zone::from)
        .collect();

        tracing::debug!("Project {} has {} managed zone(s)", self.project_id, zones.len());
        Ok(zones)
    }

    /// List all record sets of managed types in a zone
    ///
    /// ```http
    /// GET /projects/:project/managedZones/:zone/rrsets?pageToken=...
    /// ```
    async fn list_record_sets(&self, zone: &Zone) -> Result<Vec<RecordSet>> {
        let url = self.zone_url(zone, "rrsets");
        let context = format!("list record sets of {}", zone.key);
        let (url, context) = (url.as_str(), context.as_str());

        let rrsets = collect_pages(move |token| {
            self.get_json::<RrsetsListResponse>(url, token, context)
        })
        .await?;

        Ok(rrsets.into_iter().filter_map(|rrset| rrset.into_record_set()).collect())
    }

    /// Submit a change batch
    ///
    /// ```http
    /// POST /projects/:project/managedZones/:zone/changes
    /// { "additions": [...], "deletions": [...] }
    /// ```
    async fn submit_change(&self, zone: &Zone, batch: &ChangeBatch) -> Result<Change> {
        let context = format!("submit change to {}", zone.key);
        let token = self.tokens.token().await?;

        let response = self
            .client
            .post(self.zone_url(zone, "changes"))
            .bearer_auth(&token)
            .json(&ChangeRequest::from(batch))
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", context, e)))?;

        let response = check_status(response, &context).await?;
        let change: ChangeResponse = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("{}: failed to parse response: {}", context, e))
        })?;

        Change::try_from(change)
    }

    /// Fetch a change by id
    ///
    /// ```http
    /// GET /projects/:project/managedZones/:zone/changes/:id
    /// ```
    async fn get_change(&self, zone: &Zone, change_id: &str) -> Result<Change> {
        let url = self.zone_url(zone, &format!("changes/{}", change_id));
        let context = format!("get change {} of {}", change_id, zone.key);

        let change: ChangeResponse = self.get_json(&url, None, &context).await?;
        Change::try_from(change)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_key.pem");

    fn key() -> ServiceAccountKey {
        ServiceAccountKey::from_json(
            &serde_json::json!({
                "type": "service_account",
                "project_id": "ddns-test",
                "private_key_id": "abc123",
                "private_key": TEST_PRIVATE_KEY,
                "client_email": "ddns@ddns-test.iam.gserviceaccount.com",
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_provider_name() {
        let provider = GoogleCloudDnsProvider::new(key()).unwrap();
        assert_eq!(provider.provider_name(), "gcloud");
        assert_eq!(provider.project_id(), "ddns-test");
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let provider = GoogleCloudDnsProvider::new(key()).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("PRIVATE KEY"));
        assert!(debug_str.contains("GoogleCloudDnsProvider"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn urls_use_project_and_zone_key() {
        let provider = GoogleCloudDnsProvider::new(key())
            .unwrap()
            .with_api_base("http://127.0.0.1:8080/dns/v1/");
        let zone = Zone::new("example-com", "example.com.");

        assert_eq!(
            provider.zone_url(&zone, "rrsets"),
            "http://127.0.0.1:8080/dns/v1/projects/ddns-test/managedZones/example-com/rrsets"
        );
    }

    #[test]
    fn from_service_account_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            serde_json::json!({
                "type": "service_account",
                "project_id": "from-file",
                "private_key": TEST_PRIVATE_KEY,
                "client_email": "ddns@from-file.iam.gserviceaccount.com",
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

        let provider = GoogleCloudDnsProvider::from_service_account_file(file.path()).unwrap();
        assert_eq!(provider.project_id(), "from-file");
    }

    #[test]
    fn missing_credentials_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GoogleCloudDnsProvider::from_service_account_file(dir.path().join("missing.json"))
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(status_error(401, "x", ""), Error::Authentication(_)));
        assert!(matches!(status_error(403, "x", ""), Error::Authentication(_)));
        assert!(matches!(status_error(404, "x", ""), Error::NotFound(_)));
        assert!(matches!(status_error(429, "x", ""), Error::RateLimited(_)));
        assert!(matches!(status_error(409, "x", ""), Error::Provider { .. }));
        assert!(matches!(status_error(503, "x", ""), Error::Provider { .. }));

        let err = status_error(412, "submit change to example-com", "precondition");
        assert!(err.to_string().contains("submit change to example-com"));
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_auth_error() {
        let mut key = key();
        key.token_uri = "http://127.0.0.1:9/token".to_string();
        let provider = GoogleCloudDnsProvider::new(key).unwrap();

        let err = provider.list_zones().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }
}
