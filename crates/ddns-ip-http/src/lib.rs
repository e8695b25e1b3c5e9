// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS system.
//
// ## Architecture
//
// Fetches the caller's public address from a plain-text echo service
// (e.g. icanhazip.com) whose entire response body is the address. One
// source is configured per address family; the family is enforced on the
// returned address.
//
// A blank body means the service had no address for us (typically no IPv6
// connectivity) and is reported as `Ok(None)`, not as an error.

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::{IpSource, IpVersion};
use ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// Address family this source reports
    version: IpVersion,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "https://ipv4.icanhazip.com")
    /// - `version`: Address family the URL reports
    pub fn new(url: impl Into<String>, version: IpVersion) -> Result<Self> {
        Self::with_timeout(url, version, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, version: IpVersion, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            version,
            client,
        })
    }

    /// Build the IPv4 source from configuration
    pub fn ipv4(config: &IpSourceConfig) -> Result<Self> {
        Self::new(config.v4_url.clone(), IpVersion::V4)
    }

    /// Build the IPv6 source from configuration
    pub fn ipv6(config: &IpSourceConfig) -> Result<Self> {
        Self::new(config.v6_url.clone(), IpVersion::V6)
    }
}

/// Interpret an echo-service response body
fn parse_body(body: &str, version: IpVersion) -> Result<Option<IpAddr>> {
    let text = body.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {}", text)))?;

    if !version.matches(&ip) {
        return Err(Error::ip_source(format!("Expected {}, got: {}", version, ip)));
    }

    Ok(Some(ip))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Option<IpAddr>> {
        tracing::debug!("Fetching {} address from {}", self.version, self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        parse_body(&body, self.version)
    }

    fn version(&self) -> IpVersion {
        self.version
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_body() {
        let ip = parse_body("192.0.2.44\n", IpVersion::V4).unwrap();
        assert_eq!(ip, Some("192.0.2.44".parse().unwrap()));

        let ip = parse_body("  2001:db8::44\r\n", IpVersion::V6).unwrap();
        assert_eq!(ip, Some("2001:db8::44".parse().unwrap()));
    }

    #[test]
    fn blank_body_is_no_address() {
        assert_eq!(parse_body("", IpVersion::V4).unwrap(), None);
        assert_eq!(parse_body("\n", IpVersion::V6).unwrap(), None);
    }

    #[test]
    fn garbage_and_wrong_family_rejected() {
        assert!(parse_body("<html>rate limited</html>", IpVersion::V4).is_err());
        assert!(parse_body("2001:db8::44", IpVersion::V4).is_err());
        assert!(parse_body("192.0.2.44", IpVersion::V6).is_err());
    }

    #[test]
    fn sources_from_config() {
        let config = IpSourceConfig::default();

        let v4 = HttpIpSource::ipv4(&config).unwrap();
        assert_eq!(v4.version(), IpVersion::V4);
        assert_eq!(v4.endpoint(), config.v4_url);

        let v6 = HttpIpSource::ipv6(&config).unwrap();
        assert_eq!(v6.version(), IpVersion::V6);
    }

    #[test]
    fn non_http_url_rejected() {
        assert!(HttpIpSource::new("ftp://example.com", IpVersion::V4).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let source = HttpIpSource::with_timeout(
            "http://127.0.0.1:9/",
            IpVersion::V4,
            Duration::from_millis(500),
        )
        .unwrap();

        assert!(source.current().await.is_err());
    }
}
