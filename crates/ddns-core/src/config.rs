//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is built once by the caller and passed explicitly to every
//! component that needs it.

use crate::record::DnsRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default TTL applied to every managed record (seconds)
pub const DEFAULT_TTL: u32 = 300;

/// Largest TTL accepted by providers (seconds)
pub const MAX_TTL: u32 = i32::MAX as u32;

/// Default IPv4 echo service
pub const DEFAULT_IPV4_URL: &str = "https://ipv4.icanhazip.com";

/// Default IPv6 echo service
pub const DEFAULT_IPV6_URL: &str = "https://ipv6.icanhazip.com";

/// Configuration for a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Records to manage
    pub records: Vec<DnsRequest>,

    /// Path to the provider credentials file
    pub credentials_path: PathBuf,

    /// Whether IPv4 addresses are looked up and A records managed
    #[serde(default = "default_enabled")]
    pub ipv4: bool,

    /// Whether IPv6 addresses are looked up and AAAA records managed
    #[serde(default = "default_enabled")]
    pub ipv6: bool,

    /// TTL applied to every record created or updated
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Address lookup endpoints
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RunConfig {
    /// Create a configuration with defaults for everything but the inputs
    pub fn new(records: Vec<DnsRequest>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            records,
            credentials_path: credentials_path.into(),
            ipv4: true,
            ipv6: true,
            ttl: DEFAULT_TTL,
            ip_source: IpSourceConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sort and de-duplicate the requested records
    pub fn normalize_records(&mut self) {
        self.records.sort();
        self.records.dedup();
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        if self.credentials_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Credentials path cannot be empty"));
        }

        if self.ttl == 0 || self.ttl > MAX_TTL {
            return Err(crate::Error::config(format!(
                "TTL must be between 1 and {} seconds. Got: {}",
                MAX_TTL, self.ttl
            )));
        }

        if self.ipv4 {
            self.ip_source.validate_url(&self.ip_source.v4_url)?;
        }
        if self.ipv6 {
            self.ip_source.validate_url(&self.ip_source.v6_url)?;
        }

        self.engine.validate()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// Address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning the caller's IPv4 address as plain text
    pub v4_url: String,
    /// URL returning the caller's IPv6 address as plain text
    pub v6_url: String,
}

impl IpSourceConfig {
    fn validate_url(&self, url: &str) -> Result<(), crate::Error> {
        if url.is_empty() {
            return Err(crate::Error::config("Address lookup URL cannot be empty"));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Address lookup URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            v4_url: DEFAULT_IPV4_URL.to_string(),
            v6_url: DEFAULT_IPV6_URL.to_string(),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between change status polls (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on waiting for one change batch to complete (seconds)
    #[serde(default = "default_apply_timeout_secs")]
    pub apply_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When the channel is full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Compute plans without submitting any change
    #[serde(default)]
    pub dry_run: bool,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_secs(self.apply_timeout_secs)
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.apply_timeout_secs == 0 {
            return Err(crate::Error::config("Apply timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_apply_timeout_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            apply_timeout_secs: default_apply_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            dry_run: false,
        }
    }
}
