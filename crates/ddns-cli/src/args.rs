//! Command-line argument parsing

use std::path::PathBuf;

use clap::Parser;
use ddns_core::config::{DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, DEFAULT_TTL};
use ddns_core::{DnsRequest, EngineConfig, IpSourceConfig, RecordType, RunConfig};
use tracing::{Level, warn};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Point A and AAAA records in Google Cloud DNS at this host's public addresses
#[derive(Debug, Parser)]
#[command(name = "gcloud-ddns", version)]
pub struct Args {
    /// Record to manage, given as a hostname and a record type
    #[arg(
        short = 'r',
        long = "record",
        num_args = 2,
        value_names = ["FQDN", "TYPE"],
        required = true
    )]
    pub records: Vec<String>,

    /// Service account credentials (JSON key file)
    #[arg(short, long, env = "DDNS_CREDENTIALS", value_name = "PATH")]
    pub credentials: PathBuf,

    /// Do not look up the IPv4 address or manage A records
    #[arg(long = "no-ipv4", env = "DDNS_NO_IPV4")]
    pub no_ipv4: bool,

    /// Do not look up the IPv6 address or manage AAAA records
    #[arg(long = "no-ipv6", env = "DDNS_NO_IPV6")]
    pub no_ipv6: bool,

    /// Proceed without asking for confirmation
    #[arg(short = 'y', long, env = "DDNS_AUTO")]
    pub auto: bool,

    /// TTL for every record created or updated (seconds)
    #[arg(long, env = "DDNS_TTL", default_value_t = DEFAULT_TTL, value_name = "SECS")]
    pub ttl: u32,

    /// Compute and print changes without submitting them
    #[arg(long, env = "DDNS_DRY_RUN")]
    pub dry_run: bool,

    /// Service returning this host's IPv4 address as plain text
    #[arg(long, env = "DDNS_IPV4_URL", default_value = DEFAULT_IPV4_URL, value_name = "URL")]
    pub ipv4_url: String,

    /// Service returning this host's IPv6 address as plain text
    #[arg(long, env = "DDNS_IPV6_URL", default_value = DEFAULT_IPV6_URL, value_name = "URL")]
    pub ipv6_url: String,

    /// Delay between change status checks (milliseconds)
    #[arg(long, env = "DDNS_POLL_INTERVAL_MS", default_value_t = 1000, value_name = "MS")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a change to complete after this long (seconds)
    #[arg(long, env = "DDNS_APPLY_TIMEOUT_SECS", default_value_t = 300, value_name = "SECS")]
    pub apply_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

impl Args {
    /// The tracing level selected with `--log-level`
    pub fn log_level(&self) -> anyhow::Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "Log level '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build requests from the `--record` pairs
    ///
    /// Pairs with an unsupported record type are reported and dropped. An
    /// invalid hostname is an error.
    pub fn requests(&self) -> ddns_core::Result<Vec<DnsRequest>> {
        let mut requests = Vec::with_capacity(self.records.len() / 2);

        for pair in self.records.chunks(2) {
            let [hostname, record_type] = pair else {
                continue;
            };

            match record_type.parse::<RecordType>() {
                Ok(record_type) => requests.push(DnsRequest::new(hostname, record_type)?),
                Err(_) => warn!(
                    "Ignoring \"{}\": unsupported record type \"{}\"",
                    hostname, record_type
                ),
            }
        }

        Ok(requests)
    }

    /// Build and validate the run configuration
    pub fn run_config(&self) -> ddns_core::Result<RunConfig> {
        let mut config = RunConfig::new(self.requests()?, self.credentials.clone()).with_ttl(self.ttl);
        config.ipv4 = !self.no_ipv4;
        config.ipv6 = !self.no_ipv6;
        config.ip_source = IpSourceConfig {
            v4_url: self.ipv4_url.clone(),
            v6_url: self.ipv6_url.clone(),
        };
        config.engine = EngineConfig {
            poll_interval_ms: self.poll_interval_ms,
            apply_timeout_secs: self.apply_timeout_secs,
            dry_run: self.dry_run,
            ..EngineConfig::default()
        };

        config.normalize_records();
        config.validate()?;
        Ok(config)
    }
}
