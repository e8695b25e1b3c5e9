// # gcloud-ddns
//
// Points A and AAAA records hosted in Google Cloud DNS at the public
// addresses of the machine it runs on.
//
// This binary is a THIN integration layer:
// 1. Parsing arguments (every option also reads a `DDNS_*` environment variable)
// 2. Asking for confirmation before contacting external hosts
// 3. Wiring the HTTP address sources and the Cloud DNS provider
// 4. Running the engine once and printing what it did
//
// All DNS logic lives in ddns-core.
//
// ## Example
//
// ```bash
// gcloud-ddns \
//     --record home.example.com A \
//     --record home.example.com AAAA \
//     --credentials /etc/ddns/service-account.json \
//     --auto
// ```

mod args;

use anyhow::{Context, Result};
use ddns_core::{
    DdnsEngine, EngineEvent, IpSource, ResolvedAddresses, RunConfig, RunSummary, resolve_addresses,
};
use ddns_ip_http::HttpIpSource;
use ddns_provider_gcloud::GoogleCloudDnsProvider;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Completed, or the operator declined to proceed
/// - 1: Configuration error (including missing credentials)
/// - 2: Runtime error (provider failure, one or more zones failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean completion
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = args::parse();

    let log_level = match args.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match args.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    print_records(&config);

    if !args.auto {
        match confirm(&config) {
            Ok(true) => {}
            Ok(false) => {
                println!("\nNo changes have been made");
                return DdnsExitCode::Success.into();
            }
            Err(e) => {
                error!("Failed to read confirmation: {}", e);
                return DdnsExitCode::RuntimeError.into();
            }
        }
    }

    if let Err(code) = check_credentials(&config) {
        return code.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(&config).await {
            Ok(summary) => {
                print_summary(&summary, config.engine.dry_run);
                if summary.has_failures() {
                    DdnsExitCode::RuntimeError
                } else {
                    DdnsExitCode::Success
                }
            }
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    })
    .into()
}

/// Fail with a configuration error when the credentials file is missing
fn check_credentials(config: &RunConfig) -> Result<(), DdnsExitCode> {
    if config.credentials_path.exists() {
        return Ok(());
    }

    eprintln!(
        "\nThe location given for the service account credentials file was not found: {}",
        config.credentials_path.display()
    );
    Err(DdnsExitCode::ConfigError)
}

fn exit_code_for(err: &anyhow::Error) -> DdnsExitCode {
    match err.downcast_ref::<ddns_core::Error>() {
        Some(e) if e.is_config() => DdnsExitCode::ConfigError,
        _ => DdnsExitCode::RuntimeError,
    }
}

fn print_records(config: &RunConfig) {
    println!("Got {} record(s) to process:", config.records.len());
    for request in &config.records {
        println!("- {}", request);
    }
    println!("\nUsing a TTL of {} seconds for all records being processed.", config.ttl);
}

/// Ask the operator whether to contact the address lookup services
fn confirm(config: &RunConfig) -> io::Result<bool> {
    let mut hosts = Vec::new();
    if config.ipv4 {
        hosts.push(config.ip_source.v4_url.as_str());
    }
    if config.ipv6 {
        hosts.push(config.ip_source.v6_url.as_str());
    }

    if !hosts.is_empty() {
        println!("\nI will be reaching out to external hosts to retrieve IP information. These hosts are:");
        for host in hosts {
            println!("- {}", host);
        }
    }

    print!("\nDo you want to proceed? y/n: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Resolve addresses, then run the engine once against Cloud DNS
async fn run(config: &RunConfig) -> Result<RunSummary> {
    let provider = GoogleCloudDnsProvider::from_service_account_file(&config.credentials_path)
        .context("Failed to load service account credentials")?;
    info!("Using Cloud DNS project {}", provider.project_id());

    let addresses = lookup_addresses(config).await?;

    let (engine, mut events) =
        DdnsEngine::new(Box::new(provider), config.ttl, config.engine.clone())?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let result = engine.run(&config.records, &addresses).await;

    // Closes the event channel so the printer drains and exits
    drop(engine);
    if let Err(e) = printer.await {
        warn!("Event printer stopped unexpectedly: {}", e);
    }

    Ok(result?)
}

async fn lookup_addresses(config: &RunConfig) -> Result<ResolvedAddresses> {
    let v4 = if config.ipv4 {
        Some(HttpIpSource::ipv4(&config.ip_source).context("Failed to set up IPv4 lookup")?)
    } else {
        None
    };
    let v6 = if config.ipv6 {
        Some(HttpIpSource::ipv6(&config.ip_source).context("Failed to set up IPv6 lookup")?)
    } else {
        None
    };

    println!("\nRetrieving external addresses now...");
    let addresses = resolve_addresses(
        v4.as_ref().map(|s| s as &dyn IpSource),
        v6.as_ref().map(|s| s as &dyn IpSource),
    )
    .await;

    if let Some(ip) = addresses.v4 {
        println!("Received '{}' as IPv4 address.", ip);
    }
    if let Some(ip) = addresses.v6 {
        println!("Received '{}' as IPv6 address.", ip);
    }
    if addresses.is_empty() {
        warn!("No public address was obtained; A and AAAA records will be left alone");
    }
    println!();

    Ok(addresses)
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::Unmatched { hostname } => {
            println!("No zone found for {}, it will be discarded", hostname);
        }
        EngineEvent::ZoneStarted { dns_name, .. } => {
            println!("Currently gathering records for {}", dns_name);
        }
        EngineEvent::ZoneFailed { zone, error } => {
            eprintln!("Zone {} failed: {}", zone, error);
        }
        other => debug!("Engine event: {:?}", other),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    for report in &summary.zones {
        let changed = report.counts.created + report.counts.updated;

        if let Some(applied) = report.applied {
            println!(
                "{}: created {} record{} ({} new, {} updated).",
                report.dns_name,
                applied.created,
                plural(applied.created),
                report.counts.created,
                report.counts.updated
            );
        } else if changed > 0 && dry_run {
            println!(
                "{}: [DRY-RUN] {} record{} would be created or updated.",
                report.dns_name,
                changed,
                plural(changed)
            );
        } else {
            println!(
                "All given records for {} are up to date. Not performing any actions on this zone.",
                report.dns_name
            );
        }

        for decision in &report.decisions {
            debug!("  {} -> {}", decision.key, decision.outcome);
        }
    }

    let counts = summary.counts;
    println!(
        "\nDone: {} created, {} updated, {} unchanged, {} protected, {} skipped; {} zone{} failed.",
        counts.created,
        counts.updated,
        counts.unchanged,
        counts.protected,
        counts.skipped,
        summary.failures.len(),
        plural(summary.failures.len())
    );
}
