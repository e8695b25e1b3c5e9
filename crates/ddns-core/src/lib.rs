// # ddns-core
//
// Core library for reconciling dynamic DNS records against managed zones.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for looking up the caller's current public address
// - **DnsProvider**: Trait for listing zones and submitting change batches
// - **ZoneIndex / route_requests**: Find the zone authoritative for each request
// - **reconcile**: Pure diff of requested state against a zone's record sets
// - **ChangeApplier**: Two-phase (delete, then create) application of a plan
// - **DdnsEngine**: Orchestrates one complete run across all zones
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and lookup implementations
// 2. **Pure Core**: Reconciliation performs no I/O and is tested in isolation
// 3. **Stateless**: Every run re-reads zones and record sets from the provider
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A converged zone produces an empty plan

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod record;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use address::{ResolvedAddresses, resolve_addresses};
pub use config::{EngineConfig, IpSourceConfig, RunConfig};
pub use engine::{ApplyReport, ChangeApplier, DdnsEngine, EngineEvent, RunSummary, ZoneReport};
pub use error::{Error, Result};
pub use reconcile::{Outcome, PlanCounts, ReconciliationPlan, SkipReason, reconcile};
pub use record::{DnsRequest, RecordKey, RecordSet, RecordType};
pub use traits::{Change, ChangeBatch, ChangeStatus, DnsProvider, IpSource, IpVersion};
pub use zone::{RoutedRequests, Zone, ZoneIndex, route_requests};
