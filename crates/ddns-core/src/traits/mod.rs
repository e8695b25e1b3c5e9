//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Look up the current public address
//! - [`DnsProvider`]: List zones and record sets, submit change batches

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, IpVersion};
pub use dns_provider::{Change, ChangeBatch, ChangeStatus, DnsProvider};
