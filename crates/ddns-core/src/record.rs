//! DNS record data model
//!
//! Plain value types shared by the router, the reconciler and the providers.
//! Names are always stored lowercase and dot-terminated so that equality,
//! hashing and suffix checks never depend on how the caller spelled them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a domain name, excluding the trailing dot (RFC 1035)
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// Record types accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Txt,
    Mx,
    Caa,
    Cname,
    Ns,
}

impl RecordType {
    /// All accepted record types, in display order
    pub const ALL: [RecordType; 7] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Txt,
        RecordType::Mx,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Ns,
    ];

    /// Wire name as used by DNS providers
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ns => "NS",
        }
    }

    /// Whether the desired value of this type comes from a resolved address
    pub fn is_address(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Aaaa)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                crate::Error::invalid_input(format!(
                    "unsupported record type '{}' (supported: A, AAAA, TXT, MX, CAA, CNAME, NS)",
                    s
                ))
            })
    }
}

/// Normalize a domain name to lowercase, dot-terminated form
pub fn normalize_fqdn(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

/// Validate a hostname
///
/// This implements basic DNS name validation per RFC 1035, relaxed to allow
/// underscores (used by service and verification records). A single trailing
/// dot is accepted.
pub fn validate_hostname(hostname: &str) -> crate::Result<()> {
    let name = hostname.strip_suffix('.').unwrap_or(hostname);

    if name.is_empty() {
        return Err(crate::Error::invalid_input("hostname cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(crate::Error::invalid_input(format!(
            "hostname too long: {} chars (max {}). Got: {}",
            name.len(),
            MAX_NAME_LEN,
            hostname
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(crate::Error::invalid_input(format!(
                "hostname has empty label: '{}'",
                hostname
            )));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(crate::Error::invalid_input(format!(
                "label too long: {} chars (max {}). Label: '{}'",
                label.len(),
                MAX_LABEL_LEN,
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::invalid_input(format!(
                "label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::invalid_input(format!(
                "label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Identity of a record set within a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Normalized, dot-terminated name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: normalize_fqdn(name),
            record_type,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)
    }
}

/// A validated request to manage one (hostname, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDnsRequest")]
pub struct DnsRequest {
    hostname: String,
    record_type: RecordType,
}

impl DnsRequest {
    /// Validate and normalize a request
    pub fn new(hostname: &str, record_type: RecordType) -> crate::Result<Self> {
        validate_hostname(hostname.trim())?;
        Ok(Self {
            hostname: normalize_fqdn(hostname),
            record_type,
        })
    }

    /// Parse a request from its two command-line values
    pub fn parse(hostname: &str, record_type: &str) -> crate::Result<Self> {
        Self::new(hostname, record_type.parse()?)
    }

    /// Dot-terminated hostname
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.hostname.clone(),
            record_type: self.record_type,
        }
    }
}

/// Unvalidated form used when deserializing
#[derive(Deserialize)]
struct RawDnsRequest {
    hostname: String,
    record_type: RecordType,
}

impl TryFrom<RawDnsRequest> for DnsRequest {
    type Error = crate::Error;

    fn try_from(raw: RawDnsRequest) -> Result<Self, Self::Error> {
        DnsRequest::new(&raw.hostname, raw.record_type)
    }
}

impl fmt::Display for DnsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" with an \"{}\" record", self.hostname, self.record_type)
    }
}

/// One authoritative record set as published by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Dot-terminated name
    pub name: String,
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record data, in provider order
    pub values: Vec<String>,
    /// Answers are chosen by a provider routing policy rather than `values`
    #[serde(default)]
    pub routing_policy: bool,
}

impl RecordSet {
    pub fn new(name: &str, record_type: RecordType, ttl: u32, values: Vec<String>) -> Self {
        Self {
            name: normalize_fqdn(name),
            record_type,
            ttl,
            values,
            routing_policy: false,
        }
    }

    /// Mark this set as served through a provider routing policy
    pub fn with_routing_policy(mut self) -> Self {
        self.routing_policy = true;
        self
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            record_type: self.record_type,
        }
    }

    /// Multi-valued and policy-routed record sets are operator-managed and
    /// never reconciled
    pub fn is_protected(&self) -> bool {
        self.routing_policy || self.values.len() > 1
    }

    /// The single value, if this set holds exactly one
    pub fn sole_value(&self) -> Option<&str> {
        match self.values.as_slice() {
            [value] => Some(value.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("Aaaa".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!("cname".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert!("SRV".parse::<RecordType>().is_err());
        assert!("".parse::<RecordType>().is_err());
    }

    #[test]
    fn record_type_serializes_as_wire_name() {
        assert_eq!(serde_json::to_string(&RecordType::Aaaa).unwrap(), "\"AAAA\"");
        assert_eq!(serde_json::to_string(&RecordType::Cname).unwrap(), "\"CNAME\"");
        let parsed: RecordType = serde_json::from_str("\"TXT\"").unwrap();
        assert_eq!(parsed, RecordType::Txt);
    }

    #[test]
    fn normalize_adds_trailing_dot_once() {
        assert_eq!(normalize_fqdn("sub.example.com"), "sub.example.com.");
        assert_eq!(normalize_fqdn("sub.example.com."), "sub.example.com.");
        assert_eq!(normalize_fqdn("Sub.Example.COM"), "sub.example.com.");
    }

    #[test]
    fn request_is_normalized() {
        let request = DnsRequest::parse("Home.Example.com", "aaaa").unwrap();
        assert_eq!(request.hostname(), "home.example.com.");
        assert_eq!(request.record_type(), RecordType::Aaaa);
        assert_eq!(request.key(), RecordKey::new("home.example.com.", RecordType::Aaaa));
    }

    #[test]
    fn deserialized_request_is_validated() {
        let request: DnsRequest =
            serde_json::from_str(r#"{"hostname": "WWW.example.com", "record_type": "A"}"#).unwrap();
        assert_eq!(request.hostname(), "www.example.com.");

        let invalid = serde_json::from_str::<DnsRequest>(r#"{"hostname": "bad..name", "record_type": "A"}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn hostname_validation() {
        assert!(validate_hostname("example.com").is_ok());
        assert!(validate_hostname("example.com.").is_ok());
        assert!(validate_hostname("_acme-challenge.example.com").is_ok());
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname(".").is_err());
        assert!(validate_hostname("a..example.com").is_err());
        assert!(validate_hostname("-bad.example.com").is_err());
        assert!(validate_hostname("bad host.example.com").is_err());
        assert!(validate_hostname(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn multi_valued_sets_are_protected() {
        let single = RecordSet::new("x.example.com", RecordType::A, 300, vec!["1.2.3.4".into()]);
        let multi = RecordSet::new(
            "x.example.com",
            RecordType::A,
            300,
            vec!["1.2.3.4".into(), "5.6.7.8".into()],
        );
        assert!(!single.is_protected());
        assert_eq!(single.sole_value(), Some("1.2.3.4"));
        assert!(multi.is_protected());
        assert_eq!(multi.sole_value(), None);
    }

    #[test]
    fn policy_routed_sets_are_protected() {
        let routed = RecordSet::new("geo.example.com", RecordType::A, 300, Vec::new())
            .with_routing_policy();
        assert!(routed.is_protected());
        assert_eq!(routed.sole_value(), None);
    }
}
