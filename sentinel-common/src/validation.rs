//! Submission validation and same-case dedupe/conflict detection
//!
//! A failed validation is a normal outcome: reasons are returned in
//! [`ValidationResult`] and recorded on the event log, never raised as errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

pub const REASON_UNSUPPORTED_CHAIN: &str = "unsupported_chain";
pub const REASON_INVALID_ADDRESS_FORMAT: &str = "invalid_address_format";
pub const REASON_INVALID_SOURCE_URL: &str = "invalid_source_url";

/// Chains accepted by the validator
pub const SUPPORTED_CHAINS: [&str; 3] = ["ETH", "BTC", "SOL"];

static ETH_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid ETH pattern"));
static BTC_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bc1|[13])[a-zA-HJ-NP-Z0-9]{25,62}$").expect("valid BTC pattern"));
static SOL_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("valid SOL pattern"));

/// Outcome of validating one incoming submission
///
/// `reasons`, `duplicate_of` and `conflict_with` are sorted and de-duplicated.
/// Persisted verbatim as the VALIDATED event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub reasons: Vec<String>,
    pub normalized_chain: String,
    pub normalized_address: String,
    pub duplicate_of: Vec<Uuid>,
    pub conflict_with: Vec<Uuid>,
}

/// Read-only view of a prior submission used by the dedupe scan
pub trait ExistingSubmission {
    fn submission_id(&self) -> Uuid;
    fn chain(&self) -> &str;
    fn address(&self) -> &str;
    fn scam_type(&self) -> &str;
}

/// Upper-case and trim a chain identifier
pub fn normalize_chain(chain: &str) -> String {
    chain.trim().to_uppercase()
}

/// Trim an address; case is preserved (checksummed addresses are case-sensitive)
pub fn normalize_address(address: &str) -> String {
    address.trim().to_string()
}

/// Check an already-normalized address against its chain's format
pub fn is_valid_address(chain: &str, address: &str) -> bool {
    let pattern = match chain {
        "ETH" => &ETH_ADDRESS,
        "BTC" => &BTC_ADDRESS,
        "SOL" => &SOL_ADDRESS,
        _ => return false,
    };
    pattern.is_match(address)
}

/// http(s) URL with a non-empty host
pub fn is_valid_source_url(source_url: &str) -> bool {
    match Url::parse(source_url) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        }
        Err(_) => false,
    }
}

/// Validate an incoming submission against prior submissions in the same case
///
/// **Algorithm:**
/// 1. Normalize chain (trim, upper-case) and address (trim)
/// 2. Check chain support, address format, source URL
/// 3. Every prior submission with the same (chain, address) is a duplicate;
///    a duplicate with a different scam-type label is also a conflict
/// 4. `passed` iff no reasons; duplicates and conflicts never fail validation
pub fn validate_submission<S: ExistingSubmission>(
    chain: &str,
    address: &str,
    source_url: &str,
    scam_type: &str,
    existing_same_case: &[S],
) -> ValidationResult {
    let normalized_chain = normalize_chain(chain);
    let normalized_address = normalize_address(address);

    let mut reasons: Vec<String> = Vec::new();
    if !SUPPORTED_CHAINS.contains(&normalized_chain.as_str()) {
        reasons.push(REASON_UNSUPPORTED_CHAIN.to_string());
    }
    if !is_valid_address(&normalized_chain, &normalized_address) {
        reasons.push(REASON_INVALID_ADDRESS_FORMAT.to_string());
    }
    if !is_valid_source_url(source_url) {
        reasons.push(REASON_INVALID_SOURCE_URL.to_string());
    }

    let mut duplicate_of = Vec::new();
    let mut conflict_with = Vec::new();
    for existing in existing_same_case {
        if existing.chain() == normalized_chain && existing.address() == normalized_address {
            duplicate_of.push(existing.submission_id());
            if existing.scam_type() != scam_type {
                conflict_with.push(existing.submission_id());
            }
        }
    }

    reasons.sort();
    reasons.dedup();
    duplicate_of.sort();
    duplicate_of.dedup();
    conflict_with.sort();
    conflict_with.dedup();

    ValidationResult {
        passed: reasons.is_empty(),
        reasons,
        normalized_chain,
        normalized_address,
        duplicate_of,
        conflict_with,
    }
}
