//! Evidence analysis rules
//!
//! Pure scoring of fetched source text against a submission's address and
//! scam-type label. Fetching itself lives with the service; a fetch failure is
//! represented here as an unreachable [`FetchOutcome`], never an error.

use serde::{Deserialize, Serialize};

/// Keywords that support each scam-type label
pub fn classification_keywords(scam_type: &str) -> &'static [&'static str] {
    match scam_type {
        "Phishing" => &["phishing", "fake website", "impersonation"],
        "Rugpull" => &["rug", "liquidity removed", "exit scam"],
        "PigButchering" => &["romance scam", "investment scam", "pig butchering"],
        "Exchange" => &["exchange", "cex", "withdrawal halted"],
        "Other" => &["scam", "fraud", "abuse"],
        _ => &[],
    }
}

/// Result of fetching a submission's source URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub text: String,
    pub source_reachable: bool,
    pub notes: Vec<String>,
}

impl FetchOutcome {
    pub fn reachable(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_reachable: true,
            notes: vec!["Source reachable".to_string()],
        }
    }

    /// `kind` names the failure class (timeout, connect, status ...)
    pub fn unreachable(kind: &str) -> Self {
        Self {
            text: String::new(),
            source_reachable: false,
            notes: vec![format!("Source unreachable: {}", kind)],
        }
    }
}

/// ENRICHED event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAnalysis {
    pub evidence_score: f64,
    pub address_found: bool,
    pub classification_supported: bool,
    pub source_reachable: bool,
    pub notes: Vec<String>,
}

/// Case-insensitive containment of the address in the text
pub fn address_found(address: &str, text: &str) -> bool {
    text.to_lowercase().contains(&address.to_lowercase())
}

/// Fraction of the label's keywords present in the text, capped at 1.0
pub fn keyword_match_score(scam_type: &str, text: &str) -> f64 {
    let keywords = classification_keywords(scam_type);
    if keywords.is_empty() {
        return 0.0;
    }
    let text_l = text.to_lowercase();
    let matched = keywords.iter().filter(|kw| text_l.contains(*kw)).count();
    (matched as f64 / keywords.len() as f64).min(1.0)
}

fn keyword_notes(scam_type: &str, text: &str) -> Vec<String> {
    let text_l = text.to_lowercase();
    let mut notes: Vec<String> = classification_keywords(scam_type)
        .iter()
        .filter(|kw| text_l.contains(*kw))
        .map(|kw| format!("Keyword matched: {}", kw))
        .collect();
    notes.sort();
    notes
}

/// Score fetched evidence for one submission
///
/// `evidence_score = 0.5*address_found + 0.3*keyword_score + 0.2*reachable`
pub fn analyze(address: &str, scam_type: &str, fetched: FetchOutcome) -> EvidenceAnalysis {
    let FetchOutcome { text, source_reachable, mut notes } = fetched;

    let addr_found = address_found(address, &text);
    let keyword_score = keyword_match_score(scam_type, &text);
    let classification_supported = keyword_score > 0.0;

    notes.push(if addr_found { "Address mentioned" } else { "Address not found" }.to_string());
    if classification_supported {
        notes.extend(keyword_notes(scam_type, &text));
    } else {
        notes.push("Classification keywords not detected".to_string());
    }

    let raw = 0.5 * f64::from(u8::from(addr_found))
        + 0.3 * keyword_score
        + 0.2 * f64::from(u8::from(source_reachable));

    EvidenceAnalysis {
        evidence_score: (raw * 10_000.0).round() / 10_000.0,
        address_found: addr_found,
        classification_supported,
        source_reachable,
        notes,
    }
}

/// Payload recorded when the analyzer itself could not run
pub fn failed_analysis(reason: &str) -> EvidenceAnalysis {
    EvidenceAnalysis {
        evidence_score: 0.0,
        address_found: false,
        classification_supported: false,
        source_reachable: false,
        notes: vec![format!("Analyzer failed safely: {}", reason)],
    }
}
