//! Consensus, contractor reliability and triage priority
//!
//! All inputs are counts derived from projected state; nothing here is stored.

/// Neutral reliability for contractors with no decided submissions
pub const NEUTRAL_RELIABILITY: f64 = 0.5;

const RELIABILITY_WEIGHT: f64 = 0.4;
const CONSENSUS_WEIGHT: f64 = 0.3;
const CONFIDENCE_WEIGHT: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 5.0;

/// Share of same-(chain, address) submissions that carry the same label
pub fn consensus_score(matching_same_label: u64, total_for_address: u64) -> f64 {
    if total_for_address == 0 {
        return 0.0;
    }
    matching_same_label as f64 / total_for_address as f64
}

/// Historical approve ratio; 0.5 when nothing has been decided yet
pub fn contractor_reliability(accepted: u64, rejected: u64) -> f64 {
    let total = accepted + rejected;
    if total == 0 {
        return NEUTRAL_RELIABILITY;
    }
    accepted as f64 / total as f64
}

/// `0.4*reliability + 0.3*consensus + 0.3*(confidence/5)`, rounded to 4 places
pub fn triage_priority(reliability: f64, consensus: f64, confidence_score: u8) -> f64 {
    let raw = RELIABILITY_WEIGHT * reliability
        + CONSENSUS_WEIGHT * consensus
        + CONFIDENCE_WEIGHT * (f64::from(confidence_score) / MAX_CONFIDENCE);
    round_to(raw, 4)
}

/// Round to `places` decimals using the exact binary value
///
/// Fixed-precision formatting rounds correctly, so 0.54375 (stored just below
/// the tie) gives 0.5437, where scaling by 10^4 first would give 0.5438.
fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}
