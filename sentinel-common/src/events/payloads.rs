//! Typed payloads per event type
//!
//! Readers decode leniently: missing fields fall back to defaults so that
//! replay never depends on every writer having emitted every field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ManagerAction;
use crate::validation::ValidationResult;

/// INGESTED
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedPayload {
    pub submission_hash: String,
}

/// VALIDATED
///
/// Written from a [`ValidationResult`]; read with `passed` defaulting to true
/// and the id lists defaulting to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPayload {
    #[serde(default = "default_passed")]
    pub passed: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub normalized_chain: Option<String>,
    #[serde(default)]
    pub normalized_address: Option<String>,
    #[serde(default)]
    pub duplicate_of: Vec<Uuid>,
    #[serde(default)]
    pub conflict_with: Vec<Uuid>,
}

fn default_passed() -> bool {
    true
}

impl From<&ValidationResult> for ValidatedPayload {
    fn from(result: &ValidationResult) -> Self {
        Self {
            passed: result.passed,
            reasons: result.reasons.clone(),
            normalized_chain: Some(result.normalized_chain.clone()),
            normalized_address: Some(result.normalized_address.clone()),
            duplicate_of: result.duplicate_of.clone(),
            conflict_with: result.conflict_with.clone(),
        }
    }
}

/// CONFLICTED
///
/// `conflict_with: None` means "keep whatever the state already holds".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_with: Option<Vec<Uuid>>,
}

/// APPROVED / REJECTED / ESCALATED / REQUEST_MORE_EVIDENCE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub action: ManagerAction,
    #[serde(default)]
    pub notes: String,
}

/// EXPORTED
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPayload {
    pub format: String,
    pub exported_at: DateTime<Utc>,
}
