//! Intake orchestration
//!
//! New submissions: canonicalize, hash, validate against the case, then insert
//! the row and its INGESTED / VALIDATED / CONFLICTED events in one transaction.
//! Manager actions: append a decision event to an existing submission.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sentinel_common::canonical::{canonical_json, content_hash};
use sentinel_common::db::{
    append_event, begin_write, get_case, get_contractor, get_submission, insert_submission,
    list_case_submissions, EventLog, NewSubmission, ScamType, Submission,
};
use sentinel_common::events::{
    ActionPayload, ConflictedPayload, IngestedPayload, ManagerAction, ValidatedPayload,
    SYSTEM_ACTOR,
};
use sentinel_common::evidence::EvidenceAnalysis;
use sentinel_common::{
    validate_submission, Error, Event, EventType, KeyedLocks, Result, ValidationResult,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use super::evidence::{enrich_submission, EvidenceFetcher};

const MIN_ADDRESS_LEN: usize = 2;
const MAX_ADDRESS_LEN: usize = 256;
const MAX_EVIDENCE_TYPE_LEN: usize = 128;
const MAX_NOTES_LEN: usize = 4000;

/// Contractor intake request
///
/// Serialized form (wire alias `blockchain`, absent optionals as `null`) is
/// the `payload` part of the submission hash input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    pub contractor_id: Uuid,
    #[serde(rename = "blockchain", alias = "chain")]
    pub chain: String,
    pub address: String,
    pub scam_type: ScamType,
    pub source_url: String,
    pub confidence_score: u8,
    #[serde(default)]
    pub evidence_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SubmitRequest {
    /// Shape checks; format problems (chain, address, URL) are left to validation
    pub fn check(&self) -> Result<()> {
        let address_len = self.address.chars().count();
        if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address_len) {
            return Err(Error::InvalidInput(format!(
                "address must be {}-{} characters",
                MIN_ADDRESS_LEN, MAX_ADDRESS_LEN
            )));
        }
        if !(1..=5).contains(&self.confidence_score) {
            return Err(Error::InvalidInput("confidence_score must be 1-5".to_string()));
        }
        if let Some(evidence_type) = &self.evidence_type {
            if evidence_type.chars().count() > MAX_EVIDENCE_TYPE_LEN {
                return Err(Error::InvalidInput(format!(
                    "evidence_type exceeds {} characters",
                    MAX_EVIDENCE_TYPE_LEN
                )));
            }
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(Error::InvalidInput(format!(
                    "notes exceed {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Manager decision request
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default = "default_manager")]
    pub actor: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_manager() -> String {
    "manager".to_string()
}

/// Result of a successful intake
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission: Submission,
    pub validation: ValidationResult,
    /// Events written by the intake transaction, in append order
    pub events: Vec<Event>,
    /// Present when evidence analysis is enabled and was recorded
    pub evidence: Option<EvidenceAnalysis>,
}

/// Sequences validation and event writes for submissions and decisions
#[derive(Clone)]
pub struct IntakeOrchestrator {
    pool: SqlitePool,
    event_log: EventLog,
    case_locks: KeyedLocks,
    fetcher: Option<Arc<dyn EvidenceFetcher>>,
}

impl IntakeOrchestrator {
    pub fn new(event_log: EventLog, case_locks: KeyedLocks) -> Self {
        Self {
            pool: event_log.pool().clone(),
            event_log,
            case_locks,
            fetcher: None,
        }
    }

    /// Enable post-intake evidence enrichment
    pub fn with_fetcher(mut self, fetcher: Arc<dyn EvidenceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Ingest one submission into a case
    ///
    /// The case lock is held across the duplicate scan and the commit, so two
    /// concurrent submissions to one case always see each other.
    pub async fn submit(&self, case_id: Uuid, request: SubmitRequest) -> Result<SubmitOutcome> {
        request.check()?;

        let (submission, validation, events) = {
            let _case_guard = self.case_locks.lock(case_id).await;
            let mut tx = begin_write(&self.pool).await?;

            if get_case(&mut *tx, case_id).await?.is_none() {
                return Err(Error::NotFound(format!("case {}", case_id)));
            }
            if get_contractor(&mut *tx, request.contractor_id).await?.is_none() {
                return Err(Error::NotFound(format!("contractor {}", request.contractor_id)));
            }

            let existing = list_case_submissions(&mut *tx, case_id).await?;
            let validation = validate_submission(
                &request.chain,
                &request.address,
                &request.source_url,
                request.scam_type.as_str(),
                &existing,
            );

            let payload = serde_json::to_value(&request)?;
            let submission_hash = content_hash(&json!({
                "case_id": case_id.to_string(),
                "payload": payload,
                "normalized_chain": validation.normalized_chain,
                "normalized_address": validation.normalized_address,
            }));

            let submission = insert_submission(
                &mut *tx,
                NewSubmission {
                    case_id,
                    contractor_id: request.contractor_id,
                    chain: validation.normalized_chain.clone(),
                    address: validation.normalized_address.clone(),
                    scam_type: request.scam_type.as_str().to_string(),
                    source_url: request.source_url.clone(),
                    confidence_score: request.confidence_score,
                    raw_payload_json: canonical_json(&payload),
                    submission_hash,
                },
            )
            .await?;

            let mut events = Vec::with_capacity(3);
            events.push(
                append_event(
                    &mut tx,
                    submission.submission_id,
                    EventType::Ingested,
                    serde_json::to_value(IngestedPayload {
                        submission_hash: submission.submission_hash.clone(),
                    })?,
                    &request.contractor_id.to_string(),
                    None,
                )
                .await?,
            );
            events.push(
                append_event(
                    &mut tx,
                    submission.submission_id,
                    EventType::Validated,
                    serde_json::to_value(ValidatedPayload::from(&validation))?,
                    SYSTEM_ACTOR,
                    None,
                )
                .await?,
            );
            if !validation.conflict_with.is_empty() {
                events.push(
                    append_event(
                        &mut tx,
                        submission.submission_id,
                        EventType::Conflicted,
                        serde_json::to_value(ConflictedPayload {
                            conflict_with: Some(validation.conflict_with.clone()),
                        })?,
                        SYSTEM_ACTOR,
                        None,
                    )
                    .await?,
                );
            }

            tx.commit().await?;
            (submission, validation, events)
        };

        tracing::info!(
            case_id = %case_id,
            submission_id = %submission.submission_id,
            passed = validation.passed,
            duplicates = validation.duplicate_of.len(),
            conflicts = validation.conflict_with.len(),
            "Submission ingested"
        );

        let evidence = match &self.fetcher {
            Some(fetcher) => enrich_submission(&self.event_log, fetcher.as_ref(), &submission).await,
            None => None,
        };

        Ok(SubmitOutcome { submission, validation, events, evidence })
    }

    /// Record a manager decision
    ///
    /// Approval requires that the latest VALIDATED event passed; a failed or
    /// missing validation is a conflict.
    pub async fn apply_action(&self, submission_id: Uuid, request: ActionRequest) -> Result<Event> {
        let action: ManagerAction = request.action.parse()?;

        if get_submission(&self.pool, submission_id).await?.is_none() {
            return Err(Error::NotFound(format!("submission {}", submission_id)));
        }

        let payload = serde_json::to_value(ActionPayload {
            action,
            notes: request.notes.unwrap_or_default(),
        })?;

        let event = self
            .event_log
            .append_checked(submission_id, action.event_type(), payload, &request.actor, |state| {
                if action == ManagerAction::Approve && !state.validated {
                    return Err(Error::Conflict(format!(
                        "submission {} has not passed validation",
                        submission_id
                    )));
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            submission_id = %submission_id,
            action = action.as_str(),
            actor = %request.actor,
            "Manager action recorded"
        );
        Ok(event)
    }
}
