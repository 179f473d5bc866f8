//! Review queue: projected state plus scores for each submission

use chrono::{DateTime, Utc};
use serde::Serialize;
use sentinel_common::db::{
    get_case, get_submission, list_case_submissions, list_contractor_submissions, list_events,
    Submission,
};
use sentinel_common::scoring::{consensus_score, contractor_reliability, triage_priority};
use sentinel_common::{project, Error, Event, EventType, Result, SubmissionState};
use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// One review queue entry
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSubmission {
    pub submission_id: Uuid,
    pub case_id: Uuid,
    pub contractor_id: Uuid,
    pub chain: String,
    pub address: String,
    pub scam_type: String,
    pub source_url: String,
    pub confidence_score: u8,
    pub created_at: DateTime<Utc>,
    pub submission_hash: String,
    pub latest_event_type: EventType,
    pub is_duplicate: bool,
    pub is_conflicted: bool,
    pub consensus_score: f64,
    pub contractor_reliability: f64,
    pub triage_priority: f64,
}

impl ScoredSubmission {
    fn needs_attention(&self) -> bool {
        self.is_duplicate || self.is_conflicted
    }
}

/// Single submission with its history
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetail {
    pub item: ScoredSubmission,
    pub state: SubmissionState,
    pub events: Vec<Event>,
}

/// Scored submissions of a case in review order
pub async fn review_queue(pool: &SqlitePool, case_id: Uuid) -> Result<Vec<ScoredSubmission>> {
    if get_case(pool, case_id).await?.is_none() {
        return Err(Error::NotFound(format!("case {}", case_id)));
    }

    let submissions = list_case_submissions(pool, case_id).await?;
    let mut reliability_cache = HashMap::new();
    let mut items = Vec::with_capacity(submissions.len());

    for submission in &submissions {
        let events = list_events(pool, submission.submission_id).await?;
        let state = project(&events)?;
        let reliability =
            cached_reliability(pool, submission.contractor_id, &mut reliability_cache).await?;
        items.push(score(submission, &state, &submissions, reliability));
    }

    order_queue(&mut items);
    tracing::debug!(case_id = %case_id, count = items.len(), "Review queue built");
    Ok(items)
}

/// Scored submission, projected state and full event history
pub async fn submission_detail(pool: &SqlitePool, submission_id: Uuid) -> Result<SubmissionDetail> {
    let submission = get_submission(pool, submission_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("submission {}", submission_id)))?;

    let events = list_events(pool, submission_id).await?;
    let state = project(&events)?;
    let case_submissions = list_case_submissions(pool, submission.case_id).await?;
    let reliability = reliability_for(pool, submission.contractor_id).await?;

    Ok(SubmissionDetail {
        item: score(&submission, &state, &case_submissions, reliability),
        state,
        events,
    })
}

/// Conflicted or duplicate first, then triage priority descending, then newest
pub fn order_queue(items: &mut [ScoredSubmission]) {
    items.sort_by(|a, b| {
        b.needs_attention()
            .cmp(&a.needs_attention())
            .then_with(|| {
                b.triage_priority
                    .partial_cmp(&a.triage_priority)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn score(
    submission: &Submission,
    state: &SubmissionState,
    case_submissions: &[Submission],
    reliability: f64,
) -> ScoredSubmission {
    let same_address: Vec<&Submission> = case_submissions
        .iter()
        .filter(|s| s.chain == submission.chain && s.address == submission.address)
        .collect();
    let same_label = same_address
        .iter()
        .filter(|s| s.scam_type == submission.scam_type)
        .count();
    let consensus = consensus_score(same_label as u64, same_address.len() as u64);

    ScoredSubmission {
        submission_id: submission.submission_id,
        case_id: submission.case_id,
        contractor_id: submission.contractor_id,
        chain: submission.chain.clone(),
        address: submission.address.clone(),
        scam_type: submission.scam_type.clone(),
        source_url: submission.source_url.clone(),
        confidence_score: submission.confidence_score,
        created_at: submission.created_at,
        submission_hash: submission.submission_hash.clone(),
        latest_event_type: state.latest_event_type.clone(),
        is_duplicate: !state.duplicate_of.is_empty(),
        is_conflicted: !state.conflict_with.is_empty(),
        consensus_score: consensus,
        contractor_reliability: reliability,
        triage_priority: triage_priority(reliability, consensus, submission.confidence_score),
    }
}

async fn cached_reliability(
    pool: &SqlitePool,
    contractor_id: Uuid,
    cache: &mut HashMap<Uuid, f64>,
) -> Result<f64> {
    if let Some(value) = cache.get(&contractor_id) {
        return Ok(*value);
    }
    let value = reliability_for(pool, contractor_id).await?;
    cache.insert(contractor_id, value);
    Ok(value)
}

/// Approve ratio over the contractor's projected decisions in every case
pub async fn reliability_for(pool: &SqlitePool, contractor_id: Uuid) -> Result<f64> {
    let mut accepted = 0u64;
    let mut rejected = 0u64;

    for submission in list_contractor_submissions(pool, contractor_id).await? {
        let events = list_events(pool, submission.submission_id).await?;
        let state = match project(&events) {
            Ok(state) => state,
            Err(Error::EmptyEventStream) => continue,
            Err(e) => return Err(e),
        };
        if state.approved {
            accepted += 1;
        } else if state.rejected {
            rejected += 1;
        }
    }

    Ok(contractor_reliability(accepted, rejected))
}
