//! Source evidence fetching and enrichment
//!
//! Enrichment runs after the intake transaction commits. It never fails the
//! intake: every failure is logged and recorded in the ENRICHED payload.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sentinel_common::db::{EventLog, Submission};
use sentinel_common::events::SYSTEM_ACTOR;
use sentinel_common::evidence::{analyze, failed_analysis, EvidenceAnalysis, FetchOutcome};
use sentinel_common::EventType;
use std::time::Duration;
use thiserror::Error;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Why a source could not be read
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,
    #[error("connect")]
    Connect,
    #[error("status {0}")]
    Status(u16),
    #[error("request: {0}")]
    Request(String),
}

impl FetchError {
    /// Short failure class recorded in the "Source unreachable" note
    pub fn kind(&self) -> String {
        match self {
            FetchError::Timeout => "timeout".to_string(),
            FetchError::Connect => "connect".to_string(),
            FetchError::Status(code) => format!("status {}", code),
            FetchError::Request(_) => "request".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Fetches the readable text behind a submission's source URL
#[async_trait]
pub trait EvidenceFetcher: Send + Sync {
    async fn fetch(&self, source_url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpEvidenceFetcher {
    client: reqwest::Client,
}

impl HttpEvidenceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sentinel-ops/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EvidenceFetcher for HttpEvidenceFetcher {
    async fn fetch(&self, source_url: &str) -> Result<String, FetchError> {
        let response = self.client.get(source_url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(strip_html(&body))
    }
}

/// Drop tags, decode common entities, collapse whitespace
pub fn strip_html(raw: &str) -> String {
    let text = TAG_RE.replace_all(raw, " ");
    let text = decode_entities(&text);
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Fetch, analyze and record an ENRICHED event for a stored submission
///
/// Returns the recorded analysis, or `None` if nothing could be appended.
pub async fn enrich_submission(
    event_log: &EventLog,
    fetcher: &dyn EvidenceFetcher,
    submission: &Submission,
) -> Option<EvidenceAnalysis> {
    let outcome = match fetcher.fetch(&submission.source_url).await {
        Ok(text) => FetchOutcome::reachable(text),
        Err(err) => {
            tracing::warn!(
                submission_id = %submission.submission_id,
                error = %err,
                "Evidence source unreachable"
            );
            FetchOutcome::unreachable(&err.kind())
        }
    };

    let analysis = analyze(&submission.address, &submission.scam_type, outcome);
    match record(event_log, submission, &analysis).await {
        Ok(()) => Some(analysis),
        Err(err) => {
            tracing::warn!(
                submission_id = %submission.submission_id,
                error = %err,
                "Evidence analysis could not be recorded"
            );
            let fallback = failed_analysis(&err.to_string());
            match record(event_log, submission, &fallback).await {
                Ok(()) => Some(fallback),
                Err(err) => {
                    tracing::warn!(
                        submission_id = %submission.submission_id,
                        error = %err,
                        "Evidence failure note could not be recorded"
                    );
                    None
                }
            }
        }
    }
}

async fn record(
    event_log: &EventLog,
    submission: &Submission,
    analysis: &EvidenceAnalysis,
) -> sentinel_common::Result<()> {
    let payload = serde_json::to_value(analysis)?;
    event_log
        .append(submission.submission_id, EventType::Enriched, payload, SYSTEM_ACTOR)
        .await?;
    tracing::info!(
        submission_id = %submission.submission_id,
        evidence_score = analysis.evidence_score,
        "Evidence analysis recorded"
    );
    Ok(())
}
