//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::ExistingSubmission;
use crate::Error;

/// Intelligence submitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contractor {
    pub contractor_id: Uuid,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CasePriority {
    Low,
    #[default]
    Med,
    High,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePriority::Low => "LOW",
            CasePriority::Med => "MED",
            CasePriority::High => "HIGH",
        }
    }
}

impl FromStr for CasePriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(CasePriority::Low),
            "MED" => Ok(CasePriority::Med),
            "HIGH" => Ok(CasePriority::High),
            other => Err(Error::InvalidInput(format!("Unknown case priority: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    #[default]
    Open,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "OPEN",
            CaseStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(CaseStatus::Open),
            "CLOSED" => Ok(CaseStatus::Closed),
            other => Err(Error::InvalidInput(format!("Unknown case status: {}", other))),
        }
    }
}

/// Investigation container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: Uuid,
    pub title: String,
    pub priority: CasePriority,
    pub start_time: DateTime<Utc>,
    pub deadline_time: DateTime<Utc>,
    pub status: CaseStatus,
}

/// Case creation request; unset times are derived at insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCase {
    pub title: String,
    #[serde(default)]
    pub priority: CasePriority,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
}

/// Scam-type labels accepted at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScamType {
    Phishing,
    PigButchering,
    Rugpull,
    Exchange,
    Other,
}

impl ScamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamType::Phishing => "Phishing",
            ScamType::PigButchering => "PigButchering",
            ScamType::Rugpull => "Rugpull",
            ScamType::Exchange => "Exchange",
            ScamType::Other => "Other",
        }
    }
}

impl fmt::Display for ScamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported claim; rows are never updated after insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: Uuid,
    pub case_id: Uuid,
    pub contractor_id: Uuid,
    /// Normalized chain
    pub chain: String,
    /// Normalized address
    pub address: String,
    pub scam_type: String,
    pub source_url: String,
    pub confidence_score: u8,
    pub created_at: DateTime<Utc>,
    /// Canonical JSON of the original request
    pub raw_payload_json: String,
    pub submission_hash: String,
}

impl ExistingSubmission for Submission {
    fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    fn chain(&self) -> &str {
        &self.chain
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn scam_type(&self) -> &str {
        &self.scam_type
    }
}

/// Insert form of [`Submission`]; id and creation time are assigned on insert
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub case_id: Uuid,
    pub contractor_id: Uuid,
    pub chain: String,
    pub address: String,
    pub scam_type: String,
    pub source_url: String,
    pub confidence_score: u8,
    pub raw_payload_json: String,
    pub submission_hash: String,
}
