//! # Sentinel Common Library
//!
//! Event-sourced core shared by the Sentinel-Ops service:
//! - Canonical JSON serialization and content hashing
//! - Submission validation and same-case dedupe/conflict detection
//! - Event types and typed payloads
//! - Append-only event log and database models
//! - Replay projection and scoring
//! - Configuration loading

pub mod canonical;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod evidence;
pub mod locks;
pub mod projection;
pub mod scoring;
pub mod time;
pub mod validation;

pub use canonical::{canonicalize, canonical_json, content_hash};
pub use error::{Error, Result};
pub use events::{Event, EventType};
pub use locks::KeyedLocks;
pub use projection::{project, SubmissionState};
pub use validation::{validate_submission, ValidationResult};
