//! Service layer: intake, evidence enrichment, review queue, export

pub mod evidence;
pub mod export;
pub mod intake;
pub mod queue;

pub use evidence::{EvidenceFetcher, FetchError, HttpEvidenceFetcher};
pub use export::{export_case, ExportFormat, ExportRecord};
pub use intake::{ActionRequest, IntakeOrchestrator, SubmitOutcome, SubmitRequest};
pub use queue::{review_queue, submission_detail, ScoredSubmission, SubmissionDetail};
