//! Intake workflow tests: dedupe/conflict, hashing, atomicity, actions, export

mod helpers;

use helpers::{memory_state, request, seed, StaticFetcher, TimeoutFetcher, BTC_ADDRESS, ETH_ADDRESS};
use serde_json::json;
use sentinel_common::canonical::{canonical_json, content_hash};
use sentinel_common::db::{
    create_case, init_database, insert_submission, list_events, NewCase, NewSubmission, ScamType,
};
use sentinel_common::events::SYSTEM_ACTOR;
use sentinel_common::validation::{REASON_INVALID_ADDRESS_FORMAT, REASON_UNSUPPORTED_CHAIN};
use sentinel_common::{Error, EventType};
use sentinel_ops::services::{export_case, review_queue, ActionRequest, ExportFormat};
use sentinel_ops::AppState;
use std::sync::Arc;
use uuid::Uuid;

fn action(name: &str) -> ActionRequest {
    ActionRequest { action: name.to_string(), actor: "lead-analyst".to_string(), notes: None }
}

#[tokio::test]
async fn test_clean_submission_records_ingested_and_validated() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "eth", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();

    assert!(outcome.validation.passed);
    assert_eq!(outcome.submission.chain, "ETH");
    let types: Vec<EventType> = outcome.events.iter().map(|e| e.event_type().clone()).collect();
    assert_eq!(types, vec![EventType::Ingested, EventType::Validated]);

    // Contractor is the actor of INGESTED, the system of VALIDATED
    assert_eq!(outcome.events[0].actor(), contractor.contractor_id.to_string());
    assert_eq!(outcome.events[1].actor(), SYSTEM_ACTOR);

    let stored = list_events(&state.db, outcome.submission.submission_id).await.unwrap();
    assert_eq!(stored, outcome.events);
    assert!(outcome.evidence.is_none());
}

#[tokio::test]
async fn test_same_address_different_label_conflicts() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let s1 = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();
    let padded = format!("  {}  ", ETH_ADDRESS);
    let s2 = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, " eth ", &padded, ScamType::Rugpull))
        .await
        .unwrap();

    let s1_id = s1.submission.submission_id;
    assert!(s2.validation.passed);
    assert_eq!(s2.validation.duplicate_of, vec![s1_id]);
    assert_eq!(s2.validation.conflict_with, vec![s1_id]);
    assert_eq!(s2.events.last().unwrap().event_type(), &EventType::Conflicted);

    let projected = state.event_log.project(s2.submission.submission_id).await.unwrap();
    assert!(projected.conflicted);
    assert_eq!(projected.conflict_with, vec![s1_id]);
    assert_eq!(projected.latest_event_type, EventType::Conflicted);
}

#[tokio::test]
async fn test_same_address_same_label_is_duplicate_only() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let s3 = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "BTC", BTC_ADDRESS, ScamType::Exchange))
        .await
        .unwrap();
    let s4 = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "BTC", BTC_ADDRESS, ScamType::Exchange))
        .await
        .unwrap();

    assert_eq!(s4.validation.duplicate_of, vec![s3.submission.submission_id]);
    assert!(s4.validation.conflict_with.is_empty());
    assert_eq!(s4.events.len(), 2);

    let projected = state.event_log.project(s4.submission.submission_id).await.unwrap();
    assert!(!projected.conflicted);
    assert!(projected.needs_attention());
}

#[tokio::test]
async fn test_dedupe_is_scoped_to_case() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;
    let other_case = create_case(&state.db, NewCase { title: "Other".into(), ..Default::default() })
        .await
        .unwrap();

    state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();
    let elsewhere = state
        .intake
        .submit(other_case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Rugpull))
        .await
        .unwrap();

    assert!(elsewhere.validation.duplicate_of.is_empty());
    assert!(elsewhere.validation.conflict_with.is_empty());
}

#[tokio::test]
async fn test_failed_validation_is_still_recorded() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let mut req = request(contractor.contractor_id, "DOGE", "DThisIsNotChecked", ScamType::Other);
    req.source_url = "ftp://example.com/file".to_string();
    let outcome = state.intake.submit(case.case_id, req).await.unwrap();

    assert!(!outcome.validation.passed);
    assert!(outcome.validation.reasons.contains(&REASON_UNSUPPORTED_CHAIN.to_string()));
    assert!(outcome.validation.reasons.contains(&REASON_INVALID_ADDRESS_FORMAT.to_string()));
    assert_eq!(outcome.events.len(), 2);

    let projected = state.event_log.project(outcome.submission.submission_id).await.unwrap();
    assert!(!projected.validated);
    assert_eq!(projected.latest_event_type, EventType::Validated);
}

#[tokio::test]
async fn test_submission_hash_matches_canonical_input() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let req = request(contractor.contractor_id, " eth ", ETH_ADDRESS, ScamType::Phishing);
    let outcome = state.intake.submit(case.case_id, req).await.unwrap();

    let payload = json!({
        "contractor_id": contractor.contractor_id.to_string(),
        "blockchain": " eth ",
        "address": ETH_ADDRESS,
        "scam_type": "Phishing",
        "source_url": "https://example.com/report",
        "confidence_score": 4,
        "evidence_type": null,
        "notes": null,
    });
    let expected = content_hash(&json!({
        "case_id": case.case_id.to_string(),
        "payload": payload,
        "normalized_chain": "ETH",
        "normalized_address": ETH_ADDRESS,
    }));

    assert_eq!(outcome.submission.submission_hash, expected);
    assert_eq!(outcome.submission.raw_payload_json, canonical_json(&payload));
    assert_eq!(
        outcome.events[0].payload(),
        &json!({"submission_hash": expected})
    );
}

#[tokio::test]
async fn test_identical_resubmission_hashes_equal() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let a = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "SOL", "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T", ScamType::Rugpull))
        .await
        .unwrap();
    let b = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "SOL", "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T", ScamType::Rugpull))
        .await
        .unwrap();

    assert_ne!(a.submission.submission_id, b.submission.submission_id);
    assert_eq!(a.submission.submission_hash, b.submission.submission_hash);
}

#[tokio::test]
async fn test_unknown_case_or_contractor_is_not_found() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let missing_case = state
        .intake
        .submit(Uuid::new_v4(), request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await;
    assert!(matches!(missing_case, Err(Error::NotFound(_))));

    let missing_contractor = state
        .intake
        .submit(case.case_id, request(Uuid::new_v4(), "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await;
    assert!(matches!(missing_contractor, Err(Error::NotFound(_))));

    assert!(review_queue(&state.db, case.case_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_out_of_range_fields_rejected() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let mut req = request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing);
    req.confidence_score = 6;
    assert!(matches!(state.intake.submit(case.case_id, req).await, Err(Error::InvalidInput(_))));

    let req = request(contractor.contractor_id, "ETH", "x", ScamType::Phishing);
    assert!(matches!(state.intake.submit(case.case_id, req).await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_intake_rolls_back_when_an_event_write_fails() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    sqlx::query(
        r#"
        CREATE TRIGGER fail_validated BEFORE INSERT ON submission_events
        WHEN NEW.event_type = 'VALIDATED'
        BEGIN
            SELECT RAISE(ABORT, 'injected failure');
        END
        "#,
    )
    .execute(&state.db)
    .await
    .unwrap();

    let result = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await;
    assert!(matches!(result, Err(Error::Database(_))));

    let submissions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(&state.db)
        .await
        .unwrap();
    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submission_events")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(submissions, 0);
    assert_eq!(events, 0);
}

#[tokio::test]
async fn test_approve_then_reject_ends_rejected() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;
    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();
    let id = outcome.submission.submission_id;

    let approved = state.intake.apply_action(id, action("approve")).await.unwrap();
    assert_eq!(approved.event_type(), &EventType::Approved);
    assert_eq!(approved.actor(), "lead-analyst");
    assert_eq!(approved.payload(), &json!({"action": "approve", "notes": ""}));

    state.intake.apply_action(id, action("reject")).await.unwrap();

    let projected = state.event_log.project(id).await.unwrap();
    assert_eq!(projected.latest_event_type, EventType::Rejected);
    assert!(!projected.approved);
    assert!(projected.rejected);
}

#[tokio::test]
async fn test_approving_failed_validation_conflicts() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;
    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", "0xnothex", ScamType::Phishing))
        .await
        .unwrap();
    let id = outcome.submission.submission_id;

    let result = state.intake.apply_action(id, action("approve")).await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // Other decisions stay available
    let escalated = state.intake.apply_action(id, action("escalate")).await.unwrap();
    assert_eq!(escalated.event_type(), &EventType::Escalated);
}

#[tokio::test]
async fn test_approving_submission_without_validation_conflicts() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;
    let submission = insert_submission(
        &state.db,
        NewSubmission {
            case_id: case.case_id,
            contractor_id: contractor.contractor_id,
            chain: "ETH".to_string(),
            address: ETH_ADDRESS.to_string(),
            scam_type: "Phishing".to_string(),
            source_url: "https://example.com/report".to_string(),
            confidence_score: 3,
            raw_payload_json: "{}".to_string(),
            submission_hash: "0".repeat(64),
        },
    )
    .await
    .unwrap();
    let id = submission.submission_id;
    state
        .event_log
        .append(id, EventType::Ingested, json!({"submission_hash": submission.submission_hash}), "system")
        .await
        .unwrap();

    let result = state.intake.apply_action(id, action("approve")).await;
    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(state.event_log.list_events(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_action_and_submission() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;
    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();

    let unknown = state.intake.apply_action(outcome.submission.submission_id, action("archive")).await;
    assert!(matches!(unknown, Err(Error::InvalidInput(_))));

    let missing = state.intake.apply_action(Uuid::new_v4(), action("approve")).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_evidence_enrichment_recorded() {
    let state = memory_state().await.with_evidence_fetcher(Arc::new(StaticFetcher(format!(
        "Reported phishing drainer at {}",
        ETH_ADDRESS.to_uppercase().replace("0X", "0x")
    ))));
    let (contractor, case) = seed(&state).await;

    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();

    let evidence = outcome.evidence.expect("evidence analysis");
    assert!(evidence.address_found);
    assert!(evidence.source_reachable);
    assert_eq!(evidence.evidence_score, 0.8);
    assert!(evidence.notes.contains(&"Keyword matched: phishing".to_string()));

    let events = list_events(&state.db, outcome.submission.submission_id).await.unwrap();
    assert_eq!(events.last().unwrap().event_type(), &EventType::Enriched);
}

#[tokio::test]
async fn test_unreachable_source_never_fails_intake() {
    let state = memory_state().await.with_evidence_fetcher(Arc::new(TimeoutFetcher));
    let (contractor, case) = seed(&state).await;

    let outcome = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();

    let evidence = outcome.evidence.expect("evidence analysis");
    assert!(!evidence.source_reachable);
    assert_eq!(evidence.evidence_score, 0.0);
    assert_eq!(evidence.notes[0], "Source unreachable: timeout");

    // Enrichment does not change the validated status
    let projected = state.event_log.project(outcome.submission.submission_id).await.unwrap();
    assert!(projected.validated);
    assert_eq!(projected.latest_event_type, EventType::Enriched);
}

#[tokio::test]
async fn test_review_queue_order_and_reliability() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let first = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();
    let conflicting = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Rugpull))
        .await
        .unwrap();
    let lone = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "BTC", BTC_ADDRESS, ScamType::Exchange))
        .await
        .unwrap();

    state.intake.apply_action(lone.submission.submission_id, action("approve")).await.unwrap();

    let queue = review_queue(&state.db, case.case_id).await.unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[0].submission_id, conflicting.submission.submission_id);
    assert!(queue[0].is_conflicted && queue[0].is_duplicate);

    // One approval, no rejections
    assert!(queue.iter().all(|item| item.contractor_reliability == 1.0));

    let lone_item = queue.iter().find(|i| i.submission_id == lone.submission.submission_id).unwrap();
    assert_eq!(lone_item.consensus_score, 1.0);
    assert_eq!(lone_item.latest_event_type, EventType::Approved);

    let first_item = queue.iter().find(|i| i.submission_id == first.submission.submission_id).unwrap();
    assert_eq!(first_item.consensus_score, 0.5);
    assert!(!first_item.is_duplicate);
}

#[tokio::test]
async fn test_export_selects_approved_once() {
    let state = memory_state().await;
    let (contractor, case) = seed(&state).await;

    let approved = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing))
        .await
        .unwrap();
    let rejected = state
        .intake
        .submit(case.case_id, request(contractor.contractor_id, "BTC", BTC_ADDRESS, ScamType::Exchange))
        .await
        .unwrap();
    state.intake.apply_action(approved.submission.submission_id, action("approve")).await.unwrap();
    state.intake.apply_action(rejected.submission.submission_id, action("reject")).await.unwrap();

    let records = export_case(&state.db, &state.case_locks, case.case_id, ExportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].submission_id, approved.submission.submission_id);
    assert_eq!(records[0].validation_summary["passed"], json!(true));

    let projected = state.event_log.project(approved.submission.submission_id).await.unwrap();
    assert!(projected.exported);
    assert_eq!(projected.latest_event_type, EventType::Exported);
    let events = list_events(&state.db, approved.submission.submission_id).await.unwrap();
    assert_eq!(events.last().unwrap().payload()["format"], json!("csv"));

    // Latest status is now EXPORTED, so a second export is empty
    let again = export_case(&state.db, &state.case_locks, case.case_id, ExportFormat::Json)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_export_unknown_case() {
    let state = memory_state().await;
    let result = export_case(&state.db, &state.case_locks, Uuid::new_v4(), ExportFormat::Json).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_same_case_submissions_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(init_database(&dir.path().join("sentinel.db")).await.unwrap());
    let (contractor, case) = seed(&state).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let intake = state.intake.clone();
        let req = request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Phishing);
        let case_id = case.case_id;
        handles.push(tokio::spawn(async move { intake.submit(case_id, req).await }));
    }

    let mut duplicate_counts = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        duplicate_counts.push(outcome.validation.duplicate_of.len());
    }
    duplicate_counts.sort();
    // Serialized per case: each later submission sees every earlier one
    assert_eq!(duplicate_counts, vec![0, 1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_intake_unaffected_by_actions_on_another_case() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(init_database(&dir.path().join("sentinel.db")).await.unwrap());
    let (contractor, case_a) = seed(&state).await;
    let case_b = create_case(&state.db, NewCase { title: "Rug pulls".into(), ..Default::default() })
        .await
        .unwrap();
    let other = state
        .intake
        .submit(case_b.case_id, request(contractor.contractor_id, "ETH", ETH_ADDRESS, ScamType::Rugpull))
        .await
        .unwrap()
        .submission
        .submission_id;

    let intake = state.intake.clone();
    let actions = tokio::spawn(async move {
        let mut failures = 0;
        for _ in 0..100 {
            if intake.apply_action(other, action("escalate")).await.is_err() {
                failures += 1;
            }
        }
        failures
    });

    let mut failures = 0;
    for i in 0..100u32 {
        let address = format!("0x{:040x}", i + 1);
        let req = request(contractor.contractor_id, "ETH", &address, ScamType::Phishing);
        if state.intake.submit(case_a.case_id, req).await.is_err() {
            failures += 1;
        }
    }

    assert_eq!(failures, 0);
    assert_eq!(actions.await.unwrap(), 0);
    assert_eq!(state.event_log.list_events(other).await.unwrap().len(), 102);
}
