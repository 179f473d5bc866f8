//! Shared fixtures for sentinel-ops integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sentinel_common::db::{
    create_case, create_contractor, init_memory_database, Case, Contractor, NewCase, ScamType,
};
use sentinel_ops::services::{EvidenceFetcher, FetchError, SubmitRequest};
use sentinel_ops::AppState;
use uuid::Uuid;

pub const ETH_ADDRESS: &str = "0x52908400098527886e0f7030069857d2e4169ee7";
pub const BTC_ADDRESS: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

/// In-memory state with no evidence fetcher
pub async fn memory_state() -> AppState {
    AppState::new(init_memory_database().await.expect("memory database"))
}

/// One contractor and one open case
pub async fn seed(state: &AppState) -> (Contractor, Case) {
    let contractor = create_contractor(&state.db, "field-agent").await.expect("contractor");
    let case = create_case(&state.db, NewCase { title: "Wallet drainers".into(), ..Default::default() })
        .await
        .expect("case");
    (contractor, case)
}

pub fn request(contractor_id: Uuid, chain: &str, address: &str, scam_type: ScamType) -> SubmitRequest {
    SubmitRequest {
        contractor_id,
        chain: chain.to_string(),
        address: address.to_string(),
        scam_type,
        source_url: "https://example.com/report".to_string(),
        confidence_score: 4,
        evidence_type: None,
        notes: None,
    }
}

/// Fetcher returning fixed text
pub struct StaticFetcher(pub String);

#[async_trait]
impl EvidenceFetcher for StaticFetcher {
    async fn fetch(&self, _source_url: &str) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

/// Fetcher that always times out
pub struct TimeoutFetcher;

#[async_trait]
impl EvidenceFetcher for TimeoutFetcher {
    async fn fetch(&self, _source_url: &str) -> Result<String, FetchError> {
        Err(FetchError::Timeout)
    }
}
