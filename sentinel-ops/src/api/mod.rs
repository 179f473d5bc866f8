//! HTTP API handlers for sentinel-ops

pub mod cases;
pub mod contractors;
pub mod health;
pub mod submissions;

pub use cases::case_routes;
pub use contractors::contractor_routes;
pub use health::health_routes;
pub use submissions::submission_routes;
