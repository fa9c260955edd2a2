//! HTTP API for the mobile client.
//!
//! Thin wrappers over extraction, planning and the task store. Extraction
//! and planning endpoints always answer 200; only storage misses surface as
//! error statuses.

mod plans;
mod routes;
mod tasks;

pub use routes::{router, serve, AppState, HealthResponse, ParseTaskRequest, ParseTaskResponse};
