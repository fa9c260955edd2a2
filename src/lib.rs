//! # Study Planner
//!
//! Backend core for a task and study planner.
//!
//! This library provides:
//! - Natural-language task extraction with a deterministic local fallback
//! - Daily study plan generation with a static fallback schedule
//! - A storage contract for tasks and plans (Supabase or in-memory)
//! - An HTTP API for the mobile client
//!
//! ## Architecture
//!
//! ```text
//!            free text
//!                │
//!                ▼
//!   ┌──────────────────────────┐
//!   │      TaskExtractor       │
//!   │  ┌────────────────────┐  │     ┌──────────────┐
//!   │  │  RemoteResolver    │──┼────▶│ GeminiClient │
//!   │  └─────────┬──────────┘  │     └──────────────┘
//!   │            │ any failure │
//!   │            ▼             │
//!   │  ┌────────────────────┐  │
//!   │  │  HeuristicParser   │  │  (pure, never fails)
//!   │  └────────────────────┘  │
//!   └────────────┬─────────────┘
//!                ▼
//!         StructuredTask
//! ```
//!
//! ## Modules
//! - `task`: task types, extraction chain, heuristic parser
//! - `planner`: study plan generation
//! - `llm`: inference client trait and Gemini implementation
//! - `storage`: task/plan store trait and implementations
//! - `api`: axum routes
//! - `config`: environment configuration

pub mod api;
pub mod config;
pub mod json;
pub mod llm;
pub mod planner;
pub mod storage;
pub mod task;

pub use config::Config;
pub use planner::{StudyPlan, StudyPlanGenerator};
pub use task::{StructuredTask, TaskExtractor};
