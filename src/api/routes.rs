//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::{GeminiClient, InferenceClient};
use crate::planner::StudyPlanGenerator;
use crate::storage::{MemoryTaskStore, SupabaseSession, SupabaseTaskStore, TaskStore};
use crate::task::display::task_summary;
use crate::task::{StructuredTask, TaskExtractor};

use super::plans;
use super::tasks;

/// Shared application state.
pub struct AppState {
    /// Free text to structured task
    pub extractor: TaskExtractor,
    /// Daily schedule generation
    pub planner: StudyPlanGenerator,
    /// Task and plan persistence
    pub store: Arc<dyn TaskStore>,
    /// Whether a remote model is configured
    pub remote_enabled: bool,
}

impl AppState {
    /// Wire the components described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let gemini = GeminiClient::with_endpoint(
            config.gemini_api_key.clone(),
            &config.gemini_api_url,
            &config.gemini_model,
        );
        let remote_enabled = gemini.has_credentials();
        if !remote_enabled {
            tracing::warn!("GEMINI_API_KEY not set; extraction and planning use local fallbacks");
        }
        let client: Arc<dyn InferenceClient> = Arc::new(gemini);

        let store: Arc<dyn TaskStore> = match &config.supabase {
            Some(supabase) => {
                tracing::info!("Using Supabase task store at {}", supabase.url);
                let mut store = SupabaseTaskStore::new(&supabase.url, &supabase.api_key);
                if let (Some(access_token), Some(user_id)) =
                    (supabase.access_token.clone(), supabase.user_id)
                {
                    store = store.with_session(SupabaseSession {
                        access_token,
                        user_id,
                    });
                }
                Arc::new(store)
            }
            None => {
                tracing::info!("Using in-memory task store");
                Arc::new(MemoryTaskStore::new())
            }
        };

        Self {
            extractor: TaskExtractor::with_remote(Arc::clone(&client)),
            planner: StudyPlanGenerator::new(client),
            store,
            remote_enabled,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks/parse", post(parse_task))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/quick", post(tasks::quick_add))
        .route("/api/tasks/date/:date", get(tasks::list_tasks_for_date))
        .route(
            "/api/tasks/:id",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/plan", post(plans::generate_plan))
        .route(
            "/api/plans/:date",
            get(plans::get_plan).put(plans::save_plan),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub remote_enabled: bool,
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        remote_enabled: state.remote_enabled,
    })
}

#[derive(Debug, Deserialize)]
pub struct ParseTaskRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseTaskResponse {
    pub task: StructuredTask,
    /// Tier that produced the task ("remote" or "heuristic")
    pub source: &'static str,
    /// Human-readable one-liner for confirmation prompts
    pub summary: String,
}

/// POST /api/tasks/parse
/// Extract a structured task from free text. Never fails.
async fn parse_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ParseTaskRequest>,
) -> Json<ParseTaskResponse> {
    let now = chrono::Local::now();
    let extraction = state.extractor.extract_at(&req.text, now).await;
    Json(ParseTaskResponse {
        summary: task_summary(&extraction.task, now.date_naive()),
        task: extraction.task,
        source: extraction.source.as_str(),
    })
}
