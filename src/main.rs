//! Study planner entry point.
//!
//! ```text
//! study-planner [serve]          run the HTTP API
//! study-planner parse <text>     extract a task and print it as JSON
//! study-planner plan [file]      plan today from a JSON task array (stdin if no file)
//! ```
//!
//! JSON goes to stdout; a human-readable summary goes to stderr.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use study_planner::llm::{GeminiClient, InferenceClient};
use study_planner::planner::PlanTask;
use study_planner::task::display::task_summary;
use study_planner::{api, Config, StudyPlanGenerator, TaskExtractor};

const USAGE: &str = "usage: study-planner [serve | parse <text> | plan [tasks.json]]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("study_planner=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => api::serve(config).await,
        Some("parse") => {
            let text = args[1..].join(" ");
            if text.trim().is_empty() {
                anyhow::bail!("{}", USAGE);
            }
            let extractor = TaskExtractor::with_remote(gemini_client(&config));
            let now = chrono::Local::now();
            let extraction = extractor.extract_at(&text, now).await;
            tracing::info!("Resolved by {}", extraction.source.as_str());
            eprintln!("{}", task_summary(&extraction.task, now.date_naive()));
            println!("{}", serde_json::to_string_pretty(&extraction.task)?);
            Ok(())
        }
        Some("plan") => {
            let raw = match args.get(1) {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let tasks: Vec<PlanTask> =
                serde_json::from_str(&raw).context("Expected a JSON array of tasks")?;
            let planner = StudyPlanGenerator::new(gemini_client(&config));
            let plan = planner.generate(&tasks).await;
            eprintln!("{}", plan.summary());
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        Some(other) => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn gemini_client(config: &Config) -> Arc<dyn InferenceClient> {
    Arc::new(GeminiClient::with_endpoint(
        config.gemini_api_key.clone(),
        &config.gemini_api_url,
        &config.gemini_model,
    ))
}
