use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task;
use tower_http::trace::TraceLayer;

use crate::bail_service;
use crate::error::ServiceResult;
use crate::inference::models::model::ModelBase;
use crate::inference::GenerationBackend;
use crate::orchestrator::{Orchestrator, TaskOutput, TaskResult};
use crate::task::{ParseStatus, RatingTier, TaskKind};

pub type SharedBackend = Box<dyn GenerationBackend + Send>;

#[derive(Clone)]
pub struct AppState {
    /// The backend is not reentrant, so every command takes this lock
    pub orchestrator: Arc<Mutex<Orchestrator<SharedBackend>>>,
    pub model: Arc<ModelBase>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator<SharedBackend>, model: ModelBase) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            model: Arc::new(model),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    En,
    Ko,
}

impl TargetLanguage {
    fn task(self) -> TaskKind {
        match self {
            TargetLanguage::En => TaskKind::TranslateToEnglish,
            TargetLanguage::Ko => TaskKind::TranslateToKorean,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct TranslateRequest {
    pub target: TargetLanguage,
    pub input: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TranslateResponse {
    pub task: TaskKind,
    pub output: String,
}

#[derive(Deserialize, Debug)]
pub struct GrammarRequest {
    pub input: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct GrammarResponse {
    pub rating: u8,
    pub tier: RatingTier,
    pub feedback: String,
    pub status: ParseStatus,
}

pub fn build_router(state: AppState) -> Router {
    let text_router = Router::new()
        .route("/translate", post(handle_translate_request))
        .route("/grammar", post(handle_grammar_request));

    Router::new()
        .route("/health", get(health))
        .route("/model", get(handle_model_request))
        .route("/command", post(handle_command_request))
        .nest("/text", text_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

#[axum_macros::debug_handler]
pub async fn handle_model_request(State(state): State<AppState>) -> Json<ModelBase> {
    Json(state.model.as_ref().clone())
}

#[axum_macros::debug_handler]
pub async fn handle_command_request(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> ServiceResult<(StatusCode, Json<TaskResult>)> {
    let result = run_command(&state, req.command).await?;
    Ok((StatusCode::OK, Json(result)))
}

#[axum_macros::debug_handler]
pub async fn handle_translate_request(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> ServiceResult<(StatusCode, Json<TranslateResponse>)> {
    let task = req.target.task();
    let result = run_task(&state, task, &req.input).await?;
    match result.output {
        TaskOutput::Translation(output) => Ok((
            StatusCode::OK,
            Json(TranslateResponse {
                task: result.task,
                output,
            }),
        )),
        TaskOutput::Grammar(_) => bail_service!(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Task {:?} produced a grammar result",
            task
        ),
    }
}

#[axum_macros::debug_handler]
pub async fn handle_grammar_request(
    State(state): State<AppState>,
    Json(req): Json<GrammarRequest>,
) -> ServiceResult<(StatusCode, Json<GrammarResponse>)> {
    let result = run_task(&state, TaskKind::GrammarCheck, &req.input).await?;
    match result.output {
        TaskOutput::Grammar(parsed) => Ok((
            StatusCode::OK,
            Json(GrammarResponse {
                rating: parsed.rating,
                tier: parsed.tier(),
                feedback: parsed.feedback,
                status: parsed.status,
            }),
        )),
        TaskOutput::Translation(_) => bail_service!(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Grammar check produced a translation"
        ),
    }
}

/// Builds the command string the way a presentation layer would for one of its buttons.
async fn run_task(state: &AppState, task: TaskKind, input: &str) -> ServiceResult<TaskResult> {
    if input.trim().is_empty() {
        bail_service!(StatusCode::BAD_REQUEST, "Input must not be empty");
    }
    run_command(state, format!("{} {}", task.keyword(), input)).await
}

async fn run_command(state: &AppState, command: String) -> ServiceResult<TaskResult> {
    let orchestrator = state.orchestrator.clone();
    let result = task::spawn_blocking(move || {
        let mut orchestrator = orchestrator.lock();
        orchestrator.handle(&command)
    })
    .await??;
    Ok(result)
}
