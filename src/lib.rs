pub mod config;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod server;
pub mod task;
pub mod telemetry;

pub use config::Config;
pub use error::{HttpErrorResponse, ServiceError, ServiceResult};
pub use inference::{BackendError, GenerationBackend, GenerationRequest};
pub use orchestrator::{Orchestrator, OrchestratorError, TaskOutput, TaskResult};
pub use server::{build_router, AppState};
pub use task::{
    Message, MatchPolicy, ParseStatus, ParsedFeedback, PromptBuilder, RatingTier, ResponseParser,
    Role, TaskKind, TaskRegistry, TaskSpec,
};
