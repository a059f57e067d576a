pub mod backend;
pub mod chat_template;
pub mod gguf_layout;
pub mod model_config;
pub mod models;
pub mod text_pipeline;

pub use backend::{BackendError, GenerationBackend, GenerationRequest};
pub use chat_template::ChatTemplate;
