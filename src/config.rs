use anyhow::Result;
use clap_serde_derive::ClapSerde;

use crate::inference::model_config::GeneralModelConfig;
use crate::inference::ChatTemplate;
use crate::task::MatchPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "LinguaRunner.toml";

#[derive(ClapSerde, Debug, Clone)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub address: String,

    /// The port the listener binds to
    #[default(25566)]
    #[arg(short, long, env)]
    pub port: u16,

    /// Hugging Face repository holding the GGUF weights
    #[default("LGAI-EXAONE/EXAONE-3.5-2.4B-Instruct-GGUF".to_string())]
    #[arg(long, env)]
    pub model_repo: String,

    /// Revision of the weights repository
    #[default("main".to_string())]
    #[arg(long, env)]
    pub model_revision: String,

    /// GGUF file inside the weights repository
    #[default("EXAONE-3.5-2.4B-Instruct-Q4_K_M.gguf".to_string())]
    #[arg(long, env)]
    pub model_file: String,

    /// Hugging Face repository holding the tokenizer
    #[default("LGAI-EXAONE/EXAONE-3.5-2.4B-Instruct".to_string())]
    #[arg(long, env)]
    pub tokenizer_repo: String,

    /// Tokenizer file inside the tokenizer repository
    #[default("tokenizer.json".to_string())]
    #[arg(long, env)]
    pub tokenizer_file: String,

    /// Prompt layout expected by the model
    #[default(ChatTemplate::Exaone)]
    #[arg(long, env, value_enum)]
    pub chat_template: ChatTemplate,

    /// Sampling seed, 0 draws a fresh random seed for every command
    #[default(0)]
    #[arg(long, env)]
    pub seed: u64,

    /// Number of trailing tokens the repetition penalty looks at
    #[default(64)]
    #[arg(long, env)]
    pub repeat_context_size: usize,

    /// How a command selects its task
    #[default(MatchPolicy::LeadingToken)]
    #[arg(long, env, value_enum)]
    pub match_policy: MatchPolicy,

    /// Directory for the log file
    #[default("log".to_string())]
    #[arg(long, env)]
    pub log_dir: String,

    /// Name of the log file inside the log directory
    #[default("app.log".to_string())]
    #[arg(long, env)]
    pub log_name: String,

    /// OTLP collector endpoint, traces and metrics are only exported when set
    #[default(String::new())]
    #[arg(long, env)]
    pub otlp_endpoint: String,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        let opt: <Config as ClapSerde>::Opt = toml::from_str(&str)?;
        Ok(Config::from(opt))
    }

    /// Like [`Config::from_toml`], but an unreadable file falls back to the defaults
    /// when `path` is the default location.
    pub fn load(path: &str) -> Result<Self> {
        match Self::from_toml(path) {
            Err(_) if path == DEFAULT_CONFIG_FILE => Ok(Config::default()),
            result => result,
        }
    }

    pub fn model_config(&self) -> GeneralModelConfig {
        GeneralModelConfig {
            seed: (self.seed != 0).then_some(self.seed),
            repeat_context_size: self.repeat_context_size,
        }
    }

    pub fn otlp_endpoint(&self) -> Option<&str> {
        (!self.otlp_endpoint.is_empty()).then_some(self.otlp_endpoint.as_str())
    }
}
