use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use crate::config::Config;
use crate::inference::backend::{BackendError, GenerationBackend, GenerationRequest};
use crate::inference::chat_template::ChatTemplate;
use crate::inference::model_config::GeneralModelConfig;
use crate::inference::models::model::ModelBase;
use crate::inference::text_pipeline::TextGeneratorPipeline;
use crate::task::TaskKind;

// EXAONE GGUF exports use llama tensor names under their own metadata prefix, see `gguf_layout`
pub struct ExaoneModel {
    base: ModelBase,
    template: ChatTemplate,
    generator_pipeline: TextGeneratorPipeline,
}

impl ExaoneModel {
    #[tracing::instrument(
        level = "info",
        skip(api, base, tokenizer_filename, gguf_filename, general_model_config)
    )]
    pub fn new(
        api: &Api,
        base: ModelBase,
        tokenizer_filename: &str,
        gguf_filename: &str,
        template: ChatTemplate,
        general_model_config: GeneralModelConfig,
    ) -> Result<Self, BackendError> {
        let repo = api.repo(Repo::with_revision(
            base.repo_id.clone(),
            RepoType::Model,
            base.repo_revision.clone(),
        ));
        let tokenizer_repo = api.repo(Repo::new(base.tokenizer_repo_id.clone(), RepoType::Model));

        let gguf_file = repo
            .get(gguf_filename)
            .map_err(|e| BackendError::Load(e.into()))?;
        let tokenizer_file = tokenizer_repo
            .get(tokenizer_filename)
            .map_err(|e| BackendError::Load(e.into()))?;
        info!(weights = %gguf_file.display(), tokenizer = %tokenizer_file.display(), "loading model");

        let generator_pipeline = TextGeneratorPipeline::with_quantized_gguf(
            &tokenizer_file,
            &gguf_file,
            general_model_config,
        )?;

        Ok(Self {
            base,
            template,
            generator_pipeline,
        })
    }

    /// Downloads (or reuses the cached) weights and tokenizer named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let api = Api::new().map_err(|e| BackendError::Load(e.into()))?;
        let base = ModelBase {
            name: "EXAONE 3.5 Instruct".into(),
            license: "EXAONE AI Model License 1.1 - NC".into(),
            tasks: TaskKind::ALL.to_vec(),
            repo_id: config.model_repo.clone(),
            repo_revision: config.model_revision.clone(),
            tokenizer_repo_id: config.tokenizer_repo.clone(),
        };

        Self::new(
            &api,
            base,
            &config.tokenizer_file,
            &config.model_file,
            config.chat_template,
            config.model_config(),
        )
    }

    pub fn base(&self) -> &ModelBase {
        &self.base
    }
}

impl GenerationBackend for ExaoneModel {
    fn eos_marker(&self) -> &str {
        self.template.eos_marker()
    }

    #[tracing::instrument(level = "info", skip(self, request), fields(model = %self.base.name))]
    fn generate(&mut self, request: &GenerationRequest) -> Result<String, BackendError> {
        let prompt = self.template.render(&request.messages)?;
        let (output, inference_time) = self
            .generator_pipeline
            .generate(
                &prompt,
                request.max_new_tokens,
                &request.sampling,
                &request.eos_marker,
            )?;

        debug!(inference_time, "model ran on cpu");
        Ok(output.trim().to_string())
    }
}
