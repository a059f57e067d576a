use std::path::Path;

use candle_core::quantized::gguf_file;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use rand::random;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::inference::backend::BackendError;
use crate::inference::gguf_layout::into_llama_layout;
use crate::inference::model_config::GeneralModelConfig;
use crate::task::SamplingParams;

// Taken from
// https://github.com/huggingface/candle/blob/main/candle-examples/examples/quantized/main.rs
pub struct TextGeneratorPipeline {
    pub model: ModelWeights,
    pub device: Device,
    pub tokenizer: Tokenizer,
    pub repeat_context_size: usize,
    pub seed: Option<u64>,
}

impl TextGeneratorPipeline {
    pub fn with_quantized_gguf(
        tokenizer_file: &Path,
        gguf_file: &Path,
        config: GeneralModelConfig,
    ) -> Result<TextGeneratorPipeline, BackendError> {
        let device = Device::Cpu;
        let mut file =
            std::fs::File::open(gguf_file).map_err(|e| BackendError::Load(e.into()))?;
        let mut model_reader = gguf_file::Content::read(&mut file)
            .map_err(|e| BackendError::Load(e.with_path(gguf_file).into()))?;
        into_llama_layout(&mut model_reader);
        let model = ModelWeights::from_gguf(model_reader, &mut file, &device)
            .map_err(|e| BackendError::Load(e.into()))?;
        let tokenizer = Tokenizer::from_file(tokenizer_file)
            .map_err(|e| BackendError::Load(anyhow::anyhow!(e)))?;

        Ok(TextGeneratorPipeline {
            model,
            device,
            tokenizer,
            repeat_context_size: config.repeat_context_size,
            seed: config.seed,
        })
    }

    /// Returns the decoded continuation and the time spent generating, in seconds.
    pub fn generate(
        &mut self,
        prompt: &str,
        max_new_tokens: usize,
        sampling: &SamplingParams,
        eos_marker: &str,
    ) -> Result<(String, f64), BackendError> {
        let mut tokens = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| BackendError::Tokenizer(e.to_string()))?
            .get_ids()
            .to_vec();
        if tokens.is_empty() {
            return Err(BackendError::Tokenizer("prompt encodes to no tokens".into()));
        }
        let prompt_len = tokens.len();
        let eos_token = eos_token_id(&self.tokenizer, eos_marker)?;

        let mut logits_processor = LogitsProcessor::new(
            self.seed.unwrap_or_else(random),
            Some(sampling.temperature),
            Some(sampling.top_p),
        );

        let start_gen = std::time::Instant::now();
        for index in 0..max_new_tokens {
            let context_size = if index > 0 { 1 } else { tokens.len() };
            let start_pos = tokens.len().saturating_sub(context_size);
            let input = Tensor::new(&tokens[start_pos..], &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, start_pos)?;
            let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
            let logits = if (sampling.repeat_penalty - 1.).abs() < f32::EPSILON {
                logits
            } else {
                let start_at = tokens.len().saturating_sub(self.repeat_context_size);
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    sampling.repeat_penalty,
                    &tokens[start_at..],
                )?
            };

            let next_token = logits_processor.sample(&logits)?;
            if next_token == eos_token {
                break;
            }
            tokens.push(next_token);
        }

        let generated = &tokens[prompt_len..];
        debug!(tokens = generated.len(), "generation finished");
        let output = self
            .tokenizer
            .decode(generated, true)
            .map_err(|e| BackendError::Tokenizer(format!("cannot decode tokens: {e}")))?;

        Ok((output, start_gen.elapsed().as_secs_f64()))
    }
}

fn eos_token_id(tokenizer: &Tokenizer, eos_marker: &str) -> Result<u32, BackendError> {
    tokenizer
        .token_to_id(eos_marker)
        .ok_or_else(|| BackendError::Tokenizer(format!("cannot find the {eos_marker} token")))
}
