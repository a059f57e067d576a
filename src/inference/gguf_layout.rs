//! Presents llama-family GGUF files under the `llama.*` layout read by `quantized_llama`.
//!
//! llama.cpp exports architectures such as EXAONE with their own metadata prefix
//! (`exaone.block_count`, ...) while the tensor names follow the llama layout.

use std::collections::HashMap;

use candle_core::quantized::gguf_file::{Content, TensorInfo, Value};
use tracing::debug;

const ARCHITECTURE_KEY: &str = "general.architecture";
const LLAMA: &str = "llama";

/// Rewrites `content` in place so `ModelWeights::from_gguf` can read it.
pub fn into_llama_layout(content: &mut Content) {
    if let Some(architecture) = rename_architecture_keys(&mut content.metadata) {
        debug!(architecture, "mapped gguf metadata to the llama layout");
    }
    fill_rope_dimension(&mut content.metadata);
    tie_output_embeddings(&mut content.tensor_infos);
}

/// Moves every `<arch>.` key to `llama.`, returning the original architecture when it differed.
fn rename_architecture_keys(metadata: &mut HashMap<String, Value>) -> Option<String> {
    let architecture = match metadata.get(ARCHITECTURE_KEY) {
        Some(Value::String(architecture)) if architecture != LLAMA => architecture.clone(),
        _ => return None,
    };
    let prefix = format!("{architecture}.");

    let keys: Vec<String> = metadata
        .keys()
        .filter(|key| key.starts_with(&prefix))
        .cloned()
        .collect();
    for key in keys {
        if let Some(value) = metadata.remove(&key) {
            metadata.insert(format!("{LLAMA}.{}", &key[prefix.len()..]), value);
        }
    }
    Some(architecture)
}

/// Some exports omit the rope dimension, which then equals the head dimension.
fn fill_rope_dimension(metadata: &mut HashMap<String, Value>) {
    let key = format!("{LLAMA}.rope.dimension_count");
    if metadata.contains_key(&key) {
        return;
    }
    let embedding = metadata
        .get(&format!("{LLAMA}.embedding_length"))
        .and_then(|v| v.to_u32().ok());
    let heads = metadata
        .get(&format!("{LLAMA}.attention.head_count"))
        .and_then(|v| v.to_u32().ok());
    if let (Some(embedding), Some(heads)) = (embedding, heads) {
        if heads > 0 {
            metadata.insert(key, Value::U32(embedding / heads));
        }
    }
}

/// Models with tied embeddings ship no `output.weight`; the token embedding stands in for it.
fn tie_output_embeddings(tensor_infos: &mut HashMap<String, TensorInfo>) {
    if tensor_infos.contains_key("output.weight") {
        return;
    }
    let Some(embedding) = tensor_infos.get("token_embd.weight") else {
        return;
    };
    let tied = TensorInfo {
        ggml_dtype: embedding.ggml_dtype,
        shape: embedding.shape.clone(),
        offset: embedding.offset,
    };
    debug!("output.weight missing, using tied token embeddings");
    tensor_infos.insert("output.weight".to_string(), tied);
}

#[cfg(test)]
mod tests {
    use candle_core::quantized::GgmlDType;
    use candle_core::Shape;

    use super::*;

    fn exaone_metadata() -> HashMap<String, Value> {
        HashMap::from([
            (ARCHITECTURE_KEY.to_string(), Value::String("exaone".into())),
            ("general.name".to_string(), Value::String("EXAONE 3.5".into())),
            ("exaone.block_count".to_string(), Value::U32(30)),
            ("exaone.embedding_length".to_string(), Value::U32(2560)),
            ("exaone.attention.head_count".to_string(), Value::U32(32)),
            ("exaone.attention.head_count_kv".to_string(), Value::U32(8)),
            (
                "exaone.attention.layer_norm_rms_epsilon".to_string(),
                Value::F32(1e-5),
            ),
        ])
    }

    fn tensor(offset: u64) -> TensorInfo {
        TensorInfo {
            ggml_dtype: GgmlDType::Q4K,
            shape: Shape::from((102400, 2560)),
            offset,
        }
    }

    #[test]
    fn exaone_keys_move_to_llama() {
        let mut metadata = exaone_metadata();
        assert_eq!(
            rename_architecture_keys(&mut metadata).as_deref(),
            Some("exaone")
        );

        assert_eq!(metadata["llama.block_count"].to_u32().unwrap(), 30);
        assert_eq!(metadata["llama.attention.head_count"].to_u32().unwrap(), 32);
        assert_eq!(metadata["llama.attention.head_count_kv"].to_u32().unwrap(), 8);
        assert!(metadata.contains_key("llama.attention.layer_norm_rms_epsilon"));
        assert!(metadata.keys().all(|key| !key.starts_with("exaone.")));
        assert!(metadata.contains_key("general.name"));
    }

    #[test]
    fn llama_files_are_untouched() {
        let mut metadata = HashMap::from([
            (ARCHITECTURE_KEY.to_string(), Value::String("llama".into())),
            ("llama.block_count".to_string(), Value::U32(22)),
        ]);
        assert_eq!(rename_architecture_keys(&mut metadata), None);
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn rope_dimension_defaults_to_head_dimension() {
        let mut metadata = exaone_metadata();
        rename_architecture_keys(&mut metadata);
        fill_rope_dimension(&mut metadata);
        assert_eq!(metadata["llama.rope.dimension_count"].to_u32().unwrap(), 80);

        metadata.insert("llama.rope.dimension_count".into(), Value::U32(64));
        fill_rope_dimension(&mut metadata);
        assert_eq!(metadata["llama.rope.dimension_count"].to_u32().unwrap(), 64);
    }

    #[test]
    fn missing_output_reuses_token_embedding() {
        let mut tensors = HashMap::from([("token_embd.weight".to_string(), tensor(4096))]);
        tie_output_embeddings(&mut tensors);
        let output = &tensors["output.weight"];
        assert_eq!(output.offset, 4096);
        assert_eq!(output.shape, Shape::from((102400, 2560)));

        let mut untied = HashMap::from([
            ("token_embd.weight".to_string(), tensor(0)),
            ("output.weight".to_string(), tensor(8192)),
        ]);
        tie_output_embeddings(&mut untied);
        assert_eq!(untied["output.weight"].offset, 8192);
    }
}
