use serde::{Deserialize, Serialize};

use crate::task::TaskKind;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelBase {
    /// The name of the model
    pub name: String,

    /// The license of the model
    pub license: String,

    /// The tasks the model is prompted for
    pub tasks: Vec<TaskKind>,

    /// The id of the repository holding the GGUF weights
    pub repo_id: String,

    /// The revision of the weights repository
    pub repo_revision: String,

    /// The id of the repository holding the tokenizer
    pub tokenizer_repo_id: String,
}
