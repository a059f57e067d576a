/// Model-wide generation settings. Per-task sampling lives in the task specs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeneralModelConfig {
    /// Fixed seed for reproducible sampling, a fresh random seed per call when unset
    pub seed: Option<u64>,
    pub repeat_context_size: usize,
}
