pub mod settings;
pub mod validation;

pub use settings::{
    FileConfig, IndexConfig, LlmConfig, LlmProviderKind, Metric, PromptStyle, Secret, Settings,
};
