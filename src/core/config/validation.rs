use super::settings::Settings;
use crate::core::errors::ConfigError;

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_non_empty("index.name", &settings.index.name)?;
    validate_non_empty("index.cloud", &settings.index.cloud)?;
    validate_non_empty("index.control_plane_url", &settings.index.control_plane_url)?;
    validate_usize_field("index.dimension", settings.index.dimension, 1, 20_000)?;
    validate_usize_field(
        "index.upsert_batch_size",
        settings.index.upsert_batch_size,
        1,
        1_000,
    )?;
    validate_usize_field("retrieval.top_k", settings.retrieval.top_k, 1, 100)?;
    validate_usize_field("ingest.chunk_size", settings.ingest.chunk_size, 1, 1_000_000)?;
    validate_usize_field(
        "ingest.embed_batch_size",
        settings.ingest.embed_batch_size,
        1,
        10_000,
    )?;
    if settings.ingest.chunk_overlap >= settings.ingest.chunk_size {
        return Err(ConfigError::Invalid {
            field: "ingest.chunk_overlap",
            reason: format!(
                "must be smaller than ingest.chunk_size ({})",
                settings.ingest.chunk_size
            ),
        });
    }
    validate_usize_field(
        "server.max_question_length",
        settings.server.max_question_length,
        1,
        10_000_000,
    )?;
    for origin in &settings.server.cors_allowed_origins {
        validate_non_empty("server.cors_allowed_origins", origin)?;
    }
    validate_non_empty("llm.model", &settings.llm.model)?;
    validate_non_empty("llm.base_url", &settings.llm.base_url)?;
    if !(0.0..=2.0).contains(&settings.llm.temperature) {
        return Err(ConfigError::Invalid {
            field: "llm.temperature",
            reason: "must be between 0.0 and 2.0".to_string(),
        });
    }
    if settings.llm.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "llm.timeout_secs",
            reason: "must be at least 1".to_string(),
        });
    }
    if settings.llm.max_tokens == Some(0) {
        return Err(ConfigError::Invalid {
            field: "llm.max_tokens",
            reason: "must be at least 1 when set".to_string(),
        });
    }
    Ok(())
}

fn validate_usize_field(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be between {} and {}", min, max),
        });
    }
    Ok(())
}

fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "value cannot be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::{
        FileConfig, HUGGINGFACEHUB_API_TOKEN, PINECONE_API_KEY,
    };

    fn base() -> Settings {
        Settings::from_sources(FileConfig::default(), |key| match key {
            PINECONE_API_KEY | HUGGINGFACEHUB_API_TOKEN => Some("x".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_settings(&base()).is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut settings = base();
        settings.ingest.chunk_overlap = settings.ingest.chunk_size;
        let err = validate_settings(&settings).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "ingest.chunk_overlap",
                ..
            }
        ));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut settings = base();
        settings.retrieval.top_k = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let mut settings = base();
        settings.llm.temperature = 3.5;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut settings = base();
        settings.llm.max_tokens = Some(0);
        assert!(matches!(
            validate_settings(&settings).unwrap_err(),
            ConfigError::Invalid {
                field: "llm.max_tokens",
                ..
            }
        ));
        settings.llm.max_tokens = Some(512);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn blank_origin_is_rejected() {
        let mut settings = base();
        settings.server.cors_allowed_origins = vec![" ".to_string()];
        assert!(validate_settings(&settings).is_err());
    }
}
