//! Configuration validation logic.

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Validate the configuration, returning all errors found (not just the first).
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        match self.llm.provider.as_str() {
            "anthropic" => {
                if self.llm.api_key.as_deref().unwrap_or("").is_empty() {
                    errors.push(ConfigError::MissingField {
                        field: "llm.api_key".to_string(),
                    });
                }
            }
            other => {
                errors.push(ConfigError::InvalidValue {
                    field: "llm.provider".to_string(),
                    message: format!("unsupported provider '{other}', expected 'anthropic'"),
                });
            }
        }

        match self.embedding.provider.as_str() {
            "voyage" => {
                if self.embedding.api_key.as_deref().unwrap_or("").is_empty() {
                    errors.push(ConfigError::MissingField {
                        field: "embedding.api_key".to_string(),
                    });
                }
            }
            other => {
                errors.push(ConfigError::InvalidValue {
                    field: "embedding.provider".to_string(),
                    message: format!("unsupported provider '{other}', expected 'voyage'"),
                });
            }
        }

        if self.processing.max_chunk_tokens == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "processing.max_chunk_tokens".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.processing.chunk_overlap_tokens >= self.processing.max_chunk_tokens {
            errors.push(ConfigError::InvalidValue {
                field: "processing.chunk_overlap_tokens".to_string(),
                message: "must be smaller than max_chunk_tokens".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.processing.confidence_threshold) {
            errors.push(ConfigError::InvalidValue {
                field: "processing.confidence_threshold".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "embedding.dimension".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
