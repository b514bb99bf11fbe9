//! Environment variable overrides for configuration.

use std::env;

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables use the `RFP_` prefix with double underscores
    /// separating nested keys (e.g., `RFP_LLM__API_KEY`).
    pub(super) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("RFP_LLM__PROVIDER") {
            self.llm.provider = val;
        }
        if let Ok(val) = env::var("RFP_LLM__API_KEY") {
            self.llm.api_key = Some(val);
        }
        if let Ok(val) = env::var("RFP_LLM__MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = env::var("RFP_LLM__BASE_URL") {
            self.llm.base_url = Some(val);
        }
        if let Ok(val) = env::var("RFP_LLM__MAX_TOKENS") {
            self.llm.max_tokens = parse_env_u32("RFP_LLM__MAX_TOKENS", &val)?;
        }

        if let Ok(val) = env::var("RFP_EMBEDDING__PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = env::var("RFP_EMBEDDING__API_KEY") {
            self.embedding.api_key = Some(val);
        }
        if let Ok(val) = env::var("RFP_EMBEDDING__MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = env::var("RFP_EMBEDDING__BASE_URL") {
            self.embedding.base_url = Some(val);
        }
        if let Ok(val) = env::var("RFP_EMBEDDING__DIMENSION") {
            self.embedding.dimension = parse_env_usize("RFP_EMBEDDING__DIMENSION", &val)?;
        }

        if let Ok(val) = env::var("RFP_BLOB__ENDPOINT") {
            self.blob.endpoint = val;
        }
        if let Ok(val) = env::var("RFP_BLOB__ACCESS_KEY") {
            self.blob.access_key = Some(val);
        }
        if let Ok(val) = env::var("RFP_BLOB__SECRET_KEY") {
            self.blob.secret_key = Some(val);
        }
        if let Ok(val) = env::var("RFP_BLOB__BUCKET") {
            self.blob.bucket = val;
        }
        if let Ok(val) = env::var("RFP_BLOB__SECURE") {
            self.blob.secure = parse_env_bool("RFP_BLOB__SECURE", &val)?;
        }
        if let Ok(val) = env::var("RFP_BLOB__MAX_UPLOAD_SIZE_MB") {
            self.blob.max_upload_size_mb =
                parse_env_u32("RFP_BLOB__MAX_UPLOAD_SIZE_MB", &val)?;
        }

        if let Ok(val) = env::var("RFP_PROCESSING__MAX_CHUNK_TOKENS") {
            self.processing.max_chunk_tokens =
                parse_env_usize("RFP_PROCESSING__MAX_CHUNK_TOKENS", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__CHUNK_OVERLAP_TOKENS") {
            self.processing.chunk_overlap_tokens =
                parse_env_usize("RFP_PROCESSING__CHUNK_OVERLAP_TOKENS", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__CONFIDENCE_THRESHOLD") {
            self.processing.confidence_threshold =
                parse_env_f32("RFP_PROCESSING__CONFIDENCE_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__DEDUP_SIMILARITY_THRESHOLD") {
            self.processing.dedup_similarity_threshold =
                parse_env_f32("RFP_PROCESSING__DEDUP_SIMILARITY_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__RETRIEVAL_SIMILARITY_CUTOFF") {
            self.processing.retrieval_similarity_cutoff =
                parse_env_f32("RFP_PROCESSING__RETRIEVAL_SIMILARITY_CUTOFF", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__RETRIEVAL_TOP_K") {
            self.processing.retrieval_top_k =
                parse_env_usize("RFP_PROCESSING__RETRIEVAL_TOP_K", &val)?;
        }
        if let Ok(val) = env::var("RFP_PROCESSING__ANSWER_BATCH_SIZE") {
            self.processing.answer_batch_size =
                parse_env_usize("RFP_PROCESSING__ANSWER_BATCH_SIZE", &val)?;
        }

        if let Ok(val) = env::var("RFP_STORAGE__DB_PATH") {
            self.storage.db_path = val;
        }

        if let Ok(val) = env::var("RFP_LOGGING__FILTER") {
            self.logging.filter = Some(val);
        }

        Ok(())
    }
}

/// Parse an environment variable value as `u32`.
pub(super) fn parse_env_u32(var_name: &str, val: &str) -> Result<u32, ConfigError> {
    val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid u32"),
    })
}

/// Parse an environment variable value as `usize`.
pub(super) fn parse_env_usize(var_name: &str, val: &str) -> Result<usize, ConfigError> {
    val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid usize"),
    })
}

/// Parse an environment variable value as `f32`.
pub(super) fn parse_env_f32(var_name: &str, val: &str) -> Result<f32, ConfigError> {
    val.parse::<f32>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid f32"),
    })
}

/// Parse an environment variable value as a boolean.
///
/// Accepts: `true`, `false`, `1`, `0`, `yes`, `no` (case-insensitive).
pub(super) fn parse_env_bool(var_name: &str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: var_name.to_string(),
            message: format!("'{val}' is not a valid boolean (use true/false/1/0/yes/no)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_bool_accepts_common_spellings() {
        assert!(parse_env_bool("X", "true").unwrap());
        assert!(parse_env_bool("X", "1").unwrap());
        assert!(!parse_env_bool("X", "no").unwrap());
        assert!(parse_env_bool("X", "nope").is_err());
    }
}
