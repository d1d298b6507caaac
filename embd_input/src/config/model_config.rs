use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{ConfigError, GenerationConfig, OneOrMany};

/// Contents of `config.json` in a model folder.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub embedding_width: usize,
    pub context_length: usize,
    pub seed: Option<u64>,
    pub bos_token_id: Option<u32>,
    pub eos_token_id: Option<OneOrMany<u32>>,
    #[serde(default)]
    pub generation_config: GenerationConfig,
}

impl ModelConfig {
    /// Reads `config.json`, then lets an optional `generation_config.json`
    /// replace the embedded generation defaults.
    pub fn load(model_path: &Path) -> Result<Self, ConfigError> {
        let config_path = model_path.join("config.json");
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let mut config: ModelConfig = Self::read_file_as_struct(&config_path)?;

        let generation_config_path = model_path.join("generation_config.json");
        if generation_config_path.exists() {
            config.generation_config =
                Self::read_file_as_struct(&generation_config_path)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("vocab_size", self.vocab_size),
            ("embedding_width", self.embedding_width),
            ("context_length", self.context_length),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: String::from("must be greater than zero"),
                });
            }
        }
        if let Some(bos_token_id) = self.bos_token_id {
            if bos_token_id as usize >= self.vocab_size {
                return Err(ConfigError::InvalidValue {
                    field: "bos_token_id",
                    reason: format!(
                        "{} is outside of vocabulary of size {}",
                        bos_token_id, self.vocab_size
                    ),
                });
            }
        }
        Ok(())
    }

    /// End-of-sequence ids from both `eos_token_id` and the generation
    /// config's stop tokens, without duplicates.
    pub fn stop_token_ids(&self) -> Vec<u32> {
        let mut tokens: Vec<u32> = self
            .eos_token_id
            .as_ref()
            .map(|value| value.as_slice().to_vec())
            .unwrap_or_default();
        for token in &self.generation_config.stop_token_ids {
            if !tokens.contains(token) {
                tokens.push(*token);
            }
        }
        tokens
    }

    fn read_file_as_struct<T: DeserializeOwned>(
        path: &PathBuf
    ) -> Result<T, ConfigError> {
        let file = File::open(path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(
        dir: &Path,
        name: &str,
        contents: &str,
    ) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_load_with_generation_override() {
        let dir = tempfile::TempDir::new().unwrap();
        write(
            dir.path(),
            "config.json",
            r#"{
                "vocab_size": 32,
                "embedding_width": 8,
                "context_length": 128,
                "bos_token_id": 1,
                "eos_token_id": [2, 3],
                "generation_config": { "temperature": 0.5 }
            }"#,
        );
        write(
            dir.path(),
            "generation_config.json",
            r#"{ "stop_token_ids": [3, 4], "top_k": 5 }"#,
        );

        let config = ModelConfig::load(dir.path()).unwrap();
        assert_eq!(config.embedding_width, 8);
        assert_eq!(config.generation_config.top_k, Some(5));
        assert_eq!(config.generation_config.temperature, None);
        assert_eq!(config.stop_token_ids(), vec![2, 3, 4]);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = ModelConfig::load(dir.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let dir = tempfile::TempDir::new().unwrap();
        write(
            dir.path(),
            "config.json",
            r#"{ "vocab_size": 32, "embedding_width": 0, "context_length": 8 }"#,
        );
        let result = ModelConfig::load(dir.path());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "embedding_width",
                ..
            })
        ));
    }

    #[test]
    fn test_single_eos_value() {
        let config: ModelConfig = serde_json::from_str(
            r#"{ "vocab_size": 4, "embedding_width": 2, "context_length": 8, "eos_token_id": 3 }"#,
        )
        .unwrap();
        assert_eq!(config.stop_token_ids(), vec![3]);
    }
}
