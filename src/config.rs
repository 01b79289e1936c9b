use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Two settings that constrain each other were given incompatible values.
    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

/// Default upper bound on upload size (25 MiB); uploads are held fully in memory.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
/// Default chunk budget in characters.
const DEFAULT_MAX_CHUNK_SIZE: usize = 512;
/// Default character overlap between consecutive chunks.
const DEFAULT_CHUNK_OVERLAP: usize = 64;
/// Default sentence-embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
/// Vector dimensionality of the default model.
const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Runtime configuration for the Docvec server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Maximum accepted upload size in bytes; larger bodies are rejected early.
    pub max_upload_bytes: usize,
    /// Upper bound on chunk length in characters.
    pub max_chunk_size: usize,
    /// Characters shared between consecutive chunks; must stay below the chunk size.
    pub chunk_overlap: usize,
    /// Sentence-embedding model identifier (Hugging Face repo name).
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Directory where model weights and tokenizer files are cached.
    pub embedding_cache_dir: PathBuf,
    /// How tabular files are turned into text segments.
    pub tabular_segmenting: TabularSegmenting,
    /// Language hint passed to the OCR engine.
    pub ocr_language: String,
}

/// Granularity used when converting tabular data to text segments.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TabularSegmenting {
    /// Each data row becomes one segment of `header: value` pairs.
    Row,
    /// Each sheet (or the whole CSV) becomes one segment.
    Sheet,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            server_port: parse_optional("SERVER_PORT")?,
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            max_chunk_size: parse_optional("MAX_CHUNK_SIZE")?.unwrap_or(DEFAULT_MAX_CHUNK_SIZE),
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: parse_optional("EMBEDDING_DIMENSION")?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            embedding_cache_dir: load_env_optional("EMBEDDING_CACHE_DIR")
                .map_or_else(|| PathBuf::from("models"), PathBuf::from),
            tabular_segmenting: load_env_optional("TABULAR_SEGMENTING")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("TABULAR_SEGMENTING".into()))
                })
                .transpose()?
                .unwrap_or(TabularSegmenting::Row),
            ocr_language: load_env_optional("OCR_LANGUAGE").unwrap_or_else(|| "eng".to_string()),
        };

        if config.max_chunk_size == 0 {
            return Err(ConfigError::InvalidValue("MAX_CHUNK_SIZE".into()));
        }
        if config.chunk_overlap >= config.max_chunk_size {
            return Err(ConfigError::Incompatible(
                "CHUNK_OVERLAP must be smaller than MAX_CHUNK_SIZE".into(),
            ));
        }
        if config.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }

        Ok(config)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for TabularSegmenting {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "row" => Ok(Self::Row),
            "sheet" => Ok(Self::Sheet),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        max_upload_bytes = config.max_upload_bytes,
        max_chunk_size = config.max_chunk_size,
        chunk_overlap = config.chunk_overlap,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::TabularSegmenting;

    #[test]
    fn tabular_segmenting_parses_known_modes() {
        assert_eq!("row".parse(), Ok(TabularSegmenting::Row));
        assert_eq!("SHEET".parse(), Ok(TabularSegmenting::Sheet));
        assert_eq!("cell".parse::<TabularSegmenting>(), Err(()));
    }
}
