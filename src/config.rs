use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::handler::middleware::CompressionAlgorithm;
use crate::http::request::DEFAULT_MAX_BODY_SIZE;
use crate::http::{APPLICATION_JSON, TEXT_HTML};

/// Content type of the bodyless 404 / 405 replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorContentType {
    /// Echo the request's negotiated content type
    #[default]
    Negotiated,
    /// Always `text/html`
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompressionConfig {
    pub algorithm: CompressionAlgorithm,
    #[serde(default = "default_min_size")]
    pub min_size: usize,
}

fn default_min_size() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Accepted request content types, in the order they are advertised
    pub allowed_content_types: Vec<String>,
    pub error_content_type: ErrorContentType,
    pub max_body_size: usize,

    pub log_level: String,
    pub server_name: String,

    pub compression: Option<CompressionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_content_types: vec![APPLICATION_JSON.to_string(), TEXT_HTML.to_string()],
            error_content_type: ErrorContentType::Negotiated,
            max_body_size: DEFAULT_MAX_BODY_SIZE,

            log_level: "info".to_string(),
            server_name: format!("rustygate/{}", env!("CARGO_PKG_VERSION")),

            compression: None,
        }
    }
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when it is unreadable or invalid.
    pub fn from_file(path: &str) -> Self {
        let (config, err) = Self::load_or_default(path);
        if let Some(err) = err {
            warn!(path, error = %err, "falling back to default config");
        }
        config
    }

    /// Like [`AppConfig::from_file`], but hands the load error back instead
    /// of logging it, for callers that set up logging from the result.
    pub fn load_or_default(path: &str) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(err) => (AppConfig::default(), Some(err)),
        }
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<AppConfig>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_content_types.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        Ok(())
    }
}
