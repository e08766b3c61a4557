//! Configuration for the analysis service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload and job store locations
    pub storage: StorageConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Background processing configuration
    pub processing: ProcessingConfig,
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file; missing sections use defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Default config file location (`<config dir>/findoc/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("findoc").join("config.toml"))
    }

    /// Apply `FINDOC_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FINDOC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FINDOC_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("FINDOC_PORT is not a port: {}", port)))?;
        }
        if let Some(dir) = lookup("FINDOC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(max_chars) = lookup("FINDOC_MAX_CHARS") {
            self.processing.max_chars = max_chars.parse().map_err(|_| {
                Error::Config(format!("FINDOC_MAX_CHARS is not a number: {}", max_chars))
            })?;
        }
        if let Some(model) = lookup("FINDOC_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("FINDOC_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        Ok(())
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.processing.max_chars == 0 {
            return Err(Error::Config("processing.max_chars must be positive".to_string()));
        }
        if self.processing.workers == 0 {
            return Err(Error::Config("processing.workers must be positive".to_string()));
        }
        if self.processing.queue_capacity == 0 {
            return Err(Error::Config("processing.queue_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Where uploads and the job store live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for uploaded documents
    pub data_dir: PathBuf,
    /// SQLite job store (default: `<data_dir>/analysis.db`)
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved job store path
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("analysis.db"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_path: None,
        }
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions (Groq, OpenAI, vLLM)
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub provider: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::OpenAi,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Character budget forwarded to the analysis engine
    pub max_chars: usize,
    /// Jobs processed concurrently
    pub workers: usize,
    /// Work items buffered before enqueue waits
    pub queue_capacity: usize,
    /// Upper bound for one analysis engine run in seconds
    pub engine_timeout_secs: u64,
    /// Remove stored uploads once their job is terminal
    pub delete_uploads: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_chars: 8000,
            workers: num_cpus::get().min(4),
            queue_capacity: 1000,
            engine_timeout_secs: 180,
            delete_uploads: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnalyzerConfig::from_toml(
            r#"
            [processing]
            max_chars = 4000

            [llm]
            provider = "ollama"
            base_url = "http://localhost:11434"
            "#,
        )
        .unwrap();

        assert_eq!(config.processing.max_chars, 4000);
        assert_eq!(config.processing.queue_capacity, 1000);
        assert_eq!(config.llm.provider, LlmBackend::Ollama);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.database_path(), PathBuf::from("data/analysis.db"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FINDOC_PORT", "9100"),
            ("FINDOC_DATA_DIR", "/tmp/findoc"),
            ("FINDOC_MAX_CHARS", "1200"),
        ]
        .into_iter()
        .collect();

        let mut config = AnalyzerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/findoc"));
        assert_eq!(config.processing.max_chars, 1200);
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = AnalyzerConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "FINDOC_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate() {
        let mut config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());

        config.processing.max_chars = 0;
        assert!(config.validate().is_err());
    }
}
