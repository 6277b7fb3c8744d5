//! Configuration management for docqa.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.docqa/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("ollama" or "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Question-answering settings
    pub qa: QaSettings,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,
}

/// Settings that drive prompt assembly and answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QaSettings {
    /// "stuff" or "refine"
    pub chain_type: String,

    /// "json" (structured) or "text" (plain)
    pub response_format: String,

    /// Total tokens the model accepts (prompt + completion)
    pub context_size: u32,

    /// Tokens reserved for the completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Stop sequences forwarded to the model
    pub stop: Vec<String>,

    /// How many candidates the retriever ranks
    pub fetch_depth: u32,

    /// How many ranked candidates the retriever forwards
    pub forward_count: u32,

    /// Literal answer returned instead of calling the model
    pub hard_coded_response: Option<String>,

    /// HuggingFace `tokenizer.json` used to count prompt tokens; relative
    /// paths resolve against the workspace
    pub tokenizer: Option<PathBuf>,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            chain_type: "refine".to_string(),
            response_format: "json".to_string(),
            context_size: 2048,
            max_tokens: 256,
            temperature: 0.8,
            stop: Vec::new(),
            fetch_depth: 25,
            forward_count: 3,
            hard_coded_response: None,
            tokenizer: None,
        }
    }
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
    Mock {
        responses: Vec<String>,
    },
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    qa: Option<QaSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            log_level: None,
            verbose: false,
            no_color: false,
            qa: QaSettings::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and
    /// environment variables.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`, `DOCQA_CONFIG`
    /// - `DOCQA_PROVIDER`, `DOCQA_MODEL`, `DOCQA_ENDPOINT`
    /// - `DOCQA_CHAIN_TYPE`, `DOCQA_RESPONSE_FORMAT`
    /// - `DOCQA_CONTEXT_SIZE`, `DOCQA_MAX_TOKENS`, `DOCQA_TEMPERATURE`, `DOCQA_STOP`
    /// - `DOCQA_FETCH_DEPTH`, `DOCQA_FORWARD_COUNT`
    /// - `DOCQA_HARD_CODED_RESPONSE`, `DOCQA_TOKENIZER`
    ///
    /// An empty `DOCQA_HARD_CODED_RESPONSE` or `DOCQA_TOKENIZER` unsets it.
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use docqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Chain: {}", config.qa.chain_type);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_for(None, None)
    }

    /// Like [`AppConfig::load`], but with the workspace and config file
    /// chosen up front (e.g. from command-line flags) so the right YAML file
    /// is read.
    pub fn load_for(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("DOCQA_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("DOCQA_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".docqa/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(mut qa) = config_file.qa {
            qa.hard_coded_response = qa.hard_coded_response.and_then(non_empty);
            result.qa = qa;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(ProviderConfig::Ollama {
                endpoint, model, ..
            }) = llm.providers.get(&llm.active_provider)
            {
                result.model = model.clone();
                result.endpoint = Some(endpoint.clone());
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply environment overrides read through `lookup`.
    fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("DOCQA_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("DOCQA_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = lookup("DOCQA_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }

        if let Some(chain_type) = lookup("DOCQA_CHAIN_TYPE") {
            self.qa.chain_type = chain_type;
        }
        if let Some(format) = lookup("DOCQA_RESPONSE_FORMAT") {
            self.qa.response_format = format;
        }
        if let Some(value) = lookup("DOCQA_CONTEXT_SIZE") {
            self.qa.context_size = parse_env("DOCQA_CONTEXT_SIZE", &value)?;
        }
        if let Some(value) = lookup("DOCQA_MAX_TOKENS") {
            self.qa.max_tokens = parse_env("DOCQA_MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("DOCQA_TEMPERATURE") {
            self.qa.temperature = parse_env("DOCQA_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("DOCQA_STOP") {
            self.qa.stop = split_stop_sequences(&value);
        }
        if let Some(value) = lookup("DOCQA_FETCH_DEPTH") {
            self.qa.fetch_depth = parse_env("DOCQA_FETCH_DEPTH", &value)?;
        }
        if let Some(value) = lookup("DOCQA_FORWARD_COUNT") {
            self.qa.forward_count = parse_env("DOCQA_FORWARD_COUNT", &value)?;
        }
        if let Some(response) = lookup("DOCQA_HARD_CODED_RESPONSE") {
            self.qa.hard_coded_response = non_empty(response);
        }
        if let Some(path) = lookup("DOCQA_TOKENIZER") {
            self.qa.tokenizer = non_empty(path).map(PathBuf::from);
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }
        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(chain_type) = overrides.chain_type {
            self.qa.chain_type = chain_type;
        }
        if let Some(format) = overrides.response_format {
            self.qa.response_format = format;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Tokenizer file for prompt token counts, resolved against the workspace.
    pub fn tokenizer_path(&self) -> Option<PathBuf> {
        self.qa.tokenizer.as_ref().map(|path| self.workspace.join(path))
    }

    /// Get the active provider configuration.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Validate configuration for the active provider and QA settings.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.qa.max_tokens >= self.qa.context_size {
            return Err(AppError::Config(format!(
                "maxTokens ({}) must be smaller than contextSize ({})",
                self.qa.max_tokens, self.qa.context_size
            )));
        }

        if self.qa.fetch_depth == 0 || self.qa.forward_count == 0 {
            return Err(AppError::Config(
                "fetchDepth and forwardCount must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub chain_type: Option<String>,
    pub response_format: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

fn parse_env<T>(key: &str, value: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: {} ({})", key, value, e)))
}

/// Blank settings count as unset.
fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn split_stop_sequences(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.qa.chain_type, "refine");
        assert_eq!(config.qa.response_format, "json");
        assert_eq!(config.qa.fetch_depth, 25);
        assert_eq!(config.qa.forward_count, 3);
        assert!(config.qa.hard_coded_response.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_from(&[
                ("DOCQA_CHAIN_TYPE", "stuff"),
                ("DOCQA_CONTEXT_SIZE", "4096"),
                ("DOCQA_MAX_TOKENS", "512"),
                ("DOCQA_STOP", "[STOP],###"),
                ("DOCQA_HARD_CODED_RESPONSE", "canned"),
            ]))
            .unwrap();

        assert_eq!(config.qa.chain_type, "stuff");
        assert_eq!(config.qa.context_size, 4096);
        assert_eq!(config.qa.max_tokens, 512);
        assert_eq!(config.qa.stop, vec!["[STOP]", "###"]);
        assert_eq!(config.qa.hard_coded_response.as_deref(), Some("canned"));
    }

    #[test]
    fn test_blank_hard_coded_response_is_unset() {
        let mut config = AppConfig::default();
        config.qa.hard_coded_response = Some("from yaml".to_string());
        config
            .apply_env(env_from(&[("DOCQA_HARD_CODED_RESPONSE", "")]))
            .unwrap();
        assert!(config.qa.hard_coded_response.is_none());

        config
            .apply_env(env_from(&[("DOCQA_HARD_CODED_RESPONSE", "  ")]))
            .unwrap();
        assert!(config.qa.hard_coded_response.is_none());
    }

    #[test]
    fn test_blank_hard_coded_response_in_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "qa:\n  hardCodedResponse: \"\"\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert!(merged.qa.hard_coded_response.is_none());
    }

    #[test]
    fn test_tokenizer_path() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/ws");
        assert!(config.tokenizer_path().is_none());

        config
            .apply_env(env_from(&[("DOCQA_TOKENIZER", "models/tokenizer.json")]))
            .unwrap();
        assert_eq!(
            config.tokenizer_path(),
            Some(PathBuf::from("/ws/models/tokenizer.json"))
        );

        config.apply_env(env_from(&[("DOCQA_TOKENIZER", "")])).unwrap();
        assert!(config.tokenizer_path().is_none());
    }

    #[test]
    fn test_env_invalid_number() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env_from(&[("DOCQA_CONTEXT_SIZE", "lots")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://gpu-box:11434"
      model: mistral
      timeout: 60
qa:
  chainType: stuff
  responseFormat: text
  contextSize: 1024
logging:
  level: debug
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.model, "mistral");
        assert_eq!(merged.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(merged.qa.chain_type, "stuff");
        assert_eq!(merged.qa.response_format, "text");
        assert_eq!(merged.qa.context_size, 1024);
        // Unspecified QA fields keep their defaults
        assert_eq!(merged.qa.max_tokens, 256);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_load_for_reads_workspace_config() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".docqa")).unwrap();
        fs::write(
            temp.path().join(".docqa/config.yaml"),
            "qa:\n  forwardCount: 7\n",
        )
        .unwrap();

        let config = AppConfig::load_for(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.qa.forward_count, 7);
    }

    #[test]
    fn test_load_for_missing_workspace() {
        let result = AppConfig::load_for(Some(PathBuf::from("/nonexistent/docqa-ws")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(CliOverrides {
            provider: Some("mock".to_string()),
            chain_type: Some("stuff".to_string()),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(overridden.provider, "mock");
        assert_eq!(overridden.qa.chain_type, "stuff");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_budget() {
        let mut config = AppConfig::default();
        config.qa.max_tokens = config.qa.context_size;
        assert!(config.validate().is_err());

        config.qa.max_tokens = 128;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_hints() {
        let mut config = AppConfig::default();
        config.qa.forward_count = 0;
        assert!(config.validate().is_err());
    }
}
