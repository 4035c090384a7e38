//! Control-plane and LLM provider configuration.
//!
//! Built once at startup: defaults, then an optional YAML file, then the
//! environment. The resulting [`Config`] is passed by reference into the
//! HTTP and LLM clients; nothing below `main` reads the environment.

use std::path::Path;

use serde::Deserialize;

use crate::error::{FactoryError, FactoryResult};

pub const DEFAULT_FACTORY_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LLM_PROVIDER: &str = "ollama";
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Full runtime configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub factory: FactoryConfig,
    pub llm: LlmConfig,
}

/// Where the control plane lives and how to authenticate.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FACTORY_BASE_URL.into(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Chat-completion backend selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Provider tag (`ollama` or `openai`); validated when the client is built.
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Upper bound on one chat exchange.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.into(),
            base_url: DEFAULT_LLM_BASE_URL.into(),
            model: DEFAULT_LLM_MODEL.into(),
            api_key: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

/// On-disk YAML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    factory: FactoryFile,
    #[serde(default)]
    llm: LlmFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FactoryFile {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LlmFile {
    provider: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the process environment and an optional file.
    pub fn load(file: Option<&Path>) -> FactoryResult<Self> {
        Self::load_with(file, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] but with an injectable variable lookup.
    pub fn load_with<F>(file: Option<&Path>, lookup: F) -> FactoryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.normalize();
        Ok(config)
    }

    /// Parse a YAML config file on top of the defaults.
    pub fn from_yaml_file(path: &Path) -> FactoryResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FactoryError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
            .map_err(|e| FactoryError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse YAML config text on top of the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| format!("invalid config: {e}"))?
        };

        let mut config = Self::default();
        let f = file.factory;
        if let Some(v) = f.base_url {
            config.factory.base_url = v;
        }
        config.factory.token = f.token.filter(|t| !t.is_empty());
        if let Some(v) = f.timeout_secs {
            config.factory.timeout_secs = v;
        }

        let l = file.llm;
        if let Some(v) = l.provider {
            config.llm.provider = v;
        }
        if let Some(v) = l.base_url {
            config.llm.base_url = v;
        }
        if let Some(v) = l.model {
            config.llm.model = v;
        }
        config.llm.api_key = l.api_key.filter(|k| !k.is_empty());
        if let Some(v) = l.timeout_secs {
            config.llm.timeout_secs = v;
        }
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F) -> FactoryResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FACTORY_BASE_URL") {
            self.factory.base_url = v;
        }
        if let Some(v) = get("FACTORY_TOKEN") {
            self.factory.token = Some(v);
        }
        if let Some(v) = get("FACTORY_TIMEOUT_SECS") {
            self.factory.timeout_secs = parse_secs("FACTORY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = get("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_secs("LLM_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.factory.base_url = trim_base_url(&self.factory.base_url);
        self.llm.base_url = trim_base_url(&self.llm.base_url);
        self.llm.provider = self.llm.provider.trim().to_lowercase();
    }
}

fn parse_secs(key: &str, value: &str) -> FactoryResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| FactoryError::Config(format!("{key} must be a number, got '{value}'")))
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
