//! Configuration system (layered: defaults > config file > env > CLI flags).
//!
//! Each layer only overrides the keys it sets. The binary applies CLI flags on
//! top of [`SkiffConfig::load`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SkiffError;
use crate::models::LanguageModel;

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "skiff.toml";

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// How actions are extracted from model responses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    /// JSON inside a fenced ```` ```action ```` block of the reply text.
    #[default]
    Fenced,
    /// The provider's native tool-calling API.
    Native,
}

/// Per-provider settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderSection {
    base_url: Option<String>,
    api_key: Option<String>,
}

/// Shape of `skiff.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    max_tokens: Option<u32>,
    max_iterations: Option<usize>,
    protocol: Option<Protocol>,
    temperature: Option<f64>,
    workdir: Option<PathBuf>,
    #[serde(default)]
    providers: HashMap<String, ProviderSection>,
}

/// Resolved configuration for one process.
#[derive(Debug, Clone, PartialEq)]
pub struct SkiffConfig {
    pub model: LanguageModel,
    pub max_tokens: u32,
    pub max_iterations: usize,
    pub protocol: Protocol,
    pub temperature: Option<f64>,
    /// Root directory the file tools resolve relative paths against.
    pub workdir: PathBuf,
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
}

impl Default for SkiffConfig {
    fn default() -> Self {
        Self {
            model: LanguageModel::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            protocol: Protocol::default(),
            temperature: None,
            workdir: PathBuf::from("."),
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
        }
    }
}

impl SkiffConfig {
    /// Load defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    /// A `.env` file in the working directory is loaded first when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SkiffError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                if let Some(default_path) = Self::default_path().filter(|p| p.is_file()) {
                    config.merge_file(&default_path)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Platform config location, e.g. `~/.config/skiff/skiff.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "skiff")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Merge a TOML file into this config.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), SkiffError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SkiffError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        self.merge_toml(&raw)
            .map_err(|e| SkiffError::Configuration(format!("{}: {e}", path.display())))
    }

    /// Merge TOML text into this config.
    pub fn merge_toml(&mut self, raw: &str) -> Result<(), SkiffError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| SkiffError::Configuration(e.to_string()))?;

        if let Some(model) = file.model {
            self.model = model.parse()?;
        }
        if let Some(max_tokens) = file.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(max_iterations) = file.max_iterations {
            self.set_max_iterations(max_iterations)?;
        }
        if let Some(protocol) = file.protocol {
            self.protocol = protocol;
        }
        if file.temperature.is_some() {
            self.temperature = file.temperature;
        }
        if let Some(workdir) = file.workdir {
            self.workdir = workdir;
        }
        for (provider, section) in file.providers {
            if let Some(url) = section.base_url {
                self.set_base_url(&provider, url);
            }
            if let Some(key) = section.api_key {
                self.set_api_key(&provider, key);
            }
        }
        Ok(())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SkiffError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("SKIFF_MODEL") {
            self.model = model.parse()?;
        }
        if let Some(raw) = lookup("SKIFF_MAX_TOKENS") {
            self.max_tokens = parse_number("SKIFF_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("SKIFF_MAX_ITERATIONS") {
            self.set_max_iterations(parse_number("SKIFF_MAX_ITERATIONS", &raw)?)?;
        }
        if let Some(raw) = lookup("SKIFF_PROTOCOL") {
            self.protocol = raw.parse().map_err(|_| {
                SkiffError::Configuration(format!(
                    "SKIFF_PROTOCOL must be 'fenced' or 'native', got '{raw}'"
                ))
            })?;
        }
        if let Some(workdir) = lookup("SKIFF_WORKDIR") {
            self.workdir = PathBuf::from(workdir);
        }

        let key_mappings = [
            ("OPENAI_API_KEY", "openai"),
            ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
        ];
        for (env_var, provider) in key_mappings {
            if let Some(key) = lookup(env_var) {
                self.set_api_key(provider, key);
            }
        }

        let url_mappings = [
            ("OPENAI_BASE_URL", "openai"),
            ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
            ("OLLAMA_BASE_URL", "ollama"),
        ];
        for (env_var, provider) in url_mappings {
            if let Some(url) = lookup(env_var) {
                self.set_base_url(provider, url);
            }
        }
        Ok(())
    }

    /// Set the iteration budget; zero is rejected.
    pub fn set_max_iterations(&mut self, max_iterations: usize) -> Result<(), SkiffError> {
        if max_iterations == 0 {
            return Err(SkiffError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        self.max_iterations = max_iterations;
        Ok(())
    }

    pub fn set_api_key(&mut self, provider: &str, key: String) {
        self.api_keys.insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.get(provider).cloned()
    }

    pub fn set_base_url(&mut self, provider: &str, url: String) {
        self.base_urls.insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.get(provider).cloned()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, SkiffError> {
    raw.trim()
        .parse()
        .map_err(|_| SkiffError::Configuration(format!("{name} must be a number, got '{raw}'")))
}
