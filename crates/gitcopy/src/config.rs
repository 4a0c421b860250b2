use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gitcopy_core::http_client::DEFAULT_API_URL;

pub const TOKEN_VAR: &str = "GITHUB_ACCESS_TOKEN";
pub const API_URL_VAR: &str = "GITHUB_API_URL";

/// Settings resolved once at startup and handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: String,
}

/// `~/.gitcopy/config.toml`.
#[derive(serde::Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Everything configuration can come from, lowest layer last.
#[derive(Default, Debug)]
pub struct Sources {
    pub process_env: HashMap<String, String>,
    pub env_file: HashMap<String, String>,
    pub file: FileConfig,
}

pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not find home directory"))?;
    Ok(home.join(".gitcopy").join("config.toml"))
}

pub fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
}

/// Read a `.env` definitions file. A missing file yields no variables.
pub fn load_env_file(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .collect::<Result<HashMap<_, _>, _>>()
        .with_context(|| format!("invalid env file {}", path.display()))
}

impl Sources {
    /// Process environment, `./.env` and `~/.gitcopy/config.toml`.
    pub fn gather() -> anyhow::Result<Self> {
        let file = match config_path() {
            Ok(path) => load_file_config(&path)?,
            Err(_) => FileConfig::default(),
        };
        Ok(Self {
            process_env: std::env::vars().collect(),
            env_file: load_env_file(Path::new(".env"))?,
            file,
        })
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.process_env
            .get(key)
            .or_else(|| self.env_file.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl Config {
    pub fn resolve(api_url_flag: Option<String>, sources: &Sources) -> anyhow::Result<Self> {
        let token = sources
            .var(TOKEN_VAR)
            .map(str::to_string)
            .or_else(|| sources.file.token.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no access token; set {TOKEN_VAR} in the environment or a .env file"
                )
            })?;

        let api_url = api_url_flag
            .or_else(|| sources.var(API_URL_VAR).map(str::to_string))
            .or_else(|| sources.file.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self { api_url, token })
    }

    pub fn load(api_url_flag: Option<String>) -> anyhow::Result<Self> {
        let sources = Sources::gather()?;
        Self::resolve(api_url_flag, &sources)
    }
}
