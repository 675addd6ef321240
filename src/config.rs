use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub manifest: ManifestConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeBaseConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base directory for per-project engine storage; one subdirectory per
    /// project, created on demand.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            working_dir: default_working_dir(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_working_dir() -> PathBuf {
    PathBuf::from("index")
}
fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.retrieval.provider.as_str() {
        "disabled" | "mock" | "http" => {}
        other => anyhow::bail!(
            "Unknown retrieval provider: '{}'. Must be disabled, mock, or http.",
            other
        ),
    }

    if config.retrieval.provider == "http" && config.retrieval.endpoint.is_none() {
        anyhow::bail!("retrieval.endpoint must be set when provider is 'http'");
    }

    if config.retrieval.timeout_secs == 0 {
        anyhow::bail!("retrieval.timeout_secs must be > 0");
    }

    Ok(config)
}
