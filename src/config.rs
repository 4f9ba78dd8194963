use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub root: Root,
    pub server: Server,
    #[serde(default)]
    pub database: Option<Database>,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Root { pub root_dir: PathBuf }

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
    /// Extra origins allowed to call the API cross-site. The bundled UI is
    /// same-origin and needs none.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Connection settings for the SQL console. Leaving the section out (or the
/// url blank) keeps the console switched off.
#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    #[serde(default = "default_max_request_kb")]
    pub max_request_kb: usize,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}
fn default_max_request_kb() -> usize { 2048 }
fn default_max_upload_mb() -> usize { 1024 }

impl Default for Limits {
    fn default() -> Self {
        Self { max_request_kb: default_max_request_kb(), max_upload_mb: default_max_upload_mb() }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.root.root_dir.is_dir() {
            anyhow::bail!("root_dir does not exist or is not a directory: {}", self.root.root_dir.display());
        }
        if self.server.port == 0 { anyhow::bail!("port must be > 0"); }
        for origin in &self.server.allowed_origins {
            if http::HeaderValue::from_str(origin).is_err() { anyhow::bail!("invalid origin: {origin:?}"); }
        }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.limits.max_upload_mb == 0 { anyhow::bail!("max_upload_mb must be > 0"); }
        Ok(())
    }

    /// The configured connection string, if the console is enabled.
    pub fn database_url(&self) -> Option<&str> {
        self.database
            .as_ref()
            .map(|d| d.url.trim())
            .filter(|u| !u.is_empty())
    }
}

pub fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    let c = dunce::canonicalize(root)?;
    Ok(c)
}
