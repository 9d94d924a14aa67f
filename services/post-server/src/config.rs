//! Configuration types and loading
//!
//! Secrets (the app secret and the page/user access token) are loaded
//! from env vars or secret files, never stored in the TOML directly.

use common::Secret;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    pub demo: DemoConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

/// Facebook app registration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub app_id: String,
    /// Token echoed back during the webhook verification handshake
    pub webhook_verify_token: String,
    #[serde(skip)]
    pub app_secret: Option<Secret>,
    /// Path to a file containing the app secret (alternative to the
    /// FB_APP_SECRET env var)
    #[serde(default)]
    pub app_secret_file: Option<PathBuf>,
}

/// Graph API endpoint settings
#[derive(Debug, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            base_url: default_base_url(),
            version: default_version(),
        }
    }
}

/// What `GET /publish` posts, and with whose credential
#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    pub page_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(skip)]
    pub access_token: Option<Secret>,
    /// Path to a file containing the caller's access token (alternative
    /// to the FB_PAGE_TOKEN env var)
    #[serde(default)]
    pub access_token_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    graph_client::DEFAULT_BASE_URL.to_owned()
}

fn default_version() -> String {
    "8.0".to_owned()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    ///
    /// Secret resolution order, per secret:
    /// 1. env var (FB_APP_SECRET / FB_PAGE_TOKEN)
    /// 2. `*_file` path from config
    ///
    /// Both secrets must resolve; the service cannot publish without them.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.app.app_id.trim().is_empty() {
            return Err(common::Error::Config("app_id must not be empty".into()));
        }
        if config.demo.page_id.trim().is_empty() {
            return Err(common::Error::Config("page_id must not be empty".into()));
        }
        if !config.graph.base_url.starts_with("http://")
            && !config.graph.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.graph.base_url
            )));
        }

        config.app.app_secret = resolve_secret(
            "FB_APP_SECRET",
            config.app.app_secret_file.as_deref(),
            "app_secret_file",
        )?;
        if config.app.app_secret.is_none() {
            return Err(common::Error::Config(
                "app secret missing: set FB_APP_SECRET or app_secret_file".into(),
            ));
        }

        config.demo.access_token = resolve_secret(
            "FB_PAGE_TOKEN",
            config.demo.access_token_file.as_deref(),
            "access_token_file",
        )?;
        if config.demo.access_token.is_none() {
            return Err(common::Error::Config(
                "access token missing: set FB_PAGE_TOKEN or access_token_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("facebook-post-server.toml")
    }
}

fn resolve_secret(
    env_var: &str,
    file: Option<&Path>,
    file_key: &str,
) -> common::Result<Option<Secret>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Some(Secret::new(value)));
    }
    if let Some(path) = file {
        let value = std::fs::read_to_string(path).map_err(|e| {
            common::Error::Config(format!("failed to read {file_key} {}: {e}", path.display()))
        })?;
        let value = value.trim().to_owned();
        if !value.is_empty() {
            return Ok(Some(Secret::new(value)));
        }
    }
    Ok(None)
}
