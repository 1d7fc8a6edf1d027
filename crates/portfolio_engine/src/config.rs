use serde::Deserialize;
use tracing::{debug, info};

use portfolio_base::{FilePath, Pal, PortfolioError, PortfolioResult, ResultExt};

/// Name of the optional configuration file in the working directory.
pub const CONFIG_FILE_NAME: &str = "portfolio.toml";

/// Configuration for the portfolio server, read from `portfolio.toml`.
///
/// Every key is optional; unknown keys are rejected so typos do not go unnoticed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
}

/// Where the HTTP server listens and how it names itself in links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    /// 0 lets the operating system pick a free port.
    pub port: u16,
    /// Base of every link href, e.g. `https://api.example.com`. When unset the
    /// request's `Host` header is used.
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            public_base_url: None,
        }
    }
}

/// Behaviour of the project API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// `max-age` declared on GET responses.
    pub cache_max_age_secs: u32,
    /// Pre-load the two sample projects at startup.
    pub seed_sample_data: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cache_max_age_secs: 300,
            seed_sample_data: true,
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> PortfolioResult<Self> {
        toml::from_str(content)
            .map_err(|e| Box::new(PortfolioError::message(format!("Invalid configuration: {}", e))))
    }
}

/// Load the configuration at `path`, falling back to defaults when the file is absent.
pub fn load_config(pal: &dyn Pal, path: &FilePath) -> PortfolioResult<Config> {
    if !pal.file_exists(path)? {
        info!(%path, "no configuration file found, using defaults");
        return Ok(Config::default());
    }
    let content = pal.read_file_to_string(path)?;
    let config = Config::parse(&content).with_context(|| format!("Loading {}", path))?;
    debug!(?config, "loaded configuration");
    Ok(config)
}
