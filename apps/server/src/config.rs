use config::{Config, Environment, File};
use crumb_cookie::JarConfig;
use serde::Deserialize;
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use tracing::info;

#[crumb_derive::crumb_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub log: LogConfig,
    pub cookies: JarConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 8080, ssl: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level directive, e.g. `info`.
    pub level: String,
    pub json: bool,
    /// Extra `EnvFilter` directives such as `crumb_cookie=debug`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), json: false, filter: None }
    }
}

/// Loads the server configuration from an optional file overlaid with `CRUMB__` variables.
///
/// `path` defaults to `config/server`; the extension is picked up by the loader. A missing file is
/// not an error, every section has defaults. Nested keys use a double underscore, so
/// `CRUMB__COOKIES__SALT=_v2` sets `cookies.salt`.
///
/// # Errors
/// Returns [`ConfigError::Config`] if a source is malformed or does not fit [`ServerConfig`].
pub fn load_config(path: Option<impl AsRef<Path>>) -> Result<ServerConfig, ConfigError> {
    let effective_path =
        path.map_or_else(|| PathBuf::from("config/server"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(
            Environment::with_prefix("CRUMB").separator("__").convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<ServerConfig>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
