use crate::models::archive::ArchiveIdStrategy;
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, str::FromStr};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORAGE_DIR: &str = "./uploads";
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Flat directory holding every `<id>.zip` archive.
    pub storage_dir: String,
    /// Public origin used when building download links.
    pub base_url: String,
    /// Upper bound for a whole `/upload` request body, in bytes.
    pub max_upload_size: usize,
    pub id_strategy: ArchiveIdStrategy,
    /// Optional HTML file replacing the embedded landing page.
    pub index_template: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Single-file upload relay serving zip archives")]
pub struct Args {
    /// Host to bind to (overrides FILE_RELAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_RELAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where archives are stored (overrides FILE_RELAY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Base URL for download links (overrides FILE_RELAY_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum upload request size in bytes (overrides FILE_RELAY_MAX_UPLOAD_SIZE)
    #[arg(long)]
    pub max_upload_size: Option<usize>,

    /// Archive identifier scheme (overrides FILE_RELAY_ID_STRATEGY)
    #[arg(long, value_enum)]
    pub id_strategy: Option<ArchiveIdStrategy>,

    /// Landing page template path (overrides FILE_RELAY_INDEX_TEMPLATE)
    #[arg(long)]
    pub index_template: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            storage_dir: DEFAULT_STORAGE_DIR.into(),
            base_url: DEFAULT_BASE_URL.into(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            id_strategy: ArchiveIdStrategy::default(),
            index_template: None,
        }
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_sources(Args::parse(), |key| env::var(key))
    }

    /// Merge parsed CLI args over values returned by `lookup`, then defaults.
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let defaults = Self::default();

        let env_host = read_var(&lookup, "FILE_RELAY_HOST")?.unwrap_or(defaults.host);
        let env_port = parse_var(&lookup, "FILE_RELAY_PORT")?.unwrap_or(defaults.port);
        let env_storage =
            read_var(&lookup, "FILE_RELAY_STORAGE_DIR")?.unwrap_or(defaults.storage_dir);
        let env_base_url = read_var(&lookup, "FILE_RELAY_BASE_URL")?.unwrap_or(defaults.base_url);
        let env_max_upload =
            parse_var(&lookup, "FILE_RELAY_MAX_UPLOAD_SIZE")?.unwrap_or(defaults.max_upload_size);
        let env_strategy = match read_var(&lookup, "FILE_RELAY_ID_STRATEGY")? {
            Some(value) => <ArchiveIdStrategy as ValueEnum>::from_str(&value, true)
                .map_err(|err| anyhow!(err))
                .with_context(|| format!("parsing FILE_RELAY_ID_STRATEGY value `{}`", value))?,
            None => defaults.id_strategy,
        };
        let env_template = read_var(&lookup, "FILE_RELAY_INDEX_TEMPLATE")?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            base_url: args.base_url.unwrap_or(env_base_url),
            max_upload_size: args.max_upload_size.unwrap_or(env_max_upload),
            id_strategy: args.id_strategy.unwrap_or(env_strategy),
            index_template: args.index_template.or(env_template),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public link for a stored archive file name such as `1700000000.zip`.
    pub fn download_url(&self, file_name: &str) -> String {
        format!("{}/file/{}", self.base_url.trim_end_matches('/'), file_name)
    }
}

fn read_var<F>(lookup: &F, key: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    read_var(lookup, key)?
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = AppConfig::from_sources(Args::default(), lookup_from(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.storage_dir, "./uploads");
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(cfg.id_strategy, ArchiveIdStrategy::Timestamp);
        assert!(cfg.index_template.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let args = Args {
            port: Some(9000),
            id_strategy: Some(ArchiveIdStrategy::Timestamp),
            ..Args::default()
        };
        let cfg = AppConfig::from_sources(
            args,
            lookup_from(&[
                ("FILE_RELAY_PORT", "7000"),
                ("FILE_RELAY_BASE_URL", "https://relay.example.com"),
                ("FILE_RELAY_ID_STRATEGY", "UUID"),
                ("FILE_RELAY_MAX_UPLOAD_SIZE", "2048"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.base_url, "https://relay.example.com");
        assert_eq!(cfg.id_strategy, ArchiveIdStrategy::Timestamp);
        assert_eq!(cfg.max_upload_size, 2048);
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let err = AppConfig::from_sources(
            Args::default(),
            lookup_from(&[("FILE_RELAY_PORT", "eighty")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("FILE_RELAY_PORT"));

        let err = AppConfig::from_sources(
            Args::default(),
            lookup_from(&[("FILE_RELAY_ID_STRATEGY", "sequential")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("FILE_RELAY_ID_STRATEGY"));
    }

    #[test]
    fn download_url_joins_base_and_file_name() {
        let mut cfg = AppConfig::default();
        assert_eq!(
            cfg.download_url("42.zip"),
            "http://localhost:8080/file/42.zip"
        );

        cfg.base_url = "https://relay.example.com/".into();
        assert_eq!(
            cfg.download_url("42.zip"),
            "https://relay.example.com/file/42.zip"
        );
    }
}
