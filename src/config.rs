use std::path::Path;

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{Error, Result};

/// File picked up from the working directory when none is given.
const CWD_CONFIG: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Number of results kept per session
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Validation service endpoint
    #[arg(long, env = "VALIDATOR_URL")]
    pub validator_url: Option<String>,

    /// Require a user token on session endpoints
    #[arg(long, env = "TOKEN_REQUIRED")]
    pub token_required: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub list: ListConfig,
    pub validator: ValidatorConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub request_timeout_secs: u64,
    pub session_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidatorConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub token_required: bool,
    pub jwt_secret: String,
}

impl AppConfig {
    /// Load from defaults, config file and environment, ignoring argv.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args().take(1))
    }

    /// Priority: CLI flag > CLI env var > `INN__*` env > config file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| Error::Config(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.session_timeout_secs", 30 * 60)?
            .set_default("list.capacity", crate::inn_list::DEFAULT_CAPACITY as u64)?
            .set_default("validator.url", "http://127.0.0.1:4000/services/inn-check")?
            .set_default("validator.timeout_secs", 10)?
            .set_default("security.token_required", false)?
            .set_default("security.jwt_secret", "")?;

        match &cli.config {
            Some(path) => {
                builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
            }
            None if Path::new(CWD_CONFIG).exists() => {
                builder = builder.add_source(File::new(CWD_CONFIG, FileFormat::Yaml));
            }
            None => {}
        }

        // E.g. INN__SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("INN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(capacity) = cli.capacity {
            builder = builder.set_override("list.capacity", capacity as u64)?;
        }
        if let Some(url) = cli.validator_url {
            builder = builder.set_override("validator.url", url)?;
        }
        if let Some(required) = cli.token_required {
            builder = builder.set_override("security.token_required", required)?;
        }

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.list.capacity == 0 {
            return Err(Error::Config("list.capacity must be positive".to_string()));
        }
        if self.security.token_required && self.security.jwt_secret.trim().is_empty() {
            return Err(Error::Config(
                "security.jwt_secret is required when tokens are required".to_string(),
            ));
        }
        Ok(())
    }
}
