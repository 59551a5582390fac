use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use thiserror::Error;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub environment: String,
    pub bucket_name: String,
    pub endpoint_url: Option<String>,
    pub span_midnight: bool,
    pub strict: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Prometheus exporter counting S3 images added in the last hour")]
pub struct Args {
    /// Host to bind to (overrides EXPORTER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EXPORTER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// AWS region of the bucket (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Value of the `environment` label (overrides ENV)
    #[arg(long)]
    pub environment: Option<String>,

    /// Bucket holding the `raw/` image prefix (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Custom S3-compatible endpoint (overrides S3_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Only list today's prefix, even during the first hour after UTC midnight
    #[arg(long)]
    pub no_span_midnight: bool,

    /// Refuse to start when region, environment or bucket is missing
    #[arg(long)]
    pub strict: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed CLI args over values looked up by `var`.
    pub fn resolve(args: Args, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = var("EXPORTER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match var("EXPORTER_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing EXPORTER_PORT value `{}`", value))?,
            None => 20000,
        };
        let env_span_midnight = match var("EXPORTER_SPAN_MIDNIGHT") {
            Some(value) => parse_flag(&value)
                .with_context(|| format!("parsing EXPORTER_SPAN_MIDNIGHT value `{}`", value))?,
            None => true,
        };
        let env_strict = match var("EXPORTER_STRICT_CONFIG") {
            Some(value) => parse_flag(&value)
                .with_context(|| format!("parsing EXPORTER_STRICT_CONFIG value `{}`", value))?,
            None => false,
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            region: args.region.or_else(|| var("AWS_REGION")).unwrap_or_default(),
            environment: args.environment.or_else(|| var("ENV")).unwrap_or_default(),
            bucket_name: args
                .bucket_name
                .or_else(|| var("BUCKET_NAME"))
                .unwrap_or_default(),
            endpoint_url: args
                .endpoint_url
                .or_else(|| var("S3_ENDPOINT_URL"))
                .filter(|url| !url.is_empty()),
            span_midnight: env_span_midnight && !args.no_span_midnight,
            strict: env_strict || args.strict,
        };

        Ok(cfg)
    }

    /// Check that every value the exporter needs to scrape is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("AWS_REGION", &self.region),
            ("ENV", &self.environment),
            ("BUCKET_NAME", &self.bucket_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    /// Apply strict mode to `validate`: missing values are fatal when strict,
    /// otherwise they are handed back so the caller can warn about them.
    pub fn check(&self) -> Result<Vec<&'static str>, ConfigError> {
        match self.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(err) if self.strict => Err(err),
            Err(ConfigError::Missing(names)) => Ok(names),
        }
    }

    /// Wildcard hosts may be refused in unprivileged sandboxes.
    pub fn binds_all_interfaces(&self) -> bool {
        matches!(self.host.as_str(), "0.0.0.0" | "::")
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got `{}`", other),
    }
}
