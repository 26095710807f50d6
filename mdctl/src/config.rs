//! Client configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `mdctl.yaml` but can be specified via
//! the `-f` flag or the `MDCTL_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `mdctl.yaml`)
//! 2. **Environment variables** - Variables prefixed with `MDCTL_`
//!
//! For nested values, use double underscores in environment variables.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Point at a different API deployment
//! MDCTL_API_URL="https://converter.example.com"
//!
//! # Switch to the raw-binary convert contract
//! MDCTL_WIRE="raw_binary"
//!
//! # Tighten the request timeout
//! MDCTL_TIMEOUT_SECS=10
//! ```

use crate::api::WireContract;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Shared CLI args - config file selection and validation.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MDCTL_CONFIG", default_value = "mdctl.yaml")]
    pub config: String,

    /// Validate configuration and exit without running a command.
    #[arg(long)]
    pub validate: bool,
}

/// Main client configuration.
///
/// All fields have sensible defaults, so a missing config file just means
/// "local API, envelope contract".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the conversion API (e.g., "http://localhost:3000")
    pub api_url: Url,

    /// Which `/api/convert` wire contract the deployment speaks.
    ///
    /// The two observed contracts (JSON envelope with base64 file data vs. a
    /// raw binary response body) are mutually exclusive per deployment; this
    /// setting picks one, never both.
    pub wire: WireContract,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Directory where downloaded artifacts are written
    pub output_dir: PathBuf,

    /// Optional path for persisting the session token across invocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse("http://localhost:3000").expect("default URL is valid"),
            wire: WireContract::default(),
            timeout_secs: 30,
            output_dir: PathBuf::from("."),
            token_file: None,
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("MDCTL_").split("__"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(config: &str) -> Args {
        Args {
            config: config.to_string(),
            validate: false,
        }
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(&test_args("missing.yaml"))?;
            assert_eq!(config.api_url.as_str(), "http://localhost:3000/");
            assert_eq!(config.wire, WireContract::Envelope);
            assert_eq!(config.timeout_secs, 30);
            assert!(config.token_file.is_none());
            Ok(())
        });
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "mdctl.yaml",
                r#"
                api_url: "https://converter.example.com"
                wire: raw_binary
                timeout_secs: 5
                output_dir: "downloads"
                "#,
            )?;
            let config = Config::load(&test_args("mdctl.yaml"))?;
            assert_eq!(config.api_url.as_str(), "https://converter.example.com/");
            assert_eq!(config.wire, WireContract::RawBinary);
            assert_eq!(config.timeout_secs, 5);
            assert_eq!(config.output_dir, PathBuf::from("downloads"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mdctl.yaml", "timeout_secs: 5")?;
            jail.set_env("MDCTL_TIMEOUT_SECS", "10");
            jail.set_env("MDCTL_WIRE", "raw_binary");
            let config = Config::load(&test_args("mdctl.yaml"))?;
            assert_eq!(config.timeout_secs, 10);
            assert_eq!(config.wire, WireContract::RawBinary);
            Ok(())
        });
    }
}
