pub mod cli;
pub mod toml_config;

use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "continent-etl")]
#[command(about = "Tag country records with their continent and install the quota sampler")]
pub struct CliConfig {
    /// Data file to rewrite (default: js/countries.js)
    #[arg(long)]
    pub target: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Name of the sampler function to replace
    #[arg(long)]
    pub function_name: Option<String>,

    /// Only replace the literal original function body
    #[arg(long)]
    pub exact_match: bool,

    /// Do not write anything when the function cannot be replaced
    #[arg(long)]
    pub strict: bool,

    /// Show what would change without writing the file
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML（若有），再套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(target) = &self.target {
            config.target.path = target.clone();
        }
        if let Some(function_name) = &self.function_name {
            config.target.function_name = Some(function_name.clone());
        }
        if self.exact_match {
            config.target.exact_match = Some(true);
        }
        if self.strict {
            config
                .error_handling
                .get_or_insert(toml_config::ErrorHandlingConfig { on_patch_failure: None })
                .on_patch_failure = Some("abort".to_string());
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(target) = &self.target {
            validate_path("target", target)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
