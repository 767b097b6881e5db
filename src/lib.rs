pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    etl::{EtlEngine, RunReport},
    pipeline::MigrationPipeline,
    sampler::{QuotaSampler, QuotaTable},
    tagger::ContinentTagger,
};
pub use domain::model::{Continent, PatchOutcome, Record};
pub use utils::error::{EtlError, Result};
