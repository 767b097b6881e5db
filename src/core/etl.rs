use crate::core::Pipeline;
use crate::domain::model::{PatchOutcome, TaggingStats};
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output_path: String,
    pub stats: TaggingStats,
    pub patch: PatchOutcome,
    pub changed: bool,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting migration...");

        // Extract
        let content = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} lines", content.lines().count());

        // Transform
        let result = self.pipeline.transform(content).await?;
        tracing::info!(
            "🏷️ Tagged {} records ({} already tagged, {} skipped)",
            result.stats.tagged,
            result.stats.already_tagged,
            result.stats.skipped_no_id + result.stats.skipped_no_context
        );
        match result.patch {
            PatchOutcome::Replaced => tracing::info!("🔁 Sampler function replaced"),
            PatchOutcome::AlreadyInstalled => tracing::info!("Sampler function already installed"),
            PatchOutcome::NotFound => tracing::warn!("Sampler function left unchanged"),
        }

        let stats = result.stats.clone();
        let patch = result.patch;
        let changed = result.changed;

        // Load
        let output_path = self.pipeline.load(result).await?;

        Ok(RunReport {
            output_path,
            stats,
            patch,
            changed,
        })
    }
}
