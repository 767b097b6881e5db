use clap::Parser;
use continent_etl::domain::model::PatchOutcome;
use continent_etl::utils::{logger, validation::Validate};
use continent_etl::{CliConfig, EtlEngine, LocalStorage, MigrationPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    let log_format = if cli.json_logs {
        logger::LogFormat::Json
    } else {
        logger::LogFormat::Compact
    };
    logger::init_logger(cli.verbose, log_format);

    tracing::info!("Starting continent-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證參數並載入配置
    let config = match cli.validate().and_then(|_| cli.resolve()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    let storage = LocalStorage::default();
    let pipeline = MigrationPipeline::new(storage, config).with_dry_run(cli.dry_run);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Migration finished for {}", report.output_path);
            println!(
                "✅ {}: {} records tagged, sampler {}",
                report.output_path,
                report.stats.tagged,
                match report.patch {
                    PatchOutcome::Replaced => "replaced",
                    PatchOutcome::AlreadyInstalled => "already installed",
                    PatchOutcome::NotFound => "NOT replaced",
                }
            );
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
