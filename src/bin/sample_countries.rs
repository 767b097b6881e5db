use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use continent_etl::core::records::{
    continent_counts, extract_records, position_by_id, write_csv, write_json,
};
use continent_etl::core::ConfigProvider;
use continent_etl::core::Storage;
use continent_etl::utils::logger;
use continent_etl::{CliConfig, LocalStorage, QuotaSampler, Record};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "sample-countries")]
#[command(about = "Draw a tournament field from a continent-tagged countries file")]
struct Args {
    /// Data file to read (default: js/countries.js)
    #[arg(long)]
    target: Option<String>,

    /// Optional TOML configuration file (quotas, target)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of countries to draw (default: the full quota size)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Id of a country that must be part of the draw, placed first
    #[arg(long)]
    pin: Option<String>,

    /// Seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let cli = CliConfig {
        target: args.target.clone(),
        config: args.config.clone(),
        function_name: None,
        exact_match: false,
        strict: false,
        dry_run: true,
        verbose: args.verbose,
        json_logs: false,
    };
    let config = cli.resolve().context("Failed to load configuration")?;

    let bytes = LocalStorage::default()
        .read_file(config.target_path())
        .await
        .with_context(|| format!("Failed to read {}", config.target_path()))?;
    let text = String::from_utf8(bytes).context("Data file is not valid UTF-8")?;

    let records = extract_records(&text);
    if records.is_empty() {
        bail!("No country records found in {}", config.target_path());
    }
    let untagged = records.iter().filter(|r| r.continent.is_none()).count();
    if untagged > 0 {
        tracing::warn!("⚠️ {} records have no continent, run continent-etl first", untagged);
    }
    tracing::info!("📥 Loaded {} records from {}", records.len(), config.target_path());

    let sampler = QuotaSampler::new(config.quotas());
    let count = args.count.unwrap_or_else(|| sampler.quotas().full_sample_size());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let sample: Vec<&Record> = match &args.pin {
        Some(id) => {
            let index = position_by_id(&records, id)
                .with_context(|| format!("Unknown country id: {}", id))?;
            sampler.sample_with_pinned(&records, count, index, &mut rng)?
        }
        None => sampler.sample(&records, count, &mut rng),
    };

    for (continent, n) in continent_counts(sample.iter().copied()) {
        tracing::info!("{}: {}", continent.display_label(), n);
    }

    let stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            write_json(&sample, stdout).context("Failed to write JSON output")?;
            println!();
        }
        OutputFormat::Csv => write_csv(&sample, stdout).context("Failed to write CSV output")?,
    }

    Ok(())
}
