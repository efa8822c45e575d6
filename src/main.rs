use clap::Parser;
use tableprep::utils::{logger, validation::Validate};
use tableprep::{CliConfig, FileInput, FileStatus, LocalStorage, PrepEngine, PrepPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting tableprep CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // Read every input up front; an unreadable path is a configuration
    // mistake, not a per-file parse failure.
    let mut inputs = Vec::new();
    for path in &config.inputs {
        match tokio::fs::read(path).await {
            Ok(bytes) => inputs.push(FileInput::new(path.clone(), String::new(), bytes)),
            Err(e) => {
                tracing::error!("❌ Cannot read {}: {}", path, e);
                eprintln!("❌ Cannot read {}: {}", path, e);
                std::process::exit(3);
            }
        }
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let concurrency = config.concurrent_files;
    let pipeline = PrepPipeline::new(storage, config);
    let engine = PrepEngine::new_with_monitoring(pipeline, concurrency, monitor_enabled);

    let outcomes = engine.run(inputs).await;

    let mut completed = 0usize;
    for outcome in &outcomes {
        match &outcome.status {
            FileStatus::Completed {
                profile,
                plan,
                output_path,
            } => {
                completed += 1;
                println!(
                    "✅ {}: {} rows × {} columns, {} transforms planned",
                    outcome.file, profile.row_count, profile.column_count,
                    plan.stats.transform_count
                );
                if let Some(path) = output_path {
                    println!("   📁 Cleaned CSV: {}", path);
                }
            }
            FileStatus::Error { message } => {
                println!("❌ {}: {}", outcome.file, message);
            }
        }
    }

    println!(
        "Processed {}/{} file(s) successfully",
        completed,
        outcomes.len()
    );

    if completed == 0 && !outcomes.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
