use anyhow::Context;
use clap::Parser;
use ptv_sync::domain::ports::DocumentStore;
use ptv_sync::utils::{logger, validation::Validate};
use ptv_sync::{
    CatalogClient, CliArgs, MemoryStore, MongoStore, ServiceImporter, SyncConfig, SyncError,
    SyncReport,
};

fn load_config(args: &CliArgs) -> anyhow::Result<SyncConfig> {
    let config = match &args.config {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => SyncConfig::from_env().context("failed to load configuration from environment")?,
    };
    config.validate().context("configuration validation failed")?;
    Ok(config)
}

async fn run<S: DocumentStore>(
    catalog: CatalogClient,
    store: S,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError> {
    let importer =
        ServiceImporter::new(catalog, store, &config.region, config.sync.clone()).await?;
    importer.import_services().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting ptv-sync");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 讀取並驗證配置
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    let catalog = CatalogClient::new(&config.upstream)?;
    let outcome: Result<SyncReport, SyncError> = if args.dry_run {
        tracing::info!("🧪 Dry run: writes go to an in-memory store");
        run(catalog, MemoryStore::new(), &config).await
    } else {
        async {
            let store = MongoStore::connect(&config.mongo).await?;
            run(catalog, store, &config).await
        }
        .await
    };

    match outcome {
        Ok(report) => {
            tracing::info!("✅ Sync completed: {:?}", report);
            println!(
                "✅ {:?} sync completed: {} services, {} channels, {} municipalities stored",
                report.mode,
                report.services_stored,
                report.channels_stored,
                report.municipalities_stored
            );
        }
        Err(e) => {
            tracing::error!("❌ Sync failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}
