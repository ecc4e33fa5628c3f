use anyhow::Context;
use clap::Parser;
use realty_import::utils::error::ErrorSeverity;
use realty_import::utils::{logger, validation::Validate};
use realty_import::{CliConfig, FeedImporter, ImportConfig, ImportError, LocalStore};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置檔（若有），再套用命令列覆蓋
    let mut config = match &cli.config {
        Some(path) => ImportConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => ImportConfig::default(),
    };
    cli.apply_to(&mut config);

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting realty-import");
    if cli.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(
                "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

fn run(config: &ImportConfig) -> Result<(), ImportError> {
    let path = config
        .source
        .path
        .as_deref()
        .ok_or_else(|| ImportError::configuration("no file nor a stream supplied for import"))?;

    let importer = FeedImporter::from_file(path)
        .with_site(config.site_info())
        .with_namespace(config.namespace())
        .with_policy(config.import.on_listing_error);

    let mut store = LocalStore::open(&config.store.output_path)?;
    let report = match importer.import(&mut store, config.import.only_load) {
        Ok(report) => report,
        Err(e) => {
            // listings committed before the failure stay in the snapshot
            if let Err(compact_error) = store.compact() {
                tracing::warn!("⚠️ Snapshot compaction failed: {}", compact_error);
            }
            return Err(e);
        }
    };
    store.compact()?;

    if config.import.only_load {
        println!("✅ Feed loaded: {} listings found", report.listings_seen);
        return Ok(());
    }

    println!(
        "✅ Imported {} of {} listings ({} skipped)",
        report.listings_imported, report.listings_seen, report.listings_skipped
    );
    println!("📁 Snapshot saved to: {}", store.snapshot_path().display());

    if let Some(csv) = &config.store.export_csv {
        let csv_path = store.export_offers_csv(csv)?;
        println!("📄 Offers exported to: {}", csv_path.display());
    }

    Ok(())
}
