pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "realty-import")]
#[command(about = "Import a Yandex realty feed (plain XML or zip/gzip/bzip2) into a local store")]
pub struct CliConfig {
    /// Feed file to import; overrides [source].path from the config file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only load and parse the feed, create no entities
    #[arg(long)]
    pub only_load: bool,

    /// Skip listings that cannot be mapped instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,

    /// Output directory of the local store
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write imported offers to this CSV file inside the output directory
    #[arg(long)]
    pub export_csv: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 將命令列參數覆蓋到檔案配置上
    pub fn apply_to(&self, config: &mut toml_config::ImportConfig) {
        if let Some(file) = &self.file {
            config.source.path = Some(file.to_string_lossy().into_owned());
        }
        if self.only_load {
            config.import.only_load = true;
        }
        if self.skip_invalid {
            config.import.on_listing_error = crate::core::importer::ListingErrorPolicy::Skip;
        }
        if let Some(output) = &self.output {
            config.store.output_path = output.clone();
        }
        if let Some(csv) = &self.export_csv {
            config.store.export_csv = Some(csv.clone());
        }
    }
}
