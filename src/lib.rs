pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{local_store::LocalStore, memory_store::InMemoryStore};
pub use config::toml_config::ImportConfig;
pub use core::importer::{FeedImporter, ImportReport, ListingErrorPolicy, SiteInfo};
pub use core::source::{FeedStream, ImportSource};
pub use domain::ports::EntityStore;
pub use utils::error::{ImportError, Result};
