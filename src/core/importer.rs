use crate::core::archive::{self, DocumentOrigin};
use crate::core::document::{FeedDocument, REALTY_NAMESPACE};
use crate::core::listing::{self, ListingRecord};
use crate::core::materializer;
use crate::core::source::{FeedStream, ImportSource};
use crate::domain::model::{EntityId, Site};
use crate::domain::ports::EntityStore;
use crate::utils::error::{ImportError, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

pub const DEFAULT_SITE_NAME: &str = "Атлант-Недвижимость";
pub const DEFAULT_SITE_URL: &str = "http://atlantnt.ru";

/// 單筆刊登無法對應時的處理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingErrorPolicy {
    /// Stop the run at the first listing that cannot be mapped.
    #[default]
    Abort,
    /// Log a warning, commit nothing for that listing and carry on.
    Skip,
}

/// The publishing site every imported offer is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_SITE_NAME.to_string(),
            url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterState {
    Unloaded,
    Loaded,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub only_load: bool,
    pub origin: Option<DocumentOrigin>,
    pub site: Option<EntityId>,
    pub listings_seen: usize,
    pub listings_imported: usize,
    pub listings_skipped: usize,
    pub elapsed_seconds: f64,
}

/// Feed importer: loads the document once, then turns every listing into entities.
///
/// Document loading is single-flight; concurrent first accesses wait for the one
/// that performs the I/O.
#[derive(Debug)]
pub struct FeedImporter {
    source: Mutex<ImportSource>,
    document: OnceCell<FeedDocument>,
    namespace: String,
    site: SiteInfo,
    policy: ListingErrorPolicy,
}

impl FeedImporter {
    pub fn new(source: ImportSource) -> Self {
        Self {
            source: Mutex::new(source),
            document: OnceCell::new(),
            namespace: REALTY_NAMESPACE.to_string(),
            site: SiteInfo::default(),
            policy: ListingErrorPolicy::default(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::new(ImportSource::from_file(path))
    }

    pub fn from_stream(stream: FeedStream) -> Self {
        Self::new(ImportSource::from_stream(stream))
    }

    pub fn with_site(mut self, site: SiteInfo) -> Self {
        self.site = site;
        self
    }

    pub fn with_policy(mut self, policy: ListingErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn policy(&self) -> ListingErrorPolicy {
        self.policy
    }

    pub fn state(&self) -> ImporterState {
        if self.document.get().is_some() {
            ImporterState::Loaded
        } else {
            ImporterState::Unloaded
        }
    }

    /// The parsed feed, loading it on first access.
    pub fn document(&self) -> Result<&FeedDocument> {
        self.document.get_or_try_init(|| self.load_document())
    }

    fn load_document(&self) -> Result<FeedDocument> {
        let source = {
            let mut guard = self
                .source
                .lock()
                .map_err(|_| ImportError::operation("import source lock poisoned"))?;
            guard.take_for_load()?
        };

        tracing::info!("📥 Loading feed from {}", source.describe());

        let stream = source.resolve()?;
        let unwrapped = archive::unwrap_archive(stream)?;
        let document = FeedDocument::from_reader(unwrapped.reader, unwrapped.origin)?;

        tracing::info!(
            "✅ Feed document loaded (root <{}>, origin {:?})",
            document.root().name(),
            document.origin()
        );
        Ok(document)
    }

    pub fn listings(&self) -> Result<impl Iterator<Item = ListingRecord<'_>>> {
        let document = self.document()?;
        Ok(listing::listings(document, &self.namespace))
    }

    /// Runs one import pass.
    ///
    /// With `only_load` the document is loaded and nothing is written to the store.
    /// Otherwise a Site is committed first, then every listing is committed on its own.
    pub fn import(&self, store: &mut dyn EntityStore, only_load: bool) -> Result<ImportReport> {
        let started = Instant::now();
        let document = self.document()?;

        let mut report = ImportReport {
            only_load,
            origin: Some(document.origin().clone()),
            ..ImportReport::default()
        };

        if only_load {
            report.listings_seen = listing::listings(document, &self.namespace).count();
            report.elapsed_seconds = started.elapsed().as_secs_f64();
            tracing::info!(
                "🔍 Load-only run: {} listings found, nothing imported",
                report.listings_seen
            );
            return Ok(report);
        }

        let site_id = self.commit_site(store)?;
        report.site = Some(site_id);

        for record in listing::listings(document, &self.namespace) {
            report.listings_seen += 1;

            let entities = match materializer::materialize(&record, site_id, store) {
                Ok(entities) => entities,
                Err(e) => match self.policy {
                    ListingErrorPolicy::Abort => {
                        tracing::error!(
                            "❌ Listing #{} ({}) failed: {}",
                            report.listings_seen,
                            record.internal_id().unwrap_or("?"),
                            e
                        );
                        return Err(e);
                    }
                    ListingErrorPolicy::Skip => {
                        tracing::warn!(
                            "⚠️ Skipping listing #{} ({}): {}",
                            report.listings_seen,
                            record.internal_id().unwrap_or("?"),
                            e
                        );
                        report.listings_skipped += 1;
                        continue;
                    }
                },
            };

            tracing::debug!(
                "Committing offer {} (object #{}, offer #{})",
                entities.offer.site_offer_id,
                entities.object.id,
                entities.offer.id
            );
            materializer::commit(store, entities)?;
            report.listings_imported += 1;
        }

        report.elapsed_seconds = started.elapsed().as_secs_f64();
        tracing::info!(
            "🏁 Import finished: {} imported, {} skipped of {} listings in {:.2}s",
            report.listings_imported,
            report.listings_skipped,
            report.listings_seen,
            report.elapsed_seconds
        );

        Ok(report)
    }

    fn commit_site(&self, store: &mut dyn EntityStore) -> Result<EntityId> {
        let mut site: Site = store.create_site();
        site.name = self.site.name.clone();
        site.url = self.site.url.clone();
        let site_id = site.id;

        store.add(site.into())?;
        store.save_changes()?;

        tracing::debug!("Site #{} '{}' committed", site_id, self.site.name);
        Ok(site_id)
    }
}
