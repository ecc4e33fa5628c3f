use crate::adapters::memory_store::{InMemoryStore, StoreSnapshot};
use crate::domain::model::{Entity, Offer, RealtyObject, Site};
use crate::domain::ports::EntityStore;
use crate::utils::error::{ImportError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE: &str = "realty_snapshot.json";
pub const JOURNAL_FILE: &str = "realty_journal.jsonl";

/// 以本機目錄保存匯入結果的儲存層
///
/// Each commit appends its unit as one JSON line to the journal before the unit
/// becomes visible, so a run that aborts half way still leaves the listings
/// committed before the failure on disk. [`compact`](Self::compact) folds the
/// journal into the full snapshot.
#[derive(Debug)]
pub struct LocalStore {
    base_path: PathBuf,
    inner: InMemoryStore,
    journal: Option<BufWriter<File>>,
}

#[derive(Debug, Serialize)]
struct OfferRow<'a> {
    offer_id: u64,
    site_offer_id: &'a str,
    offer_type: String,
    site: &'a str,
    property_type: String,
    category: String,
    url: &'a str,
    area: String,
    area_unit: String,
    building_type: String,
    created_at: String,
}

fn display_or_empty<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl LocalStore {
    /// Opens the store directory, picking up an existing snapshot and journal.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let snapshot_path = base_path.join(SNAPSHOT_FILE);

        let mut inner = if snapshot_path.exists() {
            let reader = BufReader::new(File::open(&snapshot_path)?);
            let snapshot: StoreSnapshot = serde_json::from_reader(reader)?;
            tracing::debug!(
                "Loaded snapshot with {} offers from {}",
                snapshot.offers.len(),
                snapshot_path.display()
            );
            InMemoryStore::from_snapshot(snapshot)
        } else {
            InMemoryStore::new()
        };

        let journal_path = base_path.join(JOURNAL_FILE);
        if journal_path.exists() {
            let replayed = Self::replay_journal(&journal_path, &mut inner)?;
            tracing::debug!("Replayed {} journaled entities", replayed);
        }

        Ok(Self {
            base_path,
            inner,
            journal: None,
        })
    }

    /// A torn last line is what an interrupted append leaves behind and is dropped;
    /// any other unreadable line is an error.
    fn replay_journal(path: &Path, inner: &mut InMemoryStore) -> Result<usize> {
        let lines = BufReader::new(File::open(path)?)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()?;

        let mut replayed = 0;
        let last = lines.len().saturating_sub(1);
        for (number, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoreSnapshot>(line) {
                Ok(unit) => replayed += inner.replay(unit),
                Err(e) if number == last => {
                    tracing::warn!("⚠️ Ignoring torn journal tail in {}: {}", path.display(), e);
                }
                Err(e) => {
                    return Err(ImportError::persistence(format!(
                        "corrupt journal {} at line {}: {}",
                        path.display(),
                        number + 1,
                        e
                    )))
                }
            }
        }
        Ok(replayed)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.base_path.join(SNAPSHOT_FILE)
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn journal_path(&self) -> PathBuf {
        self.base_path.join(JOURNAL_FILE)
    }

    fn append_journal(&mut self, unit: &StoreSnapshot) -> Result<()> {
        let mut line = serde_json::to_vec(unit)?;
        line.push(b'\n');

        if self.journal.is_none() {
            fs::create_dir_all(&self.base_path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.journal_path())?;
            self.journal = Some(BufWriter::new(file));
        }

        if let Some(journal) = self.journal.as_mut() {
            journal.write_all(&line)?;
            journal.flush()?;
        }
        Ok(())
    }

    /// 將目前所有已提交的資料寫成完整快照，並清除 journal
    ///
    /// Written to a temp file and renamed into place. Does nothing when no journal
    /// exists, i.e. nothing was committed since the last compaction.
    pub fn compact(&mut self) -> Result<()> {
        let journal_path = self.journal_path();
        if !journal_path.exists() {
            return Ok(());
        }

        self.journal = None;
        let tmp_path = self.base_path.join(format!("{}.tmp", SNAPSHOT_FILE));
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer_pretty(&mut writer, self.inner.snapshot())?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, self.snapshot_path())?;
        fs::remove_file(&journal_path)?;

        tracing::info!(
            "💾 Snapshot compacted: {} offers in {}",
            self.inner.offers().len(),
            self.snapshot_path().display()
        );
        Ok(())
    }

    /// Writes one CSV row per committed offer, joined with its object and site.
    pub fn export_offers_csv(&self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.base_path.join(file_name);

        let sites: HashMap<u64, &Site> = self.inner.sites().iter().map(|s| (s.id, s)).collect();
        let objects: HashMap<u64, &RealtyObject> =
            self.inner.objects().iter().map(|o| (o.id, o)).collect();

        let mut writer = csv::Writer::from_path(&path)?;
        for offer in self.inner.offers() {
            writer.serialize(Self::row(offer, &sites, &objects))?;
        }
        writer.flush()?;

        tracing::debug!("Exported {} offers to {}", self.inner.offers().len(), path.display());
        Ok(path)
    }

    fn row<'a>(
        offer: &'a Offer,
        sites: &HashMap<u64, &'a Site>,
        objects: &HashMap<u64, &'a RealtyObject>,
    ) -> OfferRow<'a> {
        let site = offer.site.and_then(|id| sites.get(&id).copied());
        let object = offer.object.and_then(|id| objects.get(&id).copied());

        OfferRow {
            offer_id: offer.id,
            site_offer_id: &offer.site_offer_id,
            offer_type: display_or_empty(offer.offer_type),
            site: site.map(|s| s.name.as_str()).unwrap_or_default(),
            property_type: display_or_empty(object.and_then(|o| o.property_type)),
            category: display_or_empty(object.and_then(|o| o.category)),
            url: object.and_then(|o| o.url.as_deref()).unwrap_or_default(),
            area: display_or_empty(object.and_then(|o| o.area).map(|a| a.value)),
            area_unit: display_or_empty(object.and_then(|o| o.area).map(|a| a.unit)),
            building_type: display_or_empty(object.and_then(|o| o.building_type)),
            created_at: display_or_empty(offer.created_at.map(|d| d.to_rfc3339())),
        }
    }
}

impl EntityStore for LocalStore {
    fn create_site(&mut self) -> Site {
        self.inner.create_site()
    }

    fn create_object(&mut self) -> RealtyObject {
        self.inner.create_object()
    }

    fn create_offer(&mut self) -> Offer {
        self.inner.create_offer()
    }

    fn add(&mut self, entity: Entity) -> Result<()> {
        self.inner.add(entity)
    }

    fn save_changes(&mut self) -> Result<()> {
        let unit = self.inner.prepare_commit()?;
        if let Err(e) = self.append_journal(&unit) {
            self.inner.discard_changes();
            self.journal = None;
            return Err(e);
        }
        self.inner.apply_pending();
        Ok(())
    }

    fn discard_changes(&mut self) {
        self.inner.discard_changes()
    }
}
