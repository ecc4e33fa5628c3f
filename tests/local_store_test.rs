mod common;

use anyhow::Result;
use common::{feed, offer, two_offer_feed};
use realty_import::adapters::local_store::{JOURNAL_FILE, SNAPSHOT_FILE};
use realty_import::adapters::memory_store::StoreSnapshot;
use realty_import::{EntityStore, FeedImporter, FeedStream, ImportError, LocalStore};
use std::io::{Cursor, Write};
use tempfile::{NamedTempFile, TempDir};

fn importer(xml: String) -> FeedImporter {
    FeedImporter::from_stream(FeedStream::seekable(Cursor::new(xml.into_bytes())))
}

#[test]
fn test_each_commit_appends_one_journal_line() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;

    importer(two_offer_feed()).import(&mut store, false)?;

    // site + one unit per listing, no full snapshot yet
    let journal = std::fs::read_to_string(dir.path().join(JOURNAL_FILE))?;
    assert_eq!(journal.lines().count(), 3);
    assert!(!store.snapshot_path().exists());

    let units: Vec<StoreSnapshot> = journal
        .lines()
        .map(|line| serde_json::from_str(line))
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(units[0].sites.len(), 1);
    assert_eq!(units[1].objects.len(), 1);
    assert_eq!(units[1].offers.len(), 1);
    Ok(())
}

#[test]
fn test_compact_writes_full_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;

    importer(two_offer_feed()).import(&mut store, false)?;
    store.compact()?;

    let data = std::fs::read(dir.path().join(SNAPSHOT_FILE))?;
    let snapshot: StoreSnapshot = serde_json::from_slice(&data)?;
    assert_eq!(snapshot.sites.len(), 1);
    assert_eq!(snapshot.objects.len(), 2);
    assert_eq!(snapshot.offers.len(), 2);
    assert_eq!(&snapshot, store.store().snapshot());
    assert!(!store.journal_path().exists());
    Ok(())
}

#[test]
fn test_only_load_writes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;

    importer(two_offer_feed()).import(&mut store, true)?;
    store.compact()?;

    assert!(!store.snapshot_path().exists());
    assert!(!store.journal_path().exists());
    Ok(())
}

#[test]
fn test_unwritable_store_keeps_commit_invisible() -> Result<()> {
    let file = NamedTempFile::new()?;
    let mut store = LocalStore::open(file.path().join("output"))?;

    let site = store.create_site();
    store.add(site.into())?;
    assert!(store.save_changes().is_err());

    assert!(store.store().sites().is_empty());
    assert_eq!(store.store().pending_len(), 0);
    assert_eq!(store.store().commit_count(), 0);

    let result = importer(two_offer_feed()).import(&mut store, false);
    assert!(result.is_err());
    assert!(store.store().snapshot().is_empty());
    Ok(())
}

#[test]
fn test_torn_journal_tail_is_ignored() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;
    importer(two_offer_feed()).import(&mut store, false)?;
    drop(store);

    let mut journal = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join(JOURNAL_FILE))?;
    journal.write_all(br#"{"sites":[{"id":99,"#)?;
    drop(journal);

    let reopened = LocalStore::open(dir.path())?;
    assert_eq!(reopened.store().offers().len(), 2);
    assert!(reopened.store().sites().iter().all(|s| s.id != 99));
    Ok(())
}

#[test]
fn test_aborted_run_keeps_earlier_listings_on_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;
    let xml = feed(&[
        offer("A", "продажа", "Квартира", "http://atlantnt.ru/a"),
        offer("B", "продажа", "Замок", "http://atlantnt.ru/b"),
    ]);

    let result = importer(xml).import(&mut store, false);
    assert!(matches!(result, Err(ImportError::LookupError { .. })));

    let reopened = LocalStore::open(dir.path())?;
    assert_eq!(reopened.store().offers().len(), 1);
    assert_eq!(reopened.store().offers()[0].site_offer_id, "A");
    Ok(())
}

#[test]
fn test_reopened_store_appends() -> Result<()> {
    let dir = TempDir::new()?;

    let mut store = LocalStore::open(dir.path())?;
    importer(two_offer_feed()).import(&mut store, false)?;
    store.compact()?;

    let mut store = LocalStore::open(dir.path())?;
    importer(two_offer_feed()).import(&mut store, false)?;
    drop(store);

    // snapshot from the first run, journal from the second
    let store = LocalStore::open(dir.path())?;
    assert_eq!(store.store().offers().len(), 4);
    let mut ids: Vec<u64> = store.store().offers().iter().map(|o| o.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    Ok(())
}

#[test]
fn test_export_offers_csv() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = LocalStore::open(dir.path())?;
    importer(two_offer_feed()).import(&mut store, false)?;

    let path = store.export_offers_csv("offers.csv")?;
    let mut reader = csv::Reader::from_path(&path)?;

    let headers = reader.headers()?.clone();
    assert_eq!(&headers[0], "offer_id");
    assert_eq!(&headers[1], "site_offer_id");

    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "A");
    assert_eq!(&rows[0][2], "Sale");
    assert_eq!(&rows[0][3], "Атлант-Недвижимость");
    assert_eq!(&rows[0][5], "Flat");
    assert_eq!(&rows[1][2], "Rent");
    assert_eq!(&rows[1][5], "Room");
    Ok(())
}
