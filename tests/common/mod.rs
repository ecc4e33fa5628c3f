#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

pub const NS: &str = "http://webmaster.yandex.ru/schemas/feed/realty/2010-06";

/// One `<offer>` with the fields the importer reads.
pub fn offer(internal_id: &str, kind: &str, category: &str, url: &str) -> String {
    format!(
        r#"  <offer internal-id="{}">
    <type>{}</type>
    <property-type>жилая</property-type>
    <category>{}</category>
    <url>{}</url>
    <location>
      <country>Россия</country>
      <locality-name>Санкт-Петербург</locality-name>
    </location>
  </offer>
"#,
        internal_id, kind, category, url
    )
}

pub fn feed(offers: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<realty-feed xmlns="{}">
  <generation-date>2016-05-10T12:00:00+04:00</generation-date>
{}</realty-feed>
"#,
        NS,
        offers.concat()
    )
}

pub fn two_offer_feed() -> String {
    feed(&[
        offer("A", "продажа", "Квартира", "http://atlantnt.ru/a"),
        offer("B", "аренда", "Комната", "http://atlantnt.ru/b"),
    ])
}

pub fn zip_bytes(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        match content {
            Some(content) => {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
            None => zip.add_directory(*name, SimpleFileOptions::default()).unwrap(),
        }
    }
    zip.finish().unwrap().into_inner()
}

pub fn gzip_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

pub fn bzip2_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}
