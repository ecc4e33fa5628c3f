use crate::core::source::FeedStream;
use crate::utils::error::{ImportError, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, ErrorKind, Read};
use zip::ZipArchive;

/// Longest signature checked by [`probe`].
pub const PROBE_LEN: usize = 4;

/// Upper bound on the buffer reserved up front from a size the archive declares.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveKind {
    Zip,
    Gzip,
    Bzip2,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Zip => f.write_str("zip"),
            ArchiveKind::Gzip => f.write_str("gzip"),
            ArchiveKind::Bzip2 => f.write_str("bzip2"),
        }
    }
}

/// 探測結果：輸入是否為已知的壓縮容器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveProbe {
    Archive(ArchiveKind),
    PlainDocument,
}

/// Where the document bytes came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DocumentOrigin {
    Plain,
    Archive {
        kind: ArchiveKind,
        entry: Option<String>,
    },
}

impl DocumentOrigin {
    pub fn is_archive(&self) -> bool {
        matches!(self, DocumentOrigin::Archive { .. })
    }
}

/// 準備交給 XML 解析器的串流
pub struct UnwrappedDocument {
    pub reader: Box<dyn Read + Send>,
    pub origin: DocumentOrigin,
}

impl fmt::Debug for UnwrappedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnwrappedDocument")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Matches leading bytes against the supported container signatures.
pub fn probe(header: &[u8]) -> ArchiveProbe {
    if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
        ArchiveProbe::Archive(ArchiveKind::Zip)
    } else if header.starts_with(&[0x1f, 0x8b]) {
        ArchiveProbe::Archive(ArchiveKind::Gzip)
    } else if header.starts_with(b"BZh") {
        ArchiveProbe::Archive(ArchiveKind::Bzip2)
    } else {
        ArchiveProbe::PlainDocument
    }
}

fn read_probe_header(stream: &mut FeedStream) -> Result<Vec<u8>> {
    let mut header = vec![0u8; PROBE_LEN];
    let mut filled = 0;

    while filled < PROBE_LEN {
        match stream.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    header.truncate(filled);
    Ok(header)
}

/// 解開壓縮容器，或將原始串流倒回開頭
///
/// Probing consumes the leading bytes. Archives are read through the probed bytes
/// chained back in front of the stream; a plain document has to be rewound, which
/// a sequential stream cannot do.
pub fn unwrap_archive(mut stream: FeedStream) -> Result<UnwrappedDocument> {
    let header = read_probe_header(&mut stream)?;

    match probe(&header) {
        ArchiveProbe::Archive(kind) => {
            tracing::debug!("Input recognized as a {} archive", kind);
            let reader = Cursor::new(header).chain(stream);

            let (entry, content) = match kind {
                ArchiveKind::Zip => first_zip_entry(reader)?,
                ArchiveKind::Gzip => gunzip(reader)?,
                ArchiveKind::Bzip2 => (None, decompress(BzDecoder::new(reader), kind)?),
            };

            tracing::info!(
                "📦 Unpacked {} bytes from {} archive entry {}",
                content.len(),
                kind,
                entry.as_deref().unwrap_or("<unnamed>")
            );

            Ok(UnwrappedDocument {
                reader: Box::new(Cursor::new(content)),
                origin: DocumentOrigin::Archive { kind, entry },
            })
        }
        ArchiveProbe::PlainDocument => {
            tracing::debug!("Input is not an archive, reading it as a plain document");
            stream.rewind()?;

            Ok(UnwrappedDocument {
                reader: Box::new(stream),
                origin: DocumentOrigin::Plain,
            })
        }
    }
}

/// Entries are visited in central directory order, which is the order they were stored in.
fn first_zip_entry<R: Read>(mut reader: R) -> Result<(Option<String>, Vec<u8>)> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            tracing::debug!("Skipping directory entry {}", file.name());
            continue;
        }

        let name = file.name().to_string();
        let mut content = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut content)
            .map_err(|e| ImportError::format(format!("corrupt zip entry {}: {}", name, e)))?;
        return Ok((Some(name), content));
    }

    Err(ImportError::format("cannot find a file in archive"))
}

/// The declared size comes from the archive itself and is not trusted beyond
/// [`MAX_PREALLOCATION`]; the buffer still grows to the real size while reading.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATION)
}

/// A gzip stream holds exactly one member; its header may carry the original file name.
fn gunzip<R: Read>(reader: R) -> Result<(Option<String>, Vec<u8>)> {
    let mut decoder = GzDecoder::new(reader);
    let mut content = Vec::new();
    decoder
        .read_to_end(&mut content)
        .map_err(|e| ImportError::format(format!("corrupt gzip archive: {}", e)))?;

    let entry = decoder
        .header()
        .and_then(|header| header.filename())
        .map(|name| String::from_utf8_lossy(name).into_owned());

    Ok((entry, content))
}

fn decompress<R: Read>(mut decoder: R, kind: ArchiveKind) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    decoder
        .read_to_end(&mut content)
        .map_err(|e| ImportError::format(format!("corrupt {} archive: {}", kind, e)))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn read_all(mut unwrapped: UnwrappedDocument) -> String {
        let mut text = String::new();
        unwrapped.reader.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_probe_signatures() {
        assert_eq!(probe(b"PK\x03\x04rest"), ArchiveProbe::Archive(ArchiveKind::Zip));
        assert_eq!(probe(b"PK\x05\x06"), ArchiveProbe::Archive(ArchiveKind::Zip));
        assert_eq!(probe(&[0x1f, 0x8b, 8, 0]), ArchiveProbe::Archive(ArchiveKind::Gzip));
        assert_eq!(probe(b"BZh9"), ArchiveProbe::Archive(ArchiveKind::Bzip2));
        assert_eq!(probe(b"<?xm"), ArchiveProbe::PlainDocument);
        assert_eq!(probe(b""), ArchiveProbe::PlainDocument);
        assert_eq!(probe(b"PK"), ArchiveProbe::PlainDocument);
    }

    #[test]
    fn test_plain_seekable_stream_is_rewound() {
        let stream = FeedStream::seekable(Cursor::new(b"<root/>".to_vec()));
        let unwrapped = unwrap_archive(stream).unwrap();
        assert_eq!(unwrapped.origin, DocumentOrigin::Plain);
        assert_eq!(read_all(unwrapped), "<root/>");
    }

    #[test]
    fn test_short_plain_stream_is_rewound() {
        let stream = FeedStream::seekable(Cursor::new(b"<a".to_vec()));
        assert_eq!(read_all(unwrap_archive(stream).unwrap()), "<a");
    }

    #[test]
    fn test_plain_sequential_stream_cannot_be_reset() {
        let stream = FeedStream::sequential(Cursor::new(b"<root/>".to_vec()));
        match unwrap_archive(stream) {
            Err(ImportError::OperationError { message }) => {
                assert_eq!(message, "cannot seek file to reset reading")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zip_skips_directories() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory("feeds/", SimpleFileOptions::default()).unwrap();
        zip.start_file("feeds/realty.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<feed/>").unwrap();
        zip.start_file("feeds/second.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<other/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let unwrapped = unwrap_archive(FeedStream::sequential(Cursor::new(bytes))).unwrap();
        assert_eq!(
            unwrapped.origin,
            DocumentOrigin::Archive {
                kind: ArchiveKind::Zip,
                entry: Some("feeds/realty.xml".to_string()),
            }
        );
        assert_eq!(read_all(unwrapped), "<feed/>");
    }

    #[test]
    fn test_zip_with_only_directories() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory("empty/", SimpleFileOptions::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        match unwrap_archive(FeedStream::seekable(Cursor::new(bytes))) {
            Err(ImportError::FormatError { message }) => {
                assert_eq!(message, "cannot find a file in archive")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_zip_is_not_treated_as_xml() {
        let stream = FeedStream::seekable(Cursor::new(b"PK\x03\x04garbage".to_vec()));
        assert!(matches!(unwrap_archive(stream), Err(ImportError::FormatError { .. })));
    }

    #[test]
    fn test_declared_entry_size_is_capped() {
        assert_eq!(initial_capacity(7), 7);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOCATION);
        assert_eq!(initial_capacity(MAX_PREALLOCATION as u64 + 1), MAX_PREALLOCATION);
    }

    #[test]
    fn test_gzip_member_name() {
        let mut encoder = flate2::GzBuilder::new()
            .filename("feed.xml")
            .write(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"<feed/>").unwrap();
        let bytes = encoder.finish().unwrap();

        let unwrapped = unwrap_archive(FeedStream::sequential(Cursor::new(bytes))).unwrap();
        assert_eq!(
            unwrapped.origin,
            DocumentOrigin::Archive {
                kind: ArchiveKind::Gzip,
                entry: Some("feed.xml".to_string()),
            }
        );
        assert_eq!(read_all(unwrapped), "<feed/>");
    }
}
