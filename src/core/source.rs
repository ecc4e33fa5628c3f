use crate::utils::error::{ImportError, Result};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const BOTH_SUPPLIED: &str = "file and a stream supplied for import";
const NONE_SUPPLIED: &str = "no file nor a stream supplied for import";

pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// 已開啟的輸入串流，並標明是否支援隨機存取
pub enum FeedStream {
    Seekable(Box<dyn ReadSeek>),
    Sequential(Box<dyn Read + Send>),
}

impl FeedStream {
    pub fn seekable<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        FeedStream::Seekable(Box::new(reader))
    }

    pub fn sequential<R: Read + Send + 'static>(reader: R) -> Self {
        FeedStream::Sequential(Box::new(reader))
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self, FeedStream::Seekable(_))
    }

    /// Moves the read position back to the very start of the stream.
    pub fn rewind(&mut self) -> Result<()> {
        match self {
            FeedStream::Seekable(reader) => {
                reader.seek(SeekFrom::Start(0))?;
                Ok(())
            }
            FeedStream::Sequential(_) => {
                Err(ImportError::operation("cannot seek file to reset reading"))
            }
        }
    }
}

impl Read for FeedStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            FeedStream::Seekable(reader) => reader.read(buf),
            FeedStream::Sequential(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for FeedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStream::Seekable(_) => f.write_str("FeedStream::Seekable"),
            FeedStream::Sequential(_) => f.write_str("FeedStream::Sequential"),
        }
    }
}

/// 匯入來源：檔案路徑或已開啟的串流，兩者必須恰好提供一個
#[derive(Debug, Default)]
pub struct ImportSource {
    file: Option<PathBuf>,
    stream: Option<FeedStream>,
}

impl ImportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::new().with_file(path)
    }

    pub fn from_stream(stream: FeedStream) -> Self {
        Self::new().with_stream(stream)
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_stream(mut self, stream: FeedStream) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Checks the file/stream combination without touching any I/O.
    pub fn validate(&self) -> Result<()> {
        match (&self.file, &self.stream) {
            (Some(_), Some(_)) => Err(ImportError::configuration(BOTH_SUPPLIED)),
            (None, None) => Err(ImportError::configuration(NONE_SUPPLIED)),
            _ => Ok(()),
        }
    }

    /// Takes what is needed for one load attempt.
    ///
    /// A file path stays behind so a later attempt can reopen it; a stream can only
    /// be consumed once.
    pub(crate) fn take_for_load(&mut self) -> Result<ImportSource> {
        self.validate()?;
        Ok(ImportSource {
            file: self.file.clone(),
            stream: self.stream.take(),
        })
    }

    pub fn resolve(self) -> Result<FeedStream> {
        match (self.file, self.stream) {
            (Some(path), None) => {
                tracing::debug!("Opening feed file: {}", path.display());
                let file = File::open(&path)?;
                Ok(FeedStream::seekable(file))
            }
            (None, Some(stream)) => {
                tracing::debug!("Using caller supplied stream: {:?}", stream);
                Ok(stream)
            }
            (Some(_), Some(_)) => Err(ImportError::configuration(BOTH_SUPPLIED)),
            (None, None) => Err(ImportError::configuration(NONE_SUPPLIED)),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.file, &self.stream) {
            (Some(path), _) => format!("file {}", path.display()),
            (None, Some(stream)) => format!("{:?}", stream),
            (None, None) => "nothing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_both_sources_rejected() {
        let source = ImportSource::from_file("/definitely/not/here.xml")
            .with_stream(FeedStream::seekable(Cursor::new(Vec::new())));

        match source.resolve() {
            Err(ImportError::ConfigurationError { message }) => {
                assert_eq!(message, "file and a stream supplied for import")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_no_source_rejected() {
        match ImportSource::new().resolve() {
            Err(ImportError::ConfigurationError { message }) => {
                assert_eq!(message, "no file nor a stream supplied for import")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ImportSource::from_file("/definitely/not/here.xml").resolve();
        assert!(matches!(result, Err(ImportError::IoError(_))));
    }

    #[test]
    fn test_take_for_load_keeps_file_path() {
        let mut source = ImportSource::from_file("feed.xml");
        let taken = source.take_for_load().unwrap();
        assert_eq!(taken.file(), Some(Path::new("feed.xml")));
        assert_eq!(source.file(), Some(Path::new("feed.xml")));

        let mut source = ImportSource::from_stream(FeedStream::sequential(Cursor::new(vec![1u8])));
        assert!(source.take_for_load().unwrap().has_stream());
        assert!(source.take_for_load().is_err());
    }

    #[test]
    fn test_rewind_requires_seek() {
        let mut stream = FeedStream::seekable(Cursor::new(b"abc".to_vec()));
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).unwrap();
        stream.rewind().unwrap();
        let mut all = String::new();
        stream.read_to_string(&mut all).unwrap();
        assert_eq!(all, "abc");

        let mut stream = FeedStream::sequential(Cursor::new(b"abc".to_vec()));
        assert!(matches!(
            stream.rewind(),
            Err(ImportError::OperationError { .. })
        ));
    }
}
