use crate::config::Config;
use crate::error::RustyTimetableError;
use reqwest::blocking::Client;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),

    #[error("Fetch remote file '{0}' failed: {1}")]
    RemoteFileFetchError(String, #[source] reqwest::Error),

    #[error("Open local file '{0}' failed: {1}")]
    LocalFileOpenError(String, #[source] std::io::Error),
}

/// A unified reader that can handle both local files and remote URLs
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Remote URL reader (in-memory buffer)
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a file from either a local path or remote URL.
    /// Remote files are downloaded completely into memory before parsing.
    ///
    /// # Arguments
    /// * `file_name` - Path or URL to the file
    /// * `config` - HTTP client settings
    ///
    /// # Returns
    /// * `Result<UnifiedReader, RustyTimetableError>` - Reader for the file content
    pub(crate) fn new(file_name: &str, config: &Config) -> Result<UnifiedReader, RustyTimetableError> {
        if Self::is_remote_url(file_name) {
            Self::fetch(file_name, config)
        } else {
            let path = Self::local_path(file_name);
            let file = File::open(&path)
                .map_err(|error| UnifiedReaderError::LocalFileOpenError(path.to_owned(), error))?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// Wraps bytes that are already in memory.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Remote(Cursor::new(bytes))
    }

    /// Checks if a file name represents a remote URL
    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        if let Ok(url) = Url::parse(file_name) {
            // Single-letter schemes are Windows drive letters, not URLs
            url.scheme() != "file" && url.scheme().len() > 1
        } else {
            false
        }
    }

    /// Resolves `file://` URLs to plain paths; any other name is returned as is.
    fn local_path(file_name: &str) -> String {
        Url::parse(file_name)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_owned())
    }

    /// Downloads a remote file with a blocking HTTP client.
    fn fetch(file_name: &str, config: &Config) -> Result<UnifiedReader, RustyTimetableError> {
        let mapper = |error: reqwest::Error| UnifiedReaderError::RemoteFileFetchError(file_name.to_owned(), error);
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(mapper)?;
        let bytes = client
            .get(file_name)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(mapper)?;
        debug!(url = file_name, bytes = bytes.len(), "fetched remote file");

        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        Ok(UnifiedReader::Remote(Cursor::new(bytes.to_vec())))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}
