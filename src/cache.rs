use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),
    #[error("request for {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("cache file {path} could not be written or read: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Something that can stream the body behind a URL into a writer.
pub trait Source {
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// Fetch-once storage for raw responses. An entry that exists is returned
/// as-is; it is never revalidated.
pub trait ResponseCache {
    fn ensure_cached(&self, url: &str, name: &str) -> Result<Vec<u8>, FetchError>;
}

/// Caches responses as files named after the cache key inside `dir`.
pub struct DiskCache<S> {
    dir: PathBuf,
    source: S,
}

impl<S: Source> DiskCache<S> {
    pub fn new(dir: impl Into<PathBuf>, source: S) -> Self {
        Self {
            dir: dir.into(),
            source,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn download(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Written next to the destination so the final rename stays on one filesystem.
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        let written = self.source.fetch_into(url, staged.as_file_mut())?;
        staged.as_file_mut().flush().map_err(io_err)?;
        staged.persist(path).map_err(|err| io_err(err.error))?;
        Ok(written)
    }
}

impl<S: Source> ResponseCache for DiskCache<S> {
    fn ensure_cached(&self, url: &str, name: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(name);
        if path.exists() {
            debug!(path = %path.display(), "cache hit");
        } else {
            debug!(path = %path.display(), url, "cache miss");
            let written = self.download(url, &path)?;
            info!(path = %path.display(), bytes = written, "downloaded");
        }

        fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// Same contract as [`DiskCache`] but held in memory for the life of the value.
pub struct InMemoryCache<S> {
    source: S,
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl<S: Source> InMemoryCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn insert(&self, name: &str, raw: impl Into<Vec<u8>>) {
        self.entries
            .borrow_mut()
            .insert(name.to_string(), raw.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }
}

impl<S: Source> ResponseCache for InMemoryCache<S> {
    fn ensure_cached(&self, url: &str, name: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(raw) = self.entries.borrow().get(name) {
            debug!(name, "cache hit");
            return Ok(raw.clone());
        }

        debug!(name, url, "cache miss");
        let mut raw = Vec::new();
        self.source.fetch_into(url, &mut raw)?;
        self.insert(name, raw.clone());
        Ok(raw)
    }
}
