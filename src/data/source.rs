use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::loader::{LoadOptions, load_file, parse_csv};
use super::model::RawTable;

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// A named remote CSV, as listed in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote(RemoteSource),
}

impl DataSource {
    /// Cache key: the path or URL.
    pub fn key(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Remote(remote) => remote.url.clone(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                write!(f, "{name}")
            }
            DataSource::Remote(remote) => write!(f, "{}", remote.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Retrieves the body of a remote CSV.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP GET with a whole-request timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("fetching {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("fetching {url}: server returned {status}");
        }
        response.text().context("reading response body")
    }
}

// ---------------------------------------------------------------------------
// Read-through cache
// ---------------------------------------------------------------------------

/// One parsed table per source key. Entries are only replaced wholesale by
/// [`SourceCache::refresh`]; there is no eviction.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<String, RawTable>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `source`, loading it on a miss.
    pub fn load(
        &mut self,
        source: &DataSource,
        options: &LoadOptions,
        fetcher: &dyn Fetcher,
    ) -> Result<&RawTable> {
        let key = source.key();
        if self.entries.contains_key(&key) {
            log::debug!("cache hit for {key}");
        } else {
            let table = read_source(source, options, fetcher)?;
            self.entries.insert(key.clone(), table);
        }
        self.entries
            .get(&key)
            .context("cache entry vanished after insert")
    }

    /// Reload `source` and replace its entry. If reading fails and an older
    /// table is cached, that table is returned instead.
    pub fn refresh(
        &mut self,
        source: &DataSource,
        options: &LoadOptions,
        fetcher: &dyn Fetcher,
    ) -> Result<&RawTable> {
        let key = source.key();
        match read_source(source, options, fetcher) {
            Ok(table) => {
                self.entries.insert(key.clone(), table);
            }
            Err(e) if self.entries.contains_key(&key) => {
                log::warn!("refreshing {source} failed, using cached copy: {e:#}");
            }
            Err(e) => return Err(e),
        }
        self.entries
            .get(&key)
            .context("cache entry vanished after insert")
    }

    pub fn invalidate(&mut self, source: &DataSource) {
        self.entries.remove(&source.key());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_source(source: &DataSource, options: &LoadOptions, fetcher: &dyn Fetcher) -> Result<RawTable> {
    match source {
        DataSource::File(path) => load_file(path, options),
        DataSource::Remote(remote) => {
            let body = fetcher.fetch(&remote.url)?;
            let table = parse_csv(body.as_bytes(), options)
                .with_context(|| format!("parsing {}", remote.name))?;
            log::info!(
                "Fetched {} rows with columns {:?} from {}",
                table.len(),
                table.column_names(),
                remote.name
            );
            Ok(table)
        }
    }
}
