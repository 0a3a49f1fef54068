//! Filesystem-backed series cache.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use quiver_types::{SeriesKey, TimeSeries};
use tracing::{debug, warn};

use crate::{
    CacheLayout, MetadataRecord, Result, StoreError, layout::parse_entry, merge_series,
    read_table, write_table,
};

/// Reads, merges and writes cached series and their metadata sidecars.
///
/// Every file is replaced by writing a temporary sibling and renaming it,
/// so an interrupted write never leaves a truncated file. The series file
/// and its sidecar are written separately; a crash between them leaves the
/// sidecar one refresh behind.
#[derive(Debug, Clone)]
pub struct CacheStore {
    layout: CacheLayout,
}

impl CacheStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| StoreError::CreateDir {
                path: root.clone(),
                source: e,
            })?;
        }
        Ok(Self {
            layout: CacheLayout::new(root),
        })
    }

    /// Returns the default data directory.
    ///
    /// - Linux: `~/.local/share/quiver/data`
    /// - macOS: `~/Library/Application Support/quiver/data`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\quiver\data`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDir`] if no home directory is known.
    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "quiver")
            .map(|dirs| dirs.data_dir().join("data"))
            .ok_or(StoreError::NoDataDir)
    }

    /// Creates a store at the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be determined or created.
    pub fn with_default_path() -> Result<Self> {
        Self::new(Self::default_path()?)
    }

    /// Returns the path layout.
    #[must_use]
    pub const fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Reads the cached series of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn read_series(&self, key: &SeriesKey) -> Result<Option<TimeSeries>> {
        let path = self.layout.series_path(key);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::ReadFile { path, source: e }),
        };
        read_table(file)
            .await
            .map(Some)
            .map_err(|source| StoreError::Table { path, source })
    }

    /// Reads the cached series of every key; keys without a file are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first read or decoding error.
    pub async fn load_series(
        &self,
        keys: impl IntoIterator<Item = SeriesKey>,
    ) -> Result<BTreeMap<SeriesKey, TimeSeries>> {
        let mut loaded = BTreeMap::new();
        for key in keys {
            match self.read_series(&key).await? {
                Some(series) => {
                    loaded.insert(key, series);
                }
                None => warn!(key = %key, "no cached data"),
            }
        }
        Ok(loaded)
    }

    /// Replaces the series file of `key` with `series`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_series(&self, key: &SeriesKey, series: &TimeSeries) -> Result<()> {
        let path = self.layout.series_path(key);
        let mut buffer = Vec::new();
        write_table(series, &mut buffer)
            .await
            .map_err(|source| StoreError::Table {
                path: path.clone(),
                source,
            })?;
        replace_file(&path, &buffer).await?;
        debug!(key = %key, rows = series.len(), path = %path.display(), "series saved");
        Ok(())
    }

    /// Merges `fresh` into `existing` and persists the result.
    ///
    /// Without an existing series the fresh rows are written as they are.
    /// If the merge is rejected, the stored file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Merge`] when the fresh rows do not overlap the
    /// cached series, or a write error.
    pub async fn merge_and_persist(
        &self,
        key: &SeriesKey,
        fresh: &TimeSeries,
        existing: Option<&TimeSeries>,
    ) -> Result<TimeSeries> {
        let merged = match existing {
            Some(existing) => {
                merge_series(existing, fresh).map_err(|source| StoreError::Merge {
                    path: self.layout.series_path(key),
                    source,
                })?
            }
            None => fresh.clone(),
        };
        self.write_series(key, &merged).await?;
        Ok(merged)
    }

    /// Reads the metadata sidecar of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn read_metadata(&self, key: &SeriesKey) -> Result<Option<MetadataRecord>> {
        let path = self.layout.metadata_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::ReadFile { path, source: e }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::ParseJson { path, source: e })
    }

    /// Merges `fresh` over the stored sidecar of `key`.
    ///
    /// Writes only if the sidecar already exists or `create` is set.
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar cannot be read or written.
    pub async fn update_metadata(
        &self,
        key: &SeriesKey,
        fresh: MetadataRecord,
        create: bool,
    ) -> Result<bool> {
        let existing = self.read_metadata(key).await?;
        if existing.is_none() && !create {
            debug!(key = %key, "no metadata to update");
            return Ok(false);
        }
        let merged = match existing {
            Some(old) => fresh.merge_over(&old),
            None => fresh,
        };
        let path = self.layout.metadata_path(key);
        let json = serde_json::to_string_pretty(&merged)?;
        replace_file(&path, json.as_bytes()).await?;
        debug!(key = %key, "metadata updated");
        Ok(true)
    }

    /// Reads the sidecars of every key; missing sidecars yield empty records.
    ///
    /// # Errors
    ///
    /// Returns the first read or parse error.
    pub async fn gather_metadata(
        &self,
        keys: impl IntoIterator<Item = SeriesKey>,
    ) -> Result<BTreeMap<SeriesKey, MetadataRecord>> {
        let mut gathered = BTreeMap::new();
        for key in keys {
            let record = self.read_metadata(&key).await?.unwrap_or_default();
            gathered.insert(key, record);
        }
        Ok(gathered)
    }

    /// Lists every cached series, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read.
    pub async fn list_series(&self) -> Result<Vec<SeriesKey>> {
        let mut keys = Vec::new();
        let root = self.layout.root();
        let mut folders = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => {
                return Err(StoreError::ReadDir {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
        };
        while let Some(folder) = next_entry(&mut folders, root).await? {
            let folder_path = folder.path();
            if !folder_path.is_dir() {
                continue;
            }
            let Some(folder_name) = folder.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let mut files = tokio::fs::read_dir(&folder_path)
                .await
                .map_err(|e| StoreError::ReadDir {
                    path: folder_path.clone(),
                    source: e,
                })?;
            while let Some(file) = next_entry(&mut files, &folder_path).await? {
                if let Some(key) = file
                    .file_name()
                    .to_str()
                    .and_then(|name| parse_entry(&folder_name, name))
                {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

async fn next_entry(
    entries: &mut tokio::fs::ReadDir,
    path: &Path,
) -> Result<Option<tokio::fs::DirEntry>> {
    entries.next_entry().await.map_err(|e| StoreError::ReadDir {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes `contents` to a temporary sibling of `path` and renames it over
/// `path`, creating the parent folder first.
async fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()));

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| StoreError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
