//! On-disk cache of parsed feeds
//!
//! Entries are keyed by the MD5 of the feed URL and sharded on the first
//! four hex digits:
//!
//! ```text
//! {cache_dir}/dcrepo/{md5[0..2]}/{md5[2..4]}/{md5}.json
//! ```
//!
//! The entry's modification time is its freshness timestamp.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::CACHE_FILE_PREFIX;
use crate::feed::ModuleMap;
use crate::repository::error::CacheError;

/// Version of the serialized entry layout
pub const CACHE_FORMAT: u32 = 1;

const CACHE_FILE_EXTENSION: &str = "json";

#[derive(Serialize)]
struct EntryRef<'a> {
    format: u32,
    modules: &'a ModuleMap,
}

#[derive(Deserialize)]
struct Entry {
    format: u32,
    modules: ModuleMap,
}

pub struct FeedCache {
    root: PathBuf,
}

impl FeedCache {
    /// Opens a cache rooted at `dir`.
    ///
    /// Returns None when `dir` is missing, not a directory or read-only.
    pub fn open(dir: &Path) -> Option<Self> {
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Some(Self {
                root: dir.to_path_buf(),
            }),
            Ok(_) => {
                warn!("Cache directory {:?} is not a writable directory", dir);
                None
            }
            Err(e) => {
                warn!("Cache directory {:?} is unavailable: {}", dir, e);
                None
            }
        }
    }

    /// Path of the entry for `url`
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let hash = format!("{:x}", md5::compute(url.as_bytes()));
        self.root
            .join(CACHE_FILE_PREFIX)
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(format!("{hash}.{CACHE_FILE_EXTENSION}"))
    }

    /// Modification time of an entry, None if it does not exist
    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path)
            .ok()
            .filter(|meta| meta.is_file())
            .and_then(|meta| meta.modified().ok())
    }

    pub fn load(&self, path: &Path) -> Result<ModuleMap, CacheError> {
        let reader = BufReader::new(File::open(path)?);
        let entry: Entry = serde_json::from_reader(reader)?;

        if entry.format != CACHE_FORMAT {
            return Err(CacheError::UnsupportedFormat(entry.format));
        }

        Ok(entry.modules)
    }

    /// Replace an entry, creating parent directories as needed.
    ///
    /// The content is written to a temporary sibling and renamed into place.
    pub fn store(&self, path: &Path, modules: &ModuleMap) -> Result<(), CacheError> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(
                &mut writer,
                &EntryRef {
                    format: CACHE_FORMAT,
                    modules,
                },
            )?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        debug!("Cached {} modules at {:?}", modules.len(), path);
        Ok(())
    }

    /// Reset an entry's freshness without changing its content
    pub fn touch(&self, path: &Path) -> Result<(), CacheError> {
        filetime::set_file_mtime(path, FileTime::now())?;
        Ok(())
    }
}
