//! In-memory index of sidecars and album markers
//!
//! Built once per run before resolution. Sidecar JSON is parsed in parallel
//! on the rayon pool; the index is read-only afterwards.

use super::locator::SidecarProbe;
use super::MetadataRecord;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sidecar::{self, is_album_metadata, is_sidecar_name};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// Parsed sidecar, or the reason it could not be parsed
type Parsed = std::result::Result<MetadataRecord, String>;

#[derive(Debug, Default)]
struct DirIndex {
    /// Sorted by name, which is the listing order used for alternative matches
    sidecars: BTreeMap<String, Parsed>,
    album_metadata: Option<PathBuf>,
}

/// Sidecars and album markers keyed by directory
#[derive(Debug, Default)]
pub struct IndexCache {
    dirs: HashMap<PathBuf, DirIndex>,
}

impl IndexCache {
    /// Scan the media roots and parse every sidecar found
    pub fn build(roots: &[PathBuf], config: &Config) -> Self {
        let span = span!(Level::INFO, "index_build", roots = roots.len());
        let _enter = span.enter();
        let started = Instant::now();

        let mut index = Self::default();
        let mut pending: Vec<(PathBuf, String)> = Vec::new();

        for root in roots {
            for entry in WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| !config.is_excluded_dir(e.path()))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(name) = entry.file_name().to_str() else {
                    continue;
                };
                let Some(dir) = entry.path().parent() else {
                    continue;
                };

                if is_album_metadata(name) {
                    index.dirs.entry(dir.to_path_buf()).or_default().album_metadata =
                        Some(entry.path().to_path_buf());
                } else if is_sidecar_name(name) {
                    pending.push((dir.to_path_buf(), name.to_string()));
                }
            }
        }

        let parsed: Vec<(PathBuf, String, Parsed)> = pending
            .into_par_iter()
            .map(|(dir, name)| {
                let result = sidecar::load_sidecar(&dir.join(&name)).map_err(|e| e.to_string());
                (dir, name, result)
            })
            .collect();

        for (dir, name, result) in parsed {
            index.dirs.entry(dir).or_default().sidecars.insert(name, result);
        }

        info!(
            sidecars = index.sidecar_count(),
            albums = index.album_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built sidecar index"
        );
        index
    }

    pub fn sidecar_count(&self) -> usize {
        self.dirs.values().map(|d| d.sidecars.len()).sum()
    }

    /// Directories carrying an album metadata file
    pub fn album_count(&self) -> usize {
        self.dirs.values().filter(|d| d.album_metadata.is_some()).count()
    }

    pub fn is_album(&self, dir: &Path) -> bool {
        self.dirs.get(dir).is_some_and(|d| d.album_metadata.is_some())
    }
}

impl SidecarProbe for IndexCache {
    fn has_sidecar(&self, dir: &Path, name: &str) -> bool {
        self.dirs.get(dir).is_some_and(|d| d.sidecars.contains_key(name))
    }

    fn sidecars_in(&self, dir: &Path) -> Vec<String> {
        self.dirs
            .get(dir)
            .map(|d| d.sidecars.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn load(&self, path: &Path) -> Result<MetadataRecord> {
        let cached = path.parent().zip(path.file_name().and_then(|n| n.to_str())).and_then(
            |(dir, name)| self.dirs.get(dir).and_then(|d| d.sidecars.get(name)),
        );

        match cached {
            Some(Ok(record)) => Ok(record.clone()),
            Some(Err(message)) => Err(Error::MalformedSidecar {
                path: path.to_path_buf(),
                message: message.clone(),
            }),
            None => {
                debug!(path = %path.display(), "Sidecar not in index, reading from disk");
                sidecar::load_sidecar(path)
            }
        }
    }
}
