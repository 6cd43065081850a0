//! Resolves one asset to its metadata source

use super::{CaptureTime, MetadataRecord, MetadataSource, ResolutionRecord, Strategy};
use crate::error::Result;
use crate::media::MediaAsset;
use crate::pattern;
use crate::sidecar::{self, is_sidecar_name};
use crate::stats::RunStatistics;
use chrono::{Datelike, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{debug, trace, warn};

/// Filesystem questions the locator needs answered
pub trait SidecarProbe {
    /// Check if a sidecar with this exact name exists in `dir`
    fn has_sidecar(&self, dir: &Path, name: &str) -> bool;

    /// Names of per-asset sidecars in `dir`, sorted
    fn sidecars_in(&self, dir: &Path) -> Vec<String>;

    /// Parse a sidecar
    fn load(&self, path: &Path) -> Result<MetadataRecord>;
}

/// Probe that asks the disk every time
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl SidecarProbe for FsProbe {
    fn has_sidecar(&self, dir: &Path, name: &str) -> bool {
        dir.join(name).is_file()
    }

    fn sidecars_in(&self, dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| is_sidecar_name(name))
            .collect();
        names.sort();
        names
    }

    fn load(&self, path: &Path) -> Result<MetadataRecord> {
        sidecar::load_sidecar(path)
    }
}

/// Picks the metadata source for an asset by strict precedence
pub struct Locator<'a> {
    probe: &'a dyn SidecarProbe,
    stats: &'a RunStatistics,
    max_album_year: i32,
    /// Direct sidecars of discovered assets, never offered as alternatives
    claimed: HashSet<PathBuf>,
}

impl<'a> Locator<'a> {
    pub fn new(probe: &'a dyn SidecarProbe, stats: &'a RunStatistics) -> Self {
        Self {
            probe,
            stats,
            max_album_year: Local::now().year() + 1,
            claimed: HashSet::new(),
        }
    }

    /// Reserve each asset's direct sidecar for that asset
    pub fn with_claims(mut self, assets: &[MediaAsset]) -> Self {
        let claimed: HashSet<PathBuf> = assets
            .iter()
            .filter_map(|asset| self.direct_sidecar(asset.dir(), &asset.export_name))
            .collect();
        self.claimed = claimed;
        self
    }

    /// Override the latest year accepted from an album name
    pub fn with_max_album_year(mut self, year: i32) -> Self {
        self.max_album_year = year;
        self
    }

    pub fn resolve(&self, asset: &MediaAsset) -> ResolutionRecord {
        let source = self.source_for(asset);
        trace!(
            path = %asset.path.display(),
            strategy = %source.strategy,
            sidecar = ?source.sidecar,
            "Resolved asset"
        );
        ResolutionRecord {
            asset: asset.clone(),
            source,
        }
    }

    /// First matching strategy wins
    pub fn source_for(&self, asset: &MediaAsset) -> MetadataSource {
        let dir = asset.dir();

        if let Some(sidecar) = self.direct_sidecar(dir, &asset.export_name) {
            return self.from_sidecar(Strategy::DirectJson, sidecar);
        }

        if asset.is_edited
            && let Some(original) = pattern::original_name_for(&asset.export_name)
            && let Some(sidecar) = self.direct_sidecar(dir, &original)
        {
            return self.from_sidecar(Strategy::InheritedJson, sidecar);
        }

        if let Some(sidecar) = self.alternative_sidecar(dir, asset.export_stem()) {
            return self.from_sidecar(Strategy::AlternativeJson, sidecar);
        }

        if let Some(taken) = pattern::extract_timestamp(&asset.export_name) {
            return MetadataSource::synthesized(
                Strategy::FilenameDerived,
                MetadataRecord::captured(CaptureTime::WallClock(taken)),
            );
        }

        if pattern::has_likely_embedded_timestamp(&asset.export_name, &asset.album) {
            return MetadataSource::synthesized(Strategy::ExifPreserved, MetadataRecord::default());
        }

        if let Some(date) = pattern::infer_date_from_album_until(&asset.album, self.max_album_year)
            && let Some(noon) = date.and_hms_opt(12, 0, 0)
        {
            return MetadataSource::synthesized(
                Strategy::AlbumDateInferred,
                MetadataRecord::captured(CaptureTime::WallClock(noon)),
            );
        }

        debug!(path = %asset.path.display(), album = %asset.album, "No metadata source");
        MetadataSource::unresolved()
    }

    fn direct_sidecar(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        sidecar::sidecar_candidates(name)
            .find(|candidate| self.probe.has_sidecar(dir, candidate))
            .map(|candidate| dir.join(candidate))
    }

    fn alternative_sidecar(&self, dir: &Path, stem: &str) -> Option<PathBuf> {
        if stem.is_empty() {
            return None;
        }
        self.probe
            .sidecars_in(dir)
            .into_iter()
            .filter(|name| continues_after_stem(name, stem))
            .map(|name| dir.join(name))
            .find(|path| !self.claimed.contains(path))
    }

    /// A malformed sidecar still decides the strategy, with an empty record
    fn from_sidecar(&self, strategy: Strategy, path: PathBuf) -> MetadataSource {
        let record = match self.probe.load(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!(sidecar = %path.display(), error = %e, "Unreadable sidecar, using empty record");
                self.stats.malformed_sidecars.fetch_add(1, Ordering::Relaxed);
                MetadataRecord::default()
            }
        };
        MetadataSource::from_sidecar(strategy, path, record)
    }
}

/// `name` starts with `stem` and the stem ends there (`IMG_1` fits `IMG_1(1).json`, not `IMG_10.jpg.json`)
fn continues_after_stem(name: &str, stem: &str) -> bool {
    name.strip_prefix(stem)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
}
