//! Media discovery, extension correction and Live Photo pairing

use crate::config::Config;
use crate::error::{Error, Result};
use crate::exiftool::MetadataTool;
use crate::pattern::is_edited_variant;
use crate::stats::RunStatistics;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions whose content is often something else, and what it may be
const EXTENSION_MISMATCHES: &[(&str, &[&str])] = &[
    ("jpg", &["MP4", "PNG"]),
    ("png", &["JPEG"]),
    ("heic", &["MOV"]),
];

/// A media file found in the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Current location on disk
    pub path: PathBuf,
    /// File name as exported. Sidecars are named after this, so it survives
    /// extension correction.
    pub export_name: String,
    /// Name of the containing directory
    pub album: String,
    pub is_edited: bool,
}

impl MediaAsset {
    pub fn new(path: PathBuf) -> Self {
        let export_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let album = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_edited = is_edited_variant(&export_name);

        Self {
            path,
            export_name,
            album,
            is_edited,
        }
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Lowercase extension of the current path
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// Export name without its extension
    pub fn export_stem(&self) -> &str {
        match self.export_name.rfind('.') {
            Some(pos) if pos > 0 => &self.export_name[..pos],
            _ => &self.export_name,
        }
    }
}

/// Find media roots (directories named in `media_root_names`) under an input directory.
///
/// The input itself counts when it carries one of the names. Roots are not
/// searched for nested roots.
pub fn find_media_roots(input_dir: &Path, config: &Config) -> Vec<PathBuf> {
    let is_root_name = |name: &str| config.media_root_names.iter().any(|n| n == name);

    if input_dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_root_name)
    {
        return vec![input_dir.to_path_buf()];
    }

    let mut roots = Vec::new();
    let mut walker = WalkDir::new(input_dir).follow_links(true).into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_dir() || config.is_excluded_dir(entry.path()) {
            continue;
        }
        if entry.file_name().to_str().is_some_and(is_root_name) {
            roots.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    roots.sort();
    roots
}

/// Media roots of every input directory.
///
/// Inputs without a media root contribute themselves.
pub fn media_roots(config: &Config) -> Vec<PathBuf> {
    let mut all = Vec::new();

    for input_dir in &config.input_dirs {
        if !input_dir.exists() {
            warn!(?input_dir, "Input directory does not exist, skipping");
            continue;
        }

        let roots = find_media_roots(input_dir, config);
        if roots.is_empty() {
            warn!(?input_dir, names = ?config.media_root_names, "No media root found, scanning input directory");
            all.push(input_dir.clone());
        } else {
            all.extend(roots);
        }
    }

    all
}

/// Scan media roots for assets, sorted by path
pub fn discover_assets(roots: &[PathBuf], config: &Config) -> Result<Vec<MediaAsset>> {
    let mut assets = Vec::new();
    for root in roots {
        debug!(root = %root.display(), "Scanning media root");
        assets.extend(scan_media(root, config)?);
    }

    if assets.is_empty() {
        let searched = roots
            .first()
            .or(config.input_dirs.first())
            .cloned()
            .unwrap_or_default();
        return Err(Error::NoMediaFound(searched));
    }

    assets.sort_by(|a, b| a.path.cmp(&b.path));
    assets.dedup_by(|a, b| a.path == b.path);
    Ok(assets)
}

/// Collect media files below one directory
pub fn scan_media(root: &Path, config: &Config) -> Result<Vec<MediaAsset>> {
    let mut assets = Vec::new();

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

        let path = entry.path();
        if entry.file_type().is_file()
            && let Some(ext) = path.extension().and_then(|e| e.to_str())
            && config.is_media(ext)
        {
            assets.push(MediaAsset::new(path.to_path_buf()));
        }
    }

    Ok(assets)
}

/// The extension an asset should carry, if its content disagrees with it
pub fn detect_extension_mismatch(
    asset: &MediaAsset,
    tool: &dyn MetadataTool,
    timeout: Duration,
) -> Option<String> {
    let ext = asset.extension();
    let (_, suspects) = EXTENSION_MISMATCHES.iter().find(|(e, _)| *e == ext)?;

    let tags = match tool.query(&asset.path, &["FileType"], timeout) {
        Ok(tags) => tags,
        Err(e) => {
            debug!(path = %asset.path.display(), error = %e, "FileType query failed");
            return None;
        }
    };

    let actual = tags.get_str("FileType")?.to_uppercase();
    suspects
        .contains(&actual.as_str())
        .then(|| actual.to_lowercase())
}

/// Rename assets whose content does not match their extension.
///
/// The export name is kept so sidecar lookup still works. A failed rename
/// leaves the asset where it was.
pub fn fix_extensions(
    assets: &mut [MediaAsset],
    tool: &dyn MetadataTool,
    timeout: Duration,
    dry_run: bool,
    stats: &RunStatistics,
) {
    for asset in assets.iter_mut() {
        let Some(new_ext) = detect_extension_mismatch(asset, tool, timeout) else {
            continue;
        };

        let new_path = asset.path.with_extension(&new_ext);
        if new_path.exists() {
            warn!(from = %asset.path.display(), to = %new_path.display(), "Corrected name already taken, keeping extension");
            continue;
        }

        if !dry_run
            && let Err(e) = fs::rename(&asset.path, &new_path)
        {
            warn!(path = %asset.path.display(), error = %e, "Failed to fix extension");
            stats.errors.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        info!(from = %asset.export_name, to = %new_path.display(), "Fixed extension");
        stats.extensions_fixed.fetch_add(1, Ordering::Relaxed);
        if !dry_run {
            asset.path = new_path;
        }
    }
}

/// Count Live Photo pairs: a `.heic` with a `<stem>.mov` or `<stem>(1).heic` sibling
pub fn pair_live_photos(assets: &[MediaAsset]) -> usize {
    let paths: HashSet<&Path> = assets.iter().map(|a| a.path.as_path()).collect();
    let exists = |p: &Path| paths.contains(p) || p.is_file();

    let mut pairs = 0;
    for asset in assets.iter().filter(|a| a.extension() == "heic") {
        let Some(stem) = asset.path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let dir = asset.dir();
        let companions = [
            dir.join(format!("{stem}(1).heic")),
            dir.join(format!("{stem}.mov")),
            dir.join(format!("{stem}.MOV")),
        ];
        if companions.iter().any(|c| exists(c)) {
            debug!(photo = %asset.path.display(), "Found Live Photo pair");
            pairs += 1;
        }
    }

    pairs
}
