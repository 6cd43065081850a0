//! Metadata resolution: which source applies to an asset

pub mod index;
pub mod locator;

use crate::media::MediaAsset;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub use crate::sidecar::{CaptureTime, MetadataRecord};
pub use index::IndexCache;
pub use locator::{FsProbe, Locator, SidecarProbe};

/// Resolution strategy, in precedence order (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Sidecar named after the asset itself
    DirectJson,
    /// Edited variant using its original's sidecar
    InheritedJson,
    /// Another sidecar in the directory whose name starts with the asset's stem
    AlternativeJson,
    /// Capture time parsed from the file name
    FilenameDerived,
    /// The file already carries its capture time; nothing is written
    ExifPreserved,
    /// Jan 1 of the year named by the album
    AlbumDateInferred,
    /// Nothing applies
    None,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::DirectJson,
        Strategy::InheritedJson,
        Strategy::AlternativeJson,
        Strategy::FilenameDerived,
        Strategy::ExifPreserved,
        Strategy::AlbumDateInferred,
        Strategy::None,
    ];

    /// Stable reporting tag
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::DirectJson => "direct_json",
            Strategy::InheritedJson => "inherited_json",
            Strategy::AlternativeJson => "alternative_json",
            Strategy::FilenameDerived => "filename_derived",
            Strategy::ExifPreserved => "exif_preserved",
            Strategy::AlbumDateInferred => "album_date_inferred",
            Strategy::None => "none",
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Strategy::None
    }

    /// Whether the metadata came from a sidecar file
    pub fn uses_sidecar(self) -> bool {
        matches!(
            self,
            Strategy::DirectJson | Strategy::InheritedJson | Strategy::AlternativeJson
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The metadata chosen for one asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSource {
    pub strategy: Strategy,
    pub sidecar: Option<PathBuf>,
    pub record: MetadataRecord,
}

impl MetadataSource {
    pub fn from_sidecar(strategy: Strategy, sidecar: PathBuf, record: MetadataRecord) -> Self {
        Self {
            strategy,
            sidecar: Some(sidecar),
            record,
        }
    }

    pub fn synthesized(strategy: Strategy, record: MetadataRecord) -> Self {
        Self {
            strategy,
            sidecar: None,
            record,
        }
    }

    pub fn unresolved() -> Self {
        Self::synthesized(Strategy::None, MetadataRecord::default())
    }
}

/// An asset paired with its metadata source. Fixed for the rest of the run.
#[derive(Debug, Clone)]
pub struct ResolutionRecord {
    pub asset: MediaAsset,
    pub source: MetadataSource,
}

impl ResolutionRecord {
    pub fn strategy(&self) -> Strategy {
        self.source.strategy
    }
}
