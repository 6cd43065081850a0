//! Sidecar JSON conventions and parsing
//!
//! A sidecar sits next to its media file and is named after the file's full
//! export name plus one of [`SIDECAR_SUFFIXES`], e.g.
//! `IMG_1234.jpg.supplemental-metadata.json`.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Sidecar suffixes in lookup order. The second one is the export's own typo.
pub const SIDECAR_SUFFIXES: &[&str] = &[
    ".supplemental-metadata.json",
    ".supplemental-metada.json",
    ".s.json",
    ".json",
];

/// Album-level metadata file names (compared lowercase)
pub const ALBUM_METADATA_NAMES: &[&str] = &[
    "metadata.json",
    "métadonnées.json",
    "metadaten.json",
    "metadatos.json",
    "metadati.json",
    "metadados.json",
];

/// The export's account-level files, which are never per-asset sidecars
const NON_ASSET_JSON_NAMES: &[&str] = &[
    "print-subscriptions.json",
    "shared_album_comments.json",
    "user-generated-memory-titles.json",
];

/// Capture time of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CaptureTime {
    /// An absolute instant, from a sidecar unix timestamp
    Instant(DateTime<Utc>),
    /// A wall clock reading with no zone, from a file or album name
    WallClock(NaiveDateTime),
}

impl CaptureTime {
    /// The time rendered in UTC. Wall clock readings are returned as is.
    pub fn utc(&self) -> NaiveDateTime {
        match self {
            CaptureTime::Instant(dt) => dt.naive_utc(),
            CaptureTime::WallClock(naive) => *naive,
        }
    }

    /// The time rendered in the local zone. Wall clock readings are returned as is.
    pub fn local(&self) -> NaiveDateTime {
        match self {
            CaptureTime::Instant(dt) => dt.with_timezone(&Local).naive_local(),
            CaptureTime::WallClock(naive) => *naive,
        }
    }

    /// The value written into the file
    pub fn embed_value(&self, write_local_time: bool) -> NaiveDateTime {
        if write_local_time { self.local() } else { self.utc() }
    }
}

/// Normalized metadata of one asset. Absent fields are never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub captured_at: Option<CaptureTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub title: Option<String>,
}

impl MetadataRecord {
    /// A record carrying only a capture time
    pub fn captured(at: CaptureTime) -> Self {
        Self {
            captured_at: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// GPS is only meaningful when one of the coordinates is non-zero
    pub fn has_gps(&self) -> bool {
        let non_zero = |v: Option<f64>| v.is_some_and(|v| v != 0.0);
        non_zero(self.latitude) || non_zero(self.longitude)
    }

    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSidecar {
    photo_taken_time: Option<RawTime>,
    geo_data: Option<RawGeo>,
    description: Option<String>,
    tags: Option<Value>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTime {
    timestamp: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGeo {
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
}

/// Candidate sidecar names for an export name, in lookup order
pub fn sidecar_candidates(export_name: &str) -> impl Iterator<Item = String> + '_ {
    SIDECAR_SUFFIXES
        .iter()
        .map(move |suffix| format!("{export_name}{suffix}"))
}

/// Check if a file name denotes an album-level metadata file
pub fn is_album_metadata(name: &str) -> bool {
    let lower = name.to_lowercase();
    ALBUM_METADATA_NAMES.contains(&lower.as_str())
}

/// Check if a file name can be a per-asset sidecar
pub fn is_sidecar_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".json")
        && !is_album_metadata(name)
        && !NON_ASSET_JSON_NAMES.contains(&lower.as_str())
}

/// Read and parse a sidecar file
pub fn load_sidecar(path: &Path) -> Result<MetadataRecord> {
    let content = fs::read_to_string(path)?;
    parse_sidecar(path, &content)
}

/// Parse sidecar JSON into a record
pub fn parse_sidecar(path: &Path, content: &str) -> Result<MetadataRecord> {
    let raw: RawSidecar = serde_json::from_str(content).map_err(|e| Error::MalformedSidecar {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let captured_at = raw
        .photo_taken_time
        .and_then(|t| t.timestamp)
        .and_then(|v| parse_unix_seconds(&v))
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(CaptureTime::Instant);

    let geo = raw.geo_data.unwrap_or_default();

    Ok(MetadataRecord {
        captured_at,
        latitude: geo.latitude,
        longitude: geo.longitude,
        altitude: geo.altitude,
        description: non_empty(raw.description),
        tags: raw.tags.map(parse_tags).unwrap_or_default(),
        title: non_empty(raw.title),
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_unix_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn parse_tags(value: Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                // Some exports wrap each tag in an object
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
