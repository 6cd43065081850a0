//! Post-write verification
//!
//! The tool's exit status says nothing about which tags actually landed, so
//! every written asset is read back and compared with its source.

use crate::exiftool::{MetadataTool, TagValues};
use crate::media::MediaAsset;
use crate::resolve::{CaptureTime, MetadataSource, Strategy};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Tags read back after embedding
pub const VERIFY_TAGS: &[&str] = &[
    "DateTimeOriginal",
    "CreateDate",
    "GPSLatitude",
    "Description",
    "ImageDescription",
];

/// A metadata field confirmed in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Gps,
    Description,
}

/// Why an asset did not end verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// The tool could not write the file, even on its own
    ToolInvocation(String),
    /// The write went through but nothing matching the source was read back
    VerificationMismatch,
    /// No strategy produced a source
    Unresolvable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ToolInvocation(message) => write!(f, "tool invocation failed: {}", message),
            FailureReason::VerificationMismatch => f.write_str("embedded metadata could not be verified"),
            FailureReason::Unresolvable => f.write_str("no metadata source"),
        }
    }
}

/// Terminal result of embedding one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingOutcome {
    pub verified: bool,
    pub fields_restored: BTreeSet<Field>,
    pub failure: Option<FailureReason>,
}

impl EmbeddingOutcome {
    pub fn verified(fields_restored: BTreeSet<Field>) -> Self {
        Self {
            verified: true,
            fields_restored,
            failure: None,
        }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self {
            verified: false,
            fields_restored: BTreeSet::new(),
            failure: Some(reason),
        }
    }

    pub fn restored(&self, field: Field) -> bool {
        self.fields_restored.contains(&field)
    }
}

/// Reads embedded tags back and classifies the outcome. Holds no counters.
pub struct Verifier<'a> {
    tool: &'a dyn MetadataTool,
    timeout: Duration,
    tolerance: Option<Duration>,
}

impl<'a> Verifier<'a> {
    pub fn new(tool: &'a dyn MetadataTool, timeout: Duration, tolerance: Option<Duration>) -> Self {
        Self {
            tool,
            timeout,
            tolerance,
        }
    }

    pub fn verify(&self, asset: &MediaAsset, source: &MetadataSource) -> EmbeddingOutcome {
        match source.strategy {
            Strategy::None => return EmbeddingOutcome::failed(FailureReason::Unresolvable),
            // Camera metadata is trusted as is
            Strategy::ExifPreserved => return EmbeddingOutcome::verified(BTreeSet::new()),
            _ => {}
        }

        let record = &source.record;
        if record.captured_at.is_none() && !record.has_gps() && !record.has_description() {
            debug!(path = %asset.path.display(), "Nothing verifiable in source");
            return EmbeddingOutcome::failed(FailureReason::VerificationMismatch);
        }

        let tags = match self.tool.query(&asset.path, VERIFY_TAGS, self.timeout) {
            Ok(tags) => tags,
            Err(e) => {
                debug!(path = %asset.path.display(), error = %e, "Verification query failed");
                return EmbeddingOutcome::failed(FailureReason::VerificationMismatch);
            }
        };

        let mut restored = BTreeSet::new();
        if let Some(expected) = record.captured_at
            && self.date_matches(&tags, expected)
        {
            restored.insert(Field::Date);
        }
        if record.latitude.is_some_and(|lat| lat != 0.0) && tags.has("GPSLatitude") {
            restored.insert(Field::Gps);
        }
        if record.has_description() && (tags.has("Description") || tags.has("ImageDescription")) {
            restored.insert(Field::Description);
        }

        if restored.is_empty() {
            debug!(path = %asset.path.display(), strategy = %source.strategy, "Embedded metadata does not match source");
            EmbeddingOutcome::failed(FailureReason::VerificationMismatch)
        } else {
            EmbeddingOutcome::verified(restored)
        }
    }

    fn date_matches(&self, tags: &TagValues, expected: CaptureTime) -> bool {
        let embedded = ["DateTimeOriginal", "CreateDate"]
            .into_iter()
            .find(|tag| tags.has(tag))
            .and_then(|tag| tags.get_str(tag));

        let Some(embedded) = embedded else {
            return false;
        };
        let Some(tolerance) = self.tolerance else {
            return true;
        };
        let Some(embedded) = parse_exif_datetime(&embedded) else {
            return false;
        };

        let tolerance = chrono::Duration::from_std(tolerance).unwrap_or(chrono::Duration::MAX);
        [expected.utc(), expected.local()]
            .into_iter()
            .any(|candidate| (embedded - candidate).abs() <= tolerance)
    }
}

/// Parse an EXIF style datetime, ignoring subseconds and a trailing zone
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    let s = s.get(..19).unwrap_or(s);

    let formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    formats
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exiftool::fake::FakeTool;
    use crate::resolve::MetadataRecord;
    use chrono::{DateTime, Datelike, Timelike};
    use serde_json::json;
    use std::path::PathBuf;

    const TOLERANCE: Option<Duration> = Some(Duration::from_secs(6 * 3600));

    fn asset() -> MediaAsset {
        MediaAsset::new(PathBuf::from("/t/Google Photos/Trip/a.jpg"))
    }

    fn sidecar_source(record: MetadataRecord) -> MetadataSource {
        MetadataSource::from_sidecar(Strategy::DirectJson, PathBuf::from("/t/a.jpg.json"), record)
    }

    fn instant(secs: i64) -> CaptureTime {
        CaptureTime::Instant(DateTime::from_timestamp(secs, 0).unwrap())
    }

    #[test]
    fn test_date_and_gps_verified() {
        let a = asset();
        let tool = FakeTool::new()
            .with_tag(&a.path, "DateTimeOriginal", json!("2023:09:01 16:00:00"))
            .with_tag(&a.path, "GPSLatitude", json!(37.7749));
        let source = sidecar_source(MetadataRecord {
            captured_at: Some(instant(1693584000)),
            latitude: Some(37.7749),
            ..MetadataRecord::default()
        });

        let outcome = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&a, &source);
        assert!(outcome.verified);
        assert!(outcome.restored(Field::Date));
        assert!(outcome.restored(Field::Gps));
        assert!(!outcome.restored(Field::Description));
    }

    #[test]
    fn test_date_outside_tolerance_is_mismatch() {
        let a = asset();
        let tool = FakeTool::new().with_tag(&a.path, "CreateDate", json!("2001:01:01 00:00:00"));
        let source = sidecar_source(MetadataRecord::captured(instant(1693584000)));

        let strict = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&a, &source);
        assert_eq!(strict.failure, Some(FailureReason::VerificationMismatch));

        // Without a window any embedded date counts
        let lenient = Verifier::new(&tool, Duration::from_secs(10), None).verify(&a, &source);
        assert!(lenient.restored(Field::Date));
    }

    #[test]
    fn test_description_verified_through_either_tag() {
        let a = asset();
        let tool = FakeTool::new().with_tag(&a.path, "ImageDescription", json!("Sunset"));
        let source = sidecar_source(MetadataRecord {
            description: Some("Sunset".into()),
            ..MetadataRecord::default()
        });

        let outcome = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&a, &source);
        assert_eq!(outcome.fields_restored, BTreeSet::from([Field::Description]));
    }

    #[test]
    fn test_query_failure_is_mismatch() {
        let a = asset();
        let tool = FakeTool::new().fail_query(&a.path);
        let source = sidecar_source(MetadataRecord::captured(instant(1693584000)));

        let outcome = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&a, &source);
        assert!(!outcome.verified);
        assert_eq!(outcome.failure, Some(FailureReason::VerificationMismatch));
    }

    #[test]
    fn test_exif_preserved_is_not_read() {
        let tool = FakeTool::new();
        let source = MetadataSource::synthesized(Strategy::ExifPreserved, MetadataRecord::default());

        let outcome = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&asset(), &source);
        assert!(outcome.verified);
        assert!(outcome.fields_restored.is_empty());
        assert_eq!(tool.query_calls(), 0);
    }

    #[test]
    fn test_unresolved_is_unresolvable() {
        let tool = FakeTool::new();
        let outcome =
            Verifier::new(&tool, Duration::from_secs(10), TOLERANCE).verify(&asset(), &MetadataSource::unresolved());
        assert_eq!(outcome.failure, Some(FailureReason::Unresolvable));
    }

    #[test]
    fn test_verify_is_idempotent() {
        let a = asset();
        let tool = FakeTool::new()
            .with_tag(&a.path, "DateTimeOriginal", json!("2023:09:01 16:00:00"))
            .with_tag(&a.path, "GPSLatitude", json!(37.7749));
        let source = sidecar_source(MetadataRecord {
            captured_at: Some(instant(1693584000)),
            latitude: Some(37.7749),
            ..MetadataRecord::default()
        });
        let verifier = Verifier::new(&tool, Duration::from_secs(10), TOLERANCE);

        let first = verifier.verify(&a, &source);
        let second = verifier.verify(&a, &source);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
        assert_eq!((dt.hour(), dt.minute()), (14, 30));

        assert!(parse_exif_datetime("2024:01:15 14:30:00.123").is_some());
        assert!(parse_exif_datetime("2024:01:15 14:30:00+02:00").is_some());
        assert!(parse_exif_datetime("\"2024-01-15 14:30:00\"").is_some());
        assert!(parse_exif_datetime("garbage").is_none());
    }
}
