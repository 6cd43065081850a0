//! Filename timestamp parsing
//!
//! Patterns are anchored at the start of the file stem, so a date buried in
//! the middle of a name is not picked up.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::trace;

/// IMG_YYYYMMDD_HHmmss, PANO_/VID_ or bare, with optional -EFFECTS
static PATTERN_COMPACT: OnceLock<Regex> = OnceLock::new();
/// YYYY-MM-DD HH-mm-ss
static PATTERN_SEPARATED: OnceLock<Regex> = OnceLock::new();
/// YYYY-MM-DD
static PATTERN_DATE_ONLY: OnceLock<Regex> = OnceLock::new();
/// Legacy camera dumps: DSCN0042.JPG, PICT0001.jpg, MVC-012.JPG
static PATTERN_LEGACY_CAMERA: OnceLock<Regex> = OnceLock::new();

fn compact_pattern() -> &'static Regex {
    PATTERN_COMPACT.get_or_init(|| {
        Regex::new(r"^(?:IMG_|PANO_|VID_)?(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})(?:-EFFECTS)?(?:$|\D)")
            .unwrap()
    })
}

fn separated_pattern() -> &'static Regex {
    PATTERN_SEPARATED.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2})-(\d{2})-(\d{2})(?:$|\D)").unwrap()
    })
}

fn date_only_pattern() -> &'static Regex {
    PATTERN_DATE_ONLY.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:$|\D)").unwrap())
}

fn legacy_camera_pattern() -> &'static Regex {
    PATTERN_LEGACY_CAMERA.get_or_init(|| {
        Regex::new(r"^(?:DVC|DSC|DSC_|DSCN|DSCF|CIMG|PICT|MVC-|IMG_)\d+\.[A-Za-z0-9]+$").unwrap()
    })
}

fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Check if a capture time can be read from the file name
pub fn extractable_timestamp(name: &str) -> bool {
    extract_timestamp(name).is_some()
}

/// Parse a capture time from the file name.
///
/// Date-only names get 12:00:00.
pub fn extract_timestamp(name: &str) -> Option<NaiveDateTime> {
    let stem = stem(name);

    if let Some(dt) = try_six_part(compact_pattern(), stem) {
        trace!(name, "Matched compact pattern");
        return Some(dt);
    }

    if let Some(dt) = try_six_part(separated_pattern(), stem) {
        trace!(name, "Matched separated pattern");
        return Some(dt);
    }

    if let Some(caps) = date_only_pattern().captures(stem)
        && let Some(dt) = build_datetime(&caps[1], &caps[2], &caps[3], "12", "00", "00")
    {
        trace!(name, "Matched date-only pattern");
        return Some(dt);
    }

    None
}

/// Check if a name is a camera counter name with no date grammar
pub fn is_legacy_camera_name(name: &str) -> bool {
    legacy_camera_pattern().is_match(name)
}

fn try_six_part(pattern: &Regex, s: &str) -> Option<NaiveDateTime> {
    let caps = pattern.captures(s)?;
    build_datetime(&caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6])
}

fn build_datetime(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
    second: &str,
) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let second: u32 = second.parse().ok()?;

    if !(1990..=2100).contains(&year) {
        return None;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    // from_ymd_opt rejects month 13, Feb 30 and friends
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_img_format() {
        assert_eq!(
            extract_timestamp("IMG_20210619_125530.jpg"),
            Some(at(2021, 6, 19, 12, 55, 30))
        );
        assert!(extractable_timestamp("VID_20190101_000001.mp4"));
        assert!(extractable_timestamp("PANO_20170704_201500.jpg"));
    }

    #[test]
    fn test_bare_and_effects_format() {
        assert_eq!(
            extract_timestamp("20240115_143000.jpg"),
            Some(at(2024, 1, 15, 14, 30, 0))
        );
        assert_eq!(
            extract_timestamp("IMG_20180917_135645-EFFECTS.jpg"),
            Some(at(2018, 9, 17, 13, 56, 45))
        );
        // Edited variants keep the date at the start of the stem
        assert_eq!(
            extract_timestamp("IMG_20180917_135645-EFFECTS-edited.jpg"),
            Some(at(2018, 9, 17, 13, 56, 45))
        );
        assert!(extractable_timestamp("IMG_20180804_134812_1.jpg"));
    }

    #[test]
    fn test_separated_format() {
        assert_eq!(
            extract_timestamp("2016-05-21 18-04-11.jpg"),
            Some(at(2016, 5, 21, 18, 4, 11))
        );
    }

    #[test]
    fn test_date_only_defaults_to_noon() {
        let dt = extract_timestamp("2015-12-24.png").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2015, 12, 24));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (12, 0, 0));
    }

    #[test]
    fn test_anchored_matching() {
        assert!(!extractable_timestamp("IMG_001.jpg"));
        assert!(!extractable_timestamp("Picture 001.jpg"));
        assert!(!extractable_timestamp("holiday_20210619_125530.jpg"));
        assert!(!extractable_timestamp("img_20210619_125530.jpg"));
        // Trailing digit makes the token longer than a date
        assert!(!extractable_timestamp("20210619_1255301.jpg"));
    }

    #[test]
    fn test_invalid_components() {
        assert!(!extractable_timestamp("19800101_000000.jpg"));
        assert!(!extractable_timestamp("20211301_120000.jpg"));
        assert!(!extractable_timestamp("20210230_120000.jpg"));
        assert!(!extractable_timestamp("20210101_250000.jpg"));
    }

    #[test]
    fn test_legacy_camera_names() {
        assert!(is_legacy_camera_name("DSCN0042.JPG"));
        assert!(is_legacy_camera_name("DSC_1234.jpg"));
        assert!(is_legacy_camera_name("MVC-012.JPG"));
        assert!(is_legacy_camera_name("PICT0001.jpg"));
        assert!(!is_legacy_camera_name("IMG_20210619_125530.jpg"));
        assert!(!is_legacy_camera_name("DSC_1234-edited.jpg"));
        assert!(!is_legacy_camera_name("Picture 001.jpg"));
    }
}
