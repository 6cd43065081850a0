//! Year inference from album directory names

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Lowest year accepted from an album name
const MIN_ALBUM_YEAR: i32 = 1990;

static PATTERN_ARCHIVE: OnceLock<Regex> = OnceLock::new();
static PATTERN_LEADING_YEAR: OnceLock<Regex> = OnceLock::new();
static PATTERN_CONTAINED_YEAR: OnceLock<Regex> = OnceLock::new();

fn archive_pattern() -> &'static Regex {
    PATTERN_ARCHIVE.get_or_init(|| Regex::new(r"^Photos from (\d{4})$").unwrap())
}

fn leading_year_pattern() -> &'static Regex {
    PATTERN_LEADING_YEAR.get_or_init(|| Regex::new(r"^(\d{4})(?:$| )").unwrap())
}

fn contained_year_pattern() -> &'static Regex {
    PATTERN_CONTAINED_YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").unwrap())
}

/// Check if the album is one of the export's yearly archive albums
pub fn has_dated_archive_album(album: &str) -> bool {
    archive_pattern().is_match(album)
}

/// Infer Jan 1 of the year an album name refers to.
///
/// The ceiling is next year.
pub fn infer_date_from_album(album: &str) -> Option<NaiveDate> {
    infer_date_from_album_until(album, Local::now().year() + 1)
}

/// Same as [`infer_date_from_album`] with an explicit upper bound on the year
pub fn infer_date_from_album_until(album: &str, max_year: i32) -> Option<NaiveDate> {
    let album = album.trim();
    let year = [archive_pattern(), leading_year_pattern(), contained_year_pattern()]
        .into_iter()
        .find_map(|pattern| pattern.captures(album))
        .and_then(|caps| caps[1].parse::<i32>().ok())?;

    if !(MIN_ALBUM_YEAR..=max_year).contains(&year) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_of(album: &str) -> Option<i32> {
        infer_date_from_album_until(album, 2026).map(|d| d.year())
    }

    #[test]
    fn test_archive_album() {
        assert_eq!(year_of("Photos from 2003"), Some(2003));
        assert!(has_dated_archive_album("Photos from 2003"));
        assert!(!has_dated_archive_album("photos from 2003"));
    }

    #[test]
    fn test_leading_and_contained_year() {
        assert_eq!(year_of("2019"), Some(2019));
        assert_eq!(year_of("2019 Summer in Lisbon"), Some(2019));
        assert_eq!(year_of("Lisbon 2017 trip"), Some(2017));
        assert_eq!(
            infer_date_from_album_until("2019 Summer", 2026),
            NaiveDate::from_ymd_opt(2019, 1, 1)
        );
    }

    #[test]
    fn test_no_year() {
        assert_eq!(year_of("Garden of the Gods"), None);
        assert_eq!(year_of("Room 12345"), None);
    }

    #[test]
    fn test_implausible_year() {
        assert_eq!(year_of("Photos from 1850"), None);
        assert_eq!(year_of("3000 Leagues"), None);
        assert_eq!(year_of("2027 Plans"), None);
        assert_eq!(infer_date_from_album_until("2027 Plans", 2027).map(|d| d.year()), Some(2027));
    }

    #[test]
    fn test_current_ceiling() {
        let next_year = Local::now().year() + 1;
        assert!(infer_date_from_album(&format!("Photos from {next_year}")).is_some());
        assert!(infer_date_from_album(&format!("Photos from {}", next_year + 1)).is_none());
    }
}
