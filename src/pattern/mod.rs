//! Filename and album name conventions used by the export
//!
//! Everything in here is a pure function over names. Nothing touches the
//! filesystem.

mod album;
mod edited;
mod timestamp;

pub use album::{has_dated_archive_album, infer_date_from_album, infer_date_from_album_until};
pub use edited::{EDIT_MARKERS, is_edited_variant, original_name_for};
pub use timestamp::{extract_timestamp, extractable_timestamp, is_legacy_camera_name};

/// Whether an asset probably already carries a usable capture date from the camera.
///
/// Assets in a `Photos from <year>` album and legacy camera dumps such as
/// `DSCN0042.JPG` are left untouched.
pub fn has_likely_embedded_timestamp(name: &str, album: &str) -> bool {
    has_dated_archive_album(album) || is_legacy_camera_name(name)
}
