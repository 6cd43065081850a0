//! Edited variant detection
//!
//! The export stores an edited copy next to the original and only writes a
//! sidecar for the original, e.g. `IMG_20180917_135645-EFFECTS-edited.jpg`
//! next to `IMG_20180917_135645.jpg`.

/// Edit markers, longest first
pub const EDIT_MARKERS: &[&str] = &[
    "-EFFECTS-edited",
    "-effects-edited",
    "_1-edited",
    "-edited",
    "_edited",
];

/// Check if a file name contains one of the known edit markers (case-sensitive)
pub fn is_edited_variant(name: &str) -> bool {
    EDIT_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Derive the original's name from an edited variant's name.
///
/// Only one marker is removed: the longest one present, at its occurrence
/// nearest the extension.
pub fn original_name_for(edited: &str) -> Option<String> {
    for marker in EDIT_MARKERS {
        if let Some(pos) = edited.rfind(marker) {
            let mut original = String::with_capacity(edited.len() - marker.len());
            original.push_str(&edited[..pos]);
            original.push_str(&edited[pos + marker.len()..]);
            return Some(original);
        }
    }
    None
}
