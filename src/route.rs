//! Outcome router: places assets into the processed or unresolved tree
//!
//! The album layout under the media root is preserved in both trees.

use crate::config::{Config, FileOperation};
use crate::error::Result;
use crate::hash::same_content;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy buffer size (256KB)
const BUFFER_SIZE: usize = 256 * 1024;

/// Highest `_N` suffix tried for a taken name
const MAX_CONFLICT_SUFFIX: usize = 10000;

/// Which output tree an asset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Verified assets
    Processed,
    /// Unresolved, failed or unverified assets
    Unresolved,
}

/// Where an asset ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub destination: PathBuf,
    /// False when identical content was already at the destination
    pub written: bool,
}

enum Slot {
    Free(PathBuf),
    Identical(PathBuf),
}

pub struct Router {
    output_dir: PathBuf,
    unresolved_dir: PathBuf,
    input_dirs: Vec<PathBuf>,
    media_root_names: Vec<String>,
    operation: FileOperation,
}

impl Router {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            unresolved_dir: config.unresolved_dir(),
            input_dirs: config.input_dirs.clone(),
            media_root_names: config.media_root_names.clone(),
            operation: config.operation,
        }
    }

    /// Path of an asset relative to its media root.
    ///
    /// Falls back to the input directory holding it, then to `<album>/<file>`.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        if let Some(rel) = path
            .ancestors()
            .skip(1)
            .find(|a| {
                a.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.media_root_names.iter().any(|m| m == n))
            })
            .and_then(|root| path.strip_prefix(root).ok())
        {
            return rel.to_path_buf();
        }

        if let Some(rel) = self
            .input_dirs
            .iter()
            .find_map(|input| path.strip_prefix(input).ok())
        {
            return rel.to_path_buf();
        }

        path.parent()
            .and_then(|p| p.parent())
            .and_then(|grandparent| path.strip_prefix(grandparent).ok())
            .map(Path::to_path_buf)
            .or_else(|| path.file_name().map(PathBuf::from))
            .unwrap_or_default()
    }

    pub fn destination(&self, path: &Path, bucket: Bucket) -> PathBuf {
        let base = match bucket {
            Bucket::Processed => &self.output_dir,
            Bucket::Unresolved => &self.unresolved_dir,
        };
        base.join(self.relative_path(path))
    }

    /// Copy or move an asset into its tree
    pub fn place(&self, source: &Path, bucket: Bucket) -> Result<Placement> {
        let wanted = self.destination(source, bucket);

        match find_slot(source, wanted, MAX_CONFLICT_SUFFIX)? {
            Slot::Identical(destination) => {
                debug!(source = %source.display(), dest = %destination.display(), "Identical file already at destination");
                if self.operation == FileOperation::Move {
                    fs::remove_file(source)?;
                }
                Ok(Placement {
                    destination,
                    written: false,
                })
            }
            Slot::Free(destination) => {
                perform_file_operation(source, &destination, self.operation)?;
                debug!(source = %source.display(), dest = %destination.display(), ?bucket, "Placed file");
                Ok(Placement {
                    destination,
                    written: true,
                })
            }
        }
    }
}

/// First free name for `wanted`, or an existing file with the same content.
///
/// Taken names get a numeric suffix: `a.jpg`, `a_1.jpg`, `a_2.jpg`.
fn find_slot(source: &Path, wanted: PathBuf, max_suffix: usize) -> Result<Slot> {
    let stem = wanted
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid filename: {}", wanted.display()),
            )
        })?
        .to_string();
    let extension = wanted
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let parent = wanted.parent().map(Path::to_path_buf).unwrap_or_default();

    for i in 0..=max_suffix {
        let candidate = if i == 0 {
            wanted.clone()
        } else {
            parent.join(format!("{}_{}{}", stem, i, extension))
        };
        if !candidate.exists() {
            return Ok(Slot::Free(candidate));
        }
        if same_content(source, &candidate)? {
            return Ok(Slot::Identical(candidate));
        }
    }

    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("Could not resolve filename conflict for {}", source.display()),
    )
    .into())
}

fn perform_file_operation(source: &Path, dest: &Path, operation: FileOperation) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    // Read before a move takes the source away
    let mtime = fs::metadata(source).and_then(|m| m.modified()).ok();

    match operation {
        FileOperation::Copy => copy_file(source, dest)?,
        FileOperation::Move => {
            // rename fails across filesystems
            if fs::rename(source, dest).is_err() {
                copy_file(source, dest)?;
                fs::remove_file(source)?;
            }
        }
    }

    // Preserve modification time
    if let Some(mtime) = mtime {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
    }

    Ok(())
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, src_file);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, dest_file);

    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
