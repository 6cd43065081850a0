//! xxHash-based content comparison for destination conflicts
//!
//! Files are hashed in streaming fashion so large videos never sit in memory.

use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

/// Read buffer size (256KB)
const BUFFER_SIZE: usize = 256 * 1024;

/// Compute the xxHash3 of a file's full content
pub fn compute_file_hash(path: &Path) -> Result<u64> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let hash = hasher.digest();
    trace!(?path, hash, "Computed file hash");
    Ok(hash)
}

/// Check if two files have identical content. Sizes are compared before hashing.
pub fn same_content(a: &Path, b: &Path) -> Result<bool> {
    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(compute_file_hash(a)? == compute_file_hash(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use xxhash_rust::xxh3::xxh3_64;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_streaming_hash_matches_one_shot() {
        let content: Vec<u8> = (0..BUFFER_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let file = temp_with(&content);
        assert_eq!(compute_file_hash(file.path()).unwrap(), xxh3_64(&content));
    }

    #[test]
    fn test_same_content() {
        let file1 = temp_with(b"test content");
        let file2 = temp_with(b"test content");
        let file3 = temp_with(b"test CONTENT");
        let file4 = temp_with(b"longer test content");

        assert!(same_content(file1.path(), file2.path()).unwrap());
        assert!(!same_content(file1.path(), file3.path()).unwrap());
        assert!(!same_content(file1.path(), file4.path()).unwrap());
    }
}
