//! Configuration types for takeout restore

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File operation used when placing assets into the output trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to destination
    #[default]
    Copy,
    /// Move files to destination
    Move,
}

/// Configuration for takeout restore
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extracted export directories to scan
    pub input_dirs: Vec<PathBuf>,

    /// Output directory for processed files
    pub output_dir: PathBuf,

    /// Directories to exclude from scanning (absolute paths or folder names)
    pub exclude_dirs: Vec<PathBuf>,

    /// Name of the side tree (inside output_dir) that receives unresolved files
    pub unresolved_dir_name: String,

    /// Directory names that mark the top of an export's media tree
    pub media_root_names: Vec<String>,

    /// File operation mode
    pub operation: FileOperation,

    /// Number of assets handed to one tool invocation
    pub batch_size: usize,

    /// Timeout for a whole batch invocation, in seconds
    pub batch_timeout_secs: u64,

    /// Timeout for a single-asset invocation, in seconds
    pub individual_timeout_secs: u64,

    /// Timeout for a verification query, in seconds
    pub query_timeout_secs: u64,

    /// Accepted distance between embedded and source capture time, in seconds.
    /// 0 only checks that a date is present.
    pub timestamp_tolerance_secs: u64,

    /// Write sidecar timestamps in local time (true) or UTC (false)
    pub write_local_time: bool,

    /// Rename files whose extension does not match their content
    pub fix_extensions: bool,

    /// Count Live Photo pairs
    pub pair_live_photos: bool,

    /// Pre-scan sidecars into an in-memory index before resolving
    pub use_index_cache: bool,

    /// Explicit path to the exiftool binary
    pub exiftool_path: Option<PathBuf>,

    /// Number of threads for the index build (0 = auto)
    pub threads: usize,

    /// Dry run mode - resolve only, don't write or copy anything
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Media file extensions to consider
    pub media_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dirs: vec![],
            output_dir: PathBuf::from("output"),
            exclude_dirs: vec![],
            unresolved_dir_name: "unmapped".into(),
            media_root_names: vec!["Google Photos".into()],
            operation: FileOperation::default(),
            batch_size: 50,
            batch_timeout_secs: 300,
            individual_timeout_secs: 30,
            query_timeout_secs: 10,
            timestamp_tolerance_secs: 6 * 3600,
            write_local_time: true,
            fix_extensions: true,
            pair_live_photos: true,
            use_index_cache: true,
            exiftool_path: None,
            threads: 0, // Auto-detect
            dry_run: false,
            verbose: false,
            media_extensions: vec![
                "jpg".into(), "jpeg".into(), "png".into(), "heic".into(),
                "gif".into(), "tiff".into(), "bmp".into(), "webp".into(),
                "mp4".into(), "mov".into(), "m4v".into(),
            ],
        }
    }
}

impl Config {
    /// Check if a file extension is a supported media format
    pub fn is_media(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.media_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Directory receiving unresolved and unverified files
    pub fn unresolved_dir(&self) -> PathBuf {
        self.output_dir.join(&self.unresolved_dir_name)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn individual_timeout(&self) -> Duration {
        Duration::from_secs(self.individual_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn timestamp_tolerance(&self) -> Option<Duration> {
        (self.timestamp_tolerance_secs > 0).then(|| Duration::from_secs(self.timestamp_tolerance_secs))
    }

    /// Check if a path should be excluded based on exclude_dirs configuration
    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        for exclude in &self.exclude_dirs {
            if exclude.is_absolute() {
                if path.starts_with(exclude) {
                    return true;
                }
            } else if let Some(exclude_name) = exclude.file_name()
                && path.components().any(|c| {
                    matches!(c, std::path::Component::Normal(name) if name == exclude_name)
                })
            {
                return true;
            }
        }

        false
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Takeout Restore Configuration File
# This file uses TOML format (https://toml.io)

# Extracted export directories (each containing a "Google Photos" folder)
input_dirs = [
    "~/Downloads/Takeout",
]

# Output directory for processed files
output_dir = "~/Pictures/processed"

# Directories to exclude from scanning (absolute paths or folder names)
exclude_dirs = [
    "@eaDir",
]

# Side tree inside output_dir for files that could not be resolved or verified
unresolved_dir_name = "unmapped"

# Directory names that mark the top of the export's media tree
media_root_names = ["Google Photos"]

# File operation: "copy" or "move"
operation = "copy"

# Assets per exiftool invocation, and the timeouts (seconds) used for
# batch invocations, single-asset retries and verification reads
batch_size = 50
batch_timeout_secs = 300
individual_timeout_secs = 30
query_timeout_secs = 10

# Accepted capture time distance when verifying (6 hours covers timezone
# ambiguity). 0 only checks that a date is present.
timestamp_tolerance_secs = 21600

# Write sidecar timestamps as local time instead of UTC
write_local_time = true

# Rename files whose content does not match their extension
fix_extensions = true

# Count Live Photo pairs (HEIC + MOV)
pair_live_photos = true

# Pre-scan all sidecars into memory before resolving
use_index_cache = true

# Explicit exiftool binary (defaults to $TAKEOUT_RESTORE_EXIFTOOL, then PATH)
# exiftool_path = "/opt/homebrew/bin/exiftool"

# Number of threads for the sidecar index build (0 = auto-detect)
threads = 0

# Dry run mode - resolve and report without writing anything
dry_run = false

# Verbose output
verbose = false

media_extensions = ["jpg", "jpeg", "png", "heic", "gif", "tiff", "bmp", "webp", "mp4", "mov", "m4v"]
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}
