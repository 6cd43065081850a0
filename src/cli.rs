//! CLI argument parsing with clap

use crate::config::{Config, FileOperation};
use clap::Parser;
use std::path::PathBuf;

/// Takeout Restore - put Google Photos export metadata back into the files
///
/// Matches every exported photo and video with its JSON sidecar (or a
/// fallback source), embeds capture time, location and description with
/// exiftool, verifies the result and sorts files into a processed tree and
/// an unresolved tree.
#[derive(Parser, Debug)]
#[command(name = "takeout-restore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write a sample configuration file to this path and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,

    /// Extracted export directories to scan
    #[arg(short, long, num_args = 1..)]
    pub input: Option<Vec<PathBuf>>,

    /// Output directory for processed files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directories to skip while scanning (absolute paths or folder names)
    #[arg(short = 'x', long, num_args = 1..)]
    pub exclude: Option<Vec<PathBuf>>,

    /// File operation mode
    #[arg(short = 'O', long, value_enum)]
    pub operation: Option<FileOperation>,

    /// Assets per exiftool invocation
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Timeout for a batch invocation, in seconds
    #[arg(long)]
    pub batch_timeout: Option<u64>,

    /// Timeout for a single-asset invocation, in seconds
    #[arg(long)]
    pub individual_timeout: Option<u64>,

    /// Accepted capture time distance when verifying, in seconds (0 = presence only)
    #[arg(long)]
    pub tolerance: Option<u64>,

    /// Write sidecar timestamps as UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Path to the exiftool binary
    #[arg(short = 'e', long)]
    pub exiftool: Option<PathBuf>,

    /// Keep extensions even when they do not match the content
    #[arg(long)]
    pub no_fix_extensions: bool,

    /// Skip Live Photo pairing
    #[arg(long)]
    pub no_live_photos: bool,

    /// Look sidecars up on disk instead of indexing them first
    #[arg(long)]
    pub no_index: bool,

    /// Number of threads for the sidecar index build (0 = auto)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref inputs) = self.input {
            config.input_dirs = inputs.clone();
        }
        if let Some(ref output) = self.output {
            config.output_dir = output.clone();
        }
        if let Some(ref exclude) = self.exclude {
            config.exclude_dirs = exclude.clone();
        }
        if let Some(operation) = self.operation {
            config.operation = operation;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(secs) = self.batch_timeout {
            config.batch_timeout_secs = secs;
        }
        if let Some(secs) = self.individual_timeout {
            config.individual_timeout_secs = secs;
        }
        if let Some(secs) = self.tolerance {
            config.timestamp_tolerance_secs = secs;
        }
        if self.utc {
            config.write_local_time = false;
        }
        if let Some(ref exiftool) = self.exiftool {
            config.exiftool_path = Some(exiftool.clone());
        }
        if self.no_fix_extensions {
            config.fix_extensions = false;
        }
        if self.no_live_photos {
            config.pair_live_photos = false;
        }
        if self.no_index {
            config.use_index_cache = false;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("takeout-restore").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse(&["-i", "/takeout"]).to_config();
        assert_eq!(config.input_dirs, vec![PathBuf::from("/takeout")]);
        assert_eq!(config.batch_size, 50);
        assert!(config.write_local_time);
        assert!(config.fix_extensions);
        assert!(config.use_index_cache);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_flags_override_file_settings() {
        let file = Config {
            batch_size: 10,
            operation: FileOperation::Copy,
            timestamp_tolerance_secs: 60,
            output_dir: PathBuf::from("/from-file"),
            ..Config::default()
        };
        let cli = parse(&[
            "-b", "5", "-O", "move", "--tolerance", "0", "--utc", "--no-index", "-n",
        ]);

        let config = cli.merge_with_config(file);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.operation, FileOperation::Move);
        assert_eq!(config.timestamp_tolerance(), None);
        assert!(!config.write_local_time);
        assert!(!config.use_index_cache);
        assert!(config.dry_run);
        // Unset flags keep the file's values
        assert_eq!(config.output_dir, PathBuf::from("/from-file"));
    }

    #[test]
    fn test_config_name() {
        assert_eq!(parse(&["-C", "Config/family.toml"]).config_name().as_deref(), Some("family"));
        assert_eq!(parse(&[]).config_name(), None);
    }
}
