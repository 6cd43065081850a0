//! Takeout Restore - metadata resolution and embedding for Google Photos exports
//!
//! This library restores the metadata an export strips from its media:
//! - Sidecar JSON matching, including edited variants and truncated names
//! - Fallback sources from filename timestamps and album names
//! - Batched exiftool writes with per-file fallback
//! - Read-back verification of every write
//! - Routing into processed and unresolved trees

pub mod cli;
pub mod config;
pub mod embed;
pub mod error;
pub mod exiftool;
pub mod hash;
pub mod media;
pub mod pattern;
pub mod process;
pub mod resolve;
pub mod route;
pub mod sidecar;
pub mod stats;
pub mod verify;

pub use cli::Cli;
pub use config::{Config, ConfigError, FileOperation};
pub use error::{Error, Result};
pub use exiftool::{ExifTool, MetadataTool};
pub use process::{AssetReport, AssetStatus, LogProgress, Phase, Processor, ProgressObserver};
pub use resolve::{MetadataSource, ResolutionRecord, Strategy};
pub use stats::{RunReport, RunStatistics};
pub use verify::{EmbeddingOutcome, FailureReason, Field};
