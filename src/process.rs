//! Run pipeline
//!
//! Handles the core logic of:
//! - Discovering media roots and assets
//! - Correcting extensions and pairing Live Photos
//! - Resolving a metadata source per asset
//! - Embedding and verifying in batches
//! - Routing every asset to the processed or unresolved tree

use crate::config::Config;
use crate::embed::{EmbedOptions, Executor};
use crate::error::Result;
use crate::exiftool::{ExifTool, MetadataTool};
use crate::media::{self, MediaAsset};
use crate::resolve::{FsProbe, IndexCache, Locator, ResolutionRecord, SidecarProbe, Strategy};
use crate::route::{Bucket, Router};
use crate::stats::RunStatistics;
use crate::verify::{EmbeddingOutcome, FailureReason, Field, Verifier};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{Level, debug, error, info, span, warn};

/// Pipeline phase reported to a [`ProgressObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scan,
    Extensions,
    LivePhotos,
    Index,
    Resolve,
    Embed,
    Route,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Scan => "scan",
            Phase::Extensions => "extensions",
            Phase::LivePhotos => "live_photos",
            Phase::Index => "index",
            Phase::Resolve => "resolve",
            Phase::Embed => "embed",
            Phase::Route => "route",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Receives progress as `(phase, fraction of the whole run, message)`.
///
/// Called on the pipeline thread, so implementations must return quickly.
pub trait ProgressObserver {
    fn on_progress(&self, phase: Phase, fraction: f64, message: &str);
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _phase: Phase, _fraction: f64, _message: &str) {}
}

/// Forwards progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, phase: Phase, fraction: f64, message: &str) {
        info!(%phase, percent = (fraction * 100.0).round() as u32, "{}", message);
    }
}

/// Final state of one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Metadata verified, asset in the processed tree
    Verified,
    /// Asset in the unresolved tree
    Unresolved,
    /// Neither tree could take the asset
    Failed,
    /// Dry run - resolved only
    DryRun,
}

/// Result of processing a single asset
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    /// Asset path at the end of the run's in-place steps
    pub source: PathBuf,
    pub strategy: Strategy,
    pub sidecar: Option<PathBuf>,
    /// Absent in dry runs
    pub outcome: Option<EmbeddingOutcome>,
    pub status: AssetStatus,
    /// Where the asset was (or, in a dry run, would be) placed
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

/// Main processor for restoring export metadata
pub struct Processor<T: MetadataTool = ExifTool> {
    config: Config,
    tool: T,
    stats: RunStatistics,
    observer: Box<dyn ProgressObserver>,
}

impl Processor<ExifTool> {
    /// Create a processor driving the exiftool found from the configuration
    pub fn with_exiftool(config: Config) -> Result<Self> {
        let tool = ExifTool::locate(config.exiftool_path.as_deref())?;
        Ok(Self::new(config, tool))
    }
}

impl<T: MetadataTool> Processor<T> {
    pub fn new(config: Config, tool: T) -> Self {
        // Configure Rayon thread pool
        if config.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build_global()
                .ok(); // Ignore if already initialized
        }

        Self {
            config,
            tool,
            stats: RunStatistics::new(),
            observer: Box::new(NoProgress),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn progress(&self, phase: Phase, fraction: f64, message: &str) {
        self.observer.on_progress(phase, fraction.clamp(0.0, 1.0), message);
    }

    /// Run the processing pipeline
    pub fn run(&mut self) -> Result<Vec<AssetReport>> {
        let _span = span!(Level::INFO, "processor_run", dry_run = self.config.dry_run).entered();

        // A missing tool is the only fatal condition, checked before touching any asset
        let version = self.tool.version()?;
        info!(%version, "Metadata tool ready");

        self.progress(Phase::Scan, 0.0, "Scanning for media files...");
        let roots = media::media_roots(&self.config);
        let mut assets = media::discover_assets(&roots, &self.config)?;
        self.stats.total_files.store(assets.len(), Ordering::Relaxed);
        info!(count = assets.len(), roots = roots.len(), "Found media files");
        self.progress(Phase::Scan, 0.1, &format!("Found {} media files", assets.len()));

        if self.config.fix_extensions {
            self.progress(Phase::Extensions, 0.1, "Checking file extensions...");
            media::fix_extensions(
                &mut assets,
                &self.tool,
                self.config.query_timeout(),
                self.config.dry_run,
                &self.stats,
            );
        }

        if self.config.pair_live_photos {
            self.progress(Phase::LivePhotos, 0.2, "Identifying Live Photos...");
            let pairs = media::pair_live_photos(&assets);
            self.stats.live_photos_paired.store(pairs, Ordering::Relaxed);
            info!(pairs, "Found Live Photo pairs");
        }

        let records = self.resolve_all(&roots, &assets);

        let reports = if self.config.dry_run {
            self.dry_run_reports(&records)
        } else {
            fs::create_dir_all(&self.config.output_dir)?;
            let outcomes = self.embed_all(&records);
            self.route_all(records, outcomes)
        };

        info!("{}", self.stats.summary());
        self.progress(Phase::Done, 1.0, &self.stats.summary());
        Ok(reports)
    }

    fn resolve_all(&self, roots: &[PathBuf], assets: &[MediaAsset]) -> Vec<ResolutionRecord> {
        let index;
        let probe: &dyn SidecarProbe = if self.config.use_index_cache {
            self.progress(Phase::Index, 0.25, "Indexing sidecar files...");
            index = IndexCache::build(roots, &self.config);
            &index
        } else {
            &FsProbe
        };

        self.progress(Phase::Resolve, 0.3, "Resolving metadata sources...");
        let locator = Locator::new(probe, &self.stats).with_claims(assets);
        let records: Vec<ResolutionRecord> = assets
            .iter()
            .map(|asset| {
                let record = locator.resolve(asset);
                self.stats.record_strategy(record.strategy());
                record
            })
            .collect();

        info!(
            json_matched = self.stats.json_matched(),
            cross_album = self.stats.cross_album_matched(),
            filename = self.stats.filename_derived.load(Ordering::Relaxed),
            exif_preserved = self.stats.exif_preserved.load(Ordering::Relaxed),
            album_date = self.stats.album_date_inferred.load(Ordering::Relaxed),
            unresolved = self.stats.unresolved.load(Ordering::Relaxed),
            "Resolved metadata sources"
        );
        records
    }

    fn embed_all(&self, records: &[ResolutionRecord]) -> Vec<EmbeddingOutcome> {
        let verifier = Verifier::new(
            &self.tool,
            self.config.query_timeout(),
            self.config.timestamp_tolerance(),
        );
        let executor = Executor::new(
            &self.tool,
            &verifier,
            EmbedOptions::from(&self.config),
            &self.stats,
        );

        self.progress(Phase::Embed, 0.35, "Embedding metadata...");
        executor.run_with_progress(records, |done, total| {
            let fraction = 0.35 + 0.45 * done as f64 / total.max(1) as f64;
            self.progress(Phase::Embed, fraction, &format!("Processed batch {}/{}", done, total));
        })
    }

    fn route_all(
        &self,
        records: Vec<ResolutionRecord>,
        outcomes: Vec<EmbeddingOutcome>,
    ) -> Vec<AssetReport> {
        let router = Router::new(&self.config);
        let total = records.len();
        let mut reports = Vec::with_capacity(total);

        for (i, (record, outcome)) in records.into_iter().zip(outcomes).enumerate() {
            self.record_outcome(&record, &outcome);

            let bucket = if outcome.verified {
                Bucket::Processed
            } else {
                Bucket::Unresolved
            };

            let (status, destination, error) = match router.place(&record.asset.path, bucket) {
                Ok(placement) => {
                    let status = match bucket {
                        Bucket::Processed => AssetStatus::Verified,
                        Bucket::Unresolved => AssetStatus::Unresolved,
                    };
                    let error = outcome.failure.as_ref().map(ToString::to_string);
                    (status, Some(placement.destination), error)
                }
                Err(e) if bucket == Bucket::Processed => {
                    warn!(path = %record.asset.path.display(), error = %e, "Failed to place file, moving it to the unresolved tree");
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    match router.place(&record.asset.path, Bucket::Unresolved) {
                        Ok(placement) => (AssetStatus::Unresolved, Some(placement.destination), Some(e.to_string())),
                        Err(e) => {
                            error!(path = %record.asset.path.display(), error = %e, "Failed to place file");
                            (AssetStatus::Failed, None, Some(e.to_string()))
                        }
                    }
                }
                Err(e) => {
                    error!(path = %record.asset.path.display(), error = %e, "Failed to place file");
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    (AssetStatus::Failed, None, Some(e.to_string()))
                }
            };

            if (i + 1) % 50 == 0 || i + 1 == total {
                let fraction = 0.8 + 0.2 * (i + 1) as f64 / total as f64;
                self.progress(Phase::Route, fraction, &format!("Placed {}/{} files", i + 1, total));
            }

            reports.push(AssetReport {
                source: record.asset.path,
                strategy: record.source.strategy,
                sidecar: record.source.sidecar,
                outcome: Some(outcome),
                status,
                destination,
                error,
            });
        }

        reports
    }

    fn record_outcome(&self, record: &ResolutionRecord, outcome: &EmbeddingOutcome) {
        if !outcome.verified {
            self.stats.unverified.fetch_add(1, Ordering::Relaxed);
            match &outcome.failure {
                Some(FailureReason::Unresolvable) | None => {
                    debug!(path = %record.asset.path.display(), "Unresolved asset");
                }
                Some(reason) => {
                    warn!(path = %record.asset.path.display(), strategy = %record.strategy(), %reason, "Asset not verified");
                }
            }
            return;
        }

        self.stats.verified.fetch_add(1, Ordering::Relaxed);
        if outcome.restored(Field::Date) {
            self.stats.date_restored.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.restored(Field::Gps) {
            self.stats.gps_restored.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.restored(Field::Description) {
            self.stats.description_restored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Report where every asset would go without writing anything
    fn dry_run_reports(&self, records: &[ResolutionRecord]) -> Vec<AssetReport> {
        let router = Router::new(&self.config);
        records
            .iter()
            .map(|record| {
                let bucket = if record.strategy().is_resolved() {
                    Bucket::Processed
                } else {
                    Bucket::Unresolved
                };
                let destination = router.destination(&record.asset.path, bucket);
                info!(
                    source = %record.asset.path.display(),
                    strategy = %record.strategy(),
                    dest = %destination.display(),
                    "[DRY RUN] Would process"
                );
                AssetReport {
                    source: record.asset.path.clone(),
                    strategy: record.strategy(),
                    sidecar: record.source.sidecar.clone(),
                    outcome: None,
                    status: AssetStatus::DryRun,
                    destination: Some(destination),
                    error: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::exiftool::fake::FakeTool;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const SIDECAR: &str = r#"{"photoTakenTime": {"timestamp": "1693584000"}, "geoData": {"latitude": 37.7749, "longitude": -122.4194, "altitude": 0.0}}"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap().write_all(content.as_bytes()).unwrap();
    }

    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
            }
        }

        fn media(&self, rel: &str) -> PathBuf {
            self.temp.path().join("Takeout/Google Photos").join(rel)
        }

        fn out(&self, rel: &str) -> PathBuf {
            self.temp.path().join("out").join(rel)
        }

        fn config(&self) -> Config {
            Config {
                input_dirs: vec![self.temp.path().join("Takeout")],
                output_dir: self.temp.path().join("out"),
                ..Config::default()
            }
        }
    }

    fn report_for<'a>(reports: &'a [AssetReport], name: &str) -> &'a AssetReport {
        reports
            .iter()
            .find(|r| r.source.file_name().is_some_and(|n| n == name))
            .unwrap()
    }

    #[test]
    fn test_sidecar_asset_ends_verified_with_date_and_gps() {
        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.supplemental-metadata.json"), SIDECAR);

        let mut processor = Processor::new(fx.config(), FakeTool::new());
        let reports = processor.run().unwrap();

        let report = report_for(&reports, "a.jpg");
        assert_eq!(report.strategy, Strategy::DirectJson);
        assert_eq!(report.status, AssetStatus::Verified);
        let outcome = report.outcome.as_ref().unwrap();
        assert!(outcome.restored(Field::Date));
        assert!(outcome.restored(Field::Gps));
        assert_eq!(report.destination, Some(fx.out("Trip/a.jpg")));
        assert!(fx.out("Trip/a.jpg").exists());

        let report = processor.stats().report();
        assert_eq!(report.verified, 1);
        assert_eq!(report.date_restored, 1);
        assert_eq!(report.gps_restored, 1);
        assert_eq!(report.json_matched, 1);
        assert_eq!(report.success_rate, 100.0);
    }

    #[test]
    fn test_unmatched_asset_goes_to_unresolved_tree() {
        let fx = Fixture::new();
        write(&fx.media("Garden of the Gods/photo.jpg"), "jpeg");

        let mut processor = Processor::new(fx.config(), FakeTool::new());
        let reports = processor.run().unwrap();

        let report = report_for(&reports, "photo.jpg");
        assert_eq!(report.strategy, Strategy::None);
        assert_eq!(report.status, AssetStatus::Unresolved);
        assert!(fx.out("unmapped/Garden of the Gods/photo.jpg").exists());
        assert!(!fx.out("Garden of the Gods/photo.jpg").exists());
        assert!(processor.tool().embed_calls().is_empty());
        assert_eq!(processor.stats().report().unresolved, 1);
    }

    #[test]
    fn test_mixed_run_routes_by_outcome() {
        let fx = Fixture::new();
        write(&fx.media("Trip/IMG_20180917_135645.jpg"), "original");
        write(&fx.media("Trip/IMG_20180917_135645-edited.jpg"), "edited");
        write(&fx.media("Trip/IMG_20180917_135645.jpg.json"), SIDECAR);
        write(&fx.media("Trip/VID_20200101_101010.mp4"), "video");
        write(&fx.media("Photos from 2003/DSCN0042.JPG"), "old");
        write(&fx.media("2019 Summer/beach.png"), "png");
        write(&fx.media("Trip/broken.jpg"), "jpeg");
        write(&fx.media("Trip/broken.jpg.json"), "{oops");

        let mut processor = Processor::new(fx.config(), FakeTool::new());
        let reports = processor.run().unwrap();
        assert_eq!(reports.len(), 6);

        assert_eq!(report_for(&reports, "IMG_20180917_135645.jpg").strategy, Strategy::DirectJson);
        let edited = report_for(&reports, "IMG_20180917_135645-edited.jpg");
        assert_eq!(edited.strategy, Strategy::InheritedJson);
        assert_eq!(edited.status, AssetStatus::Verified);
        assert_eq!(report_for(&reports, "VID_20200101_101010.mp4").strategy, Strategy::FilenameDerived);
        assert_eq!(report_for(&reports, "DSCN0042.JPG").strategy, Strategy::ExifPreserved);
        assert_eq!(report_for(&reports, "beach.png").strategy, Strategy::AlbumDateInferred);

        let broken = report_for(&reports, "broken.jpg");
        assert_eq!(broken.strategy, Strategy::DirectJson);
        assert_eq!(broken.status, AssetStatus::Unresolved);
        assert!(fx.out("unmapped/Trip/broken.jpg").exists());

        assert!(fx.out("Photos from 2003/DSCN0042.JPG").exists());
        assert!(fx.out("2019 Summer/beach.png").exists());

        let stats = processor.stats().report();
        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.verified, 5);
        assert_eq!(stats.unverified, 1);
        assert_eq!(stats.malformed_sidecars, 1);
        assert_eq!(stats.exif_preserved, 1);
        // Camera metadata and the empty sidecar record need no write
        assert_eq!(processor.tool().embed_calls(), vec![4]);
    }

    #[test]
    fn test_failed_batch_is_retried_individually() {
        let fx = Fixture::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            write(&fx.media(&format!("Trip/{name}")), name);
            write(&fx.media(&format!("Trip/{name}.json")), SIDECAR);
        }
        let tool = FakeTool::new()
            .fail_batches_over(1)
            .fail_path(fx.media("Trip/b.jpg"));

        let mut processor = Processor::new(fx.config(), tool);
        let reports = processor.run().unwrap();

        assert_eq!(processor.tool().embed_calls(), vec![3, 1, 1, 1]);
        assert_eq!(report_for(&reports, "a.jpg").status, AssetStatus::Verified);
        assert_eq!(report_for(&reports, "c.jpg").status, AssetStatus::Verified);

        let failed = report_for(&reports, "b.jpg");
        assert_eq!(failed.status, AssetStatus::Unresolved);
        assert!(failed.error.as_deref().is_some_and(|e| e.contains("tool invocation failed")));
        assert!(fx.out("unmapped/Trip/b.jpg").exists());

        let stats = processor.stats().report();
        assert_eq!(stats.batch_fallbacks, 1);
        assert_eq!(stats.tool_failures, 1);
        assert_eq!(stats.verified, 2);
    }

    #[test]
    fn test_unverified_write_goes_to_unresolved_tree() {
        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.json"), SIDECAR);
        let tool = FakeTool::new()
            .drop_tag("DateTimeOriginal")
            .drop_tag("CreateDate")
            .drop_tag("GPSLatitude");

        let mut processor = Processor::new(fx.config(), tool);
        let reports = processor.run().unwrap();

        let report = report_for(&reports, "a.jpg");
        assert_eq!(report.status, AssetStatus::Unresolved);
        assert_eq!(
            report.outcome.as_ref().unwrap().failure,
            Some(FailureReason::VerificationMismatch)
        );
        assert!(fx.out("unmapped/Trip/a.jpg").exists());
    }

    #[test]
    fn test_extension_fix_keeps_sidecar_match() {
        let fx = Fixture::new();
        write(&fx.media("Trip/clip.jpg"), "mp4 bytes");
        write(&fx.media("Trip/clip.jpg.json"), SIDECAR);
        let tool = FakeTool::new().with_file_type(fx.media("Trip/clip.jpg"), "MP4");

        let mut processor = Processor::new(fx.config(), tool);
        let reports = processor.run().unwrap();

        let report = report_for(&reports, "clip.mp4");
        assert_eq!(report.strategy, Strategy::DirectJson);
        assert_eq!(report.status, AssetStatus::Verified);
        assert!(fx.out("Trip/clip.mp4").exists());
        assert_eq!(processor.stats().report().extensions_fixed, 1);
    }

    #[test]
    fn test_unplaceable_asset_falls_back_to_unresolved_tree() {
        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.json"), SIDECAR);
        // A file where the album directory should go blocks the processed tree
        write(&fx.out("Trip"), "not a directory");

        let mut processor = Processor::new(fx.config(), FakeTool::new());
        let reports = processor.run().unwrap();

        let report = report_for(&reports, "a.jpg");
        assert_eq!(report.status, AssetStatus::Unresolved);
        assert_eq!(report.destination, Some(fx.out("unmapped/Trip/a.jpg")));
        assert!(report.error.is_some());
        assert!(fx.out("unmapped/Trip/a.jpg").exists());
        assert_eq!(processor.stats().report().errors, 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.json"), SIDECAR);
        write(&fx.media("Trip/photo.jpg"), "jpeg");
        let config = Config {
            dry_run: true,
            ..fx.config()
        };

        let mut processor = Processor::new(config, FakeTool::new());
        let reports = processor.run().unwrap();

        assert!(reports.iter().all(|r| r.status == AssetStatus::DryRun));
        assert_eq!(report_for(&reports, "a.jpg").destination, Some(fx.out("Trip/a.jpg")));
        assert_eq!(
            report_for(&reports, "photo.jpg").destination,
            Some(fx.out("unmapped/Trip/photo.jpg"))
        );
        assert!(!fx.out("").exists());
        assert!(processor.tool().embed_calls().is_empty());
        assert_eq!(processor.stats().json_matched(), 1);
    }

    #[test]
    fn test_fs_probe_run_matches_index_run() {
        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.s.json"), SIDECAR);
        write(&fx.media("Trip/a-edited.jpg"), "jpeg");
        let config = Config {
            use_index_cache: false,
            dry_run: true,
            ..fx.config()
        };

        let reports = Processor::new(config, FakeTool::new()).run().unwrap();
        assert_eq!(report_for(&reports, "a.jpg").strategy, Strategy::DirectJson);
        assert_eq!(report_for(&reports, "a-edited.jpg").strategy, Strategy::InheritedJson);
    }

    #[test]
    fn test_empty_input_is_error() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.media("")).unwrap();
        let err = Processor::new(fx.config(), FakeTool::new()).run().unwrap_err();
        assert!(matches!(err, Error::NoMediaFound(_)));
    }

    #[test]
    fn test_progress_reaches_done() {
        struct Recorder(Arc<Mutex<Vec<(Phase, f64)>>>);
        impl ProgressObserver for Recorder {
            fn on_progress(&self, phase: Phase, fraction: f64, _message: &str) {
                self.0.lock().unwrap().push((phase, fraction));
            }
        }

        let fx = Fixture::new();
        write(&fx.media("Trip/a.jpg"), "jpeg");
        write(&fx.media("Trip/a.jpg.json"), SIDECAR);
        let seen = Arc::new(Mutex::new(Vec::new()));

        Processor::new(fx.config(), FakeTool::new())
            .with_observer(Box::new(Recorder(seen.clone())))
            .run()
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|(p, _)| *p == Phase::Embed));
        assert_eq!(seen.last(), Some(&(Phase::Done, 1.0)));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
