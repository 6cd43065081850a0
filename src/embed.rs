//! Embedding executor: batched writes with individual fallback

use crate::config::Config;
use crate::exiftool::{EmbedJob, FieldMap, MetadataTool};
use crate::resolve::{CaptureTime, MetadataRecord, ResolutionRecord, Strategy};
use crate::stats::RunStatistics;
use crate::verify::{EmbeddingOutcome, FailureReason, Verifier};
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{Level, debug, info, span, warn};

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const FILE_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S%:z";

/// Whether the filesystem has a writable creation date
const HAS_FILE_CREATE_DATE: bool = cfg!(any(target_os = "macos", windows));

/// Batch sizing and timeouts
#[derive(Debug, Clone, Copy)]
pub struct EmbedOptions {
    pub batch_size: usize,
    pub batch_timeout: Duration,
    pub individual_timeout: Duration,
    pub write_local_time: bool,
}

impl From<&Config> for EmbedOptions {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_timeout: config.batch_timeout(),
            individual_timeout: config.individual_timeout(),
            write_local_time: config.write_local_time,
        }
    }
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Tags to write for a record. Absent fields produce no tags.
pub fn field_map(record: &MetadataRecord, write_local_time: bool) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(taken) = record.captured_at {
        let value = taken.embed_value(write_local_time).format(EXIF_DATE_FORMAT).to_string();
        for tag in ["DateTimeOriginal", "CreateDate", "ModifyDate"] {
            fields.set(tag, value.clone());
        }

        // Filesystem dates need a zone to land on the right instant
        let file_value = match taken {
            CaptureTime::Instant(dt) => dt
                .with_timezone(&chrono::Local)
                .format(FILE_DATE_FORMAT)
                .to_string(),
            CaptureTime::WallClock(naive) => naive.format(EXIF_DATE_FORMAT).to_string(),
        };
        fields.set("FileModifyDate", file_value.clone());
        if HAS_FILE_CREATE_DATE {
            fields.set("FileCreateDate", file_value);
        }
    }

    if record.has_gps() {
        let latitude = record.latitude.unwrap_or(0.0);
        let longitude = record.longitude.unwrap_or(0.0);
        fields.set("GPSLatitude", latitude.abs().to_string());
        fields.set("GPSLatitudeRef", if latitude < 0.0 { "S" } else { "N" });
        fields.set("GPSLongitude", longitude.abs().to_string());
        fields.set("GPSLongitudeRef", if longitude < 0.0 { "W" } else { "E" });
        if let Some(altitude) = record.altitude {
            fields.set("GPSAltitude", altitude.abs().to_string());
            // Raw value: 0 above sea level, 1 below
            fields.set("GPSAltitudeRef#", if altitude < 0.0 { "1" } else { "0" });
        }
    }

    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        for tag in ["ImageDescription", "Caption-Abstract", "XMP:Description"] {
            fields.set(tag, description);
        }
    }

    for tag in &record.tags {
        fields.set("Keywords", tag.as_str());
        fields.set("XMP:Subject", tag.as_str());
    }

    if let Some(title) = record.title.as_deref() {
        fields.set("XMP:Title", title);
    }

    fields
}

/// Drives the tool over resolution records and verifies each write
pub struct Executor<'a> {
    tool: &'a dyn MetadataTool,
    verifier: &'a Verifier<'a>,
    options: EmbedOptions,
    stats: &'a RunStatistics,
}

impl<'a> Executor<'a> {
    pub fn new(
        tool: &'a dyn MetadataTool,
        verifier: &'a Verifier<'a>,
        options: EmbedOptions,
        stats: &'a RunStatistics,
    ) -> Self {
        Self {
            tool,
            verifier,
            options,
            stats,
        }
    }

    /// Embed and verify every record. Outcomes line up with `records`.
    pub fn run(&self, records: &[ResolutionRecord]) -> Vec<EmbeddingOutcome> {
        self.run_with_progress(records, |_, _| {})
    }

    /// Same as [`Executor::run`], reporting `(batches done, batch count)` after each batch
    pub fn run_with_progress(
        &self,
        records: &[ResolutionRecord],
        mut on_batch: impl FnMut(usize, usize),
    ) -> Vec<EmbeddingOutcome> {
        let mut outcomes: Vec<Option<EmbeddingOutcome>> = vec![None; records.len()];
        let mut pending: Vec<(usize, EmbedJob)> = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            match record.strategy() {
                Strategy::None => {
                    outcomes[idx] = Some(EmbeddingOutcome::failed(FailureReason::Unresolvable));
                }
                Strategy::ExifPreserved => {
                    outcomes[idx] = Some(EmbeddingOutcome::verified(BTreeSet::new()));
                }
                _ => {
                    let fields = field_map(&record.source.record, self.options.write_local_time);
                    if fields.is_empty() {
                        debug!(path = %record.asset.path.display(), "No fields to write");
                        outcomes[idx] = Some(self.verifier.verify(&record.asset, &record.source));
                    } else {
                        pending.push((
                            idx,
                            EmbedJob {
                                path: record.asset.path.clone(),
                                fields,
                            },
                        ));
                    }
                }
            }
        }

        let batch_count = pending.len().div_ceil(self.options.batch_size);
        for (batch_idx, batch) in pending.chunks(self.options.batch_size).enumerate() {
            let span = span!(Level::INFO, "batch", number = batch_idx + 1, size = batch.len());
            let _enter = span.enter();

            for (idx, outcome) in self.run_batch(records, batch) {
                outcomes[idx] = Some(outcome);
            }
            on_batch(batch_idx + 1, batch_count);
        }

        outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| EmbeddingOutcome::failed(FailureReason::Unresolvable)))
            .collect()
    }

    fn run_batch(
        &self,
        records: &[ResolutionRecord],
        batch: &[(usize, EmbedJob)],
    ) -> Vec<(usize, EmbeddingOutcome)> {
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        let jobs: Vec<EmbedJob> = batch.iter().map(|(_, job)| job.clone()).collect();

        match self.tool.embed(&jobs, self.options.batch_timeout) {
            Ok(()) => {
                let outcomes: Vec<_> = batch
                    .iter()
                    .map(|(idx, _)| (*idx, self.verify(&records[*idx])))
                    .collect();
                let verified = outcomes.iter().filter(|(_, o)| o.verified).count();
                info!(verified, total = batch.len(), "Batch embedded");
                outcomes
            }
            Err(e) => {
                warn!(error = %e, "Batch failed, processing files individually");
                self.stats.batch_fallbacks.fetch_add(1, Ordering::Relaxed);
                batch
                    .iter()
                    .map(|(idx, job)| (*idx, self.run_individual(&records[*idx], job)))
                    .collect()
            }
        }
    }

    fn run_individual(&self, record: &ResolutionRecord, job: &EmbedJob) -> EmbeddingOutcome {
        match self
            .tool
            .embed(std::slice::from_ref(job), self.options.individual_timeout)
        {
            Ok(()) => self.verify(record),
            Err(e) => {
                warn!(path = %job.path.display(), error = %e, "Failed to embed metadata");
                self.stats.tool_failures.fetch_add(1, Ordering::Relaxed);
                EmbeddingOutcome::failed(FailureReason::ToolInvocation(e.to_string()))
            }
        }
    }

    fn verify(&self, record: &ResolutionRecord) -> EmbeddingOutcome {
        self.verifier.verify(&record.asset, &record.source)
    }
}
