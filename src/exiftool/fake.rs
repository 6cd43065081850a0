//! In-memory metadata tool for tests

use super::{EmbedJob, MetadataTool, TagValues};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, HashMap<String, Value>>,
    file_types: HashMap<PathBuf, String>,
    failing_paths: HashSet<PathBuf>,
    failing_queries: HashSet<PathBuf>,
    dropped_tags: HashSet<String>,
    max_batch: Option<usize>,
    timeout_batch: Option<usize>,
    embed_calls: Vec<usize>,
    query_calls: usize,
}

/// Keeps written tags per path. Failures and partial writes are configurable.
#[derive(Default)]
pub struct FakeTool {
    state: Mutex<State>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any invocation carrying more than `max` jobs
    pub fn fail_batches_over(self, max: usize) -> Self {
        self.state.lock().unwrap().max_batch = Some(max);
        self
    }

    /// Time out any invocation carrying more than `max` jobs
    pub fn time_out_batches_over(self, max: usize) -> Self {
        self.state.lock().unwrap().timeout_batch = Some(max);
        self
    }

    /// Fail any invocation that includes this path
    pub fn fail_path(self, path: impl Into<PathBuf>) -> Self {
        self.state.lock().unwrap().failing_paths.insert(path.into());
        self
    }

    /// Fail queries against this path
    pub fn fail_query(self, path: impl Into<PathBuf>) -> Self {
        self.state.lock().unwrap().failing_queries.insert(path.into());
        self
    }

    /// Accept writes to this tag without storing them
    pub fn drop_tag(self, tag: &str) -> Self {
        self.state.lock().unwrap().dropped_tags.insert(tag.to_string());
        self
    }

    /// Report a content type for `FileType` queries
    pub fn with_file_type(self, path: impl Into<PathBuf>, file_type: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .file_types
            .insert(path.into(), file_type.to_string());
        self
    }

    /// Preload a tag as if the camera had written it
    pub fn with_tag(self, path: impl Into<PathBuf>, tag: &str, value: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .entry(path.into())
            .or_default()
            .insert(tag.to_string(), value);
        self
    }

    /// Number of jobs in each embed invocation, in call order
    pub fn embed_calls(&self) -> Vec<usize> {
        self.state.lock().unwrap().embed_calls.clone()
    }

    pub fn query_calls(&self) -> usize {
        self.state.lock().unwrap().query_calls
    }

    /// Tag as stored for a path
    pub fn tag(&self, path: &Path, tag: &str) -> Option<Value> {
        self.state.lock().unwrap().files.get(path)?.get(tag).cloned()
    }
}

/// `XMP:Title` is read back as `Title`, `GPSAltitudeRef#` as `GPSAltitudeRef`
fn bare_tag(tag: &str) -> &str {
    tag.rsplit(':').next().unwrap_or(tag).trim_end_matches('#')
}

impl MetadataTool for FakeTool {
    fn version(&self) -> Result<String> {
        Ok("12.76".to_string())
    }

    fn embed(&self, jobs: &[EmbedJob], timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.embed_calls.push(jobs.len());

        if state.timeout_batch.is_some_and(|max| jobs.len() > max) {
            return Err(Error::ToolTimeout { timeout });
        }

        if state.max_batch.is_some_and(|max| jobs.len() > max) {
            return Err(Error::ToolInvocation {
                message: format!("batch of {} rejected", jobs.len()),
            });
        }
        if let Some(job) = jobs.iter().find(|j| state.failing_paths.contains(&j.path)) {
            return Err(Error::ToolInvocation {
                message: format!("Error: cannot write {}", job.path.display()),
            });
        }

        for job in jobs {
            let mut written: HashMap<String, Value> = HashMap::new();
            for (tag, value) in job.fields.iter() {
                let tag = bare_tag(tag);
                if state.dropped_tags.contains(tag) {
                    continue;
                }
                let value = Value::String(value.to_string());
                let merged = match written.remove(tag) {
                    None => value,
                    Some(Value::Array(mut items)) => {
                        items.push(value);
                        Value::Array(items)
                    }
                    Some(first) => Value::Array(vec![first, value]),
                };
                written.insert(tag.to_string(), merged);
            }
            state.files.entry(job.path.clone()).or_default().extend(written);
        }

        Ok(())
    }

    fn query(&self, path: &Path, tags: &[&str], _timeout: Duration) -> Result<TagValues> {
        let mut state = self.state.lock().unwrap();
        state.query_calls += 1;

        if state.failing_queries.contains(path) {
            return Err(Error::ToolTimeout {
                timeout: Duration::from_secs(10),
            });
        }

        let stored = state.files.get(path);
        let mut values = HashMap::new();
        for tag in tags {
            if *tag == "FileType"
                && let Some(file_type) = state.file_types.get(path)
            {
                values.insert("FileType".to_string(), Value::String(file_type.clone()));
                continue;
            }
            if let Some(value) = stored.and_then(|s| s.get(*tag)) {
                values.insert(tag.to_string(), value.clone());
            }
        }

        Ok(TagValues::from_map(values))
    }
}
