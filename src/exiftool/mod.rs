//! External metadata tool boundary
//!
//! The engine only talks to the tool through [`MetadataTool`], which keeps the
//! ExifTool process contract in one place and lets tests run against an
//! in-memory fake.

mod command;
#[cfg(test)]
pub mod fake;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, trace};

pub use command::{Output, run_with_timeout};

/// Environment variable naming the exiftool binary
pub const EXIFTOOL_ENV: &str = "TAKEOUT_RESTORE_EXIFTOOL";

/// Timeout for the startup version check
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Ordered tag assignments for one file. A tag may repeat (e.g. `Keywords`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.entries.push((tag.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// First value assigned to a tag
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.iter().find(|(t, _)| *t == tag).map(|(_, v)| v)
    }
}

/// One file and the tags to write into it
#[derive(Debug, Clone)]
pub struct EmbedJob {
    pub path: PathBuf,
    pub fields: FieldMap,
}

/// Tag values read back from a file, keyed by tag name without group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagValues {
    values: HashMap<String, Value>,
}

impl TagValues {
    pub fn from_map(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.values.get(tag)
    }

    /// Value rendered as text, if present
    pub fn get_str(&self, tag: &str) -> Option<String> {
        match self.values.get(tag)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Check if a tag is present with a non-empty value
    pub fn has(&self, tag: &str) -> bool {
        match self.values.get(tag) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }
}

/// The external metadata tool contract
pub trait MetadataTool {
    /// Report the tool's version. Fails when the tool is not usable.
    fn version(&self) -> Result<String>;

    /// Write every job's fields in one invocation
    fn embed(&self, jobs: &[EmbedJob], timeout: Duration) -> Result<()>;

    /// Read the given tags from a file
    fn query(&self, path: &Path, tags: &[&str], timeout: Duration) -> Result<TagValues>;
}

/// ExifTool driven as a subprocess
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find the binary: explicit path, then [`EXIFTOOL_ENV`], then `PATH`
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Self::new(path));
            }
            return Err(Error::ToolNotFound {
                tool: path.display().to_string(),
            });
        }

        if let Some(path) = env::var_os(EXIFTOOL_ENV).map(PathBuf::from)
            && path.is_file()
        {
            debug!(path = %path.display(), "Using exiftool from {}", EXIFTOOL_ENV);
            return Ok(Self::new(path));
        }

        find_in_path("exiftool")
            .map(Self::new)
            .ok_or_else(|| Error::ToolNotFound {
                tool: "exiftool".to_string(),
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MetadataTool for ExifTool {
    fn version(&self) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-ver");
        let output = run_with_timeout(cmd, None, VERSION_TIMEOUT).map_err(|e| match e {
            Error::Io(_) => Error::ToolNotFound {
                tool: self.program.display().to_string(),
            },
            other => other,
        })?;

        if !output.status.success() {
            return Err(Error::ToolInvocation {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn embed(&self, jobs: &[EmbedJob], timeout: Duration) -> Result<()> {
        if jobs.is_empty() {
            return Ok(());
        }

        let argfile = build_argfile(jobs);
        trace!(jobs = jobs.len(), "exiftool argfile:\n{}", argfile);

        let mut cmd = Command::new(&self.program);
        cmd.args(["-@", "-", "-common_args"]).args(COMMON_WRITE_ARGS);
        let output = run_with_timeout(cmd, Some(argfile), timeout)?;

        if !output.status.success() {
            return Err(Error::ToolInvocation {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    fn query(&self, path: &Path, tags: &[&str], timeout: Duration) -> Result<TagValues> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-json", "-n"]);
        cmd.args(tags.iter().map(|tag| format!("-{tag}")));
        cmd.arg(path);

        let output = run_with_timeout(cmd, None, timeout)?;
        if !output.status.success() {
            return Err(Error::ToolOutput {
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_query_output(path, &output.stdout)
    }
}

/// Arguments shared by every `-execute` group. `-common_args` is not allowed
/// inside an argfile, so these go on the command line.
const COMMON_WRITE_ARGS: &[&str] = &["-overwrite_original", "-ec", "-api", "largefilesupport=1"];

/// Build the `-@ -` argument file: one command group per job, separated by `-execute`
fn build_argfile(jobs: &[EmbedJob]) -> String {
    let mut out = String::new();
    for (i, job) in jobs.iter().enumerate() {
        if i > 0 {
            out.push_str("-execute\n");
        }
        for (tag, value) in job.fields.iter() {
            out.push_str(&format!("-{}={}\n", tag, escape_value(value)));
        }
        out.push_str(&job.path.to_string_lossy());
        out.push('\n');
    }
    out
}

/// Argfile entries are line based; `-ec` turns these escapes back into characters
fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn parse_query_output(path: &Path, stdout: &[u8]) -> Result<TagValues> {
    let parsed: Vec<HashMap<String, Value>> =
        serde_json::from_slice(stdout).map_err(|e| Error::ToolOutput {
            path: path.to_path_buf(),
            message: format!("Failed to parse exiftool JSON: {}", e),
        })?;

    let values = parsed.into_iter().next().ok_or_else(|| Error::ToolOutput {
        path: path.to_path_buf(),
        message: "exiftool returned no entries".to_string(),
    })?;

    Ok(TagValues::from_map(values))
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    let candidates: Vec<String> = if cfg!(windows) {
        vec![format!("{name}.exe"), name.to_string()]
    } else {
        vec![name.to_string()]
    };

    env::split_paths(&path_var)
        .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
        .find(|p| p.is_file())
}
