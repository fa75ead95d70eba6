//! Where failure records go once a helper has produced them.
//!
//! A [`FailureReporter`] receives each [`FailureRecord`] as soon as it is
//! recorded, while the scenario is still running. Suite-level renderers
//! ([`junit`], [`console`]) work from the finished
//! [`SuiteReport`](crate::runner::SuiteReport).

pub mod console;
pub mod junit;

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::warn;

use crate::failure::FailureRecord;

/// Name of the JSON Lines file inside a report directory.
pub const FAILURES_FILE: &str = "failures.jsonl";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives failure records as they happen.
pub trait FailureReporter: Send + Sync {
    fn record(&self, failure: &FailureRecord);
}

impl<R: FailureReporter + ?Sized> FailureReporter for Arc<R> {
    fn record(&self, failure: &FailureRecord) {
        (**self).record(failure)
    }
}

/// Forwards every record to each inner reporter in order.
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Box<dyn FailureReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl FailureReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl FailureReporter for FanoutReporter {
    fn record(&self, failure: &FailureRecord) {
        for reporter in &self.reporters {
            reporter.record(failure);
        }
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<FailureRecord>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FailureReporter for MemoryReporter {
    fn record(&self, failure: &FailureRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(failure.clone());
        }
    }
}

/// Logs one `warn!` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn record(&self, failure: &FailureRecord) {
        warn!(
            scenario = failure.scenario(),
            file = failure.file(),
            line = failure.line(),
            expected = failure.expected(),
            screenshot = failure.screenshot().is_some(),
            "{}",
            failure.description()
        );
    }
}

/// Persists failures to a report directory.
///
/// Each record becomes one line of `failures.jsonl`. The screenshot is
/// written next to it as `<record-id>.png` and the line carries its file
/// name under `screenshot_file` instead of the inline image.
pub struct JsonlReporter {
    dir: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlReporter {
    /// Opens (creating if needed) `dir` and appends to its failures file.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(FAILURES_FILE))?;
        Ok(Self {
            dir,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, failure: &FailureRecord) -> Result<(), ReportError> {
        let mut line = serde_json::to_value(failure)?;
        if let Some(obj) = line.as_object_mut() {
            obj.remove("screenshot");
            if let Some(png) = failure.screenshot() {
                let name = format!("{}.png", failure.id());
                std::fs::write(self.dir.join(&name), png)?;
                obj.insert("screenshot_file".to_string(), name.into());
            }
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("report writer poisoned"))?;
        writeln!(writer, "{}", serde_json::to_string(&line)?)?;
        writer.flush()?;
        Ok(())
    }
}

impl FailureReporter for JsonlReporter {
    fn record(&self, failure: &FailureRecord) {
        if let Err(e) = self.write(failure) {
            warn!(dir = %self.dir.display(), error = %e, "failed to persist failure record");
        }
    }
}
