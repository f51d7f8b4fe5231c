// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ParseReportError, SerializeError};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;

/// The fixed reporter identifier carried by every zephyr-json report.
///
/// Reports whose `meta.reporter` doesn't match this value are rejected by
/// [`Report::from_json_str`].
pub static REPORTER_ID: &str = "zephyr-json";

/// Opaque per-test configuration metadata, stored as an open key-value map.
///
/// The contents are supplied by the external test runner and are not
/// interpreted here beyond tag extraction (which lives in `zephyr-reporter`).
pub type ConfigOverrides = Map<String, Value>;

/// The root of a zephyr-json report.
///
/// A report is created empty at run start, appended to by exactly one
/// collector for the duration of one run, finalized and written once at run
/// end, and immutable thereafter. Merged reports are freshly constructed;
/// their inputs are never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    /// Report provenance and lifecycle timestamps.
    pub meta: ReportMeta,

    /// Aggregate statistics over `tests`.
    pub stats: RunStats,

    /// The test records, in the order they finished (or, for a merged report,
    /// in input-scan order).
    pub tests: Vec<TestRecord>,
}

impl Report {
    /// Creates a new, empty `Report` generated at the given time.
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            meta: ReportMeta {
                reporter: REPORTER_ID.to_owned(),
                generated_at,
                started_at: None,
                ended_at: None,
            },
            stats: RunStats::default(),
            tests: Vec::new(),
        }
    }

    /// Sets the time at which the run began.
    pub fn set_started_at(&mut self, started_at: DateTime<Utc>) -> &mut Self {
        self.meta.started_at = Some(started_at);
        self
    }

    /// Sets the time at which the run ended.
    pub fn set_ended_at(&mut self, ended_at: DateTime<Utc>) -> &mut Self {
        self.meta.ended_at = Some(ended_at);
        self
    }

    /// Sets the overall wall-clock duration reported by the runner.
    pub fn set_duration_ms(&mut self, duration_ms: Option<u64>) -> &mut Self {
        self.stats.duration_ms = duration_ms;
        self
    }

    /// Appends a record and updates the per-status counters.
    ///
    /// Use of this method over pushing to `self.tests` directly keeps
    /// `stats.tests == passes + failures + pending` true by construction.
    pub fn push_record(&mut self, record: TestRecord) -> &mut Self {
        self.stats.tests += 1;
        match record.status {
            TestStatus::Passed => self.stats.passes += 1,
            TestStatus::Failed => self.stats.failures += 1,
            TestStatus::Pending => self.stats.pending += 1,
        }
        self.tests.push(record);
        self
    }

    /// Serializes this report to the given writer as 2-space-indented UTF-8
    /// JSON.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Serializes this report to a string.
    pub fn to_json_string(&self) -> Result<String, SerializeError> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(String::from_utf8(buf).expect("serde_json writes UTF-8"))
    }

    /// Parses and validates a report from JSON text.
    ///
    /// The shape checks (reporter identifier, `tests` a sequence, `stats`
    /// present) run before typed deserialization so their failures are
    /// reported distinctly from a malformed field.
    pub fn from_json_str(input: &str) -> Result<Self, ParseReportError> {
        let value: Value = serde_json::from_str(input).map_err(ParseReportError::Json)?;

        let reporter = value
            .pointer("/meta/reporter")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if reporter != REPORTER_ID {
            return Err(ParseReportError::ReporterMismatch {
                found: reporter.to_owned(),
            });
        }
        if !value.get("tests").is_some_and(Value::is_array) {
            return Err(ParseReportError::TestsNotASequence);
        }
        if value.get("stats").is_none() {
            return Err(ParseReportError::MissingStats);
        }

        serde_json::from_value(value).map_err(ParseReportError::Schema)
    }
}

/// Report provenance: who wrote it and when.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// The reporter identifier, always [`REPORTER_ID`] for reports produced
    /// by this workspace.
    pub reporter: String,

    /// The time at which the report entity was created. For a merged report
    /// this is the merge's own time, not inherited from inputs.
    pub generated_at: DateTime<Utc>,

    /// The time at which the run began. Only present when the run-start
    /// lifecycle boundary was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// The time at which the run ended. Only present when the run-end
    /// lifecycle boundary was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Aggregate statistics over a report's test records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Total number of records.
    pub tests: usize,

    /// Number of passed records.
    pub passes: usize,

    /// Number of failed records.
    pub failures: usize,

    /// Number of pending records.
    pub pending: usize,

    /// Overall duration in milliseconds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl RunStats {
    /// Recomputes statistics from a sequence of records: counts per status
    /// plus summed durations.
    ///
    /// A summed duration of exactly zero is emitted as `None` rather than
    /// `Some(0)`. This makes "no timing data" and "zero total" ambiguous on
    /// the wire; the ambiguity is deliberate and kept for compatibility.
    pub fn recompute<'a>(records: impl IntoIterator<Item = &'a TestRecord>) -> Self {
        let mut stats = Self::default();
        let mut duration_ms = 0u64;
        for record in records {
            stats.tests += 1;
            match record.status {
                TestStatus::Passed => stats.passes += 1,
                TestStatus::Failed => stats.failures += 1,
                TestStatus::Pending => stats.pending += 1,
            }
            duration_ms += record.duration_ms.unwrap_or(0);
        }
        stats.duration_ms = (duration_ms != 0).then_some(duration_ms);
        stats
    }

    /// Returns true if `tests` equals `passes + failures + pending`.
    pub fn is_consistent(&self) -> bool {
        self.tests == self.passes + self.failures + self.pending
    }
}

/// The canonical record of one completed test.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// The display name, with any trailing bracketed tag annotation stripped.
    pub title: String,

    /// The title qualified by suite ancestry, as supplied by the runner.
    pub full_title: String,

    /// Ancestor suite names, ordered root → immediate.
    #[serde(default)]
    pub parents: Vec<String>,

    /// The originating source file, when it could be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Utf8PathBuf>,

    /// How long the test took, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// The test's outcome.
    pub status: TestStatus,

    /// Extracted tags: unique, in first-seen order.
    #[serde(default)]
    pub tags: Vec<String>,

    /// The raw override metadata the tags were extracted from, stored
    /// opaquely.
    #[serde(default)]
    pub config_overrides: ConfigOverrides,

    /// The failure, present exactly when `status` is [`TestStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TestError>,
}

impl TestRecord {
    /// Returns the identity key used for deduplication.
    ///
    /// Two records are duplicates when their full title, file (absent treated
    /// as empty) and parent chain all match. Identity is not enforced unique
    /// at creation time; only the merger consults it.
    pub fn identity(&self) -> TestIdentity {
        TestIdentity {
            full_title: self.full_title.clone(),
            file: self
                .file
                .as_ref()
                .map(|file| file.as_str().to_owned())
                .unwrap_or_default(),
            parents: self.parents.clone(),
        }
    }
}

/// The dedupe key of a [`TestRecord`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TestIdentity {
    /// The ancestry-qualified title.
    pub full_title: String,

    /// The originating source file, or the empty string if absent.
    pub file: String,

    /// Ancestor suite names, ordered root → immediate.
    pub parents: Vec<String>,
}

/// The outcome of a single test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test ran and passed.
    Passed,

    /// The test ran and failed.
    Failed,

    /// The test was registered but not executed.
    Pending,
}

/// The failure attached to a failed test record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestError {
    /// The failure message.
    pub message: String,

    /// The stack trace, captured verbatim when the runner supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}
