// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges the per-run reports written by parallel shards into one report.

use crate::{
    errors::{CleanupError, WriteReportError},
    paths,
    scan::scan_run_reports,
    shard::ShardId,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use std::{collections::HashSet, fs::File, io::BufWriter};
use tracing::{info, warn};
use zephyr_report::{ParseReportError, Report, RunStats, TestRecord};

/// Options for a merge operation.
///
/// The shard identifier is an explicit field: the merge core never consults
/// ambient process state. Callers that follow the conventional environment
/// variable can construct the field with
/// [`ShardId::from_env`](crate::shard::ShardId::from_env).
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// The output root, under which `zephyr/temp` is scanned and
    /// `zephyr/zephyr-report-<shard>.json` is written.
    pub root_dir: Utf8PathBuf,

    /// The shard this process is running as.
    pub shard: ShardId,

    /// Whether to deduplicate records sharing an identity key.
    pub dedupe: bool,

    /// Allows the merge to run on non-primary shards. Off by default so that
    /// parallel shards don't all repeat the same global merge.
    pub merge_on_all_shards: bool,
}

impl MergeOptions {
    /// Creates options with the given root and shard, dedupe off and the
    /// primary-shard gate engaged.
    pub fn new(root_dir: impl Into<Utf8PathBuf>, shard: ShardId) -> Self {
        Self {
            root_dir: root_dir.into(),
            shard,
            dedupe: false,
            merge_on_all_shards: false,
        }
    }
}

/// The result of a merge that ran to completion (successfully or as a
/// defined no-op). Write failures are returned as errors instead.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The merge was a no-op; nothing was written.
    Skipped(SkipReason),

    /// The merged report was written.
    Merged(MergeSummary),
}

impl MergeOutcome {
    /// Returns the summary if the merge wrote a report.
    pub fn summary(&self) -> Option<&MergeSummary> {
        match self {
            MergeOutcome::Merged(summary) => Some(summary),
            MergeOutcome::Skipped(_) => None,
        }
    }
}

/// Why a merge was a no-op.
#[derive(Debug)]
pub enum SkipReason {
    /// A non-primary shard attempted a merge without the override flag.
    NotPrimaryShard {
        /// The shard that was gated off.
        shard: ShardId,
    },

    /// The scan root doesn't exist.
    MissingRoot {
        /// The directory that was expected to exist.
        root: Utf8PathBuf,
    },

    /// The scan root exists but no candidate files matched.
    NoCandidateFiles {
        /// The directory that was scanned.
        root: Utf8PathBuf,
    },

    /// Candidates existed but none parsed as a valid report.
    NoValidReports {
        /// The per-file outcomes, all non-`Loaded`.
        inputs: Vec<InputOutcome>,
    },
}

/// What was written, plus per-file detail about the inputs.
#[derive(Debug)]
pub struct MergeSummary {
    /// Where the merged report was written.
    pub output_path: Utf8PathBuf,

    /// The recomputed statistics of the merged report.
    pub stats: RunStats,

    /// Per-file outcomes, in scan order.
    pub inputs: Vec<InputOutcome>,
}

/// The outcome of reading one candidate file.
#[derive(Debug)]
pub struct InputOutcome {
    /// The candidate file.
    pub path: Utf8PathBuf,

    /// What happened to it.
    pub status: InputStatus,
}

/// Per-file status within a merge. Failures here are diagnostics, never
/// fatal: the file is skipped and the merge continues.
#[derive(Debug)]
pub enum InputStatus {
    /// The file parsed and validated.
    Loaded {
        /// How many records it contributed.
        tests: usize,
    },

    /// The file could not be read.
    Unreadable(std::io::Error),

    /// The file was not a valid zephyr-json report.
    Invalid(ParseReportError),
}

/// Merges all per-run reports under the options' root into one report.
///
/// Unless [`MergeOptions::merge_on_all_shards`] is set, only the primary
/// shard actually merges; other shards get a skipped outcome. This gate is a
/// convention, not mutual exclusion — true locking across shard processes is
/// left to external orchestration.
///
/// Source reports are never mutated; the merged report is a fresh entity
/// stamped with the merge's own time. Statistics are always recomputed from
/// the final record sequence, never copied from inputs.
pub fn merge_reports(opts: &MergeOptions) -> Result<MergeOutcome, WriteReportError> {
    if !opts.merge_on_all_shards && !opts.shard.is_primary() {
        warn!(
            "skipping merge on non-primary shard `{}` (redundant with the primary's)",
            opts.shard
        );
        return Ok(MergeOutcome::Skipped(SkipReason::NotPrimaryShard {
            shard: opts.shard.clone(),
        }));
    }

    let scan_root = paths::temp_dir(&opts.root_dir);
    let output_path = paths::merged_report_path(&opts.root_dir, &opts.shard);

    if !scan_root.is_dir() {
        warn!("report root does not exist: {scan_root}");
        return Ok(MergeOutcome::Skipped(SkipReason::MissingRoot {
            root: scan_root,
        }));
    }

    let candidates = scan_run_reports(&scan_root, &output_path);
    if candidates.is_empty() {
        return Ok(MergeOutcome::Skipped(SkipReason::NoCandidateFiles {
            root: scan_root,
        }));
    }

    let mut inputs = Vec::with_capacity(candidates.len());
    let mut reports = Vec::new();
    for path in candidates {
        let status = match load_report(&path) {
            Ok(report) => {
                let tests = report.tests.len();
                reports.push(report);
                InputStatus::Loaded { tests }
            }
            Err(status) => status,
        };
        inputs.push(InputOutcome { path, status });
    }

    if reports.is_empty() {
        warn!(
            "found {} candidate file(s) under {scan_root} but none were valid zephyr-json reports",
            inputs.len()
        );
        return Ok(MergeOutcome::Skipped(SkipReason::NoValidReports { inputs }));
    }

    let mut started_at: Option<DateTime<Utc>> = None;
    let mut ended_at: Option<DateTime<Utc>> = None;
    let mut records: Vec<TestRecord> = Vec::new();
    for report in &reports {
        started_at = earliest(started_at, report.meta.started_at);
        ended_at = latest(ended_at, report.meta.ended_at);
        records.extend(report.tests.iter().cloned());
    }
    if opts.dedupe {
        records = dedupe_records(records);
    }

    let mut merged = Report::new(Utc::now());
    merged.meta.started_at = started_at;
    merged.meta.ended_at = ended_at;
    merged.stats = RunStats::recompute(&records);
    merged.tests = records;

    write_report(&merged, &output_path)?;
    info!(
        "merged {} report(s) -> {output_path} ({} tests)",
        reports.len(),
        merged.stats.tests
    );

    Ok(MergeOutcome::Merged(MergeSummary {
        output_path,
        stats: merged.stats,
        inputs,
    }))
}

/// Recursively deletes the entire report namespace under `root`.
pub fn clean_reports(root: &Utf8Path) -> Result<(), CleanupError> {
    let dir = paths::namespace_dir(root);
    if !dir.exists() {
        warn!("report directory does not exist, nothing to clean: {dir}");
        return Ok(());
    }
    std::fs::remove_dir_all(&dir).map_err(|error| CleanupError { path: dir, error })
}

fn load_report(path: &Utf8Path) -> Result<Report, InputStatus> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            warn!("skipping unreadable report {path}: {error}");
            return Err(InputStatus::Unreadable(error));
        }
    };
    Report::from_json_str(&text).map_err(|error| {
        warn!("skipping invalid report {path}: {error}");
        InputStatus::Invalid(error)
    })
}

/// Removes later records whose identity key duplicates an earlier one. The
/// first occurrence wins and survivor order is preserved.
fn dedupe_records(records: Vec<TestRecord>) -> Vec<TestRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.identity()))
        .collect()
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn write_report(report: &Report, output_path: &Utf8Path) -> Result<(), WriteReportError> {
    let dir = output_path
        .parent()
        .expect("merged report path always has a parent");
    std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
        path: dir.to_path_buf(),
        error,
    })?;

    let file = File::create(output_path).map_err(|error| WriteReportError::Fs {
        path: output_path.to_path_buf(),
        error,
    })?;
    report
        .serialize(BufWriter::new(file))
        .map_err(|error| WriteReportError::Serialize {
            path: output_path.to_path_buf(),
            error,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zephyr_report::{ConfigOverrides, TestStatus};

    fn record(full_title: &str, file: Option<&str>) -> TestRecord {
        TestRecord {
            title: full_title.to_owned(),
            full_title: full_title.to_owned(),
            parents: vec![],
            file: file.map(Into::into),
            duration_ms: None,
            status: TestStatus::Passed,
            tags: vec![],
            config_overrides: ConfigOverrides::new(),
            error: None,
        }
    }

    fn timestamp(s: &str) -> Option<DateTime<Utc>> {
        Some(s.parse().expect("valid timestamp"))
    }

    #[test]
    fn earliest_and_latest_ignore_absent_values() {
        let early = timestamp("2024-01-01T00:00:00Z");
        let late = timestamp("2024-01-01T00:05:00Z");

        assert_eq!(earliest(early, late), early);
        assert_eq!(earliest(None, late), late);
        assert_eq!(earliest(early, None), early);
        assert_eq!(earliest(None, None), None);

        assert_eq!(latest(early, late), late);
        assert_eq!(latest(None, early), early);
        assert_eq!(latest(late, None), late);
        assert_eq!(latest(None, None), None);
    }

    #[test]
    fn dedupe_keeps_first_occurrence_and_order() {
        let records = vec![
            record("a", None),
            record("b", Some("x.cy.ts")),
            record("a", None),
            record("c", None),
            record("b", Some("y.cy.ts")),
        ];
        let deduped = dedupe_records(records);
        let titles: Vec<_> = deduped
            .iter()
            .map(|record| {
                (
                    record.full_title.as_str(),
                    record.file.as_deref().map(|f| f.as_str()),
                )
            })
            .collect();
        // The second "b" survives: a different file means a different
        // identity.
        assert_eq!(
            titles,
            [
                ("a", None),
                ("b", Some("x.cy.ts")),
                ("c", None),
                ("b", Some("y.cy.ts")),
            ]
        );
    }

    #[test]
    fn dedupe_distinguishes_parent_chains() {
        let mut a = record("t", None);
        a.parents = vec!["Suite".to_owned()];
        let b = record("t", None);
        assert_eq!(dedupe_records(vec![a, b]).len(), 2);
    }
}
