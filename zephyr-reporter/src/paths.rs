// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report path layout under the output root.
//!
//! Per-run reports:  `<root>/zephyr/temp/<dir-of-source>/zephyr-report-<base>.json`
//! Merged reports:   `<root>/zephyr/zephyr-report-<shard>.json`
//!
//! The merged report deliberately lives outside `temp/`, so scanning the temp
//! tree can never pick up a previous merge output.

use crate::shard::ShardId;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

/// Directory under the output root that holds everything this crate writes.
pub(crate) static REPORT_NAMESPACE: &str = "zephyr";

/// Subdirectory of the namespace that holds per-run reports.
pub(crate) static TEMP_DIR_NAME: &str = "temp";

/// File name prefix shared by per-run and merged reports.
pub(crate) static REPORT_FILE_PREFIX: &str = "zephyr-report";

/// Test-file suffixes stripped from a source file's base name when deriving
/// the report file name.
static TEST_FILE_SUFFIXES: &[&str] = &[".cy.ts", ".cy.tsx", ".cy.js", ".cy.jsx"];

/// Timestamp format used in synthesized report file names. Colon-free so the
/// result is a valid file name everywhere.
static FILE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

/// Returns `<root>/zephyr`.
pub(crate) fn namespace_dir(root: &Utf8Path) -> Utf8PathBuf {
    root.join(REPORT_NAMESPACE)
}

/// Returns `<root>/zephyr/temp`.
pub(crate) fn temp_dir(root: &Utf8Path) -> Utf8PathBuf {
    namespace_dir(root).join(TEMP_DIR_NAME)
}

/// Derives the output path for one run's report.
///
/// With a known source file, the report mirrors the source's directory under
/// the temp tree and takes its base name with any test-file suffix stripped.
/// Without one, a placeholder name incorporating `generated_at` is
/// synthesized. The `.json` extension is always present so the scanner picks
/// the file up either way.
pub(crate) fn run_report_path(
    root: &Utf8Path,
    source_file: Option<&Utf8Path>,
    generated_at: DateTime<Utc>,
) -> Utf8PathBuf {
    let temp = temp_dir(root);
    match source_file {
        Some(source) => {
            let dir = source.parent().unwrap_or(Utf8Path::new(""));
            // Absolute sources are re-rooted under the temp tree.
            let dir = dir.strip_prefix("/").unwrap_or(dir);
            let base = source.file_name().unwrap_or("unnamed");
            let stem = strip_test_suffix(base);
            temp.join(dir).join(format!("{REPORT_FILE_PREFIX}-{stem}.json"))
        }
        None => temp.join(format!(
            "{REPORT_FILE_PREFIX}-untracked-{}.json",
            generated_at.format(FILE_TIMESTAMP_FORMAT)
        )),
    }
}

/// Derives the output path for a shard's merged report.
pub(crate) fn merged_report_path(root: &Utf8Path, shard: &ShardId) -> Utf8PathBuf {
    namespace_dir(root).join(format!("{REPORT_FILE_PREFIX}-{shard}.json"))
}

/// Returns true if `path` names a per-run report: prefixed base name and a
/// `.json` extension (case-insensitive).
pub(crate) fn is_run_report(path: &Utf8Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    name.starts_with(REPORT_FILE_PREFIX)
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn strip_test_suffix(base: &str) -> &str {
    for suffix in TEST_FILE_SUFFIXES {
        if let Some(stem) = base.strip_suffix(suffix) {
            return stem;
        }
    }
    base
}
