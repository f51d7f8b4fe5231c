// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of per-run report files under a directory tree.

use crate::paths;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Recursively enumerates per-run report files beneath `root`.
///
/// Matches regular files whose base name starts with the per-run prefix and
/// whose extension is `.json` (case-insensitive), excluding `exclude` so a
/// merge never reads its own output. Results are sorted, which makes the
/// order reproducible within a run; callers must not depend on ordering
/// across platforms or filesystems beyond that.
///
/// A missing root or an empty result is not an error: both return an empty
/// list with a diagnostic.
pub fn scan_run_reports(root: &Utf8Path, exclude: &Utf8Path) -> Vec<Utf8PathBuf> {
    if !root.is_dir() {
        warn!("report root does not exist: {root}");
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("error walking {root}: {error}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = match Utf8PathBuf::try_from(entry.into_path()) {
            Ok(path) => path,
            Err(error) => {
                warn!("skipping non-UTF-8 path: {error}");
                continue;
            }
        };
        if path.as_path() == exclude || !paths::is_run_report(&path) {
            continue;
        }
        found.push(path);
    }
    found.sort_unstable();

    if found.is_empty() {
        warn!(
            "no {}-*.json files found under {root}",
            paths::REPORT_FILE_PREFIX
        );
    }
    found
}
