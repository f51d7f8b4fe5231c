// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while writing and cleaning up reports.
//!
//! Per-file read and shape failures during a merge are not errors: they are
//! swallowed with a diagnostic and surfaced in the merge's per-file outcome
//! list ([`InputStatus`](crate::merge::InputStatus)).

use camino::Utf8PathBuf;
use thiserror::Error;
use zephyr_report::SerializeError;

/// An error that occurs while writing a report to disk.
///
/// Write failures are never handled locally; they propagate to the caller of
/// the collector or the merger.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path `{path}`")]
    Fs {
        /// The path being operated on.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while serializing zephyr-json output.
    #[error("error writing zephyr-json output to `{path}`")]
    Serialize {
        /// The output file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: SerializeError,
    },
}

/// An error that occurs while removing the report namespace directory.
#[derive(Debug, Error)]
#[error("error removing report directory `{path}`")]
pub struct CleanupError {
    pub(crate) path: Utf8PathBuf,
    #[source]
    pub(crate) error: std::io::Error,
}
