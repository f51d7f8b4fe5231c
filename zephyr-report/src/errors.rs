// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::REPORTER_ID;
use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_json_string`](crate::Report::to_json_string).
#[derive(Debug, Error)]
#[error("error serializing zephyr-json report")]
pub struct SerializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error that occurs while reading a [`Report`](crate::Report) from JSON
/// text.
///
/// The variants distinguish text that isn't JSON at all from JSON that doesn't
/// carry the zephyr-json shape, so callers can report the two separately.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseReportError {
    /// The input was not valid JSON.
    #[error("input is not valid JSON")]
    Json(#[source] serde_json::Error),

    /// `meta.reporter` was missing or didn't match [`REPORTER_ID`].
    #[error("`meta.reporter` is `{found}`, expected `{REPORTER_ID}`")]
    ReporterMismatch {
        /// The reporter identifier that was found, or the empty string if the
        /// field was absent.
        found: String,
    },

    /// The `tests` field was missing or not a sequence.
    #[error("`tests` is missing or not a sequence")]
    TestsNotASequence,

    /// The `stats` field was missing.
    #[error("`stats` is missing")]
    MissingStats,

    /// The input passed the shape checks but a field didn't deserialize.
    #[error("report does not match the zephyr-json schema")]
    Schema(#[source] serde_json::Error),
}
