// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed lifecycle events emitted by the external test runner.
//!
//! Runner adapters are expected to translate their native notification stream
//! into these types. Keeping the shapes explicit here (rather than probing
//! loosely-typed runner objects inside the collector) pins down exactly which
//! pieces of runner state the report schema depends on.

use crate::overrides::OverrideCandidate;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use zephyr_report::TestStatus;

/// A single notification in a run's sequential lifecycle stream.
#[derive(Clone, Debug)]
pub enum RunEvent {
    /// The run began.
    RunStarted {
        /// When the run began.
        timestamp: DateTime<Utc>,
    },

    /// A test finished, in any status.
    TestFinished {
        /// The completed test, with the metadata the runner supplied for it.
        test: Box<CompletedTest>,
    },

    /// The run ended.
    RunFinished {
        /// When the run ended.
        timestamp: DateTime<Utc>,

        /// The runner-reported total wall-clock duration, when available.
        duration_ms: Option<u64>,
    },
}

/// A completed test as reported by the runner.
#[derive(Clone, Debug, Default)]
pub struct CompletedTest {
    /// The raw title, possibly carrying a trailing bracketed tag annotation.
    pub title: String,

    /// The ancestry-qualified title, when the runner supplies one.
    pub full_title: Option<String>,

    /// The source file the test itself is annotated with, when present.
    pub file: Option<Utf8PathBuf>,

    /// How long the test took, in milliseconds.
    pub duration_ms: Option<u64>,

    /// The outcome of the test.
    pub outcome: TestOutcome,

    /// The suite ancestry chain, ordered immediate parent first. An unnamed
    /// root suite is represented by an entry with an empty title.
    pub ancestors: Vec<SuiteInfo>,

    /// Candidate locations for override metadata, in precedence order.
    pub overrides: Vec<OverrideCandidate>,
}

/// One ancestor suite in a test's ancestry chain.
#[derive(Clone, Debug, Default)]
pub struct SuiteInfo {
    /// The suite title. Empty for unnamed (root) suites.
    pub title: String,

    /// The source file the suite is annotated with, when present.
    pub file: Option<Utf8PathBuf>,
}

/// The outcome of a completed test.
#[derive(Clone, Debug, Default)]
pub enum TestOutcome {
    /// The test ran and passed.
    #[default]
    Passed,

    /// The test ran and failed.
    Failed(RunnerFailure),

    /// The test was registered but not executed.
    Pending,
}

impl TestOutcome {
    /// Returns the report status corresponding to this outcome.
    pub fn status(&self) -> TestStatus {
        match self {
            TestOutcome::Passed => TestStatus::Passed,
            TestOutcome::Failed(_) => TestStatus::Failed,
            TestOutcome::Pending => TestStatus::Pending,
        }
    }
}

/// The error value the runner raised for a failed test.
#[derive(Clone, Debug)]
pub struct RunnerFailure {
    /// The error's message property, when it carried one.
    pub message: Option<String>,

    /// The error's string form, used as the message fallback.
    pub rendered: String,

    /// The stack trace, captured verbatim when present.
    pub stack: Option<String>,
}

impl RunnerFailure {
    /// Returns the failure message: the message property when present, else
    /// the rendered string form.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_falls_back_to_rendered_form() {
        let with_message = RunnerFailure {
            message: Some("expected 1 to equal 2".to_owned()),
            rendered: "AssertionError: expected 1 to equal 2".to_owned(),
            stack: None,
        };
        assert_eq!(with_message.message(), "expected 1 to equal 2");

        let without_message = RunnerFailure {
            message: None,
            rendered: "Error: boom".to_owned(),
            stack: None,
        };
        assert_eq!(without_message.message(), "Error: boom");
    }
}
