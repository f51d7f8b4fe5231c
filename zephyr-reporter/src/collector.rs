// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds one report incrementally from a run's lifecycle events.

use crate::{
    errors::WriteReportError,
    events::{CompletedTest, RunEvent, TestOutcome},
    overrides::{extract_tags, resolve_overrides},
    paths,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::{fs::File, io::BufWriter, sync::LazyLock};
use zephyr_report::{Report, TestError, TestRecord};

/// Matches a trailing bracket-delimited tag annotation: optional leading
/// text, then a bracketed list at the very end of the title.
static TAG_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?s)(.*?)(\s*\[.*\])?$").expect("regex is valid"));

/// Collects one run's lifecycle events into a report and writes it once at
/// run end.
///
/// The collector is driven synchronously by the runner's sequential
/// notification stream; the in-progress report is never shared. After the
/// run-end event has been handled the report is read-only.
#[derive(Debug)]
pub struct EventCollector {
    report: Report,
    output_path: Utf8PathBuf,
}

impl EventCollector {
    /// Creates a collector for a run rooted at `root_dir`.
    ///
    /// `source_file` is the run's source-file identifier when the runner
    /// knows it; the output path is derived from it (see the crate docs for
    /// the layout). `generated_at` stamps the report and feeds the
    /// placeholder file name used when no source file is known.
    pub fn new(
        root_dir: &Utf8Path,
        source_file: Option<&Utf8Path>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            report: Report::new(generated_at),
            output_path: paths::run_report_path(root_dir, source_file, generated_at),
        }
    }

    /// The path the report will be written to at run end.
    pub fn output_path(&self) -> &Utf8Path {
        &self.output_path
    }

    /// The in-progress report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Handles one lifecycle event.
    ///
    /// The run-end event finalizes the report and writes it; a write failure
    /// propagates to the caller unhandled.
    pub fn handle_event(&mut self, event: RunEvent) -> Result<(), WriteReportError> {
        match event {
            RunEvent::RunStarted { timestamp } => {
                self.report.set_started_at(timestamp);
            }
            RunEvent::TestFinished { test } => {
                self.record_test(*test);
            }
            RunEvent::RunFinished {
                timestamp,
                duration_ms,
            } => {
                self.report.set_ended_at(timestamp);
                self.report.set_duration_ms(duration_ms);
                self.write_report()?;
            }
        }
        Ok(())
    }

    fn record_test(&mut self, test: CompletedTest) {
        let title = strip_tag_suffix(&test.title);
        let full_title = test.full_title.clone().unwrap_or_else(|| title.clone());
        let (file, parents) = resolve_location(&test);

        let error = match &test.outcome {
            TestOutcome::Failed(failure) => Some(TestError {
                message: failure.message().to_owned(),
                stack: failure.stack.clone(),
            }),
            TestOutcome::Passed | TestOutcome::Pending => None,
        };

        let config_overrides = resolve_overrides(&test.overrides);
        let tags = extract_tags(&config_overrides);

        self.report.push_record(TestRecord {
            title,
            full_title,
            parents,
            file,
            duration_ms: test.duration_ms,
            status: test.outcome.status(),
            tags,
            config_overrides,
            error,
        });
    }

    fn write_report(&self) -> Result<(), WriteReportError> {
        let dir = self
            .output_path
            .parent()
            .expect("report path always has a parent");
        std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
            path: dir.to_path_buf(),
            error,
        })?;

        let file = File::create(&self.output_path).map_err(|error| WriteReportError::Fs {
            path: self.output_path.clone(),
            error,
        })?;
        self.report
            .serialize(BufWriter::new(file))
            .map_err(|error| WriteReportError::Serialize {
                path: self.output_path.clone(),
                error,
            })
    }
}

/// Strips a trailing bracket-delimited tag annotation from a raw title and
/// trims the remainder. Titles without such a suffix come back unchanged
/// (modulo trimming).
fn strip_tag_suffix(raw_title: &str) -> String {
    match TAG_SUFFIX_RE.captures(raw_title) {
        Some(captures) => captures
            .get(1)
            .map(|stripped| stripped.as_str().trim().to_owned())
            .unwrap_or_default(),
        None => raw_title.trim().to_owned(),
    }
}

/// Resolves a test's source file and parent-suite chain.
///
/// A test carrying its own source file uses it directly, with no parents
/// recorded. Otherwise the ancestry chain is walked outward: each non-empty
/// ancestor title is prepended (yielding root → immediate order), and the
/// walk stops as soon as an ancestor supplies a source file or the chain is
/// exhausted. Failing to find a file anywhere is non-fatal.
fn resolve_location(test: &CompletedTest) -> (Option<Utf8PathBuf>, Vec<String>) {
    if test.file.is_some() {
        return (test.file.clone(), Vec::new());
    }

    let mut parents = Vec::new();
    let mut file = None;
    for ancestor in &test.ancestors {
        file = ancestor.file.clone();

        let title = ancestor.title.trim();
        if !title.is_empty() {
            parents.insert(0, ancestor.title.clone());
        }
        if file.is_some() {
            break;
        }
    }
    (file, parents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::{RunnerFailure, SuiteInfo},
        overrides::{OverrideCandidate, OverrideOrigin},
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use test_case::test_case;
    use zephyr_report::TestStatus;

    #[test_case("Login works [smoke, p1]", "Login works"; "single annotation")]
    #[test_case("Plain title", "Plain title"; "no annotation")]
    #[test_case("Trailing space [a] ", "Trailing space [a]"; "annotation not at very end")]
    #[test_case("a [b] [c]", "a"; "strip starts at first bracket")]
    #[test_case("[only]", ""; "annotation only")]
    #[test_case("", ""; "empty title")]
    #[test_case("keep [inner] text", "keep [inner] text"; "inner brackets kept")]
    fn tag_suffix_stripping(raw: &str, expected: &str) {
        assert_eq!(strip_tag_suffix(raw), expected);
    }

    fn timestamp(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid timestamp")
    }

    fn collector() -> EventCollector {
        EventCollector::new(
            "out".into(),
            Some("cypress/e2e/login.cy.ts".into()),
            timestamp("2024-01-01T00:00:00Z"),
        )
    }

    fn finished(test: CompletedTest) -> RunEvent {
        RunEvent::TestFinished {
            test: Box::new(test),
        }
    }

    #[test]
    fn own_file_wins_and_leaves_parents_empty() {
        let test = CompletedTest {
            title: "t".to_owned(),
            file: Some("cypress/e2e/login.cy.ts".into()),
            ancestors: vec![SuiteInfo {
                title: "Suite".to_owned(),
                file: Some("cypress/e2e/other.cy.ts".into()),
            }],
            ..Default::default()
        };
        let (file, parents) = resolve_location(&test);
        assert_eq!(file.as_deref(), Some("cypress/e2e/login.cy.ts".into()));
        assert_eq!(parents, Vec::<String>::new());
    }

    #[test]
    fn ancestry_walk_stops_at_first_file() {
        // Chain (immediate first): inner -> middle (has file) -> outer.
        let test = CompletedTest {
            title: "t".to_owned(),
            ancestors: vec![
                SuiteInfo {
                    title: "inner".to_owned(),
                    file: None,
                },
                SuiteInfo {
                    title: "middle".to_owned(),
                    file: Some("cypress/e2e/suite.cy.ts".into()),
                },
                SuiteInfo {
                    title: "outer".to_owned(),
                    file: None,
                },
            ],
            ..Default::default()
        };
        let (file, parents) = resolve_location(&test);
        assert_eq!(file.as_deref(), Some("cypress/e2e/suite.cy.ts".into()));
        // Root-to-immediate order, without the unvisited outer suite.
        assert_eq!(parents, ["middle", "inner"]);
    }

    #[test]
    fn unnamed_root_suites_are_skipped_in_parents() {
        let test = CompletedTest {
            title: "t".to_owned(),
            ancestors: vec![
                SuiteInfo {
                    title: "Suite".to_owned(),
                    file: None,
                },
                SuiteInfo {
                    title: "".to_owned(),
                    file: None,
                },
            ],
            ..Default::default()
        };
        let (file, parents) = resolve_location(&test);
        assert_eq!(file, None);
        assert_eq!(parents, ["Suite"]);
    }

    #[test]
    fn full_lifecycle_builds_a_finalized_report() {
        let mut collector = collector();
        collector
            .handle_event(RunEvent::RunStarted {
                timestamp: timestamp("2024-01-01T00:00:01Z"),
            })
            .expect("no write happens yet");

        collector
            .handle_event(finished(CompletedTest {
                title: "Login works [smoke, p1]".to_owned(),
                full_title: Some("Auth Login works [smoke, p1]".to_owned()),
                duration_ms: Some(120),
                overrides: vec![OverrideCandidate::new(
                    OverrideOrigin::TestConfig,
                    match json!({ "tags": ["smoke", "p1"], "retries": 2 }) {
                        Value::Object(map) => map,
                        _ => unreachable!(),
                    },
                )],
                ancestors: vec![SuiteInfo {
                    title: "Auth".to_owned(),
                    file: Some("cypress/e2e/login.cy.ts".into()),
                }],
                ..Default::default()
            }))
            .expect("test events never write");

        collector
            .handle_event(finished(CompletedTest {
                title: "Logout works".to_owned(),
                outcome: TestOutcome::Failed(RunnerFailure {
                    message: None,
                    rendered: "CypressError: timed out".to_owned(),
                    stack: Some("at logout.cy.ts:12".to_owned()),
                }),
                ..Default::default()
            }))
            .expect("test events never write");

        let report = collector.report();
        assert_eq!(report.stats.tests, 2);
        assert_eq!(report.stats.passes, 1);
        assert_eq!(report.stats.failures, 1);
        assert!(report.stats.is_consistent());
        assert_eq!(
            report.meta.started_at,
            Some(timestamp("2024-01-01T00:00:01Z"))
        );
        assert_eq!(report.meta.ended_at, None);

        let first = &report.tests[0];
        assert_eq!(first.title, "Login works");
        assert_eq!(first.full_title, "Auth Login works [smoke, p1]");
        assert_eq!(first.tags, ["smoke", "p1"]);
        assert_eq!(first.parents, ["Auth"]);
        assert_eq!(first.file.as_deref(), Some("cypress/e2e/login.cy.ts".into()));
        assert_eq!(first.status, TestStatus::Passed);
        assert_eq!(first.config_overrides.get("retries"), Some(&json!(2)));
        assert!(first.error.is_none());

        let second = &report.tests[1];
        // No runner-supplied full title: falls back to the stripped title.
        assert_eq!(second.full_title, "Logout works");
        assert_eq!(second.status, TestStatus::Failed);
        let error = second.error.as_ref().expect("failed test carries error");
        assert_eq!(error.message, "CypressError: timed out");
        assert_eq!(error.stack.as_deref(), Some("at logout.cy.ts:12"));
    }

    #[test]
    fn run_finished_writes_the_report_once() {
        let temp = camino_tempfile::tempdir().expect("tempdir created");
        let mut collector = EventCollector::new(
            temp.path(),
            Some("cypress/e2e/login.cy.ts".into()),
            timestamp("2024-01-01T00:00:00Z"),
        );

        collector
            .handle_event(finished(CompletedTest {
                title: "t".to_owned(),
                ..Default::default()
            }))
            .expect("test events never write");
        collector
            .handle_event(RunEvent::RunFinished {
                timestamp: timestamp("2024-01-01T00:05:00Z"),
                duration_ms: Some(300_000),
            })
            .expect("write succeeds");

        let text =
            std::fs::read_to_string(collector.output_path()).expect("report file exists");
        let report = Report::from_json_str(&text).expect("written report is valid");
        assert_eq!(report.stats.tests, 1);
        assert_eq!(report.stats.duration_ms, Some(300_000));
        assert_eq!(report.meta.ended_at, Some(timestamp("2024-01-01T00:05:00Z")));
    }
}
