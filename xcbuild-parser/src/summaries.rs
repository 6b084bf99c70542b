// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result-bundle tree walker.
//!
//! The test-summaries document (the result bundle's property list, exported
//! as JSON) carries the same information as the console output without
//! line-based ambiguity: per-target summaries, each holding a recursively
//! nested tree of test nodes. Internal nodes (those with `Subtests`) become
//! suites; leaves become cases. There is no shared mutable open-context, so
//! the walker is reentrant: parsing the same document twice produces
//! identical reports.

use crate::{
    errors::{ReportWriteError, SummariesError},
    outcome::Outcome,
    reports::SuiteSink,
};
use camino::Utf8Path;
use regex::Regex;
use serde::Deserialize;
use std::{fs, sync::LazyLock, time::Duration};
use xcbuild_report::{TestCase, TestCaseStatus, TestFailure, TestSuite};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestSummaries {
    testable_summaries: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestableSummary {
    test_name: String,
    #[serde(default)]
    tests: Vec<TestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestNode {
    #[serde(default)]
    duration: f64,
    test_name: String,
    #[serde(default)]
    subtests: Option<Vec<TestNode>>,
    #[serde(default)]
    test_status: Option<String>,
    #[serde(default)]
    failure_summaries: Vec<FailureSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FailureSummary {
    message: String,
    #[serde(default)]
    file_name: String,
    #[serde(default)]
    line_number: u64,
    #[serde(default)]
    performance_failure: bool,
}

/// Structured failure messages embed the stack trace as a parenthesized
/// trailing segment.
static FAILED_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(failed: .*?)\n\((.*?)\n\)$").expect("regex is valid"));

/// Recursive-descent parser for test-summaries documents.
pub struct SummariesParser<S> {
    hostname: String,
    sink: S,
    outcome: Outcome,
}

impl<S: SuiteSink> SummariesParser<S> {
    /// Creates a parser reporting `hostname` in emitted suites and flushing
    /// each suite to `sink` once its full subtree is processed.
    pub fn new(hostname: impl Into<String>, sink: S) -> Self {
        Self {
            hostname: hostname.into(),
            sink,
            outcome: Outcome::default(),
        }
    }

    /// The overall outcome observed so far: failed once any case closes
    /// unsuccessfully.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Parses the test-summaries document at `path` and emits one report per
    /// suite.
    ///
    /// A malformed target summary inside a well-formed document is logged
    /// and skipped; sibling targets still produce reports.
    pub fn parse_file(&mut self, path: &Utf8Path) -> Result<(), SummariesError> {
        let contents = fs::read_to_string(path).map_err(|error| SummariesError::Read {
            path: path.to_owned(),
            error,
        })?;
        let summaries: TestSummaries =
            serde_json::from_str(&contents).map_err(|error| SummariesError::Deserialize {
                path: path.to_owned(),
                error,
            })?;

        for value in summaries.testable_summaries {
            match serde_json::from_value::<TestableSummary>(value) {
                Ok(target) => self.parse_target(target)?,
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed testable summary");
                }
            }
        }
        Ok(())
    }

    /// Consumes the parser, returning the sink.
    pub fn finish(self) -> S {
        self.sink
    }

    fn parse_target(&mut self, target: TestableSummary) -> Result<(), ReportWriteError> {
        let mut suite = TestSuite::new(&self.hostname, target.test_name);
        self.parse_subtests(target.tests, &mut suite)?;
        self.sink.write_suite(&suite)
    }

    fn parse_subtests(
        &mut self,
        nodes: Vec<TestNode>,
        parent: &mut TestSuite,
    ) -> Result<(), ReportWriteError> {
        for node in nodes {
            match node.subtests {
                Some(subtests) => {
                    let mut suite = TestSuite::new(&self.hostname, node.test_name);
                    suite.set_duration(duration_from_secs(node.duration));
                    self.parse_subtests(subtests, &mut suite)?;
                    self.sink.write_suite(&suite)?;
                }
                None => self.parse_leaf(node, parent),
            }
        }
        Ok(())
    }

    fn parse_leaf(&mut self, node: TestNode, parent: &mut TestSuite) {
        let mut case = TestCase::new(parent.name.clone(), node.test_name);
        case.set_time(duration_from_secs(node.duration));

        match node.test_status.as_deref() {
            Some("Success") => {
                parent.add_test_case(case);
            }
            Some("Failure") => {
                self.outcome.set_failed();
                case.set_status(TestCaseStatus::Failed);
                for summary in node.failure_summaries {
                    // Performance failures flag a benchmark regression, not
                    // a correctness failure.
                    if summary.performance_failure {
                        continue;
                    }
                    case.add_failure(failure_from_summary(summary));
                }
                parent.add_test_case(case);
            }
            other => {
                tracing::debug!(
                    status = ?other,
                    case = %case.name,
                    "ignoring subtest with unrecognized status"
                );
            }
        }
    }
}

fn failure_from_summary(summary: FailureSummary) -> TestFailure {
    if let Some(captures) = FAILED_MESSAGE.captures(&summary.message) {
        TestFailure::new(&captures[1], &captures[2])
    } else {
        TestFailure::new(
            format!(
                "{}\n at File: {}\n Line number: {}",
                summary.message, summary.file_name, summary.line_number
            ),
            "No stacktrace here.",
        )
    }
}

fn duration_from_secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or_default()
}
