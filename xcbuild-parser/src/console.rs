// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console stream state machine.
//!
//! [`ConsoleParser`] consumes xcodebuild console output one line at a time,
//! strictly in arrival order, and flushes each completed suite through a
//! [`SuiteSink`]. The machine has three states, encoded by the open
//! suite/case context: `Idle` (no open suite), `InSuite` (suite open, no
//! open case) and `InCase` (suite and case open).
//!
//! Events arriving in a state that violates their preconditions raise a
//! fatal [`ConsoleError`]: the parser stops, resets its context, forces the
//! outcome to the failure sentinel, and never guesses a recovery.

use crate::{
    errors::ConsoleError,
    events::{self, LineEvent},
    outcome::Outcome,
    reports::SuiteSink,
};
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use xcbuild_report::{TestCase, TestCaseStatus, TestError, TestFailure, TestSuite};

/// The mutable open suite/case context, exclusively owned by one
/// [`ConsoleParser`].
#[derive(Debug, Default)]
struct ParserContext {
    suite: Option<TestSuite>,
    case: Option<TestCase>,
}

/// Incremental parser for xcodebuild console output.
pub struct ConsoleParser<S> {
    hostname: String,
    sink: S,
    context: ParserContext,
    outcome: Outcome,
}

impl<S: SuiteSink> ConsoleParser<S> {
    /// Creates a parser reporting `hostname` in emitted suites and flushing
    /// completed suites to `sink`.
    pub fn new(hostname: impl Into<String>, sink: S) -> Self {
        Self {
            hostname: hostname.into(),
            sink,
            context: ParserContext::default(),
            outcome: Outcome::default(),
        }
    }

    /// Consumes one line of console output (without its trailing newline).
    ///
    /// Lines are processed synchronously and in lockstep with the caller;
    /// nothing is buffered or reordered. Any error is fatal: the context is
    /// reset and the outcome forced to the failure sentinel.
    pub fn consume_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        match self.handle_line(line) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.outcome.set_failed();
                self.context = ParserContext::default();
                Err(error)
            }
        }
    }

    /// The overall outcome observed so far.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The name of the currently open suite, if any.
    pub fn current_suite_name(&self) -> Option<&str> {
        self.context.suite.as_ref().map(|suite| suite.name.as_str())
    }

    /// The name of the currently open case, if any.
    pub fn current_case_name(&self) -> Option<&str> {
        self.context.case.as_ref().map(|case| case.name.as_str())
    }

    /// Consumes the parser, returning the final outcome and the sink.
    ///
    /// Any suite still open at this point was never flushed and is lost,
    /// which mirrors the behavior on interruption.
    pub fn finish(self) -> (Outcome, S) {
        (self.outcome, self.sink)
    }

    fn handle_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        let Some(event) = events::recognize(line) else {
            return Ok(());
        };

        match event {
            LineEvent::SuiteStarted { name, timestamp } => {
                let timestamp = self.parse_timestamp(&timestamp, line)?;
                if let Some(open_suite) = &self.context.suite {
                    // Starting a suite while one is open abandons the
                    // previous context without flushing it.
                    tracing::warn!(
                        abandoned = %open_suite.name,
                        started = %name,
                        "suite started while another suite was open"
                    );
                }
                let mut suite = TestSuite::new(&self.hostname, name);
                suite.set_timestamp(timestamp);
                self.context.suite = Some(suite);
                self.context.case = None;
            }

            LineEvent::SuiteEnded { name, timestamp } => {
                if self.context.suite.is_none() {
                    // Upstream tools occasionally emit termination markers
                    // with no matching start.
                    tracing::debug!(suite = %name, "dropping suite end with no open suite");
                    return Ok(());
                }
                let timestamp = self.parse_timestamp(&timestamp, line)?;
                if let Some(mut suite) = self.context.suite.take() {
                    suite.set_end_timestamp(timestamp);
                    self.context.case = None;
                    self.sink.write_suite(&suite)?;
                }
            }

            LineEvent::CaseStarted { suite: _, case } => {
                if self.context.case.is_some() {
                    return Err(self.desync("test case started while another case is open", line));
                }
                let Some(open_suite) = &self.context.suite else {
                    return Err(self.desync("test case started with no open suite", line));
                };
                self.context.case = Some(TestCase::new(open_suite.name.clone(), case));
            }

            LineEvent::CaseEndedPassed {
                suite: _,
                case,
                elapsed,
            } => {
                self.close_case(&case, &elapsed, TestCaseStatus::Passed, line)?;
            }

            LineEvent::CaseEndedFailed {
                suite: _,
                case,
                elapsed,
            } => {
                self.close_case(&case, &elapsed, TestCaseStatus::Failed, line)?;
            }

            LineEvent::CaseFailedWithLocation {
                location,
                suite,
                case,
                message,
            } => {
                match (&self.context.suite, &self.context.case) {
                    (Some(open_suite), Some(open_case)) => {
                        if !open_suite.name.ends_with(&suite) {
                            return Err(self.desync(
                                format!("failure for suite '{suite}' does not match open suite"),
                                line,
                            ));
                        }
                        if open_case.name != case {
                            return Err(self.desync(
                                format!("failure for case '{case}' does not match open case"),
                                line,
                            ));
                        }
                    }
                    _ => {
                        return Err(self.desync("assertion failure with no open case", line));
                    }
                }
                if let Some(open_case) = self.context.case.as_mut() {
                    open_case.add_failure(TestFailure::new(message, location));
                }
            }

            LineEvent::UIAssertionFailure { location, message } => {
                // UI failures are emitted asynchronously and may arrive
                // without a synchronized open case; drop them then.
                match self.context.case.as_mut() {
                    Some(open_case) => {
                        open_case.add_failure(TestFailure::new(message, location));
                    }
                    None => {
                        tracing::debug!(%location, "dropping UI assertion failure with no open case");
                    }
                }
            }

            LineEvent::ExitCodeReported { code } => {
                self.outcome.set_exit_code(code);
            }

            LineEvent::GlobalFailureMarker => {
                self.outcome.set_failed();
            }

            LineEvent::UncaughtException { ty, reason } => {
                self.outcome.set_failed();
                if self.context.suite.is_none() {
                    return Err(self.desync("uncaught exception with no open suite", line));
                }
                if let Some(mut suite) = self.context.suite.take() {
                    if let Some(mut open_case) = self.context.case.take() {
                        open_case.set_status(TestCaseStatus::Errored);
                        open_case.add_error(TestError::new(ty, reason));
                        suite.add_test_case(open_case);
                    }
                    self.sink.write_suite(&suite)?;
                }
            }
        }

        Ok(())
    }

    /// Closes the open case with the given status, appending it to the open
    /// suite. The event's case name must equal the open case's name; on a
    /// mismatch nothing is mutated.
    fn close_case(
        &mut self,
        case: &str,
        elapsed: &str,
        status: TestCaseStatus,
        line: &str,
    ) -> Result<(), ConsoleError> {
        match &self.context.case {
            Some(open_case) if open_case.name == case => {}
            Some(_) => {
                return Err(self.desync(
                    format!("case '{case}' closed but a different case is open"),
                    line,
                ));
            }
            None => {
                return Err(self.desync("test case closed with no open case", line));
            }
        }
        let elapsed = self.parse_elapsed(elapsed, line)?;
        let Some(open_suite) = self.context.suite.as_mut() else {
            return Err(ConsoleError::Desync {
                reason: "test case closed with no open suite".to_owned(),
                current_suite: None,
                current_case: self.context.case.as_ref().map(|c| c.name.clone()),
                line: line.to_owned(),
            });
        };
        if let Some(mut closed) = self.context.case.take() {
            closed.set_time(elapsed);
            closed.set_status(status);
            open_suite.add_test_case(closed);
        }
        Ok(())
    }

    fn parse_timestamp(
        &self,
        text: &str,
        line: &str,
    ) -> Result<DateTime<FixedOffset>, ConsoleError> {
        events::parse_timestamp(text).ok_or_else(|| ConsoleError::MalformedTimestamp {
            input: text.to_owned(),
            line: line.to_owned(),
        })
    }

    fn parse_elapsed(&self, text: &str, line: &str) -> Result<Duration, ConsoleError> {
        text.parse::<f64>()
            .ok()
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .ok_or_else(|| ConsoleError::MalformedNumber {
                input: text.to_owned(),
                line: line.to_owned(),
            })
    }

    fn desync(&self, reason: impl Into<String>, line: &str) -> ConsoleError {
        ConsoleError::Desync {
            reason: reason.into(),
            current_suite: self.current_suite_name().map(str::to_owned),
            current_case: self.current_case_name().map(str::to_owned),
            line: line.to_owned(),
        }
    }
}
