// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Parsers that turn `xcodebuild` output into JUnit-style test reports.
//!
//! Two independent producers converge on the same report model
//! ([`xcbuild_report::TestSuite`]):
//!
//! - [`console::ConsoleParser`] consumes the tool's console output line by
//!   line, driving a state machine over recognized [`events::LineEvent`]s.
//! - [`summaries::SummariesParser`] walks a structured test-summaries
//!   document (the result bundle exported as JSON), which carries the same
//!   information without line-based ambiguity.
//!
//! Both flush completed suites through the [`reports::SuiteSink`] seam and
//! feed the run's overall [`outcome::Outcome`].

pub mod console;
pub mod errors;
pub mod events;
pub mod outcome;
pub mod reports;
pub mod summaries;
