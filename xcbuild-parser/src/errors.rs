// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while parsing xcodebuild output.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// A fatal error raised by the console stream parser.
///
/// All variants abort the run: the parser never guesses a recovery, and the
/// run's outcome is forced to the failure sentinel.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// An event arrived in a state that violates the state machine's
    /// preconditions (desynchronization).
    #[error(
        "log statements out of sync: {reason}\n  current suite: {current_suite:?}\n  current case: {current_case:?}\n  line: {line:?}"
    )]
    Desync {
        /// What precondition was violated.
        reason: String,
        /// Name of the suite that was open when the event arrived.
        current_suite: Option<String>,
        /// Name of the case that was open when the event arrived.
        current_case: Option<String>,
        /// The offending line.
        line: String,
    },

    /// Neither known timestamp format matched a suite boundary marker.
    ///
    /// This is desynchronization-class: the suite cannot be correctly timed.
    #[error("malformed timestamp {input:?} in line {line:?}")]
    MalformedTimestamp {
        /// The text that failed to parse.
        input: String,
        /// The offending line.
        line: String,
    },

    /// A numeric field (elapsed seconds) failed to parse.
    #[error("malformed number {input:?} in line {line:?}")]
    MalformedNumber {
        /// The text that failed to parse.
        input: String,
        /// The offending line.
        line: String,
    },

    /// Failed to persist a completed suite's report.
    #[error("failed to write test report")]
    Report(#[from] ReportWriteError),
}

/// An error that occurred while persisting a suite report.
#[derive(Debug, Error)]
pub enum ReportWriteError {
    /// A filesystem operation failed.
    #[error("error writing to {path}")]
    Fs {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// XML serialization failed.
    #[error("error serializing report for suite '{suite}'")]
    Serialize {
        /// The suite being serialized.
        suite: String,
        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },
}

/// An error raised while parsing a structured test-summaries document.
///
/// Fatal for the document as a whole; malformed *individual* target
/// summaries inside a well-formed document are logged and skipped instead
/// (see [`crate::summaries`]).
#[derive(Debug, Error)]
pub enum SummariesError {
    /// The document could not be read.
    #[error("failed to read test summaries at {path}")]
    Read {
        /// The document path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The document is not a valid test-summaries structure.
    #[error("failed to deserialize test summaries at {path}")]
    Deserialize {
        /// The document path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// Failed to persist a completed suite's report.
    #[error("failed to write test report")]
    Report(#[from] ReportWriteError),
}
