// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::serialize::serialize_suite;
use chrono::{DateTime, FixedOffset};
use std::{io, time::Duration};

/// A named group of test cases with start/end timing and counters.
///
/// The `tests`/`failures`/`errors` counters are kept consistent with the
/// statuses of the contained cases by [`TestSuite::add_test_case`], which is
/// the only supported mutation path for the case list.
#[derive(Clone, Debug)]
pub struct TestSuite {
    /// The host the suite ran on.
    pub hostname: String,

    /// The name of this suite. Unique per run; reports for suites of the same
    /// name overwrite each other.
    pub name: String,

    /// The time at which the suite began execution.
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// The time at which the suite finished execution.
    pub end_timestamp: Option<DateTime<FixedOffset>>,

    /// The overall time taken by the suite, if known independently of the
    /// start/end timestamps.
    pub duration: Option<Duration>,

    /// The total number of cases in this suite.
    pub tests: usize,

    /// The number of cases that failed an assertion.
    pub failures: usize,

    /// The number of cases that terminated abnormally.
    pub errors: usize,

    /// The cases that form this suite, in completion order.
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Creates a new `TestSuite` with zeroed counters and no timing.
    pub fn new(hostname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            name: name.into(),
            timestamp: None,
            end_timestamp: None,
            duration: None,
            tests: 0,
            failures: 0,
            errors: 0,
            test_cases: vec![],
        }
    }

    /// Sets the start timestamp for the suite.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the end timestamp for the suite.
    pub fn set_end_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.end_timestamp = Some(timestamp.into());
        self
    }

    /// Sets the overall time taken by the suite.
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = Some(duration);
        self
    }

    /// Adds a closed case to this suite and updates the counters.
    pub fn add_test_case(&mut self, test_case: TestCase) -> &mut Self {
        self.tests += 1;
        match test_case.status {
            TestCaseStatus::Passed => {}
            TestCaseStatus::Failed => self.failures += 1,
            TestCaseStatus::Errored => self.errors += 1,
        }
        self.test_cases.push(test_case);
        self
    }

    /// The time reported in the `time` attribute: the explicit duration if
    /// one was recorded, otherwise the span between the start and end
    /// timestamps.
    pub fn time(&self) -> Option<Duration> {
        self.duration.or_else(|| {
            let (start, end) = (self.timestamp?, self.end_timestamp?);
            (end - start).to_std().ok()
        })
    }

    /// Serialize this suite as a JUnit XML document to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> quick_xml::Result<()> {
        serialize_suite(self, writer)
    }

    /// Serialize this suite to a string.
    pub fn to_string(&self) -> quick_xml::Result<String> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|utf8_err| quick_xml::Error::NonDecodable(Some(utf8_err.utf8_error())))
    }
}

/// A single test execution unit within a suite.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// The "classname" of the case: the name of the owning suite.
    pub classname: String,

    /// The name of the case. Unique within an open suite.
    pub name: String,

    /// The time it took to execute this case. Set when the case closes
    /// normally; absent while the case is open or when it was cut short by
    /// an abnormal termination.
    pub time: Option<Duration>,

    /// How the case closed. A case starts out tagged as passed; closing
    /// events retag it.
    pub status: TestCaseStatus,

    /// Assertion failures attached to this case, in arrival order.
    pub failures: Vec<TestFailure>,

    /// Abnormal-termination errors attached to this case, in arrival order.
    pub errors: Vec<TestError>,
}

impl TestCase {
    /// Creates a new open `TestCase`.
    pub fn new(classname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            name: name.into(),
            time: None,
            status: TestCaseStatus::Passed,
            failures: vec![],
            errors: vec![],
        }
    }

    /// Sets the elapsed time for the case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Tags how the case closed.
    ///
    /// The tag drives the suite counters, independently of whether any
    /// failure or error payloads are attached: a case closed by a bare
    /// "failed" marker still counts as a failure.
    pub fn set_status(&mut self, status: TestCaseStatus) -> &mut Self {
        self.status = status;
        self
    }

    /// Attaches an assertion failure to this case.
    pub fn add_failure(&mut self, failure: TestFailure) -> &mut Self {
        self.failures.push(failure);
        self
    }

    /// Attaches an abnormal-termination error to this case.
    pub fn add_error(&mut self, error: TestError) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Whether the case is tagged as failed.
    pub fn is_failed(&self) -> bool {
        self.status == TestCaseStatus::Failed
    }

    /// Whether the case is tagged as errored.
    pub fn is_errored(&self) -> bool {
        self.status == TestCaseStatus::Errored
    }
}

/// How a [`TestCase`] closed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TestCaseStatus {
    /// The case closed successfully.
    #[default]
    Passed,

    /// The case closed with an assertion failure: an *expected* kind of
    /// issue.
    Failed,

    /// The case terminated abnormally: an *unexpected* kind of issue.
    Errored,
}

/// An assertion failure: an *expected* kind of test issue, tied to a source
/// location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestFailure {
    /// The human-readable failure message.
    pub message: String,

    /// The source location (`file:line` or an equivalent locator string).
    pub location: String,
}

impl TestFailure {
    /// Creates a new `TestFailure`.
    pub fn new(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
        }
    }
}

/// An abnormal termination (e.g. an uncaught exception), as opposed to an
/// assertion failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestError {
    /// The error kind or exception type name.
    pub ty: String,

    /// The human-readable error message.
    pub message: String,
}

impl TestError {
    /// Creates a new `TestError`.
    pub fn new(ty: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            message: message.into(),
        }
    }
}
