// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of completed suites.

use crate::errors::ReportWriteError;
use camino::Utf8PathBuf;
use std::{fs, io::BufWriter};
use xcbuild_report::TestSuite;

/// The seam between the two report producers and persistence.
///
/// A suite is flushed exactly once, after it closes; after the flush it is
/// never mutated again.
pub trait SuiteSink {
    /// Persists one completed suite.
    fn write_suite(&mut self, suite: &TestSuite) -> Result<(), ReportWriteError>;
}

/// Writes each completed suite to `TEST-<suite-name>.xml` under an output
/// directory.
///
/// Suites sharing a name overwrite each other's report; the last write
/// wins.
#[derive(Clone, Debug)]
pub struct ReportDir {
    dir: Utf8PathBuf,
}

impl ReportDir {
    /// Creates the output directory (and any missing parents) and returns
    /// a sink writing into it.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self, ReportWriteError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|error| ReportWriteError::Fs {
            path: dir.clone(),
            error,
        })?;
        Ok(Self { dir })
    }

    /// The path a suite's report is written to.
    pub fn report_path(&self, suite_name: &str) -> Utf8PathBuf {
        self.dir.join(format!("TEST-{suite_name}.xml"))
    }
}

impl SuiteSink for ReportDir {
    fn write_suite(&mut self, suite: &TestSuite) -> Result<(), ReportWriteError> {
        let path = self.report_path(&suite.name);
        let file = fs::File::create(&path).map_err(|error| ReportWriteError::Fs {
            path: path.clone(),
            error,
        })?;
        suite
            .serialize(BufWriter::new(file))
            .map_err(|error| ReportWriteError::Serialize {
                suite: suite.name.clone(),
                error,
            })
    }
}

/// Collects flushed suites in memory, preserving flush order.
///
/// Useful in tests and for callers that post-process suites before
/// persisting them.
#[derive(Clone, Debug, Default)]
pub struct CollectedSuites {
    /// The flushed suites.
    pub suites: Vec<TestSuite>,
}

impl SuiteSink for CollectedSuites {
    fn write_suite(&mut self, suite: &TestSuite) -> Result<(), ReportWriteError> {
        self.suites.push(suite.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn writes_report_file_with_deterministic_name() {
        let dir = tempdir().expect("temp dir");
        let mut sink = ReportDir::new(dir.path().join("test-reports")).expect("creates dir");

        let suite = TestSuite::new("testhost", "Foo");
        sink.write_suite(&suite).expect("writes report");

        let path = dir.path().join("test-reports").join("TEST-Foo.xml");
        let contents = fs::read_to_string(path).expect("report exists");
        assert!(contents.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(contents.contains("<testsuite name=\"Foo\""));
    }

    #[test]
    fn same_suite_name_overwrites_previous_report() {
        let dir = tempdir().expect("temp dir");
        let mut sink = ReportDir::new(dir.path().to_owned()).expect("creates dir");

        let first = TestSuite::new("testhost", "Foo");
        sink.write_suite(&first).expect("writes report");

        let mut second = TestSuite::new("otherhost", "Foo");
        second.add_test_case(xcbuild_report::TestCase::new("Foo", "bar"));
        sink.write_suite(&second).expect("writes report");

        let contents =
            fs::read_to_string(sink.report_path("Foo")).expect("report exists");
        assert!(contents.contains("hostname=\"otherhost\""));
        assert!(contents.contains("tests=\"1\""));
    }
}
