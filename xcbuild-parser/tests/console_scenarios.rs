// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios feeding console logs through the parser and
//! checking the reports written to disk.

use camino_tempfile::Utf8TempDir;
use pretty_assertions::assert_eq;
use std::fs;
use xcbuild_parser::{
    console::ConsoleParser,
    errors::ConsoleError,
    outcome::{Outcome, FAILURE_SENTINEL},
    reports::ReportDir,
};

fn parser_in(dir: &Utf8TempDir) -> ConsoleParser<ReportDir> {
    let sink = ReportDir::new(dir.path().join("test-reports")).expect("creates output dir");
    ConsoleParser::new("testhost", sink)
}

fn report(dir: &Utf8TempDir, suite: &str) -> String {
    let path = dir.path().join("test-reports").join(format!("TEST-{suite}.xml"));
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("report {path} exists"))
}

#[test]
fn passing_suite_writes_success_report() {
    let dir = Utf8TempDir::new().expect("temp dir");
    let mut parser = parser_in(&dir);

    for line in [
        "Test Suite 'Foo' started at 2010-10-02 13:39:23 GMT 0000",
        "Test Case '-[Foo bar]' started.",
        "Test Case '-[Foo bar]' passed (1.234 seconds).",
        "Test Suite 'Foo' finished at 2010-10-02 13:41:23 GMT 0000.",
    ] {
        parser.consume_line(line).expect("line parses cleanly");
    }

    assert_eq!(parser.outcome().code(), 0);
    let xml = report(&dir, "Foo");
    assert!(xml.contains("tests=\"1\""), "unexpected report: {xml}");
    assert!(xml.contains("failures=\"0\""), "unexpected report: {xml}");
    assert!(
        xml.contains("<testcase classname=\"Foo\" name=\"bar\" time=\"1.234\"/>"),
        "unexpected report: {xml}"
    );
}

#[test]
fn failing_suite_writes_failure_report_and_outcome() {
    let dir = Utf8TempDir::new().expect("temp dir");
    let mut parser = parser_in(&dir);

    for line in [
        "Test Suite 'Foo' started at 2010-10-02 13:39:23 GMT 0000",
        "Test Case '-[Foo bar]' started.",
        "/Users/ci/FooTests.m:21: error: -[Foo bar] : expected 1, got 2",
        "Test Case '-[Foo bar]' failed (1.234 seconds).",
        "Test Suite 'Foo' finished at 2010-10-02 13:41:23 GMT 0000.",
        "** TEST FAILED **",
    ] {
        parser.consume_line(line).expect("line parses cleanly");
    }

    assert_eq!(parser.outcome().code(), FAILURE_SENTINEL);
    let xml = report(&dir, "Foo");
    assert!(xml.contains("failures=\"1\""), "unexpected report: {xml}");
    assert!(
        xml.contains("<failure message=\"expected 1, got 2\">/Users/ci/FooTests.m:21</failure>"),
        "unexpected report: {xml}"
    );
}

#[test]
fn suite_marker_with_bundle_path_leaves_parser_idle() {
    let dir = Utf8TempDir::new().expect("temp dir");
    let mut parser = parser_in(&dir);

    parser
        .consume_line(
            "Test Suite '/Users/ci/build/Debug-iphonesimulator/Foo.octest(Tests)' \
             started at 2010-10-02 13:39:23 GMT 0000",
        )
        .expect("pathological suite reference is inert");

    assert_eq!(parser.current_suite_name(), None);
    assert_eq!(parser.outcome(), Outcome::Undetermined);
}

#[test]
fn uncaught_exception_errors_the_case_and_flushes() {
    let dir = Utf8TempDir::new().expect("temp dir");
    let mut parser = parser_in(&dir);

    for line in [
        "Test Suite 'Foo' started at 2010-10-02 13:39:23 GMT 0000",
        "Test Case '-[Foo bar]' started.",
        "2010-10-02 13:40:00.123 otest[500:10b] *** Terminating app due to uncaught \
         exception 'NSRangeException', reason: 'index 5 beyond bounds'",
    ] {
        parser.consume_line(line).expect("line parses cleanly");
    }

    assert_eq!(parser.outcome().code(), FAILURE_SENTINEL);
    assert_eq!(parser.current_suite_name(), None);
    assert_eq!(parser.current_case_name(), None);
    let xml = report(&dir, "Foo");
    assert!(xml.contains("errors=\"1\""), "unexpected report: {xml}");
    assert!(
        xml.contains("<error type=\"NSRangeException\">index 5 beyond bounds</error>"),
        "unexpected report: {xml}"
    );
}

#[test]
fn desync_aborts_without_writing_a_report() {
    let dir = Utf8TempDir::new().expect("temp dir");
    let mut parser = parser_in(&dir);

    parser
        .consume_line("Test Suite 'Foo' started at 2010-10-02 13:39:23 GMT 0000")
        .expect("line parses cleanly");
    let error = parser
        .consume_line("Test Case '-[Foo bar]' passed (0.5 seconds).")
        .expect_err("close without open case must desync");
    assert!(matches!(error, ConsoleError::Desync { .. }));

    assert_eq!(parser.outcome().code(), FAILURE_SENTINEL);
    let reports = fs::read_dir(dir.path().join("test-reports").as_std_path())
        .expect("output dir exists")
        .count();
    assert_eq!(reports, 0);
}
