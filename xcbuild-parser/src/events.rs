// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line event recognition for xcodebuild console output.
//!
//! [`recognize`] classifies one line into at most one [`LineEvent`] by trying
//! an ordered list of patterns and taking the first match. The ordering is
//! part of the contract, not an implementation detail: several patterns
//! overlap (a suite-end marker also looks like `Test Suite '...' \S+ at ...`),
//! and reordering them changes observable behavior.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// A typed event recognized from one line of console output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineEvent {
    /// A test suite started. The name never contains a path separator;
    /// marker lines referencing bundle paths produce no event.
    SuiteStarted {
        /// The suite name.
        name: String,
        /// The raw start timestamp text.
        timestamp: String,
    },

    /// A test suite finished (or otherwise terminated).
    SuiteEnded {
        /// The suite name.
        name: String,
        /// The raw end timestamp text.
        timestamp: String,
    },

    /// A test case inside the current suite began.
    CaseStarted {
        /// The suite name embedded in the marker.
        suite: String,
        /// The case name.
        case: String,
    },

    /// A test case ended successfully.
    CaseEndedPassed {
        /// The suite name embedded in the marker.
        suite: String,
        /// The case name.
        case: String,
        /// The raw elapsed-seconds text.
        elapsed: String,
    },

    /// An assertion failure tied to a specific suite/case via the message
    /// body itself, used for cross-checking against the open context.
    CaseFailedWithLocation {
        /// The source location (`file:line`).
        location: String,
        /// The suite name embedded in the message.
        suite: String,
        /// The case name embedded in the message.
        case: String,
        /// The failure message.
        message: String,
    },

    /// A UI-test assertion failure. Carries no suite/case names; attaches to
    /// whatever case is currently open.
    UIAssertionFailure {
        /// The source location (`file:line`).
        location: String,
        /// The failure message.
        message: String,
    },

    /// A test case ended with at least one failure.
    CaseEndedFailed {
        /// The suite name embedded in the marker.
        suite: String,
        /// The case name.
        case: String,
        /// The raw elapsed-seconds text.
        elapsed: String,
    },

    /// An explicit numeric process exit code embedded in the log.
    ExitCodeReported {
        /// The reported code.
        code: i32,
    },

    /// A bare line indicating the overall build or test run failed.
    GlobalFailureMarker,

    /// The process under test terminated abnormally.
    UncaughtException {
        /// The exception type name.
        ty: String,
        /// The exception reason.
        reason: String,
    },
}

static START_SUITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Test Suite '([^'/]+)'\s+started at\s+(.*)$").expect("regex is valid")
});
static END_SUITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Test Suite '([^'/]+)'\s+\S+\s+at\s+(.*).$").expect("regex is valid")
});
static START_TESTCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Test Case '-\[(\S+)\s+(\S+)\]' started\.$").expect("regex is valid")
});
static END_TESTCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Test Case '-\[(\S+)\s+(\S+)\]' passed \((.*) seconds\)\.$")
        .expect("regex is valid")
});
static ERROR_TESTCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*): error: -\[(\S+)\s+(\S+)\] : (.*)$").expect("regex is valid")
});
static ERROR_UI_TESTCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*?Assertion Failure: (.+:\d+): (.*)$").expect("regex is valid")
});
static FAILED_TESTCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Test Case '-\[(\S+)\s+(\S+)\]' failed \((\S+) seconds\)\.$")
        .expect("regex is valid")
});
static FAILED_WITH_EXIT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^failed with exit code (\d+)$").expect("regex is valid"));
static TERMINATING_EXCEPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*\*\*\* Terminating app due to uncaught exception '(\S+)', reason: '(.+[^\\])'.*$")
        .expect("regex is valid")
});

/// Classifies one line (without its trailing newline) into at most one event.
///
/// The patterns are tried in a fixed order and the first match wins:
/// suite start, suite end, case start, case passed, located case failure,
/// UI assertion failure, case failed, exit code, global failure marker,
/// uncaught exception. A line matching none of them is inert.
pub fn recognize(line: &str) -> Option<LineEvent> {
    if let Some(captures) = START_SUITE.captures(line) {
        return Some(LineEvent::SuiteStarted {
            name: normalize_suite_name(&captures[1]),
            timestamp: captures[2].to_owned(),
        });
    }

    if let Some(captures) = END_SUITE.captures(line) {
        return Some(LineEvent::SuiteEnded {
            name: normalize_suite_name(&captures[1]),
            timestamp: captures[2].to_owned(),
        });
    }

    if let Some(captures) = START_TESTCASE.captures(line) {
        return Some(LineEvent::CaseStarted {
            suite: captures[1].to_owned(),
            case: captures[2].to_owned(),
        });
    }

    if let Some(captures) = END_TESTCASE.captures(line) {
        return Some(LineEvent::CaseEndedPassed {
            suite: captures[1].to_owned(),
            case: captures[2].to_owned(),
            elapsed: captures[3].to_owned(),
        });
    }

    if let Some(captures) = ERROR_TESTCASE.captures(line) {
        return Some(LineEvent::CaseFailedWithLocation {
            location: captures[1].to_owned(),
            suite: captures[2].to_owned(),
            case: captures[3].to_owned(),
            message: captures[4].to_owned(),
        });
    }

    if let Some(captures) = ERROR_UI_TESTCASE.captures(line) {
        return Some(LineEvent::UIAssertionFailure {
            location: captures[1].to_owned(),
            message: captures[2].to_owned(),
        });
    }

    if let Some(captures) = FAILED_TESTCASE.captures(line) {
        return Some(LineEvent::CaseEndedFailed {
            suite: captures[1].to_owned(),
            case: captures[2].to_owned(),
            elapsed: captures[3].to_owned(),
        });
    }

    if let Some(captures) = FAILED_WITH_EXIT_CODE.captures(line) {
        if let Ok(code) = captures[1].parse() {
            return Some(LineEvent::ExitCodeReported { code });
        }
    }

    if line == "BUILD FAILED" || line == "** TEST FAILED **" {
        return Some(LineEvent::GlobalFailureMarker);
    }

    if let Some(captures) = TERMINATING_EXCEPTION.captures(line) {
        return Some(LineEvent::UncaughtException {
            ty: captures[1].to_owned(),
            reason: captures[2].to_owned(),
        });
    }

    None
}

/// Suite bundles named `Foo-Bar.xctest` report with `-` in the name, which
/// is awkward in report file names; normalize dashes to underscores so start
/// and end markers (and the report file) agree.
fn normalize_suite_name(name: &str) -> String {
    if name.ends_with(".xctest") {
        name.replace('-', "_")
    } else {
        name.to_owned()
    }
}

static TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.3f"];

/// Parses a suite boundary timestamp, trying each known format in turn.
///
/// The first format covers the timezone-name calendar style
/// (`2010-10-02 13:39:23 GMT 0000`); the second covers the sub-second style
/// with a trailing numeric offset (`2017-03-22 16:31:24.123 +0900`). A
/// signed offset in the trailing text is honored; a bare zone name carries
/// no offset information and is read as UTC.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        let Ok((naive, rest)) = NaiveDateTime::parse_and_remainder(text, format) else {
            continue;
        };
        if rest.starts_with('.') {
            // Sub-second digits this format cannot represent; let the next
            // format consume them.
            continue;
        }
        let offset = rest
            .split_whitespace()
            .find_map(parse_numeric_offset)
            .unwrap_or_else(|| Utc.fix());
        return naive.and_local_timezone(offset).single();
    }
    None
}

/// Parses a `+HHMM` / `-HHMM` offset token.
fn parse_numeric_offset(token: &str) -> Option<FixedOffset> {
    let (sign, digits) = if let Some(rest) = token.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_suite_start() {
        let event = recognize("Test Suite 'Foo' started at 2010-10-02 13:39:23 GMT 0000");
        assert_eq!(
            event,
            Some(LineEvent::SuiteStarted {
                name: "Foo".into(),
                timestamp: "2010-10-02 13:39:23 GMT 0000".into(),
            })
        );
    }

    #[test]
    fn suite_start_with_path_is_inert() {
        let line = "Test Suite '/Users/bob/build/Tests.octest(Tests)' started at \
                    2010-10-02 13:39:23 GMT 0000";
        assert_eq!(recognize(line), None);
    }

    #[test]
    fn recognizes_suite_end_and_drops_trailing_period() {
        let event = recognize("Test Suite 'Foo' finished at 2010-10-02 13:41:23 GMT 0000.");
        assert_eq!(
            event,
            Some(LineEvent::SuiteEnded {
                name: "Foo".into(),
                timestamp: "2010-10-02 13:41:23 GMT 0000".into(),
            })
        );
    }

    #[test]
    fn xctest_suite_names_are_normalized() {
        let event = recognize("Test Suite 'Foo-Bar.xctest' started at 2010-10-02 13:39:23 GMT 0000");
        assert_eq!(
            event,
            Some(LineEvent::SuiteStarted {
                name: "Foo_Bar.xctest".into(),
                timestamp: "2010-10-02 13:39:23 GMT 0000".into(),
            })
        );
    }

    #[test]
    fn recognizes_case_markers() {
        assert_eq!(
            recognize("Test Case '-[Foo bar]' started."),
            Some(LineEvent::CaseStarted {
                suite: "Foo".into(),
                case: "bar".into(),
            })
        );
        assert_eq!(
            recognize("Test Case '-[Foo bar]' passed (1.234 seconds)."),
            Some(LineEvent::CaseEndedPassed {
                suite: "Foo".into(),
                case: "bar".into(),
                elapsed: "1.234".into(),
            })
        );
        assert_eq!(
            recognize("Test Case '-[Foo bar]' failed (1.234 seconds)."),
            Some(LineEvent::CaseEndedFailed {
                suite: "Foo".into(),
                case: "bar".into(),
                elapsed: "1.234".into(),
            })
        );
    }

    #[test]
    fn recognizes_located_failure() {
        let line = "/Users/bob/FooTests.m:21: error: -[Foo bar] : expected 1, got 2";
        assert_eq!(
            recognize(line),
            Some(LineEvent::CaseFailedWithLocation {
                location: "/Users/bob/FooTests.m:21".into(),
                suite: "Foo".into(),
                case: "bar".into(),
                message: "expected 1, got 2".into(),
            })
        );
    }

    #[test]
    fn recognizes_ui_assertion_failure() {
        let line = "    t =    42.00s Assertion Failure: UITests.swift:27: no match found";
        assert_eq!(
            recognize(line),
            Some(LineEvent::UIAssertionFailure {
                location: "UITests.swift:27".into(),
                message: "no match found".into(),
            })
        );
    }

    #[test]
    fn recognizes_run_level_markers() {
        assert_eq!(
            recognize("failed with exit code 65"),
            Some(LineEvent::ExitCodeReported { code: 65 })
        );
        assert_eq!(recognize("BUILD FAILED"), Some(LineEvent::GlobalFailureMarker));
        assert_eq!(
            recognize("** TEST FAILED **"),
            Some(LineEvent::GlobalFailureMarker)
        );
    }

    #[test]
    fn recognizes_uncaught_exception() {
        let line = "2016-08-31 12:00:00.000 otest[1:2] *** Terminating app due to uncaught \
                    exception 'NSRangeException', reason: 'index 3 beyond bounds'";
        assert_eq!(
            recognize(line),
            Some(LineEvent::UncaughtException {
                ty: "NSRangeException".into(),
                reason: "index 3 beyond bounds".into(),
            })
        );
    }

    #[test]
    fn unrelated_lines_are_inert() {
        assert_eq!(recognize(""), None);
        assert_eq!(recognize("CompileC build/Foo.o Foo.m normal"), None);
        assert_eq!(recognize("Executed 2 tests, with 0 failures"), None);
    }

    #[test]
    fn parses_zone_name_timestamp_as_utc() {
        let parsed = parse_timestamp("2010-10-02 13:39:23 GMT 0000").expect("parses");
        assert_eq!(parsed.to_rfc3339(), "2010-10-02T13:39:23+00:00");
    }

    #[test]
    fn parses_subsecond_timestamp_with_offset() {
        let parsed = parse_timestamp("2017-03-22 16:31:24.123 +0900").expect("parses");
        assert_eq!(parsed.to_rfc3339(), "2017-03-22T16:31:24.123+09:00");
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        assert_eq!(parse_timestamp("next Tuesday"), None);
    }
}
