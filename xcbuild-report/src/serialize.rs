// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `TestSuite`.

use crate::{TestCase, TestError, TestFailure, TestSuite};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use std::{io, time::Duration};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";

pub(crate) fn serialize_suite(suite: &TestSuite, writer: impl io::Write) -> quick_xml::Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_suite_impl(suite, &mut writer)?;

    // Add a trailing newline.
    writer.write_indent()?;
    Ok(())
}

fn serialize_suite_impl(
    suite: &TestSuite,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestSuite {
        hostname,
        name,
        timestamp,
        end_timestamp: _,
        duration: _,
        tests,
        failures,
        errors,
        test_cases,
    } = suite;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.extend_attributes([
        ("name", name.as_str()),
        ("hostname", hostname.as_str()),
        ("tests", tests.to_string().as_str()),
        ("failures", failures.to_string().as_str()),
        ("errors", errors.to_string().as_str()),
    ]);
    if let Some(timestamp) = timestamp {
        testsuite_tag.push_attribute(("timestamp", format!("{}", timestamp.format("%+")).as_str()));
    }
    if let Some(time) = suite.time() {
        testsuite_tag.push_attribute(("time", serialize_time(&time).as_str()));
    }
    writer.write_event(Event::Start(testsuite_tag))?;

    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }

    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let TestCase {
        classname,
        name,
        time,
        status: _,
        failures,
        errors,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.extend_attributes([("classname", classname.as_str()), ("name", name.as_str())]);
    if let Some(time) = time {
        testcase_tag.push_attribute(("time", serialize_time(time).as_str()));
    }

    if failures.is_empty() && errors.is_empty() {
        writer.write_event(Event::Empty(testcase_tag))?;
        return Ok(());
    }
    writer.write_event(Event::Start(testcase_tag))?;

    for failure in failures {
        serialize_failure(failure, writer)?;
    }
    for error in errors {
        serialize_error(error, writer)?;
    }

    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_failure(
    failure: &TestFailure,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut failure_tag = BytesStart::new(FAILURE_TAG);
    failure_tag.push_attribute(("message", failure.message.as_str()));

    writer.write_event(Event::Start(failure_tag))?;
    writer.write_event(Event::Text(BytesText::new(&failure.location)))?;
    serialize_end_tag(FAILURE_TAG, writer)
}

fn serialize_error(
    error: &TestError,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut error_tag = BytesStart::new(ERROR_TAG);
    error_tag.push_attribute(("type", error.ty.as_str()));

    writer.write_event(Event::Start(error_tag))?;
    writer.write_event(Event::Text(BytesText::new(&error.message)))?;
    serialize_end_tag(ERROR_TAG, writer)
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let end_tag = BytesEnd::new(tag_name);
    writer.write_event(Event::End(end_tag))
}

// Serialize time as seconds with 3 decimal points.
fn serialize_time(time: &Duration) -> String {
    format!("{:.3}", time.as_secs_f64())
}
