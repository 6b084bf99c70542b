// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model and serializer for JUnit-style test reports produced from
//! xcodebuild runs.
//!
//! One [`TestSuite`] serializes to one `<testsuite>` XML document that
//! mainstream JUnit consumers (Jenkins, GitLab, Buildkite, ...) can import.

mod report;
mod serialize;

pub use report::*;

// Re-export `quick_xml::Result` so it can be used by downstream consumers.
pub use quick_xml::Result;
