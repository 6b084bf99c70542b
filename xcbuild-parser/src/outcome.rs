// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Overall run outcome aggregation.

/// The fixed sentinel denoting overall failure, distinct from any specific
/// exit code reported by the tool.
pub const FAILURE_SENTINEL: i32 = -1;

/// The single exit/outcome signal for a parse run.
///
/// Strictly last-write-wins in line order: there is no precedence between
/// event kinds, so an explicit `exit code 0` arriving after a generic
/// failure marker downgrades the outcome back to success.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Outcome {
    /// No signal observed yet; treated as success at end of parsing.
    #[default]
    Undetermined,

    /// An explicit numeric exit code reported in the log.
    ExitCode(i32),

    /// The fixed failure sentinel: a global failure marker, an uncaught
    /// exception, or any fatal parse error.
    Failed,
}

impl Outcome {
    /// Records an explicit exit code, overwriting any previous signal.
    pub fn set_exit_code(&mut self, code: i32) {
        *self = Outcome::ExitCode(code);
    }

    /// Records the failure sentinel, overwriting any previous signal.
    pub fn set_failed(&mut self) {
        *self = Outcome::Failed;
    }

    /// The integer surfaced to the orchestration layer. `0` means success.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Undetermined => 0,
            Outcome::ExitCode(code) => code,
            Outcome::Failed => FAILURE_SENTINEL,
        }
    }

    /// Whether the run counts as successful.
    pub fn is_success(self) -> bool {
        self.code() == 0
    }
}
