//! Adjudicating a run against its metadata
//!
//! | negative | outcome                               | verdict            |
//! |----------|---------------------------------------|--------------------|
//! | absent   | success                               | pass               |
//! | absent   | failure                               | fail, raw value    |
//! | present  | success                               | fail               |
//! | present  | failure in the wrong phase            | fail, dump         |
//! | present  | right phase, different error type     | fail, dump         |
//! | present  | right phase, same error type          | pass               |
//!
//! The error type is only looked at once the phase matched. A failure whose
//! type cannot be read at that point is harness-fatal: the engine produced
//! something the harness does not know how to inspect.

use crate::engine::{Context, ExecutionOutcome, ThrownValue};
use crate::error::HarnessError;
use crate::execution::Execution;
use crate::metadata::TestMetadata;
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Adjudicated result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// The engine did not meet the expectation
    Fail {
        message: String,
        diagnostics: Option<String>,
    },
    /// The harness could not interpret what the engine produced
    HarnessFatal {
        message: String,
        diagnostics: Option<String>,
    },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { message, .. } | Verdict::HarnessFatal { message, .. } => Some(message),
        }
    }

    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { diagnostics, .. } | Verdict::HarnessFatal { diagnostics, .. } => {
                diagnostics.as_deref()
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail { message, .. } => write!(f, "FAIL: {}", message),
            Verdict::HarnessFatal { message, .. } => write!(f, "INTERNAL ERROR: {}", message),
        }
    }
}

/// Validate a finished execution; the context's dump is only taken when
/// the verdict needs it
pub fn validate<C: Context>(name: &str, metadata: &TestMetadata, execution: &Execution<C>) -> Verdict {
    validate_outcome(name, metadata, &execution.outcome, || execution.dump_code())
}

/// Validate an outcome against `metadata`.
///
/// `dump` is called at most once, for phase and type mismatches and for
/// unclassifiable failures.
pub fn validate_outcome<T, F>(name: &str, metadata: &TestMetadata, outcome: &ExecutionOutcome<T>, dump: F) -> Verdict
where
    T: ThrownValue,
    F: FnOnce() -> Option<String>,
{
    let (failure, phase, expected) = match (outcome, &metadata.negative) {
        (ExecutionOutcome::Success, None) => return Verdict::Pass,
        (ExecutionOutcome::Success, Some(expected)) => {
            return Verdict::Fail {
                message: format!(
                    "{}: expected failure did not occur (expected {} in the {} phase)",
                    name, expected.error_type, expected.phase
                ),
                diagnostics: None,
            };
        }
        (ExecutionOutcome::Failure { failure, .. }, None) => {
            return Verdict::Fail {
                message: format!("{}: {}", name, failure),
                diagnostics: None,
            };
        }
        (ExecutionOutcome::Failure { failure, phase }, Some(expected)) => (failure, *phase, expected),
    };

    if phase != expected.phase {
        return Verdict::Fail {
            message: format!(
                "{}: error {} happened at the wrong phase (expected {})",
                name, failure, expected.phase
            ),
            diagnostics: dump(),
        };
    }

    let error_type = match failure.error_type() {
        Ok(error_type) => error_type,
        Err(shape) => {
            let err = HarnessError::UnexpectedFailureShape(shape);
            error!(name, %err, "unclassifiable failure");
            return Verdict::HarnessFatal {
                message: format!("{}: {}", name, err),
                diagnostics: dump(),
            };
        }
    };

    if error_type != expected.error_type {
        return Verdict::Fail {
            message: format!(
                "{}: unexpected error type ({}), expected ({})",
                name, error_type, expected.error_type
            ),
            diagnostics: dump(),
        };
    }

    Verdict::Pass
}
