//! Verdict data model and decoding.
//!
//! The sandbox script constructs its outcome inside the browser and the
//! driver hands it back as untyped JSON. Decoding is explicit and strict:
//! anything that is not exactly one of the two legal shapes is an engine
//! failure, never a verdict.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Raw outcomes a browser round-trip can legally produce.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("outcome is not an object: {0}")]
    NotAnObject(String),
    #[error("outcome is missing the passed flag")]
    MissingPassed,
    #[error("outcome field has the wrong type: {0}")]
    WrongType(&'static str),
    #[error("outcome carries neither a value nor an error")]
    Empty,
    #[error("outcome carries both a value and an error")]
    Ambiguous,
    #[error("outcome claims a pass alongside an error")]
    PassedWithError,
}

/// Decoded result of one sandboxed evaluation.
///
/// Exactly two shapes exist: the predicate returned (possibly a failing
/// value), or something threw along the way. Both carry the serialized
/// rendering produced inside the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Returned { passed: bool, value: String },
    Threw { error: String },
}

impl Outcome {
    /// Decodes the raw execution value returned over the wire.
    ///
    /// Field presence is checked against the concrete JSON object rather
    /// than through generic deserialization defaults, so a spoofed or
    /// half-formed shape cannot masquerade as a verdict.
    pub fn decode(raw: &Value) -> Result<Self, OutcomeError> {
        let fields = raw
            .as_object()
            .ok_or_else(|| OutcomeError::NotAnObject(raw.to_string()))?;

        let passed = fields
            .get("passed")
            .ok_or(OutcomeError::MissingPassed)?
            .as_bool()
            .ok_or(OutcomeError::WrongType("passed"))?;

        match (fields.get("value"), fields.get("error")) {
            (Some(value), None) => Ok(Outcome::Returned {
                passed,
                value: value
                    .as_str()
                    .ok_or(OutcomeError::WrongType("value"))?
                    .to_owned(),
            }),
            (None, Some(error)) => {
                if passed {
                    return Err(OutcomeError::PassedWithError);
                }
                Ok(Outcome::Threw {
                    error: error
                        .as_str()
                        .ok_or(OutcomeError::WrongType("error"))?
                        .to_owned(),
                })
            }
            (None, None) => Err(OutcomeError::Empty),
            (Some(_), Some(_)) => Err(OutcomeError::Ambiguous),
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            Outcome::Returned { passed, .. } => *passed,
            Outcome::Threw { .. } => false,
        }
    }
}

/// Final record returned for a judged submission.
///
/// Serializes with the wire field names the host layer passes through to
/// clients; absent branches are omitted rather than rendered as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "numChars")]
    pub num_chars: usize,
}

impl Verdict {
    /// Decorates a decoded outcome with the length of the raw solution text.
    pub fn new(outcome: Outcome, solution: &str) -> Self {
        let num_chars = solution.chars().count();
        match outcome {
            Outcome::Returned { passed, value } => Self {
                passed,
                value: Some(value),
                error: None,
                num_chars,
            },
            Outcome::Threw { error } => Self {
                passed: false,
                value: None,
                error: Some(error),
                num_chars,
            },
        }
    }
}
