//! Error types for rule validation.

use std::result;

/// Errors raised when a rule set does not fit its axes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("rule '{rule}' has a condition on unknown axis '{axis}'")]
    UnknownAxis { rule: String, axis: String },

    #[error("rule '{rule}' has an invalid condition on '{axis}': {reason}")]
    InvalidCondition { rule: String, axis: String, reason: String },
}

pub type Result<T> = result::Result<T, Error>;
