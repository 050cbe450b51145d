//! Error types for model construction.

use crate::location::Location;

/// Result type for variation model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building axes, models and mutators.
///
/// All of them are raised at construction time. Once a [`Mutator`] exists,
/// evaluating it cannot fail.
///
/// [`Mutator`]: crate::Mutator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Axis bounds are out of order.
    #[error(
        "axis '{axis}' has an invalid range: minimum {minimum}, default {default}, maximum {maximum}"
    )]
    AxisRange {
        axis: String,
        minimum: f64,
        default: f64,
        maximum: f64,
    },

    /// Two masters normalize to the same location.
    #[error("masters {first} and {second} share the location {location}")]
    DuplicateLocation {
        first: usize,
        second: usize,
        location: Location,
    },

    /// No master sits at the origin of the model.
    #[error("no master at the default location {0}")]
    MissingDefaultMaster(Location),

    /// A master value does not match the structure of the first master.
    #[error("value of master {master} is incompatible: {reason}")]
    IncompatibleValue { master: usize, reason: String },

    /// No masters were supplied.
    #[error("cannot build a model without masters")]
    EmptyModel,

    /// A location refers to an axis that was never declared.
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),

    /// A mutator received a different number of values than its model has masters.
    #[error("expected {expected} master values, got {actual}")]
    MasterCountMismatch { expected: usize, actual: usize },
}
