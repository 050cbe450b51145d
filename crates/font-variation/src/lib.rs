//! # Font Variation
//!
//! Interpolate master data across a multi-axis design space.
//!
//! A [`VariationModel`] is built from the normalized locations of a set of
//! masters. It orders the masters, computes the region of influence
//! ([`Support`]) of each one, and derives per-location weights. A [`Mutator`]
//! binds a model to one [`Value`] per master and evaluates it anywhere in the
//! space, including outside the masters' extent.
//!
//! ## Example
//!
//! ```
//! use fontmutator_variation::{Location, Mutator, Value};
//!
//! let mutator = Mutator::from_masters(
//!     ["wght"],
//!     vec![
//!         (Location::new(), Value::Scalar(100.0)),
//!         (Location::from([("wght", 1.0)]), Value::Scalar(200.0)),
//!     ],
//! )
//! .unwrap();
//!
//! let value = mutator.evaluate(&Location::from([("wght", 0.25)]));
//! assert_eq!(value.as_scalar(), Some(125.0));
//! ```

mod axis;
mod error;
mod location;
mod model;
mod mutator;
mod value;

pub use axis::{Axis, AxisSpace};
pub use error::{Error, Result};
pub use kurbo::Point;
pub use location::Location;
pub use model::{Support, Tent, VariationModel, bias_from_locations};
pub use mutator::Mutator;
pub use value::{PointKind, PointSequence, Structure, Value};
