//! # Font Instancer
//!
//! Generate static instances from the sources of a design space.
//!
//! An [`InstanceBuilder`] takes a [`DesignSpace`] (axes, in-memory sources
//! and substitution rules) and answers [`InstanceRequest`]s. Glyphs, kerning
//! and numeric font info are interpolated with one mutator per property,
//! built on first use and shared by every instance. Properties that cannot
//! be interpolated are left out and reported as [`Diagnostic`]s, so one bad
//! glyph never costs the whole instance.
//!
//! ## Example
//!
//! ```
//! use fontmutator_instancer::{DesignSpace, Glyph, InstanceBuilder, InstanceRequest, Source};
//! use fontmutator_variation::{Axis, Location};
//!
//! let weight = Axis::new("weight", 400.0, 400.0, 700.0).unwrap();
//! let design = DesignSpace::new(
//!     vec![weight],
//!     vec![
//!         Source::new("Regular", Location::from([("weight", 400.0)]))
//!             .with_glyph("space", Glyph::new(250.0)),
//!         Source::new("Bold", Location::from([("weight", 700.0)]))
//!             .with_glyph("space", Glyph::new(280.0)),
//!     ],
//! );
//!
//! let builder = InstanceBuilder::new(design).unwrap();
//! let request = InstanceRequest::new("Medium", Location::from([("weight", 550.0)]));
//! let instance = builder.build(&request);
//! assert_eq!(instance.glyphs["space"].advance, 265.0);
//! ```

mod builder;
mod designspace;
mod error;
mod glyph;
mod parallel;
mod report;
mod request;

pub use builder::InstanceBuilder;
pub use designspace::{DesignSpace, Source};
pub use error::{Error, Result};
pub use glyph::{Component, Glyph};
pub use parallel::BatchResult;
pub use report::{Diagnostic, DiagnosticKind, Instance, PropertyId};
pub use request::{GlyphOverride, InstanceRequest};
