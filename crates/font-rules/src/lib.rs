//! # Font Rules
//!
//! Conditional glyph substitutions triggered by design-space locations.
//!
//! A [`Rule`] holds one or more [`ConditionSet`]s and a list of
//! `(from, to)` glyph name pairs. It fires when any of its condition sets
//! holds at a location. A [`RuleEngine`] validates a rule list against its
//! axes and applies the fired rules in declaration order, so substitutions
//! chain from one rule to the next.

mod engine;
mod error;
mod rule;

pub use engine::RuleEngine;
pub use error::{Error, Result};
pub use rule::{Condition, ConditionSet, Rule};
