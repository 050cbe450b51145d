//! Design space model for instance generation.
//!
//! Mirrors the concepts from fontTools designspaceLib, holding source data
//! already loaded into memory.

use std::collections::HashSet;

use fontmutator_rules::{Rule, RuleEngine};
use fontmutator_variation::{Axis, AxisSpace, Location};
use indexmap::IndexMap;

use crate::{
    error::{Error, Result},
    glyph::Glyph,
};

/// A source (master) in the design space.
#[derive(Debug, Clone, Default)]
pub struct Source {
    /// Unique source name, used in diagnostics
    pub name: String,
    /// User-space location; missing axes sit at their default
    pub location: Location,
    pub glyphs: IndexMap<String, Glyph>,
    /// Kerning values keyed by `(first, second)` glyph or group name
    pub kerning: IndexMap<(String, String), f64>,
    /// Numeric font-info fields (ascender, xHeight, ...)
    pub info: IndexMap<String, f64>,
    /// Glyphs this source must not contribute to
    pub muted_glyphs: HashSet<String>,
}

impl Source {
    /// Create a new source with the given name and location.
    pub fn new(name: &str, location: Location) -> Self {
        Self { name: name.to_string(), location, ..Default::default() }
    }

    /// Add a glyph.
    pub fn with_glyph(mut self, name: &str, glyph: Glyph) -> Self {
        self.glyphs.insert(name.to_string(), glyph);
        self
    }

    /// Add a kerning pair.
    pub fn with_kerning(mut self, first: &str, second: &str, value: f64) -> Self {
        self.kerning.insert((first.to_string(), second.to_string()), value);
        self
    }

    /// Add a numeric font-info field.
    pub fn with_info(mut self, field: &str, value: f64) -> Self {
        self.info.insert(field.to_string(), value);
        self
    }

    /// Exclude glyphs from this source's contribution.
    pub fn with_muted_glyphs<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.muted_glyphs.extend(names.into_iter().map(Into::into));
        self
    }

    /// True if this source provides `glyph` to its mutator.
    pub fn contributes(&self, glyph: &str) -> bool {
        self.glyphs.contains_key(glyph) && !self.muted_glyphs.contains(glyph)
    }
}

/// A complete design space: axes, sources and substitution rules.
#[derive(Debug, Clone, Default)]
pub struct DesignSpace {
    pub axes: AxisSpace,
    pub sources: Vec<Source>,
    pub rules: Vec<Rule>,
}

impl DesignSpace {
    /// Create a new design space with the given axes and sources.
    pub fn new(axes: Vec<Axis>, sources: Vec<Source>) -> Self {
        Self { axes: AxisSpace::new(axes), sources, rules: Vec::new() }
    }

    /// Add substitution rules, evaluated in order.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// Find the default source (the one at the default location for all axes).
    pub fn default_source(&self) -> Option<&Source> {
        self.default_source_index().map(|i| &self.sources[i])
    }

    /// Find the index of the default source.
    pub fn default_source_index(&self) -> Option<usize> {
        let default = self.axes.default_location();
        self.sources
            .iter()
            .position(|source| self.axes.complete(&source.location).is_ok_and(|l| l == default))
    }

    /// Validate the design space.
    ///
    /// A missing default source is not an error: instances are then
    /// interpolated around a bias source instead.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::NoSources);
        }

        let mut axes = HashSet::new();
        for axis in self.axes.axes() {
            if !axes.insert(axis.name()) {
                return Err(Error::DuplicateAxis(axis.name().to_string()));
            }
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(Error::DuplicateSource(source.name.clone()));
            }
            if let Err(error) = self.axes.complete(&source.location) {
                return Err(Error::InvalidSource {
                    name: source.name.clone(),
                    location: source.location.clone(),
                    error,
                });
            }
        }

        self.rule_engine().map(drop)
    }

    /// Validate the rules against the axes.
    pub fn rule_engine(&self) -> Result<RuleEngine> {
        Ok(RuleEngine::new(&self.axes, self.rules.clone())?)
    }
}
