//! Instance requests.

use fontmutator_variation::Location;
use indexmap::IndexMap;

/// Per-glyph adjustments to an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOverride {
    /// Leave the glyph out of the instance
    pub mute: bool,
    /// User-space location used for this glyph instead of the instance's
    pub location: Option<Location>,
    /// Code points replacing the ones taken from the sources
    pub unicodes: Option<Vec<u32>>,
}

impl GlyphOverride {
    pub fn muted() -> Self {
        Self { mute: true, ..Default::default() }
    }

    pub fn at(location: Location) -> Self {
        Self { location: Some(location), ..Default::default() }
    }

    pub fn with_unicodes(mut self, unicodes: impl IntoIterator<Item = u32>) -> Self {
        self.unicodes = Some(unicodes.into_iter().collect());
        self
    }
}

/// A named instance to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    pub name: String,
    /// User-space location; x coordinates of anisotropic instances
    pub location: Location,
    /// Coordinates for y geometry, overriding `location` axis by axis
    pub anisotropic_location: Option<Location>,
    /// Round geometry, kerning and info to integers
    pub round: bool,
    /// Apply the design space's substitution rules
    pub process_rules: bool,
    pub include_kerning: bool,
    /// Glyphs to generate; `None` generates every glyph of the sources
    pub glyph_names: Option<Vec<String>>,
    pub glyph_overrides: IndexMap<String, GlyphOverride>,
}

impl InstanceRequest {
    /// Create a request with rules and kerning enabled and rounding off.
    pub fn new(name: &str, location: Location) -> Self {
        Self {
            name: name.to_string(),
            location,
            anisotropic_location: None,
            round: false,
            process_rules: true,
            include_kerning: true,
            glyph_names: None,
            glyph_overrides: IndexMap::new(),
        }
    }

    pub fn with_anisotropic_location(mut self, vertical: Location) -> Self {
        self.anisotropic_location = Some(vertical);
        self
    }

    pub fn with_rounding(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    pub fn with_rules(mut self, process_rules: bool) -> Self {
        self.process_rules = process_rules;
        self
    }

    pub fn with_kerning(mut self, include_kerning: bool) -> Self {
        self.include_kerning = include_kerning;
        self
    }

    pub fn with_glyph_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.glyph_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_glyph_override(mut self, glyph: &str, glyph_override: GlyphOverride) -> Self {
        self.glyph_overrides.insert(glyph.to_string(), glyph_override);
        self
    }

    /// The location used for y geometry.
    ///
    /// Axes not named by the anisotropic location share the main location's
    /// coordinate.
    pub fn vertical_location(&self) -> Location {
        let mut vertical = self.location.clone();
        for (axis, value) in self.anisotropic_location.iter().flat_map(Location::iter) {
            vertical = vertical.with(axis, value);
        }
        vertical
    }
}
