//! Instance output and per-property diagnostics.

use std::fmt;

use fontmutator_variation::{Location, Value};
use indexmap::IndexMap;
use log::warn;

use crate::glyph::Glyph;

/// An interpolatable property of a design space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// The instance as a whole (its location could not be resolved)
    Instance,
    Glyph(String),
    /// One kerning pair, `(first, second)`
    Kerning(String, String),
    Info(String),
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyId::Instance => f.write_str("instance"),
            PropertyId::Glyph(name) => write!(f, "glyph '{name}'"),
            PropertyId::Kerning(first, second) => write!(f, "kerning '{first} {second}'"),
            PropertyId::Info(field) => write!(f, "info '{field}'"),
        }
    }
}

/// What went wrong with a property.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The property's mutator could not be built; it is missing from the instance.
    Model(fontmutator_variation::Error),
    /// Some sources lack the property; it was interpolated from the others.
    SparseValue { missing: Vec<String> },
    /// No source contributes the property; it is missing from the instance.
    Undefined,
    /// The request muted the glyph; it is missing from the instance.
    Muted,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Model(error) => write!(f, "{error}"),
            DiagnosticKind::SparseValue { missing } => {
                write!(f, "not defined in {}", missing.join(", "))
            }
            DiagnosticKind::Undefined => f.write_str("not defined in any source"),
            DiagnosticKind::Muted => f.write_str("muted"),
        }
    }
}

/// A problem with one property of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub property: PropertyId,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(property: PropertyId, kind: DiagnosticKind) -> Self {
        Self { property, kind }
    }

    /// True if the property could not be produced.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Model(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.kind)
    }
}

/// A generated instance, ready to be written into a font source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub name: String,
    /// Complete user-space location of the instance
    pub location: Location,
    pub glyphs: IndexMap<String, Glyph>,
    pub kerning: IndexMap<(String, String), f64>,
    pub info: IndexMap<String, f64>,
    /// Rule substitutions firing at the instance location, in rule order
    pub substitutions: Vec<(String, String)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Instance {
    pub(crate) fn new(name: &str, location: Location) -> Self {
        Self { name: name.to_string(), location, ..Default::default() }
    }

    pub(crate) fn report(&mut self, property: PropertyId, kind: DiagnosticKind) {
        let diagnostic = Diagnostic::new(property, kind);
        warn!("{}: {diagnostic}", self.name);
        self.diagnostics.push(diagnostic);
    }

    /// True if no property failed to build.
    ///
    /// Sparse, undefined and muted properties do not make an instance
    /// incomplete.
    pub fn is_complete(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics recorded for `property`.
    pub fn diagnostics_for<'a>(
        &'a self,
        property: &'a PropertyId,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| &d.property == property)
    }

    /// The evaluated value of a property.
    ///
    /// Glyphs come back in their record form (see [`Glyph::to_value`]),
    /// kerning pairs and info fields as scalars.
    pub fn value(&self, property: &PropertyId) -> Option<Value> {
        match property {
            PropertyId::Instance => None,
            PropertyId::Glyph(name) => self.glyphs.get(name).map(Glyph::to_value),
            PropertyId::Kerning(first, second) => self
                .kerning
                .get(&(first.clone(), second.clone()))
                .map(|v| Value::Scalar(*v)),
            PropertyId::Info(field) => self.info.get(field).map(|v| Value::Scalar(*v)),
        }
    }

    /// Swap two glyphs the way substitution rules do.
    ///
    /// Outlines, advances and components change places while code points
    /// stay with their names; component references and kerning pairs are
    /// renamed to match. Nothing happens unless both glyphs exist.
    pub(crate) fn swap_glyphs(&mut self, a: &str, b: &str) {
        let (Some(ia), Some(ib)) = (self.glyphs.get_index_of(a), self.glyphs.get_index_of(b))
        else {
            return;
        };
        let mut first = self.glyphs[ia].clone();
        let mut second = self.glyphs[ib].clone();
        std::mem::swap(&mut first.unicodes, &mut second.unicodes);
        self.glyphs[ia] = second;
        self.glyphs[ib] = first;

        let rename = |name: &str| match name {
            n if n == a => b.to_string(),
            n if n == b => a.to_string(),
            n => n.to_string(),
        };
        for glyph in self.glyphs.values_mut() {
            for component in &mut glyph.components {
                component.base = rename(&component.base);
            }
        }
        self.kerning = std::mem::take(&mut self.kerning)
            .into_iter()
            .map(|((first, second), value)| ((rename(&first), rename(&second)), value))
            .collect();
    }
}
