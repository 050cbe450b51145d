//! Instance generation from a design space.

use std::{
    result,
    sync::{Arc, OnceLock},
    time::Instant,
};

use fontmutator_rules::RuleEngine;
use fontmutator_variation::{
    AxisSpace, Location, Mutator, Value, VariationModel, bias_from_locations,
};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use crate::{
    designspace::{DesignSpace, Source},
    error::{Error, Result},
    glyph::Glyph,
    parallel::{BatchResult, collect_parallel},
    report::{Diagnostic, DiagnosticKind, Instance, PropertyId},
    request::InstanceRequest,
};

type ModelError = fontmutator_variation::Error;
type ModelResult<T> = result::Result<T, ModelError>;
type Cached<T> = OnceLock<ModelResult<Arc<T>>>;

/// Font-info fields measured along y. Anisotropic instances evaluate them
/// at the vertical location.
const VERTICAL_INFO_FIELDS: &[&str] = &[
    "ascender",
    "descender",
    "xHeight",
    "capHeight",
    "openTypeHheaAscender",
    "openTypeHheaDescender",
    "openTypeHheaLineGap",
    "openTypeOS2TypoAscender",
    "openTypeOS2TypoDescender",
    "openTypeOS2TypoLineGap",
    "openTypeOS2WinAscent",
    "openTypeOS2WinDescent",
    "postscriptUnderlinePosition",
    "postscriptUnderlineThickness",
];

struct GlyphMutator {
    mutator: Mutator,
    /// Sources without the glyph
    missing: Vec<String>,
    unicodes: Vec<u32>,
}

/// Mutator for one number: an info field or a kerning pair.
struct ScalarMutator {
    mutator: Mutator,
    missing: Vec<String>,
}

/// The sources sharing one set of discrete-axis coordinates, with the
/// mutators built from them so far.
struct Slice {
    discrete: Location,
    /// User-space location the slice interpolates around
    neutral: Location,
    /// Continuous axes, re-anchored at the bias when no source sits at the default
    axes: AxisSpace,
    axis_names: Vec<String>,
    /// Indices into the design space's sources
    sources: Vec<usize>,
    /// Normalized source locations, parallel to `sources`
    locations: Vec<Location>,
    /// Model over every source, shared by properties that all sources define
    model: OnceLock<ModelResult<Arc<VariationModel>>>,
    glyphs: IndexMap<String, Cached<GlyphMutator>>,
    info: IndexMap<String, Cached<ScalarMutator>>,
    kerning: IndexMap<(String, String), Cached<ScalarMutator>>,
}

impl Slice {
    fn new(design: &DesignSpace, discrete: Location, members: Vec<usize>) -> Result<Self> {
        let continuous = design.axes.continuous();
        let axis_names = continuous.continuous_names();

        let mut user = Vec::with_capacity(members.len());
        for &i in &members {
            let source = &design.sources[i];
            let complete = design.axes.complete(&source.location).map_err(invalid(source))?;
            user.push(design.axes.split_discrete(&complete).0);
        }

        let default = continuous.default_location();
        let (axes, neutral) = if user.contains(&default) {
            (continuous, default)
        } else {
            let bias = bias_from_locations(&axis_names, &user).unwrap_or(default);
            debug!("No source at the default of slice {discrete}, interpolating around {bias}");
            (continuous.rebased(&bias), bias)
        };
        let neutral = discrete.iter().fold(neutral, |location, (axis, value)| {
            location.with(axis, value)
        });

        let mut locations = Vec::with_capacity(members.len());
        for (&i, location) in members.iter().zip(&user) {
            locations.push(axes.normalize(location).map_err(invalid(&design.sources[i]))?);
        }

        let mut glyph_names = IndexSet::new();
        let mut info_fields = IndexSet::new();
        let mut pairs = IndexSet::new();
        for &i in &members {
            glyph_names.extend(design.sources[i].glyphs.keys().cloned());
            info_fields.extend(design.sources[i].info.keys().cloned());
            pairs.extend(design.sources[i].kerning.keys().cloned());
        }

        Ok(Self {
            discrete,
            neutral,
            axes,
            axis_names,
            sources: members,
            locations,
            model: OnceLock::new(),
            glyphs: glyph_names.into_iter().map(|name| (name, OnceLock::new())).collect(),
            info: info_fields.into_iter().map(|field| (field, OnceLock::new())).collect(),
            kerning: pairs.into_iter().map(|pair| (pair, OnceLock::new())).collect(),
        })
    }

    fn members<'a>(&'a self, sources: &'a [Source]) -> impl Iterator<Item = &'a Source> + 'a {
        self.sources.iter().map(move |&i| &sources[i])
    }

    fn shared_model(&self) -> ModelResult<Arc<VariationModel>> {
        self.model
            .get_or_init(|| {
                VariationModel::new(self.axis_names.clone(), self.locations.clone()).map(Arc::new)
            })
            .clone()
    }

    /// Build a mutator from `(position in this slice, value)` pairs.
    ///
    /// A sparse property whose masters miss the neutral reports the slice's
    /// user-space neutral.
    fn mutator(&self, masters: Vec<(usize, Value)>) -> ModelResult<Mutator> {
        if masters.len() == self.sources.len() {
            let values = masters.into_iter().map(|(_, value)| value).collect();
            return Mutator::new(self.shared_model()?, values);
        }
        let masters = masters
            .into_iter()
            .map(|(position, value)| (self.locations[position].clone(), value))
            .collect();
        Mutator::from_masters(self.axis_names.clone(), masters).map_err(|error| match error {
            ModelError::MissingDefaultMaster(_) => {
                ModelError::MissingDefaultMaster(self.neutral.clone())
            }
            error => error,
        })
    }

    fn glyph(&self, sources: &[Source], name: &str) -> Option<ModelResult<Arc<GlyphMutator>>> {
        let cell = self.glyphs.get(name)?;
        Some(cell.get_or_init(|| self.build_glyph(sources, name).map(Arc::new)).clone())
    }

    fn build_glyph(&self, sources: &[Source], name: &str) -> ModelResult<GlyphMutator> {
        let mut masters = Vec::new();
        let mut missing = Vec::new();
        let mut unicodes = None;
        for (position, source) in self.members(sources).enumerate() {
            if !source.contributes(name) {
                if !source.muted_glyphs.contains(name) {
                    missing.push(source.name.clone());
                }
                continue;
            }
            let glyph = &source.glyphs[name];
            // the neutral's code points win over the first source's
            if unicodes.is_none() || self.locations[position].is_origin() {
                unicodes = Some(glyph.unicodes.clone());
            }
            masters.push((position, glyph.to_value()));
        }
        let mutator = self.mutator(masters)?;
        Ok(GlyphMutator { mutator, missing, unicodes: unicodes.unwrap_or_default() })
    }

    /// Build a scalar mutator from the sources for which `lookup` finds a value.
    fn build_scalar(
        &self,
        sources: &[Source],
        lookup: impl Fn(&Source) -> Option<f64>,
    ) -> ModelResult<ScalarMutator> {
        let mut masters = Vec::new();
        let mut missing = Vec::new();
        for (position, source) in self.members(sources).enumerate() {
            match lookup(source) {
                Some(value) => masters.push((position, Value::Scalar(value))),
                None => missing.push(source.name.clone()),
            }
        }
        Ok(ScalarMutator { mutator: self.mutator(masters)?, missing })
    }

    fn field(&self, sources: &[Source], field: &str) -> Option<ModelResult<Arc<ScalarMutator>>> {
        let cell = self.info.get(field)?;
        let build = || self.build_scalar(sources, |source| source.info.get(field).copied());
        Some(cell.get_or_init(|| build().map(Arc::new)).clone())
    }

    /// Pairs missing from a source are left out of that pair's mutator.
    fn pair(
        &self,
        sources: &[Source],
        pair: &(String, String),
    ) -> Option<ModelResult<Arc<ScalarMutator>>> {
        let cell = self.kerning.get(pair)?;
        let build = || self.build_scalar(sources, |source| source.kerning.get(pair).copied());
        Some(cell.get_or_init(|| build().map(Arc::new)).clone())
    }

    fn prepare(&self, sources: &[Source], property: &PropertyId) -> ModelResult<()> {
        match property {
            PropertyId::Instance => Ok(()),
            PropertyId::Glyph(name) => self.glyph(sources, name).transpose().map(drop),
            PropertyId::Kerning(first, second) => {
                let pair = (first.clone(), second.clone());
                self.pair(sources, &pair).transpose().map(drop)
            }
            PropertyId::Info(field) => self.field(sources, field).transpose().map(drop),
        }
    }
}

fn invalid(source: &Source) -> impl FnOnce(ModelError) -> Error + '_ {
    move |error| Error::InvalidSource {
        name: source.name.clone(),
        location: source.location.clone(),
        error,
    }
}

/// How a failed mutator build is reported.
///
/// A property no source contributes to has no masters at all; that is a
/// warning, everything else leaves the instance incomplete.
fn failure(error: ModelError) -> DiagnosticKind {
    match error {
        ModelError::EmptyModel => DiagnosticKind::Undefined,
        error => DiagnosticKind::Model(error),
    }
}

/// Where a request lands in the design space.
struct Placement<'a> {
    /// Complete user-space location
    location: Location,
    slice: &'a Slice,
    /// Normalized location for x geometry, kerning and most info fields
    horizontal: Location,
    /// Normalized location for y geometry and vertical info fields
    vertical: Location,
}

/// Generates instances from one design space.
///
/// Mutators are built on first use and cached for the lifetime of the
/// builder, so a builder can serve many requests (from many threads)
/// while solving every property only once.
pub struct InstanceBuilder {
    design: DesignSpace,
    rules: RuleEngine,
    slices: Vec<Slice>,
}

impl InstanceBuilder {
    /// Validate `design` and group its sources by discrete location.
    ///
    /// No mutator is built yet; see [`prepare`](Self::prepare).
    pub fn new(design: DesignSpace) -> Result<Self> {
        design.validate()?;
        let rules = design.rule_engine()?;

        let mut groups: Vec<(Location, Vec<usize>)> = Vec::new();
        for (i, source) in design.sources.iter().enumerate() {
            let complete = design.axes.complete(&source.location).map_err(invalid(source))?;
            let (_, discrete) = design.axes.split_discrete(&complete);
            match groups.iter().position(|(key, _)| *key == discrete) {
                Some(group) => groups[group].1.push(i),
                None => groups.push((discrete, vec![i])),
            }
        }

        let slices = groups
            .into_iter()
            .map(|(discrete, members)| Slice::new(&design, discrete, members))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Design space: {} axes, {} sources, {} rules, {} discrete slice(s)",
            design.axes.axes().len(),
            design.sources.len(),
            rules.rules().len(),
            slices.len()
        );
        Ok(Self { design, rules, slices })
    }

    pub fn design_space(&self) -> &DesignSpace {
        &self.design
    }

    /// Build every mutator up front, in parallel.
    ///
    /// Returns a diagnostic for each property whose mutator cannot be built,
    /// including properties no source contributes to.
    pub fn prepare(&self) -> Vec<Diagnostic> {
        let start = Instant::now();
        let tasks: Vec<(&Slice, PropertyId)> = self
            .slices
            .iter()
            .flat_map(|slice| {
                let glyphs = slice.glyphs.keys().map(|name| PropertyId::Glyph(name.clone()));
                let info = slice.info.keys().map(|field| PropertyId::Info(field.clone()));
                let kerning = slice
                    .kerning
                    .keys()
                    .map(|(first, second)| PropertyId::Kerning(first.clone(), second.clone()));
                glyphs.chain(info).chain(kerning).map(move |property| (slice, property))
            })
            .collect();

        let diagnostics: Vec<Diagnostic> = collect_parallel(&tasks, |(slice, property)| {
            slice
                .prepare(&self.design.sources, property)
                .err()
                .map(|error| Diagnostic::new(property.clone(), failure(error)))
        })
        .into_iter()
        .flatten()
        .collect();

        info!(
            "Prepared {} mutators in {:.2?} ({} failed)",
            tasks.len(),
            start.elapsed(),
            diagnostics.len()
        );
        diagnostics
    }

    /// Generate every request in parallel, in request order.
    pub fn build_all(&self, requests: &[InstanceRequest]) -> Vec<Instance> {
        let start = Instant::now();
        let instances = collect_parallel(requests, |request| self.build(request));
        let result = BatchResult::from_instances(&instances);
        info!(
            "Built {} instances in {:.2?}: {} complete, {} partial",
            result.total(),
            start.elapsed(),
            result.complete,
            result.partial
        );
        instances
    }

    /// Generate one instance.
    ///
    /// Never fails as a whole: properties that cannot be produced are left
    /// out and described in [`Instance::diagnostics`].
    pub fn build(&self, request: &InstanceRequest) -> Instance {
        let start = Instant::now();
        let mut instance = Instance::new(&request.name, request.location.clone());

        let placement = match self.place(request) {
            Ok(placement) => placement,
            Err(error) => {
                instance.report(PropertyId::Instance, DiagnosticKind::Model(error));
                return instance;
            }
        };

        self.build_glyphs(request, &placement, &mut instance);
        if request.include_kerning {
            self.build_kerning(request, &placement, &mut instance);
        }
        self.build_info(request, &placement, &mut instance);

        if request.process_rules && !self.rules.is_empty() {
            instance.substitutions = self.rules.evaluate(&placement.location);
            let names: Vec<&str> = placement.slice.glyphs.keys().map(String::as_str).collect();
            for (from, to) in self.rules.renames(&placement.location, &names) {
                debug!("{}: swapping '{from}' and '{to}'", instance.name);
                instance.swap_glyphs(&from, &to);
            }
        }

        instance.location = placement.location;
        info!(
            "Built instance '{}' at {} in {:.2?}",
            instance.name,
            instance.location,
            start.elapsed()
        );
        instance
    }

    fn place(&self, request: &InstanceRequest) -> ModelResult<Placement<'_>> {
        let axes = &self.design.axes;
        let location = axes.complete(&request.location)?;
        let vertical = axes.complete(&request.vertical_location())?;

        let (continuous, discrete) = axes.split_discrete(&location);
        let slice = self
            .slices
            .iter()
            .find(|slice| slice.discrete == discrete)
            .ok_or(ModelError::MissingDefaultMaster(discrete))?;

        let horizontal = slice.axes.normalize(&continuous)?;
        let vertical = slice.axes.normalize(&axes.split_discrete(&vertical).0)?;
        Ok(Placement { location, slice, horizontal, vertical })
    }

    /// Normalize a glyph-specific location within the instance's slice.
    fn place_glyph(&self, slice: &Slice, location: &Location) -> ModelResult<Location> {
        let complete = self.design.axes.complete(location)?;
        slice.axes.normalize(&self.design.axes.split_discrete(&complete).0)
    }

    fn build_glyphs(
        &self,
        request: &InstanceRequest,
        placement: &Placement<'_>,
        instance: &mut Instance,
    ) {
        let sources = &self.design.sources;
        let slice = placement.slice;
        let names: Vec<&String> = match &request.glyph_names {
            Some(names) => names.iter().collect(),
            None => slice.glyphs.keys().collect(),
        };

        for name in names {
            let property = PropertyId::Glyph(name.clone());
            let glyph_override = request.glyph_overrides.get(name);
            if glyph_override.is_some_and(|o| o.mute) {
                instance.report(property, DiagnosticKind::Muted);
                continue;
            }

            let glyph_location = match glyph_override.and_then(|o| o.location.as_ref()) {
                Some(location) => match self.place_glyph(slice, location) {
                    Ok(location) => Some(location),
                    Err(error) => {
                        instance.report(property, DiagnosticKind::Model(error));
                        continue;
                    }
                },
                None => None,
            };
            let (horizontal, vertical) = match &glyph_location {
                Some(location) => (location, location),
                None => (&placement.horizontal, &placement.vertical),
            };

            let mutator = match slice.glyph(sources, name) {
                Some(Ok(mutator)) => mutator,
                Some(Err(error)) => {
                    instance.report(property, failure(error));
                    continue;
                }
                None => {
                    instance.report(property, DiagnosticKind::Undefined);
                    continue;
                }
            };
            if !mutator.missing.is_empty() {
                let missing = mutator.missing.clone();
                instance.report(property.clone(), DiagnosticKind::SparseValue { missing });
            }

            let value = mutator.mutator.evaluate_anisotropic(horizontal, vertical);
            let unicodes = glyph_override
                .and_then(|o| o.unicodes.clone())
                .unwrap_or_else(|| mutator.unicodes.clone());
            let Some(mut glyph) = Glyph::from_value(&value, unicodes) else {
                let reason = "interpolated value is not a glyph".to_string();
                let error = ModelError::IncompatibleValue { master: 0, reason };
                instance.report(property, DiagnosticKind::Model(error));
                continue;
            };
            if request.round {
                glyph = glyph.rounded();
            }
            instance.glyphs.insert(name.clone(), glyph);
        }
    }

    /// Kerning is horizontal and always evaluated at the x location.
    fn build_kerning(
        &self,
        request: &InstanceRequest,
        placement: &Placement<'_>,
        instance: &mut Instance,
    ) {
        let slice = placement.slice;
        for pair in slice.kerning.keys() {
            let property = PropertyId::Kerning(pair.0.clone(), pair.1.clone());
            let Some(value) = self.evaluate_scalar(
                slice.pair(&self.design.sources, pair),
                &placement.horizontal,
                property,
                instance,
            ) else {
                continue;
            };
            let value = if request.round { value.round() } else { value };
            instance.kerning.insert(pair.clone(), value);
        }
    }

    fn build_info(
        &self,
        request: &InstanceRequest,
        placement: &Placement<'_>,
        instance: &mut Instance,
    ) {
        let slice = placement.slice;
        for field in slice.info.keys() {
            let location = if VERTICAL_INFO_FIELDS.contains(&field.as_str()) {
                &placement.vertical
            } else {
                &placement.horizontal
            };
            let Some(value) = self.evaluate_scalar(
                slice.field(&self.design.sources, field),
                location,
                PropertyId::Info(field.clone()),
                instance,
            ) else {
                continue;
            };
            let value = if request.round { value.round() } else { value };
            instance.info.insert(field.clone(), value);
        }
    }

    /// Evaluate a kerning pair or info field, recording what went wrong.
    fn evaluate_scalar(
        &self,
        mutator: Option<ModelResult<Arc<ScalarMutator>>>,
        location: &Location,
        property: PropertyId,
        instance: &mut Instance,
    ) -> Option<f64> {
        let mutator = match mutator? {
            Ok(mutator) => mutator,
            Err(error) => {
                instance.report(property, failure(error));
                return None;
            }
        };
        if !mutator.missing.is_empty() {
            let missing = mutator.missing.clone();
            instance.report(property, DiagnosticKind::SparseValue { missing });
        }
        mutator.mutator.evaluate(location).as_scalar()
    }
}

#[cfg(test)]
mod tests {
    use fontmutator_variation::{Axis, Point, PointKind, PointSequence};
    use pretty_assertions::assert_eq;

    use super::*;

    fn bar(width: f64) -> Glyph {
        Glyph::new(width + 100.0).with_outline(PointSequence::from_contours([[
            (Point::new(50.0, 0.0), PointKind::Line),
            (Point::new(50.0 + width, 0.0), PointKind::Line),
            (Point::new(50.0 + width, 700.0), PointKind::Line),
            (Point::new(50.0, 700.0), PointKind::Line),
        ]]))
    }

    fn source(name: &str, weight: f64, stem: f64) -> Source {
        Source::new(name, Location::from([("weight", weight)]))
            .with_glyph("I", bar(stem).with_unicodes([0x49]))
            .with_info("xHeight", 500.0 + stem / 10.0)
    }

    fn design() -> DesignSpace {
        DesignSpace::new(
            vec![Axis::new("weight", 100.0, 400.0, 900.0).unwrap()],
            vec![
                source("Thin", 100.0, 20.0),
                source("Regular", 400.0, 80.0),
                source("Black", 900.0, 200.0),
            ],
        )
    }

    #[test]
    fn one_slice_without_discrete_axes() {
        let builder = InstanceBuilder::new(design()).unwrap();
        assert_eq!(builder.slices.len(), 1);
        assert_eq!(builder.slices[0].locations[0], Location::from([("weight", -1.0)]));
        assert_eq!(builder.slices[0].glyphs.len(), 1);
    }

    #[test]
    fn mutators_are_cached() {
        let builder = InstanceBuilder::new(design()).unwrap();
        let sources = &builder.design.sources;
        let slice = &builder.slices[0];

        let first = slice.glyph(sources, "I").unwrap().unwrap();
        let second = slice.glyph(sources, "I").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // glyphs defined everywhere share the slice model
        let field = slice.field(sources, "xHeight").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first.mutator.shared_model(), &field.mutator.shared_model()));
    }

    #[test]
    fn prepare_builds_everything() {
        let builder = InstanceBuilder::new(design()).unwrap();
        assert_eq!(builder.prepare(), Vec::new());
        assert!(builder.slices[0].glyphs["I"].get().is_some());
        assert!(builder.slices[0].info["xHeight"].get().is_some());
    }

    #[test]
    fn interpolates_between_masters() {
        let builder = InstanceBuilder::new(design()).unwrap();
        let instance = builder.build(&InstanceRequest::new(
            "Bold",
            Location::from([("weight", 650.0)]),
        ));

        assert!(instance.is_complete());
        let glyph = &instance.glyphs["I"];
        assert_eq!(glyph.advance, 240.0);
        assert_eq!(glyph.unicodes, vec![0x49]);
        assert_eq!(glyph.outline.points()[1], Point::new(190.0, 0.0));
        assert_eq!(instance.info["xHeight"], 514.0);
    }

    #[test]
    fn unknown_request_axis_is_reported() {
        let builder = InstanceBuilder::new(design()).unwrap();
        let instance =
            builder.build(&InstanceRequest::new("Wide", Location::from([("width", 120.0)])));
        assert!(!instance.is_complete());
        assert_eq!(instance.diagnostics[0].property, PropertyId::Instance);
        assert!(instance.glyphs.is_empty());
    }
}
