//! Mutators: a variation model with one value per master.

use std::sync::Arc;

use log::trace;

use crate::{
    error::{Error, Result},
    location::Location,
    model::VariationModel,
    value::Value,
};

/// Interpolates one property (a glyph, a kerning value, a font-info field)
/// across the masters of a [`VariationModel`].
///
/// Deltas are solved once at construction; evaluation only reads them, so a
/// mutator can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Mutator {
    model: Arc<VariationModel>,
    /// One delta per master, in the model's processing order
    deltas: Vec<Value>,
}

impl Mutator {
    /// Attach `values` (one per master, in the model's input order) to `model`
    /// and solve for deltas.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyModel` if `values` is empty
    /// - `Error::MasterCountMismatch` if `values` and the model differ in length
    /// - `Error::IncompatibleValue` if a value's structure differs from the first value's
    pub fn new(model: Arc<VariationModel>, values: Vec<Value>) -> Result<Self> {
        check_compatible(&values)?;
        if values.len() != model.len() {
            return Err(Error::MasterCountMismatch { expected: model.len(), actual: values.len() });
        }
        let deltas = solve_deltas(&model, &values);
        Ok(Self { model, deltas })
    }

    /// Build the model and the mutator together from `(normalized location, value)` pairs.
    ///
    /// Values are checked for compatibility before any model is built.
    pub fn from_masters<S: Into<String>>(
        axes: impl IntoIterator<Item = S>,
        masters: Vec<(Location, Value)>,
    ) -> Result<Self> {
        Self::from_masters_with_origin(axes, masters, &Location::new())
    }

    /// Like [`from_masters`](Self::from_masters), with the model anchored at `origin`.
    pub fn from_masters_with_origin<S: Into<String>>(
        axes: impl IntoIterator<Item = S>,
        masters: Vec<(Location, Value)>,
        origin: &Location,
    ) -> Result<Self> {
        let (locations, values): (Vec<_>, Vec<_>) = masters.into_iter().unzip();
        check_compatible(&values)?;
        let model = VariationModel::with_origin(axes, locations, origin)?;
        Self::new(Arc::new(model), values)
    }

    pub fn model(&self) -> &VariationModel {
        &self.model
    }

    /// Shared handle to the model, for building sibling mutators.
    pub fn shared_model(&self) -> Arc<VariationModel> {
        Arc::clone(&self.model)
    }

    /// `(master input index, delta)` pairs in processing order.
    pub fn deltas(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.model.order().iter().copied().zip(self.deltas.iter())
    }

    /// Interpolate (or extrapolate) the value at a normalized location.
    ///
    /// Axes missing from `location` are at zero; axes unknown to the model
    /// are ignored.
    pub fn evaluate(&self, location: &Location) -> Value {
        let scalars = self.model.scalars_at(location);
        let mut contributions = scalars.iter().zip(&self.deltas).filter(|(s, _)| **s != 0.0);

        let Some((first_scalar, first)) = contributions.next() else {
            // Only reachable if no support covers the location, including the
            // default's, which covers everything.
            return self.deltas[0].scaled(0.0);
        };
        let mut result = first.scaled(*first_scalar);
        for (scalar, delta) in contributions {
            result.add_scaled(delta, *scalar);
        }
        result
    }

    /// Evaluate with separate locations for horizontal and vertical geometry.
    ///
    /// Point x coordinates come from `horizontal`, y coordinates from
    /// `vertical`; scalars come from `horizontal`.
    pub fn evaluate_anisotropic(&self, horizontal: &Location, vertical: &Location) -> Value {
        let h = self.evaluate(horizontal);
        if horizontal == vertical {
            return h;
        }
        let v = self.evaluate(vertical);
        Value::merge_anisotropic(h, &v)
    }
}

fn check_compatible(values: &[Value]) -> Result<()> {
    let Some(reference) = values.first() else {
        return Err(Error::EmptyModel);
    };
    for (master, value) in values.iter().enumerate().skip(1) {
        if let Some(reason) = reference.mismatch(value) {
            return Err(Error::IncompatibleValue { master, reason });
        }
    }
    Ok(())
}

/// Solve deltas in processing order.
///
/// The delta of each master is its value minus what the already solved
/// masters contribute at its location, so evaluating at any master location
/// reproduces that master's value.
fn solve_deltas(model: &VariationModel, values: &[Value]) -> Vec<Value> {
    let mut deltas: Vec<Value> = Vec::with_capacity(values.len());
    for (position, &master) in model.order().iter().enumerate() {
        let mut delta = values[master].clone();
        for &(prev, scalar) in model.delta_weights(position) {
            delta.add_scaled(&deltas[prev], -scalar);
        }
        deltas.push(delta);
    }
    trace!("Solved {} deltas", deltas.len());
    deltas
}
