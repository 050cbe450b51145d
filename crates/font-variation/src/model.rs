//! Variation model: master ordering, supports and weights.
//!
//! Implements the region algorithm used by MutatorMath-style tooling and the
//! OpenType variation model: every master gets a box of influence (its
//! support), masters are processed from least to most specific, and the
//! weight of a master at a location is the product of per-axis tent
//! functions over its support.

use std::{cmp::Ordering, collections::HashMap};

use log::{log_enabled, trace};
use ordered_float::OrderedFloat;

use crate::{
    error::{Error, Result},
    location::Location,
};

/// Influence of one master along one axis: zero at `lower` and `upper`,
/// one at `peak`, linear in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tent {
    pub lower: f64,
    pub peak: f64,
    pub upper: f64,
}

impl Tent {
    pub fn new(lower: f64, peak: f64, upper: f64) -> Self {
        Self { lower, peak, upper }
    }
}

/// The region of the design space over which a master has influence.
///
/// Axes without a tent are unconstrained: the master's coordinate on them is
/// zero and they do not limit its influence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Support {
    /// One entry per model axis
    tents: Vec<Option<Tent>>,
}

impl Support {
    /// Tent on the axis at `axis_index` in model axis order.
    pub fn tent(&self, axis_index: usize) -> Option<Tent> {
        self.tents.get(axis_index).copied().flatten()
    }

    /// True for the support of the default master, which applies everywhere.
    pub fn is_default(&self) -> bool {
        self.tents.iter().all(Option::is_none)
    }

    /// Scalar influence at `coords`.
    ///
    /// `ranges` holds the per-axis extent of the master locations. Outside
    /// that extent the outermost tents keep their slope instead of dropping
    /// to zero, which turns evaluation past the last master into linear
    /// extrapolation along the nearest segment.
    fn scalar_at(&self, coords: &[f64], ranges: &[(f64, f64)]) -> f64 {
        let mut scalar = 1.0;

        for (i, tent) in self.tents.iter().enumerate() {
            let Some(Tent { lower, peak, upper }) = *tent else {
                continue;
            };
            let v = coords[i];
            if v == peak {
                continue;
            }

            let (axis_min, axis_max) = ranges[i];
            if v < axis_min && lower <= axis_min {
                if peak <= axis_min && peak < upper {
                    scalar *= (v - upper) / (peak - upper);
                    continue;
                } else if axis_min < peak {
                    scalar *= (v - lower) / (peak - lower);
                    continue;
                }
            } else if axis_max < v && axis_max <= upper {
                if axis_max <= peak && lower < peak {
                    scalar *= (v - lower) / (peak - lower);
                    continue;
                } else if peak < axis_max {
                    scalar *= (v - upper) / (peak - upper);
                    continue;
                }
            }

            if v <= lower || upper <= v {
                return 0.0;
            }
            if v < peak {
                scalar *= (v - lower) / (peak - lower);
            } else {
                scalar *= (v - upper) / (peak - upper);
            }
        }

        scalar
    }
}

/// A variation model over a fixed set of normalized master locations.
///
/// Immutable once built; share it between mutators with an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationModel {
    axes: Vec<String>,
    origin: Location,
    /// Master locations in input order
    locations: Vec<Location>,
    /// order[k] = input index of the k-th processed master
    order: Vec<usize>,
    /// positions[i] = processing position of input master i
    positions: Vec<usize>,
    /// Everything below is in processing order
    supports: Vec<Support>,
    /// delta_weights[k] = (j, scalar of master j at master k) for j < k, non-zero only
    delta_weights: Vec<Vec<(usize, f64)>>,
    axis_ranges: Vec<(f64, f64)>,
}

impl VariationModel {
    /// Build a model whose default master sits at the all-zero location.
    ///
    /// Axes missing from a location count as zero.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyModel` if `locations` is empty
    /// - `Error::UnknownAxis` if a location uses an axis not in `axes`
    /// - `Error::DuplicateLocation` if two masters share a location
    /// - `Error::MissingDefaultMaster` if no master is at the origin
    pub fn new<S: Into<String>>(
        axes: impl IntoIterator<Item = S>,
        locations: Vec<Location>,
    ) -> Result<Self> {
        Self::with_origin(axes, locations, &Location::new())
    }

    /// Build a model anchored at `origin` instead of the all-zero location.
    ///
    /// Locations (both master and query locations) are taken relative to
    /// `origin`, which must coincide with one of the masters.
    pub fn with_origin<S: Into<String>>(
        axes: impl IntoIterator<Item = S>,
        locations: Vec<Location>,
        origin: &Location,
    ) -> Result<Self> {
        let axes: Vec<String> = axes.into_iter().map(Into::into).collect();
        if locations.is_empty() {
            return Err(Error::EmptyModel);
        }

        let origin_coords = fit_to_axes(&axes, origin)?;
        let mut coords = Vec::with_capacity(locations.len());
        for location in &locations {
            let fitted = fit_to_axes(&axes, location)?;
            coords.push(
                fitted
                    .iter()
                    .zip(&origin_coords)
                    .map(|(v, o)| clean_zero(v - o))
                    .collect::<Vec<f64>>(),
            );
        }

        for (second, location) in coords.iter().enumerate() {
            if let Some(first) = coords[..second].iter().position(|other| other == location) {
                return Err(Error::DuplicateLocation {
                    first,
                    second,
                    location: locations[second].clone(),
                });
            }
        }
        if !coords.iter().any(|c| c.iter().all(|v| *v == 0.0)) {
            return Err(Error::MissingDefaultMaster(origin.clone()));
        }

        let order = processing_order(&coords);
        let mut positions = vec![0; order.len()];
        for (position, &master) in order.iter().enumerate() {
            positions[master] = position;
        }
        let coords: Vec<Vec<f64>> = order.iter().map(|&i| coords[i].clone()).collect();
        let axis_ranges = axis_ranges(axes.len(), &coords);
        let supports = master_supports(&coords, &axis_ranges);
        let delta_weights = delta_weights(&coords, &supports, &axis_ranges);

        if log_enabled!(log::Level::Trace) {
            trace!("Variation model over {axes:?} anchored at {origin}");
            for (k, &i) in order.iter().enumerate() {
                trace!("  {} {:?} {:?}", locations[i], supports[k].tents, delta_weights[k]);
            }
        }

        Ok(Self {
            axes,
            origin: origin.clone(),
            locations,
            order,
            positions,
            supports,
            delta_weights,
            axis_ranges,
        })
    }

    /// Build a model anchored at the master chosen by [`bias_from_locations`].
    ///
    /// This synthesizes a default when none of the masters sits at the
    /// all-zero location.
    pub fn with_bias<S: Into<String>>(
        axes: impl IntoIterator<Item = S>,
        locations: Vec<Location>,
    ) -> Result<Self> {
        let axes: Vec<String> = axes.into_iter().map(Into::into).collect();
        let origin = bias_from_locations(&axes, &locations).ok_or(Error::EmptyModel)?;
        Self::with_origin(axes, locations, &origin)
    }

    /// Number of masters.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Always false: a model cannot be built without masters.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn axis_names(&self) -> &[String] {
        &self.axes
    }

    pub fn origin(&self) -> &Location {
        &self.origin
    }

    /// Master locations, in the order they were given.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Processing order: the input index of each master, least specific first.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Support of the master at input index `master`.
    pub fn support(&self, master: usize) -> &Support {
        &self.supports[self.positions[master]]
    }

    /// `(input index, support)` pairs in processing order.
    pub fn supports(&self) -> impl Iterator<Item = (usize, &Support)> {
        self.order.iter().copied().zip(self.supports.iter())
    }

    /// Weight of the master at input index `master` at `location`.
    pub fn scalar_for(&self, master: usize, location: &Location) -> f64 {
        let coords = self.localize(location);
        self.supports[self.positions[master]].scalar_at(&coords, &self.axis_ranges)
    }

    /// Weights of all masters at `location`, in input order.
    pub fn weights_at(&self, location: &Location) -> Vec<f64> {
        let mut weights = vec![0.0; self.len()];
        for (scalar, &master) in self.scalars_at(location).into_iter().zip(&self.order) {
            weights[master] = scalar;
        }
        weights
    }

    /// Weights of all masters at `location`, in processing order.
    ///
    /// Axes not in the model are ignored; missing axes count as zero.
    pub(crate) fn scalars_at(&self, location: &Location) -> Vec<f64> {
        let coords = self.localize(location);
        self.supports
            .iter()
            .map(|support| support.scalar_at(&coords, &self.axis_ranges))
            .collect()
    }

    pub(crate) fn delta_weights(&self, position: usize) -> &[(usize, f64)] {
        &self.delta_weights[position]
    }

    fn localize(&self, location: &Location) -> Vec<f64> {
        self.axes
            .iter()
            .map(|axis| location.get_or_zero(axis) - self.origin.get_or_zero(axis))
            .collect()
    }
}

/// Pick the master location best suited as the model origin.
///
/// Returns the all-zero location if present. Otherwise picks the location
/// with the most other locations aligned with it (differing on at most one
/// axis), preferring the lowest coordinates in axis order on ties. Returns
/// `None` for an empty slice.
pub fn bias_from_locations(axes: &[String], locations: &[Location]) -> Option<Location> {
    let coords: Vec<Vec<f64>> = locations
        .iter()
        .map(|loc| axes.iter().map(|axis| loc.get_or_zero(axis)).collect())
        .collect();

    if let Some(origin) = coords.iter().position(|c| c.iter().all(|v| *v == 0.0)) {
        return Some(locations[origin].clone());
    }

    let aligned = |candidate: &[f64]| {
        coords
            .iter()
            .filter(|other| other.iter().zip(candidate).filter(|(a, b)| a != b).count() <= 1)
            .count()
    };

    (0..coords.len())
        .max_by(|&a, &b| {
            aligned(&coords[a]).cmp(&aligned(&coords[b])).then_with(|| {
                // reversed so that the lowest coordinates win the max
                coords[b]
                    .iter()
                    .zip(&coords[a])
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            })
        })
        .map(|best| locations[best].clone())
}

fn fit_to_axes(axes: &[String], location: &Location) -> Result<Vec<f64>> {
    if let Some(unknown) = location.axes().find(|name| !axes.iter().any(|a| a == name)) {
        return Err(Error::UnknownAxis(unknown.to_string()));
    }
    Ok(axes.iter().map(|axis| location.get_or_zero(axis)).collect())
}

fn clean_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Sort key for a master location.
///
/// From most to least influential: the default, then masters on a single
/// axis, then corners and other multi-axis masters. Remaining ties are broken
/// by axis, sign and magnitude so the order is reproducible.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct LocationSortKey {
    /// Number of non-zero coordinates
    rank: usize,
    /// -1 for every coordinate that matches a master sitting on that axis alone
    on_axis_points: i32,
    /// Indices of the non-zero axes
    active_axes: Vec<usize>,
    axis_value_signs: Vec<i8>,
    axis_value_abs: Vec<OrderedFloat<f64>>,
}

fn processing_order(coords: &[Vec<f64>]) -> Vec<usize> {
    // axis index -> coordinates of masters that are non-zero on that axis only
    let mut on_axis_points: HashMap<usize, Vec<f64>> = HashMap::new();
    for location in coords {
        let mut active = location.iter().enumerate().filter(|(_, v)| **v != 0.0);
        if let (Some((axis, value)), None) = (active.next(), active.next()) {
            on_axis_points.entry(axis).or_default().push(*value);
        }
    }

    let key_for = |location: &[f64]| {
        let active: Vec<(usize, f64)> = location
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| *v != 0.0)
            .collect();
        let on_axis = active
            .iter()
            .filter(|(axis, v)| on_axis_points.get(axis).is_some_and(|points| points.contains(v)))
            .count();
        LocationSortKey {
            rank: active.len(),
            on_axis_points: -(on_axis as i32),
            active_axes: active.iter().map(|(axis, _)| *axis).collect(),
            axis_value_signs: active.iter().map(|(_, v)| if *v > 0.0 { 1 } else { -1 }).collect(),
            axis_value_abs: active.iter().map(|(_, v)| OrderedFloat(v.abs())).collect(),
        }
    };

    let mut order: Vec<usize> = (0..coords.len()).collect();
    order.sort_by_cached_key(|&i| key_for(&coords[i]));
    order
}

/// Per-axis extent of the master locations, always including the origin.
fn axis_ranges(axis_count: usize, coords: &[Vec<f64>]) -> Vec<(f64, f64)> {
    (0..axis_count)
        .map(|axis| {
            coords.iter().fold((0.0_f64, 0.0_f64), |(min, max), location| {
                (min.min(location[axis]), max.max(location[axis]))
            })
        })
        .collect()
}

/// Compute the support of every master, in processing order.
///
/// Each master starts with a box reaching from the origin to the outermost
/// master on its side of every active axis. The box is then cut by each
/// earlier master with the same active axes that falls inside it, along the
/// axis (or axes) where the cut keeps the largest share of the box.
fn master_supports(coords: &[Vec<f64>], ranges: &[(f64, f64)]) -> Vec<Support> {
    let mut supports: Vec<Support> = Vec::with_capacity(coords.len());

    for location in coords {
        let mut tents: Vec<Option<Tent>> = location
            .iter()
            .zip(ranges)
            .map(|(&peak, &(min, max))| match peak.partial_cmp(&0.0) {
                Some(Ordering::Greater) => Some(Tent::new(0.0, peak, max)),
                Some(Ordering::Less) => Some(Tent::new(min, peak, 0.0)),
                _ => None,
            })
            .collect();

        for prev in &supports {
            let same_axes = tents.iter().zip(&prev.tents).all(|(a, b)| a.is_some() == b.is_some());
            if !same_axes {
                continue;
            }

            let inside = tents.iter().zip(&prev.tents).all(|(tent, prev)| match (tent, prev) {
                (Some(tent), Some(prev)) => {
                    prev.peak == tent.peak || (tent.lower < prev.peak && prev.peak < tent.upper)
                }
                _ => true,
            });
            if !inside {
                continue;
            }

            let mut best_ratio = -1.0;
            let mut best: Vec<(usize, Tent)> = Vec::new();
            for (axis, (tent, prev)) in tents.iter().zip(&prev.tents).enumerate() {
                let (Some(tent), Some(prev)) = (tent, prev) else {
                    continue;
                };
                let mut cut = *tent;
                let ratio = match prev.peak.partial_cmp(&tent.peak) {
                    Some(Ordering::Less) => {
                        cut.lower = prev.peak;
                        (prev.peak - tent.peak) / (tent.lower - tent.peak)
                    }
                    Some(Ordering::Greater) => {
                        cut.upper = prev.peak;
                        (prev.peak - tent.peak) / (tent.upper - tent.peak)
                    }
                    _ => continue,
                };
                if ratio > best_ratio {
                    best.clear();
                    best_ratio = ratio;
                }
                if ratio == best_ratio {
                    best.push((axis, cut));
                }
            }
            for (axis, cut) in best {
                tents[axis] = Some(cut);
            }
        }

        supports.push(Support { tents });
    }

    supports
}

/// For every master, the non-zero scalars of the earlier masters at its location.
fn delta_weights(
    coords: &[Vec<f64>],
    supports: &[Support],
    ranges: &[(f64, f64)],
) -> Vec<Vec<(usize, f64)>> {
    coords
        .iter()
        .enumerate()
        .map(|(k, location)| {
            supports[..k]
                .iter()
                .enumerate()
                .filter_map(|(j, support)| {
                    let scalar = support.scalar_at(location, ranges);
                    (scalar != 0.0).then_some((j, scalar))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tents(model: &VariationModel, master: usize) -> Vec<Option<(f64, f64, f64)>> {
        let support = model.support(master);
        (0..model.axis_names().len())
            .map(|axis| support.tent(axis).map(|t| (t.lower, t.peak, t.upper)))
            .collect()
    }

    fn loc(wght: f64, wdth: f64) -> Location {
        Location::from([("wght", wght), ("wdth", wdth)])
    }

    #[test]
    fn scalar_at_peak_and_between() {
        let support = Support { tents: vec![Some(Tent::new(0.0, 1.0, 1.0)), None] };
        let ranges = [(0.0, 1.0), (0.0, 0.0)];
        assert_eq!(support.scalar_at(&[1.0, 0.0], &ranges), 1.0);
        assert!((support.scalar_at(&[0.5, 0.7], &ranges) - 0.5).abs() < 1e-9);
        assert_eq!(support.scalar_at(&[0.0, 0.0], &ranges), 0.0);
    }

    #[test]
    fn scalar_extrapolates_past_outermost_master() {
        let support = Support { tents: vec![Some(Tent::new(0.0, 1.0, 1.0))] };
        let ranges = [(0.0, 1.0)];
        assert!((support.scalar_at(&[1.5], &ranges) - 1.5).abs() < 1e-9);
        assert!((support.scalar_at(&[-0.5], &ranges) - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn order_is_by_rank_then_axis() {
        let model = VariationModel::new(
            ["wght", "wdth"],
            vec![loc(1.0, 1.0), loc(0.0, 1.0), loc(0.0, 0.0), loc(1.0, 0.0), loc(-1.0, 0.0)],
        )
        .unwrap();
        // default, weight masters (negative first), width master, corner
        assert_eq!(model.order(), &[2, 4, 3, 1, 0]);
    }

    #[test]
    fn order_does_not_depend_on_input_order() {
        let locations = vec![loc(0.0, 0.0), loc(1.0, 0.0), loc(0.0, 1.0), loc(0.5, 0.0)];
        let forward = VariationModel::new(["wght", "wdth"], locations.clone()).unwrap();
        let mut reversed_locations = locations.clone();
        reversed_locations.reverse();
        let reversed = VariationModel::new(["wght", "wdth"], reversed_locations).unwrap();

        let forward_locs: Vec<_> = forward.order().iter().map(|&i| &locations[i]).collect();
        let reversed_locs: Vec<_> =
            reversed.order().iter().map(|&i| &reversed.locations()[i]).collect();
        assert_eq!(forward_locs, reversed_locs);
    }

    #[test]
    fn supports_for_intermediate_master() {
        let model = VariationModel::new(
            ["wght"],
            vec![
                Location::from([("wght", 0.0)]),
                Location::from([("wght", 0.5)]),
                Location::from([("wght", 1.0)]),
            ],
        )
        .unwrap();

        assert!(model.support(0).is_default());
        assert_eq!(tents(&model, 1), vec![Some((0.0, 0.5, 1.0))]);
        assert_eq!(tents(&model, 2), vec![Some((0.5, 1.0, 1.0))]);
    }

    #[test]
    fn supports_for_corner_masters() {
        let model = VariationModel::new(
            ["wght", "wdth"],
            vec![loc(0.0, 0.0), loc(1.0, 0.0), loc(0.0, 1.0), loc(1.0, 1.0), loc(0.5, 1.0)],
        )
        .unwrap();

        assert_eq!(tents(&model, 1), vec![Some((0.0, 1.0, 1.0)), None]);
        assert_eq!(tents(&model, 2), vec![None, Some((0.0, 1.0, 1.0))]);
        // (1, 1) lines up with both on-axis masters, so it comes before (0.5, 1)
        // and keeps its full box
        assert_eq!(model.order(), &[0, 1, 2, 3, 4]);
        assert_eq!(tents(&model, 3), vec![Some((0.0, 1.0, 1.0)), Some((0.0, 1.0, 1.0))]);
        assert_eq!(tents(&model, 4), vec![Some((0.0, 0.5, 1.0)), Some((0.0, 1.0, 1.0))]);
    }

    #[test]
    fn supports_for_diagonal_masters() {
        let model = VariationModel::new(
            ["wght", "wdth"],
            vec![loc(0.0, 0.0), loc(1.0, 1.0), loc(0.5, 0.5)],
        )
        .unwrap();

        assert_eq!(model.order(), &[0, 2, 1]);
        assert_eq!(tents(&model, 2), vec![Some((0.0, 0.5, 1.0)), Some((0.0, 0.5, 1.0))]);
        // both axes cut the box by the same ratio, so both are cut
        assert_eq!(tents(&model, 1), vec![Some((0.5, 1.0, 1.0)), Some((0.5, 1.0, 1.0))]);
    }

    #[test]
    fn weights_sum_for_bilinear_grid() {
        let model = VariationModel::new(
            ["wght", "wdth"],
            vec![loc(0.0, 0.0), loc(1.0, 0.0), loc(0.0, 1.0), loc(1.0, 1.0)],
        )
        .unwrap();
        let weights = model.weights_at(&loc(0.5, 0.5));
        assert_eq!(weights, vec![1.0, 0.5, 0.5, 0.25]);
        assert_eq!(model.scalar_for(3, &loc(0.5, 0.5)), 0.25);
    }

    #[test]
    fn duplicate_locations_are_rejected() {
        let err = VariationModel::new(
            ["wght"],
            vec![Location::new(), Location::from([("wght", 1.0)]), Location::from([("wght", 1.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateLocation { first: 1, second: 2, .. }));
    }

    #[test]
    fn missing_default_is_rejected() {
        let err = VariationModel::new(
            ["wght"],
            vec![Location::from([("wght", -1.0)]), Location::from([("wght", 1.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingDefaultMaster(_)));
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = VariationModel::new(["wght"], Vec::new()).unwrap_err();
        assert_eq!(err, Error::EmptyModel);
    }

    #[test]
    fn unknown_axis_is_rejected() {
        let err =
            VariationModel::new(["wght"], vec![Location::new(), Location::from([("opsz", 1.0)])])
                .unwrap_err();
        assert_eq!(err, Error::UnknownAxis("opsz".to_string()));
    }

    #[test]
    fn bias_prefers_origin() {
        let axes = vec!["wght".to_string()];
        let locations = vec![Location::from([("wght", 1.0)]), Location::from([("wght", 0.0)])];
        assert_eq!(bias_from_locations(&axes, &locations), Some(locations[1].clone()));
    }

    #[test]
    fn bias_picks_lowest_aligned_corner() {
        let axes = vec!["wght".to_string(), "wdth".to_string()];
        let locations = vec![loc(1000.0, 100.0), loc(0.0, 100.0), loc(1000.0, 0.0), loc(0.0, 0.0)];
        // (0, 0) is the origin here, so take a grid without one
        let shifted: Vec<_> =
            locations.iter().map(|l| l.offset_by(&loc(-10.0, -10.0))).collect();
        assert_eq!(bias_from_locations(&axes, &shifted), Some(loc(10.0, 10.0)));
    }

    #[test]
    fn with_bias_anchors_at_chosen_master() {
        let model = VariationModel::with_bias(
            ["wght"],
            vec![Location::from([("wght", 1.0)]), Location::from([("wght", -1.0)])],
        )
        .unwrap();
        assert_eq!(model.origin(), &Location::from([("wght", -1.0)]));
        assert_eq!(model.order(), &[1, 0]);
    }
}
