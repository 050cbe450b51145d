//! Locations in a design space.

use std::{collections::BTreeMap, fmt};

/// A point in a design space, as a mapping from axis name to coordinate.
///
/// The same type is used for user-space and normalized locations; which one
/// a value holds is determined by where it came from. Missing axes are
/// interpreted by the consumer (an [`AxisSpace`] fills in axis defaults, a
/// [`VariationModel`] treats them as zero).
///
/// [`AxisSpace`]: crate::AxisSpace
/// [`VariationModel`]: crate::VariationModel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    coords: BTreeMap<String, f64>,
}

impl Location {
    /// Create an empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this location with `axis` set to `value`.
    pub fn with(mut self, axis: impl Into<String>, value: f64) -> Self {
        self.coords.insert(axis.into(), clean_zero(value));
        self
    }

    /// Coordinate on `axis`, if present.
    pub fn get(&self, axis: &str) -> Option<f64> {
        self.coords.get(axis).copied()
    }

    /// Coordinate on `axis`, or zero.
    pub fn get_or_zero(&self, axis: &str) -> f64 {
        self.get(axis).unwrap_or(0.0)
    }

    pub fn contains(&self, axis: &str) -> bool {
        self.coords.contains_key(axis)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate `(axis, coordinate)` pairs in axis name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Axis names present in this location.
    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(String::as_str)
    }

    /// True if every coordinate is zero (or the location is empty).
    pub fn is_origin(&self) -> bool {
        self.coords.values().all(|v| *v == 0.0)
    }

    /// Number of axes with a non-zero coordinate.
    pub fn rank(&self) -> usize {
        self.coords.values().filter(|v| **v != 0.0).count()
    }

    /// Subtract `other` axis by axis; axes missing on either side count as zero.
    pub fn offset_by(&self, other: &Location) -> Location {
        let mut result = self.clone();
        for (axis, value) in other.iter() {
            let current = result.get_or_zero(axis);
            result.coords.insert(axis.to_string(), clean_zero(current - value));
        }
        result
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Location {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().map(|(k, v)| (k.into(), clean_zero(v))).collect(),
        }
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for Location {
    fn from(value: [(S, f64); N]) -> Self {
        value.into_iter().collect()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (axis, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{axis}: {value}")?;
        }
        f.write_str("}")
    }
}

// -0.0 and 0.0 must compare and sort identically.
fn clean_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_and_rank() {
        let loc = Location::from([("wght", 0.0), ("wdth", 0.0)]);
        assert!(loc.is_origin());
        assert_eq!(loc.rank(), 0);

        let loc = loc.with("wght", 0.5);
        assert!(!loc.is_origin());
        assert_eq!(loc.rank(), 1);
    }

    #[test]
    fn structural_equality() {
        let a = Location::from([("wght", 1.0), ("wdth", -0.0)]);
        let b = Location::new().with("wdth", 0.0).with("wght", 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn offset_fills_missing_axes() {
        let a = Location::from([("wght", 1.0)]);
        let b = Location::from([("wght", 0.5), ("wdth", -1.0)]);
        assert_eq!(a.offset_by(&b), Location::from([("wght", 0.5), ("wdth", 1.0)]));
    }

    #[test]
    fn display() {
        let loc = Location::from([("wght", 1.0), ("ital", 0.5)]);
        assert_eq!(loc.to_string(), "{ital: 0.5, wght: 1}");
    }
}
