//! Values attached to masters.

use indexmap::IndexMap;
use kurbo::Point;

/// How a point participates in its contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// First point of an open contour.
    Move,
    Line,
    /// On-curve point ending a cubic segment.
    Curve,
    /// On-curve point ending a quadratic segment.
    QCurve,
    OffCurve,
}

/// The structural signature of a [`PointSequence`].
///
/// Two sequences can only be interpolated when their structures are equal:
/// same point count, same point kinds, same contour boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Structure {
    /// Index of the last point of each contour.
    pub contour_ends: Vec<usize>,
    pub kinds: Vec<PointKind>,
}

/// An ordered sequence of points, grouped into contours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSequence {
    points: Vec<Point>,
    structure: Structure,
}

impl PointSequence {
    /// Build a sequence from contours of `(point, kind)` pairs.
    ///
    /// Empty contours are dropped.
    pub fn from_contours<C>(contours: impl IntoIterator<Item = C>) -> Self
    where
        C: IntoIterator<Item = (Point, PointKind)>,
    {
        let mut sequence = Self::default();
        for contour in contours {
            let start = sequence.points.len();
            for (point, kind) in contour {
                sequence.points.push(point);
                sequence.structure.kinds.push(kind);
            }
            if sequence.points.len() > start {
                sequence.structure.contour_ends.push(sequence.points.len() - 1);
            }
        }
        sequence
    }

    /// A single on-curve point forming its own contour (e.g. a component offset).
    pub fn single(point: Point) -> Self {
        Self::from_contours([[(point, PointKind::Move)]])
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A copy with every coordinate rounded half away from zero.
    pub fn rounded(&self) -> PointSequence {
        PointSequence {
            points: self.points.iter().map(|p| Point::new(p.x.round(), p.y.round())).collect(),
            structure: self.structure.clone(),
        }
    }

    /// Iterate contours as lists of `(point, kind)` pairs.
    pub fn contours(&self) -> impl Iterator<Item = Vec<(Point, PointKind)>> + '_ {
        let mut start = 0;
        self.structure.contour_ends.iter().map(move |&end| {
            let contour = (start..=end)
                .map(|i| (self.points[i], self.structure.kinds[i]))
                .collect();
            start = end + 1;
            contour
        })
    }
}

/// A value that can be interpolated between masters.
///
/// The set of kinds is closed; every operation handles all three.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Points(PointSequence),
    /// Named sub-values, compared and evaluated field by field.
    Record(IndexMap<String, Value>),
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<PointSequence> for Value {
    fn from(value: PointSequence) -> Self {
        Value::Points(value)
    }
}

impl Value {
    /// Build a record from `(name, value)` pairs, keeping their order.
    pub fn record<S: Into<String>>(fields: impl IntoIterator<Item = (S, Value)>) -> Self {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&PointSequence> {
        match self {
            Value::Points(points) => Some(points),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|fields| fields.get(name))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Points(_) => "point sequence",
            Value::Record(_) => "record",
        }
    }

    /// Describe the first structural difference between `self` and `other`,
    /// or `None` if they can be interpolated together.
    pub fn mismatch(&self, other: &Value) -> Option<String> {
        self.mismatch_at(other, "")
    }

    fn mismatch_at(&self, other: &Value, path: &str) -> Option<String> {
        let at = if path.is_empty() { String::new() } else { format!(" at '{path}'") };
        match (self, other) {
            (Value::Scalar(_), Value::Scalar(_)) => None,
            (Value::Points(a), Value::Points(b)) => {
                if a.len() != b.len() {
                    Some(format!("expected {} points, got {}{at}", a.len(), b.len()))
                } else if a.structure.contour_ends != b.structure.contour_ends {
                    Some(format!("contour boundaries differ{at}"))
                } else if a.structure.kinds != b.structure.kinds {
                    Some(format!("point kinds differ{at}"))
                } else {
                    None
                }
            }
            (Value::Record(a), Value::Record(b)) => {
                if !a.keys().eq(b.keys()) {
                    let expected: Vec<_> = a.keys().map(String::as_str).collect();
                    let actual: Vec<_> = b.keys().map(String::as_str).collect();
                    return Some(format!("expected fields {expected:?}, got {actual:?}{at}"));
                }
                a.iter().zip(b.values()).find_map(|((name, a), b)| {
                    let path =
                        if path.is_empty() { name.clone() } else { format!("{path}.{name}") };
                    a.mismatch_at(b, &path)
                })
            }
            (a, b) => Some(format!("expected a {}, got a {}{at}", a.kind_name(), b.kind_name())),
        }
    }

    /// A copy with every number multiplied by `factor`.
    pub(crate) fn scaled(&self, factor: f64) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(v * factor),
            Value::Points(seq) => Value::Points(PointSequence {
                points: seq.points.iter().map(|p| Point::new(p.x * factor, p.y * factor)).collect(),
                structure: seq.structure.clone(),
            }),
            Value::Record(fields) => Value::Record(
                fields.iter().map(|(name, value)| (name.clone(), value.scaled(factor))).collect(),
            ),
        }
    }

    /// `self += other * factor`, element by element.
    ///
    /// Both values must be structurally compatible; mutators check this once
    /// at construction.
    pub(crate) fn add_scaled(&mut self, other: &Value, factor: f64) {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => *a += b * factor,
            (Value::Points(a), Value::Points(b)) => {
                for (p, q) in a.points.iter_mut().zip(&b.points) {
                    p.x += q.x * factor;
                    p.y += q.y * factor;
                }
            }
            (Value::Record(a), Value::Record(b)) => {
                for (field, other_field) in a.values_mut().zip(b.values()) {
                    field.add_scaled(other_field, factor);
                }
            }
            _ => debug_assert!(false, "add_scaled on incompatible values"),
        }
    }

    /// Round every number half away from zero.
    ///
    /// Rounding an already integral value returns it unchanged.
    pub fn rounded(&self) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(v.round()),
            Value::Points(seq) => Value::Points(seq.rounded()),
            Value::Record(fields) => Value::Record(
                fields.iter().map(|(name, value)| (name.clone(), value.rounded())).collect(),
            ),
        }
    }

    /// Combine two evaluations of the same model: x coordinates from
    /// `horizontal`, y coordinates from `vertical`.
    ///
    /// Scalars carry no direction and are taken from `horizontal`.
    pub fn merge_anisotropic(horizontal: Value, vertical: &Value) -> Value {
        match (horizontal, vertical) {
            (Value::Points(mut h), Value::Points(v)) => {
                for (p, q) in h.points.iter_mut().zip(&v.points) {
                    p.y = q.y;
                }
                Value::Points(h)
            }
            (Value::Record(h), Value::Record(v)) => Value::Record(
                h.into_iter()
                    .zip(v.values())
                    .map(|((name, h), v)| (name, Value::merge_anisotropic(h, v)))
                    .collect(),
            ),
            (h, _) => h,
        }
    }
}
