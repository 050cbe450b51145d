//! Glyph data and its interpolatable form.

use fontmutator_variation::{PointSequence, Value};
use kurbo::{Affine, Point};

/// A reference to another glyph, placed with an affine transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub transform: Affine,
}

impl Component {
    pub fn new(base: impl Into<String>, transform: Affine) -> Self {
        Self { base: base.into(), transform }
    }

    /// A component shifted by `(dx, dy)` without scaling.
    pub fn offset(base: impl Into<String>, dx: f64, dy: f64) -> Self {
        Self::new(base, Affine::translate((dx, dy)))
    }
}

/// One glyph of a source or an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub advance: f64,
    pub outline: PointSequence,
    pub components: Vec<Component>,
    pub unicodes: Vec<u32>,
}

impl Glyph {
    pub fn new(advance: f64) -> Self {
        Self { advance, ..Default::default() }
    }

    pub fn with_outline(mut self, outline: PointSequence) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_unicodes(mut self, unicodes: impl IntoIterator<Item = u32>) -> Self {
        self.unicodes = unicodes.into_iter().collect();
        self
    }

    /// The glyph as a record of advance, outline and components.
    ///
    /// Components are keyed `base#index`, so two glyphs only interpolate
    /// when they reference the same bases in the same order. Unicodes are
    /// not part of the value.
    pub fn to_value(&self) -> Value {
        let components = self.components.iter().enumerate().map(|(i, component)| {
            let [xx, xy, yx, yy, dx, dy] = component.transform.as_coeffs();
            let fields = Value::record([
                ("offset", Value::Points(PointSequence::single(Point::new(dx, dy)))),
                ("xx", Value::Scalar(xx)),
                ("xy", Value::Scalar(xy)),
                ("yx", Value::Scalar(yx)),
                ("yy", Value::Scalar(yy)),
            ]);
            (format!("{}#{i}", component.base), fields)
        });
        Value::record([
            ("advance", Value::Scalar(self.advance)),
            ("outline", Value::Points(self.outline.clone())),
            ("components", Value::record(components)),
        ])
    }

    /// Rebuild a glyph from a value produced by [`to_value`](Self::to_value)
    /// (or by interpolating such values).
    ///
    /// Returns `None` if the value does not have that layout.
    pub fn from_value(value: &Value, unicodes: Vec<u32>) -> Option<Glyph> {
        let advance = value.field("advance")?.as_scalar()?;
        let outline = value.field("outline")?.as_points()?.clone();
        let components = value
            .field("components")?
            .as_record()?
            .iter()
            .map(|(key, fields)| {
                let (base, _) = key.rsplit_once('#')?;
                let offset = *fields.field("offset")?.as_points()?.points().first()?;
                let coeff = |name| fields.field(name).and_then(Value::as_scalar);
                let transform = Affine::new([
                    coeff("xx")?,
                    coeff("xy")?,
                    coeff("yx")?,
                    coeff("yy")?,
                    offset.x,
                    offset.y,
                ]);
                Some(Component::new(base, transform))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Glyph { advance, outline, components, unicodes })
    }

    /// Round coordinates, advance and component offsets half away from zero.
    ///
    /// Component scale and skew are left untouched.
    pub fn rounded(&self) -> Glyph {
        Glyph {
            advance: self.advance.round(),
            outline: self.outline.rounded(),
            components: self
                .components
                .iter()
                .map(|component| {
                    let [xx, xy, yx, yy, dx, dy] = component.transform.as_coeffs();
                    let transform = Affine::new([xx, xy, yx, yy, dx.round(), dy.round()]);
                    Component::new(component.base.clone(), transform)
                })
                .collect(),
            unicodes: self.unicodes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use fontmutator_variation::PointKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn glyph() -> Glyph {
        Glyph::new(500.5)
            .with_outline(PointSequence::from_contours([[
                (Point::new(10.4, 0.0), PointKind::Line),
                (Point::new(250.5, 700.0), PointKind::Line),
                (Point::new(-0.5, 0.0), PointKind::Line),
            ]]))
            .with_component(Component::new(
                "acute#alt",
                Affine::new([0.5, 0.0, 0.0, 0.5, 100.5, 600.2]),
            ))
            .with_unicodes([0x41])
    }

    #[test]
    fn value_layout_is_reversible() {
        let glyph = glyph();
        let value = glyph.to_value();
        assert!(value.field("components").unwrap().field("acute#alt#0").is_some());
        assert_eq!(Glyph::from_value(&value, vec![0x41]), Some(glyph));
    }

    #[test]
    fn component_bases_are_part_of_the_structure() {
        let a = Glyph::new(500.0).with_component(Component::offset("acute", 0.0, 0.0));
        let b = Glyph::new(500.0).with_component(Component::offset("grave", 0.0, 0.0));
        assert!(a.to_value().mismatch(&b.to_value()).is_some());
    }

    #[test]
    fn foreign_value_is_rejected() {
        assert_eq!(Glyph::from_value(&Value::Scalar(1.0), Vec::new()), None);
    }

    #[test]
    fn rounding_keeps_component_scale() {
        let rounded = glyph().rounded();
        assert_eq!(rounded.advance, 501.0);
        assert_eq!(rounded.outline.points()[0], Point::new(10.0, 0.0));
        assert_eq!(rounded.outline.points()[2], Point::new(-1.0, 0.0));
        assert_eq!(
            rounded.components[0].transform.as_coeffs(),
            [0.5, 0.0, 0.0, 0.5, 101.0, 600.0]
        );
    }
}
