//! Design axes and coordinate normalization.

use crate::{
    error::{Error, Result},
    location::Location,
};

/// A design axis (e.g. weight or width).
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    name: String,
    minimum: f64,
    default: f64,
    maximum: f64,
    /// (user, design) breakpoints, sorted by user value
    map: Vec<(f64, f64)>,
    discrete: bool,
}

impl Axis {
    /// Create a continuous axis without a user-to-design map.
    ///
    /// # Errors
    ///
    /// `Error::AxisRange` unless `minimum <= default <= maximum`.
    pub fn new(name: &str, minimum: f64, default: f64, maximum: f64) -> Result<Self> {
        if !(minimum <= default && default <= maximum) {
            return Err(Error::AxisRange {
                axis: name.to_string(),
                minimum,
                default,
                maximum,
            });
        }
        Ok(Self {
            name: name.to_string(),
            minimum,
            default,
            maximum,
            map: Vec::new(),
            discrete: false,
        })
    }

    /// Set the piecewise-linear user-to-design map.
    ///
    /// Breakpoints are `(user, design)` pairs and may be given in any order.
    pub fn with_map(mut self, map: impl IntoIterator<Item = (f64, f64)>) -> Self {
        self.map = map.into_iter().collect();
        self.map.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.map.dedup_by(|a, b| a.0 == b.0);
        self
    }

    /// Mark the axis discrete: its coordinates are matched exactly and never
    /// interpolated.
    pub fn with_discrete(mut self, discrete: bool) -> Self {
        self.discrete = discrete;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn default(&self) -> f64 {
        self.default
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn is_discrete(&self) -> bool {
        self.discrete
    }

    /// Map a user coordinate to a design coordinate.
    ///
    /// Values outside the breakpoints continue along the nearest segment.
    pub fn map_forward(&self, value: f64) -> f64 {
        match self.map.as_slice() {
            [] => value,
            [(input, output)] => value + (output - input),
            map => {
                let last = map.len() - 1;
                let segment = map
                    .windows(2)
                    .position(|pair| value <= pair[1].0)
                    .unwrap_or(last - 1);
                let (a, b) = (map[segment], map[segment + 1]);
                if b.0 == a.0 {
                    return a.1;
                }
                a.1 + (value - a.0) * (b.1 - a.1) / (b.0 - a.0)
            }
        }
    }

    /// Normalize a user coordinate.
    ///
    /// The default maps to 0, the minimum to -1 and the maximum to +1, linearly
    /// in design space on each side of the default. Values outside the axis
    /// range are not clamped: they extrapolate along the nearest side. When one
    /// side of the axis is empty, the other side's scale is used.
    ///
    /// Discrete axes return the coordinate unchanged.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.discrete {
            return value;
        }
        let value = self.map_forward(value);
        let minimum = self.map_forward(self.minimum);
        let default = self.map_forward(self.default);
        let maximum = self.map_forward(self.maximum);

        let below = default - minimum;
        let above = maximum - default;
        let span = match (value < default, below > 0.0, above > 0.0) {
            (true, true, _) | (false, true, false) => below,
            (true, false, true) | (false, _, true) => above,
            _ => return 0.0,
        };
        let normalized = (value - default) / span;
        if normalized == 0.0 { 0.0 } else { normalized }
    }

    /// A copy of this axis whose default is `neutral`.
    ///
    /// The range is widened to include the new default, so a master placed
    /// outside the authored range can still anchor the axis.
    pub fn rebased(&self, neutral: f64) -> Axis {
        Axis {
            minimum: self.minimum.min(neutral),
            default: neutral,
            maximum: self.maximum.max(neutral),
            ..self.clone()
        }
    }
}

/// An ordered set of axes, used to validate and normalize locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisSpace {
    axes: Vec<Axis>,
}

impl AxisSpace {
    pub fn new(axes: Vec<Axis>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    /// Names of the continuous axes, in declaration order.
    pub fn continuous_names(&self) -> Vec<String> {
        self.axes
            .iter()
            .filter(|axis| !axis.discrete)
            .map(|axis| axis.name.clone())
            .collect()
    }

    /// The user-space location of every axis default.
    pub fn default_location(&self) -> Location {
        self.axes.iter().map(|axis| (axis.name.as_str(), axis.default)).collect()
    }

    /// Fill in defaults for missing axes.
    ///
    /// # Errors
    ///
    /// `Error::UnknownAxis` if `location` names an axis not in this space.
    pub fn complete(&self, location: &Location) -> Result<Location> {
        if let Some(unknown) = location.axes().find(|name| self.get(name).is_none()) {
            return Err(Error::UnknownAxis(unknown.to_string()));
        }
        Ok(self
            .axes
            .iter()
            .map(|axis| (axis.name.as_str(), location.get(&axis.name).unwrap_or(axis.default)))
            .collect())
    }

    /// Normalize a user-space location on every axis.
    pub fn normalize(&self, location: &Location) -> Result<Location> {
        let complete = self.complete(location)?;
        Ok(self
            .axes
            .iter()
            .map(|axis| (axis.name.as_str(), axis.normalize(complete.get_or_zero(&axis.name))))
            .collect())
    }

    /// Split a location into its continuous and discrete coordinates.
    pub fn split_discrete(&self, location: &Location) -> (Location, Location) {
        let (discrete, continuous): (Vec<_>, Vec<_>) = location
            .iter()
            .partition(|(name, _)| self.get(name).is_some_and(Axis::is_discrete));
        (continuous.into_iter().collect(), discrete.into_iter().collect())
    }

    /// The continuous axes only.
    pub fn continuous(&self) -> AxisSpace {
        AxisSpace::new(self.axes.iter().filter(|axis| !axis.discrete).cloned().collect())
    }

    /// Re-anchor every axis named in `neutral` at that coordinate.
    pub fn rebased(&self, neutral: &Location) -> AxisSpace {
        AxisSpace::new(
            self.axes
                .iter()
                .map(|axis| match neutral.get(&axis.name) {
                    Some(value) if !axis.discrete => axis.rebased(value),
                    _ => axis.clone(),
                })
                .collect(),
        )
    }
}
