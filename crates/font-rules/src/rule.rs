//! Conditions, condition sets and rules.

use fontmutator_variation::Location;
use indexmap::IndexMap;

/// A closed range on one axis. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Condition {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl Condition {
    pub fn range(minimum: f64, maximum: f64) -> Self {
        Self { minimum: Some(minimum), maximum: Some(maximum) }
    }

    pub fn at_least(minimum: f64) -> Self {
        Self { minimum: Some(minimum), maximum: None }
    }

    pub fn at_most(maximum: f64) -> Self {
        Self { minimum: None, maximum: Some(maximum) }
    }

    /// True if `value` lies within the bounds, both ends included.
    pub fn contains(&self, value: f64) -> bool {
        self.minimum.is_none_or(|min| value >= min) && self.maximum.is_none_or(|max| value <= max)
    }

    /// Describe why the condition can never be evaluated meaningfully.
    pub(crate) fn problem(&self) -> Option<String> {
        match (self.minimum, self.maximum) {
            (None, None) => Some("both bounds are missing".to_string()),
            (Some(min), Some(max)) if min > max => {
                Some(format!("minimum {min} is greater than maximum {max}"))
            }
            (min, max) if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) => {
                Some("bound is NaN".to_string())
            }
            _ => None,
        }
    }
}

/// Conditions that must all hold at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    conditions: IndexMap<String, Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the condition on `axis`.
    pub fn with(mut self, axis: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(axis.into(), condition);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(axis, condition)| (axis.as_str(), condition))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True if every condition holds at `location`.
    ///
    /// `location` must carry a coordinate for every axis a condition names;
    /// a missing coordinate fails the condition. An empty set always holds.
    pub fn is_satisfied_by(&self, location: &Location) -> bool {
        self.conditions
            .iter()
            .all(|(axis, condition)| location.get(axis).is_some_and(|v| condition.contains(v)))
    }
}

impl<S: Into<String>> FromIterator<(S, Condition)> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = (S, Condition)>>(iter: I) -> Self {
        Self { conditions: iter.into_iter().map(|(axis, c)| (axis.into(), c)).collect() }
    }
}

/// A location-triggered list of glyph substitutions.
///
/// The rule fires when any of its condition sets holds. A rule without
/// condition sets never fires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub name: String,
    pub condition_sets: Vec<ConditionSet>,
    /// `(from, to)` glyph name pairs, in declaration order
    pub substitutions: Vec<(String, String)>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_condition_set(mut self, set: ConditionSet) -> Self {
        self.condition_sets.push(set);
        self
    }

    pub fn with_substitution(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.substitutions.push((from.into(), to.into()));
        self
    }

    /// True if any condition set holds at `location`.
    pub fn fires_at(&self, location: &Location) -> bool {
        self.condition_sets.iter().any(|set| set.is_satisfied_by(location))
    }

    /// The replacement for `name` under this rule, if any.
    ///
    /// Only the first substitution whose source is `name` applies; a rule
    /// does not chain with itself.
    pub fn substitute(&self, name: &str) -> Option<&str> {
        self.substitutions
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let condition = Condition::range(400.0, 700.0);
        assert!(condition.contains(400.0));
        assert!(condition.contains(700.0));
        assert!(!condition.contains(399.9));
        assert!(!condition.contains(700.1));
    }

    #[test]
    fn open_bounds() {
        assert!(Condition::at_least(600.0).contains(1e9));
        assert!(!Condition::at_least(600.0).contains(599.0));
        assert!(Condition::at_most(600.0).contains(-1e9));
    }

    #[test]
    fn condition_problems() {
        assert!(Condition::default().problem().is_some());
        assert!(Condition::range(2.0, 1.0).problem().is_some());
        assert!(Condition::at_least(f64::NAN).problem().is_some());
        assert_eq!(Condition::range(1.0, 1.0).problem(), None);
    }

    #[test]
    fn set_requires_every_condition() {
        let set = ConditionSet::new()
            .with("weight", Condition::at_least(600.0))
            .with("width", Condition::at_most(100.0));

        assert!(set.is_satisfied_by(&Location::from([("weight", 700.0), ("width", 75.0)])));
        assert!(!set.is_satisfied_by(&Location::from([("weight", 700.0), ("width", 125.0)])));
        assert!(!set.is_satisfied_by(&Location::from([("weight", 700.0)])));
        assert!(ConditionSet::new().is_satisfied_by(&Location::new()));
    }

    #[test]
    fn rule_without_condition_sets_never_fires() {
        let rule = Rule::new("dollar").with_substitution("dollar", "dollar.alt");
        assert!(!rule.fires_at(&Location::new()));
    }

    #[test]
    fn first_matching_substitution_wins() {
        let rule = Rule::new("r")
            .with_substitution("a", "b")
            .with_substitution("b", "c")
            .with_substitution("a", "z");
        assert_eq!(rule.substitute("a"), Some("b"));
        assert_eq!(rule.substitute("b"), Some("c"));
        assert_eq!(rule.substitute("c"), None);
    }
}
