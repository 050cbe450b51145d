//! Rule evaluation against design-space locations.

use fontmutator_variation::{AxisSpace, Location};
use log::debug;

use crate::{
    error::{Error, Result},
    rule::Rule,
};

/// An ordered, validated rule list bound to a set of axes.
///
/// Conditions are tested in user coordinates. Axes missing from a query
/// location take their default; coordinates on axes outside the space are
/// ignored.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    axes: AxisSpace,
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Validate `rules` against `axes`.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownAxis` if a condition names an axis not in `axes`
    /// - `Error::InvalidCondition` if a condition has no bounds, NaN bounds,
    ///   or a minimum above its maximum
    pub fn new(axes: &AxisSpace, rules: Vec<Rule>) -> Result<Self> {
        for rule in &rules {
            for (axis, condition) in rule.condition_sets.iter().flat_map(|set| set.iter()) {
                if axes.get(axis).is_none() {
                    return Err(Error::UnknownAxis {
                        rule: rule.name.clone(),
                        axis: axis.to_string(),
                    });
                }
                if let Some(reason) = condition.problem() {
                    return Err(Error::InvalidCondition {
                        rule: rule.name.clone(),
                        axis: axis.to_string(),
                        reason,
                    });
                }
            }
        }
        Ok(Self { axes: axes.clone(), rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn complete(&self, location: &Location) -> Location {
        self.axes
            .axes()
            .iter()
            .map(|axis| (axis.name(), location.get(axis.name()).unwrap_or(axis.default())))
            .collect()
    }

    /// Rules that fire at `location`, in declaration order.
    pub fn fired(&self, location: &Location) -> impl Iterator<Item = &Rule> {
        let location = self.complete(location);
        self.rules.iter().filter(move |rule| rule.fires_at(&location))
    }

    /// Substitution pairs of every rule firing at `location`.
    ///
    /// Pairs keep rule declaration order, then each rule's own order.
    pub fn evaluate(&self, location: &Location) -> Vec<(String, String)> {
        self.fired(location)
            .flat_map(|rule| rule.substitutions.iter().cloned())
            .collect()
    }

    /// Apply the rules firing at `location` to a list of glyph names.
    ///
    /// Rules run one after another over the whole list, so a later rule sees
    /// the names produced by earlier ones: `A -> B` followed by `B -> C`
    /// turns `A` into `C`.
    pub fn apply<S: AsRef<str>>(&self, location: &Location, names: &[S]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        for rule in self.fired(location) {
            debug!("Rule '{}' fires at {location}", rule.name);
            for name in &mut names {
                if let Some(to) = rule.substitute(name.as_str()) {
                    *name = to.to_string();
                }
            }
        }
        names
    }

    /// The final name `name` resolves to at `location`.
    pub fn resolve(&self, location: &Location, name: &str) -> String {
        self.apply(location, &[name]).remove(0)
    }

    /// `(original, substitute)` pairs for the names in `names` that change
    /// at `location`, in list order.
    pub fn renames<S: AsRef<str>>(
        &self,
        location: &Location,
        names: &[S],
    ) -> Vec<(String, String)> {
        let resolved = self.apply(location, names);
        names
            .iter()
            .map(|old| old.as_ref())
            .zip(resolved)
            .filter(|(old, new)| *old != new.as_str())
            .map(|(old, new)| (old.to_string(), new))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use fontmutator_variation::Axis;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rule::{Condition, ConditionSet};

    fn axes() -> AxisSpace {
        AxisSpace::new(vec![
            Axis::new("weight", 100.0, 400.0, 900.0).unwrap(),
            Axis::new("width", 50.0, 100.0, 200.0).unwrap(),
        ])
    }

    fn heavy(rule: &str) -> Rule {
        Rule::new(rule).with_condition_set(
            ConditionSet::new().with("weight", Condition::range(600.0, 900.0)),
        )
    }

    fn loc(weight: f64) -> Location {
        Location::from([("weight", weight)])
    }

    #[test]
    fn chained_rules() {
        let engine = RuleEngine::new(
            &axes(),
            vec![
                heavy("first").with_substitution("A", "B"),
                heavy("second").with_substitution("B", "C"),
            ],
        )
        .unwrap();

        assert_eq!(engine.resolve(&loc(700.0), "A"), "C");
        assert_eq!(engine.resolve(&loc(400.0), "A"), "A");
        assert_eq!(
            engine.evaluate(&loc(700.0)),
            vec![("A".to_string(), "B".to_string()), ("B".to_string(), "C".to_string())]
        );
    }

    #[test]
    fn boundary_fires() {
        let engine = RuleEngine::new(&axes(), vec![heavy("r").with_substitution("a", "a.alt")])
            .unwrap();
        assert_eq!(engine.resolve(&loc(600.0), "a"), "a.alt");
        assert_eq!(engine.resolve(&loc(900.0), "a"), "a.alt");
        assert_eq!(engine.resolve(&loc(599.0), "a"), "a");
    }

    #[test]
    fn any_condition_set_fires() {
        let rule = Rule::new("r")
            .with_condition_set(ConditionSet::new().with("weight", Condition::at_least(800.0)))
            .with_condition_set(ConditionSet::new().with("width", Condition::at_most(60.0)))
            .with_substitution("a", "a.alt");
        let engine = RuleEngine::new(&axes(), vec![rule]).unwrap();

        assert_eq!(engine.resolve(&loc(850.0), "a"), "a.alt");
        assert_eq!(engine.resolve(&Location::from([("width", 55.0)]), "a"), "a.alt");
        assert_eq!(engine.resolve(&loc(500.0), "a"), "a");
    }

    #[test]
    fn missing_axes_take_default() {
        let rule = Rule::new("narrow")
            .with_condition_set(ConditionSet::new().with("width", Condition::range(90.0, 110.0)))
            .with_substitution("a", "a.alt");
        let engine = RuleEngine::new(&axes(), vec![rule]).unwrap();
        assert_eq!(engine.resolve(&Location::new(), "a"), "a.alt");
    }

    #[test]
    fn renames_only_changed_names() {
        let engine = RuleEngine::new(
            &axes(),
            vec![heavy("r").with_substitution("dollar", "dollar.nostroke")],
        )
        .unwrap();
        let renames = engine.renames(&loc(700.0), &["a", "dollar", "b"]);
        assert_eq!(renames, vec![("dollar".to_string(), "dollar.nostroke".to_string())]);
    }

    #[test]
    fn unknown_axis() {
        let rule = Rule::new("r")
            .with_condition_set(ConditionSet::new().with("slant", Condition::at_least(1.0)));
        let err = RuleEngine::new(&axes(), vec![rule]).unwrap_err();
        assert_eq!(err, Error::UnknownAxis { rule: "r".to_string(), axis: "slant".to_string() });
    }

    #[test]
    fn inverted_condition() {
        let rule = Rule::new("r")
            .with_condition_set(ConditionSet::new().with("weight", Condition::range(700.0, 600.0)));
        let err = RuleEngine::new(&axes(), vec![rule]).unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { .. }));
    }
}
