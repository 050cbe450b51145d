//! Rule processing over glyph name lists.

use fontmutator_rules::{Condition, ConditionSet, Rule, RuleEngine};
use fontmutator_variation::{Axis, AxisSpace, Location};
use pretty_assertions::assert_eq;

fn axes() -> AxisSpace {
    AxisSpace::new(vec![
        Axis::new("weight", 0.0, 400.0, 1000.0).unwrap(),
        Axis::new("italic", 0.0, 0.0, 1.0).unwrap().with_discrete(true),
    ])
}

fn engine() -> RuleEngine {
    let bold = ConditionSet::new().with("weight", Condition::at_least(600.0));
    let italic = ConditionSet::new().with("italic", Condition::range(1.0, 1.0));
    RuleEngine::new(
        &axes(),
        vec![
            Rule::new("nostroke")
                .with_condition_set(bold.clone())
                .with_substitution("dollar", "dollar.nostroke")
                .with_substitution("cent", "cent.nostroke"),
            Rule::new("italic-alternates")
                .with_condition_set(italic)
                .with_substitution("a", "a.italic")
                .with_substitution("dollar.nostroke", "dollar.nostroke.italic"),
            Rule::new("unreachable").with_substitution("a", "a.never"),
        ],
    )
    .unwrap()
}

#[test]
fn apply_to_glyph_list() {
    let _ = env_logger::builder().is_test(true).try_init();
    let names = ["a", "dollar", "cent", "b"];

    let upright_bold = Location::from([("weight", 700.0)]);
    assert_eq!(
        engine().apply(&upright_bold, &names),
        vec!["a", "dollar.nostroke", "cent.nostroke", "b"]
    );

    let italic_bold = Location::from([("weight", 700.0), ("italic", 1.0)]);
    assert_eq!(
        engine().apply(&italic_bold, &names),
        vec!["a.italic", "dollar.nostroke.italic", "cent.nostroke", "b"]
    );

    let italic_light = Location::from([("weight", 300.0), ("italic", 1.0)]);
    assert_eq!(engine().apply(&italic_light, &names), vec!["a.italic", "dollar", "cent", "b"]);
}

#[test]
fn default_location_fires_nothing() {
    let engine = engine();
    assert_eq!(engine.fired(&Location::new()).count(), 0);
    assert_eq!(engine.evaluate(&Location::new()), Vec::<(String, String)>::new());
}

#[test]
fn unknown_query_axes_are_ignored() {
    let location = Location::from([("weight", 1000.0), ("optical", 12.0)]);
    assert_eq!(engine().resolve(&location, "cent"), "cent.nostroke");
}
