use serde_json::{json, Value};
use trial_core::{is_valid_field_name, Condition, ConditionList, TrialError};

fn condition(pairs: &[(&str, Value)]) -> Condition {
    Condition::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())))
        .expect("valid condition")
}

#[test]
fn field_names_follow_identifier_rules() {
    assert!(is_valid_field_name("ori"));
    assert!(is_valid_field_name("target_pos2"));
    assert!(!is_valid_field_name(""));
    assert!(!is_valid_field_name("2back"));
    assert!(!is_valid_field_name("_hidden"));
    assert!(!is_valid_field_name("has space"));
    assert!(!is_valid_field_name("dash-ed"));
}

#[test]
fn condition_preserves_field_order() {
    let cond = condition(&[("zeta", json!(1)), ("alpha", json!("x")), ("mid", json!(true))]);
    let names: Vec<_> = cond.field_names().collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(cond.get("alpha"), Some(&json!("x")));
    assert_eq!(cond.len(), 3);
}

#[test]
fn condition_rejects_bad_and_duplicate_names() {
    let bad = Condition::from_pairs(vec![("1st".to_string(), json!(1))]).unwrap_err();
    assert!(matches!(bad, TrialError::Configuration(ref info) if info.code == "invalid-field-name"));

    let dup = Condition::from_pairs(vec![("a", json!(1)), ("a", json!(2))]).unwrap_err();
    assert_eq!(dup.info().code, "duplicate-field-name");
}

#[test]
fn empty_and_absent_lists_normalize_to_sentinel() {
    for list in [ConditionList::new(Vec::new()), ConditionList::from_optional(None)] {
        assert_eq!(list.len(), 1);
        assert!(list.is_sentinel());
        assert!(list.get(0).expect("sentinel").is_empty());
        assert!(list.attributes().is_empty());
    }
}

#[test]
fn attributes_come_from_first_condition() {
    let list = ConditionList::new(vec![
        condition(&[("ori", json!(0)), ("sf", json!(2))]),
        condition(&[("ori", json!(90)), ("sf", json!(4))]),
    ]);
    assert_eq!(list.attributes(), vec!["ori".to_string(), "sf".to_string()]);
    assert!(!list.is_sentinel());
}

#[test]
fn from_value_accepts_null_and_object_arrays() {
    assert!(ConditionList::from_value(Value::Null).unwrap().is_sentinel());
    let list = ConditionList::from_value(json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}])).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(1).unwrap().get("a"), Some(&json!(3)));
}

#[test]
fn from_value_rejects_other_shapes() {
    let err = ConditionList::from_value(json!("conditions.csv")).unwrap_err();
    assert_eq!(err.info().code, "malformed-condition-list");
    let err = ConditionList::from_value(json!([{"a": 1}, 3])).unwrap_err();
    assert_eq!(err.info().code, "malformed-condition");
    assert_eq!(err.info().context_value("index"), Some("1"));
}

#[test]
fn condition_serde_keeps_order_and_validates() {
    let cond: Condition = serde_json::from_str(r#"{"b": 1, "a": 2}"#).expect("parse");
    assert_eq!(serde_json::to_string(&cond).unwrap(), r#"{"b":1,"a":2}"#);
    assert!(serde_json::from_str::<Condition>(r#"{"bad name": 1}"#).is_err());
}
