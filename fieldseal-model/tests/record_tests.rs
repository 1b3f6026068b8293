use fieldseal_model::{apply_modifications, FieldUpdate, Modifications, Record};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

#[test]
fn set_inserts_and_replaces() {
    let mut r = record(json!({"name": "Camilla", "age": 25}));
    let mut mods = Modifications::new();
    mods.insert("age".into(), FieldUpdate::Set(json!(26)));
    mods.insert("street".into(), json!("East 13th Street").into());

    apply_modifications(&mut r, &mods);
    assert_eq!(
        r,
        record(json!({"name": "Camilla", "age": 26, "street": "East 13th Street"}))
    );
}

#[test]
fn unset_removes_field() {
    let mut r = record(json!({"name": "Camilla", "street": "x"}));
    let mut mods = Modifications::new();
    mods.insert("street".into(), FieldUpdate::Unset);
    mods.insert("missing".into(), FieldUpdate::Unset);

    apply_modifications(&mut r, &mods);
    assert_eq!(r, record(json!({"name": "Camilla"})));
}

#[test]
fn value_accessor() {
    assert_eq!(FieldUpdate::Set(json!(1)).value(), Some(&json!(1)));
    assert_eq!(FieldUpdate::Unset.value(), None);
}

#[test]
fn field_update_serializes_snake_case() {
    let json = serde_json::to_string(&FieldUpdate::Unset).unwrap();
    assert_eq!(json, "\"unset\"");
}

#[test]
fn to_modifications_sets_every_field() {
    let mods = fieldseal_model::to_modifications(record(json!({"a": 1, "b": "x"})));
    assert_eq!(mods.len(), 2);
    assert_eq!(mods["a"], FieldUpdate::Set(json!(1)));
    assert_eq!(mods["b"], FieldUpdate::Set(json!("x")));
}
