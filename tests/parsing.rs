mod common;

use common::read_fixture;
use farm_terminal::farm_fetch::{parse_animals_json, parse_fields_json};
use farm_terminal::state::FieldState;

#[test]
fn parses_fields_fixture() {
    let fields = parse_fields_json(&read_fixture("fields.json")).expect("fixture should parse");
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0].name, "Chips");
    assert_eq!(fields[0].crop_name.as_deref(), Some("Wheat"));
    assert_eq!(fields[0].state, FieldState::Growing);
    assert_eq!(fields[0].harvest_time, Some(1_700_007_200));
    assert!(fields[0].fertilized);

    let cable = &fields[2];
    assert_eq!(cable.state, FieldState::Cultivating);
    assert_eq!(cable.crop_name, None);
    assert_eq!(cable.harvest_time, None);

    assert_eq!(fields[4].state, FieldState::Other("idle".to_string()));
    assert_eq!(fields[4].state.priority(), 5);
}

#[test]
fn parses_animals_fixture() {
    let animals = parse_animals_json(&read_fixture("animals.json")).expect("fixture should parse");
    assert_eq!(animals.len(), 3);
    assert_eq!(animals[0].int_name, "farm_pig");
    assert_eq!(animals[0].total, 10);
    assert_eq!(animals[0].feed_level, 150);
    assert_eq!(animals[0].feed_max, 200);
    assert_eq!(animals[2].collection_time, None);
}

#[test]
fn null_and_empty_bodies_are_empty() {
    assert!(parse_fields_json("null").expect("null should parse").is_empty());
    assert!(parse_fields_json("").expect("empty should parse").is_empty());
    assert!(parse_animals_json(r#"{"animals":null}"#)
        .expect("null list should parse")
        .is_empty());
}

#[test]
fn list_of_wrong_type_is_rejected() {
    let err = parse_fields_json(r#"{"fields":5}"#).expect_err("number is not a list");
    assert!(err.to_string().contains("fields"));
    assert!(parse_animals_json(r#"{"animals":"nope"}"#).is_err());
    assert!(parse_animals_json(r#"{"animals":{"farm_pig":1}}"#).is_err());
}

#[test]
fn records_without_identifier_are_skipped() {
    let animals = parse_animals_json(r#"{"animals":[{"total":3},{"int_name":"farm_pig","total":"4"}]}"#)
        .expect("should parse");
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0].total, 4);
    assert_eq!(animals[0].feed_max, 0);
}
