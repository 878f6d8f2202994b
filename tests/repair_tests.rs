use san_crawler::parse::repair;

#[test]
fn concatenated_objects_become_an_array() {
    let fixed = repair(br#"{"a":1}{"b":2}{"c":3}"#);
    assert_eq!(fixed, br#"[{"a":1},{"b":2},{"c":3}]"#.to_vec());

    let v: Vec<serde_json::Value> = serde_json::from_slice(&fixed).unwrap();
    assert_eq!(v[1]["b"], 2);
}

#[test]
fn single_and_empty_inputs() {
    assert_eq!(repair(br#"{"a":1}"#), br#"[{"a":1}]"#.to_vec());
    assert_eq!(repair(b""), b"[]".to_vec());
}
