use yaml_config_edit::{ConfigDocument, Key, YamlError};

fn doc(text: &str) -> ConfigDocument {
    ConfigDocument::parse(text).unwrap()
}

fn key(text: &str) -> Key {
    text.parse().unwrap()
}

#[test]
fn test_remove_top_level_key() {
    let mut d = doc("config:\n  app:a: 1 # first\n  app:b: 2\n  app:c: 3\n");
    d.remove("config", &key("app:b"), false).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:a: 1 # first\n  app:c: 3\n");
    d.remove("config", &key("app:a"), true).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:c: 3\n");
}

#[test]
fn test_remove_secret() {
    let mut d = doc("config:\n  app:apiKey:\n    secure: abc\n  app:name: web\n");
    d.remove("config", &key("app:apiKey"), true).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:name: web\n");
}

#[test]
fn test_remove_missing_is_a_no_op() {
    let text = "config:\n  app:a: 1\n";
    let mut d = doc(text);
    d.remove("config", &key("app:missing"), false).unwrap();
    d.remove("config", &key("app:missing.key"), true).unwrap();
    d.remove("config", &key("app:a.b"), true).unwrap();
    d.remove("config", &key("app:a[3]"), true).unwrap();
    assert_eq!(d.to_string(), text);

    let mut empty = ConfigDocument::new();
    assert!(empty.remove("config", &key("app:a"), false).is_ok());
}

#[test]
fn test_remove_missing_root_key() {
    let mut d = doc("config:\n  a: 1\n");
    assert!(matches!(
        d.remove("missingRoot", &key("a"), false),
        Err(YamlError::RootKeyNotFound(name)) if name == "missingRoot"
    ));
}

#[test]
fn test_remove_nested_leaves_placeholder() {
    let mut d = doc("config:\n  app:db:\n    port: 5432\n  app:name: web\n");
    d.remove("config", &key("app:db.port"), true).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:db: {}\n  app:name: web\n");
}

#[test]
fn test_remove_nested_keeps_siblings() {
    let mut d = doc("config:\n  app:db:\n    host: h\n    # the port\n    port: 5432\n");
    d.remove("config", &key("app:db.port"), true).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:db:\n    host: h\n");
}

#[test]
fn test_remove_array_items() {
    let mut d = doc("config:\n  app:list:\n  - a\n  - b\n  app:flow: [1, 2, 3]\n");
    d.remove("config", &key("app:list[0]"), true).unwrap();
    d.remove("config", &key("app:flow[1]"), true).unwrap();
    assert_eq!(
        d.to_string(),
        "config:\n  app:list:\n  - b\n  app:flow: [1, 3]\n"
    );
    d.remove("config", &key("app:list[0]"), true).unwrap();
    assert_eq!(d.to_string(), "config:\n  app:list: []\n  app:flow: [1, 3]\n");
}

#[test]
fn test_remove_inside_array_of_maps() {
    let mut d = doc("config:\n  app:servers:\n  - host: a\n    port: 80\n");
    d.remove("config", &key("app:servers[0].port"), true)
        .unwrap();
    assert_eq!(d.to_string(), "config:\n  app:servers:\n  - host: a\n");
}

#[test]
fn test_remove_invalid_path() {
    let mut d = doc("config:\n  app:a: 1\n");
    assert!(matches!(
        d.remove("config", &key("app:a[x]"), true),
        Err(YamlError::InvalidKeyPath(_))
    ));
}

#[test]
fn test_remove_then_set_again() {
    let mut d = doc("config:\n  app:a: 1\n");
    d.remove("config", &key("app:a"), false).unwrap();
    assert_eq!(d.to_string(), "config: {}\n");
    d.set(
        "config",
        &key("app:b"),
        &yaml_config_edit::ConfigValue::new("x"),
        false,
    )
    .unwrap();
    assert_eq!(d.to_string(), "config:\n  app:b: x\n");
}

#[test]
fn test_remove_middle_key_keeps_lines_apart() {
    let mut d = doc("a: 1\nb: 2\nc: 3\n");
    d.remove("", &key("b"), false).unwrap();
    assert_eq!(d.to_string(), "a: 1\nc: 3\n");
    assert!(!d.has_key("b"));
}

#[test]
fn test_remove_first_flow_entry() {
    let mut d = doc("f: {a: 1, b: 2, c: 3}\n");
    d.remove("", &key("f.a"), true).unwrap();
    assert_eq!(d.to_string(), "f: {b: 2, c: 3}\n");
}

#[test]
fn test_remove_commented_entry() {
    let mut d = doc("a:\n  b: 1 # c\n  d: 2\n");
    d.remove("", &key("a.b"), true).unwrap();
    assert_eq!(d.to_string(), "a:\n  d: 2\n");
}

#[test]
fn test_remove_deep_path_leaves_placeholder() {
    let mut d = doc("a:\n  b:\n    c: 1\n  d: 2\n");
    d.remove("", &key("a.b.c"), true).unwrap();
    assert_eq!(d.to_string(), "a:\n  b: {}\n  d: 2\n");
}

#[test]
fn test_remove_emptying_map_in_list() {
    let mut d = doc("l:\n- x: 1\n");
    d.remove("", &key("l[0].x"), true).unwrap();
    assert_eq!(d.to_string(), "l:\n- {}\n");
}
