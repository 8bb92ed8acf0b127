use std::fs;
use tempfile::TempDir;
use yaml_config_edit::{ConfigDocument, ConfigValue, Key, YamlError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_edit_file_in_place() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stack.dev.yaml");
    fs::write(
        &path,
        "# dev stack\nconfig:\n  aws:region: us-west-2 # keep me\n  app:replicas: 1\n",
    )
    .unwrap();

    let mut doc = ConfigDocument::from_path(&path).unwrap();
    let replicas: Key = "app:replicas".parse().unwrap();
    doc.set("config", &replicas, &ConfigValue::new("3"), true)
        .unwrap();
    let secret: Key = "app:dbPassword".parse().unwrap();
    doc.set("config", &secret, &ConfigValue::secure("AAABAJ9s"), true)
        .unwrap();
    doc.save_to_file(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "# dev stack\nconfig:\n  aws:region: us-west-2 # keep me\n  app:replicas: \"3\"\n  app:dbPassword:\n    secure: AAABAJ9s\n"
    );

    let reread = ConfigDocument::from_path(&path).unwrap();
    assert_eq!(reread.to_string(), written);
    assert!(reread.has_key("config"));
}

#[test]
fn test_unedited_file_is_unchanged() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stack.prod.yaml");
    let text = "encryptionsalt: djE6YWJj\nconfig:\n  app:tags: [a, b]   # spacing kept\n\n  app:motd: 'hi'\n";
    fs::write(&path, text).unwrap();

    let doc = ConfigDocument::from_path(&path).unwrap();
    doc.save_to_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = ConfigDocument::from_path(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(YamlError::Io(_))));
}

#[test]
fn test_load_bytes() {
    let doc = ConfigDocument::load(Some(b"config:\n  a: 1\n".as_slice())).unwrap();
    assert_eq!(doc.marshal(), b"config:\n  a: 1\n".to_vec());
    let nothing = ConfigDocument::load(None).unwrap();
    assert!(nothing.is_empty());
    assert!(nothing.marshal().is_empty());
}
