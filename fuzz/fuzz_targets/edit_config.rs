#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_config_edit::{ConfigDocument, ConfigValue, Key};

fuzz_target!(|data: &[u8]| {
    let Some(split) = data.iter().position(|b| *b == 0) else {
        return;
    };
    let (text, key) = data.split_at(split);
    let (Ok(text), Ok(key)) = (std::str::from_utf8(text), std::str::from_utf8(&key[1..])) else {
        return;
    };
    let Ok(mut doc) = ConfigDocument::parse(text) else {
        return;
    };
    let Ok(key) = key.parse::<Key>() else {
        return;
    };

    // Whatever an edit does, the result must parse again
    if doc.set("", &key, &ConfigValue::new("v"), true).is_ok() {
        let written = doc.to_string();
        assert!(ConfigDocument::parse(&written).is_ok(), "{:?}", written);
    }
    let _ = doc.remove("", &key, true);
});
