#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_config_edit::Parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Skip extremely large inputs to avoid timeout
        if text.len() > 1_000_000 {
            return;
        }

        // Parsing never panics and never loses text, errors or not
        let parse = Parse::parse_yaml(text);
        let tree = parse.tree();
        assert_eq!(tree.to_string(), text);
    }
});
