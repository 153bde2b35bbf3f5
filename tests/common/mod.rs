// Shared test helpers for bbcode2html.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// One rendered input/expected pair.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub input: String,
    pub expected: String,
}

/// Load a fixture file from `test-fixtures/`.
pub fn load_fixtures(file: &str) -> Vec<Fixture> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-fixtures")
        .join(file);
    let data = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Missing fixture file: {}", path.display()));
    serde_json::from_str(&data)
        .unwrap_or_else(|err| panic!("Invalid fixture file {}: {err}", path.display()))
}
