// Fixture tests - input/expected pairs rendered with the default HTML tag
// set and default options.

mod common;

use pretty_assertions::assert_eq;

fn fixture_test(file: &str) {
    for fixture in common::load_fixtures(file) {
        let result = bbcode2html::render(&fixture.input).unwrap();
        assert_eq!(result, fixture.expected, "fixture: {}", fixture.name);
    }
}

#[test]
fn fixtures_basic() {
    fixture_test("basic.json");
}

#[test]
fn fixtures_recovery() {
    fixture_test("recovery.json");
}

#[test]
fn fixtures_formatting() {
    fixture_test("formatting.json");
}
