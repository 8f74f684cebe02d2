//! Quantifier behavior across the reference forms
//!
//! The laws under test: `?` matches at most once, `*` never fails, `+`
//! fails exactly when `*` would match nothing, `{n}` behaves like `{n:n}`,
//! and `{n:m}` stops at the upper bound.

use rel_parser::rel::testing::{assert_ast, parser_from};
use rel_parser::rel::{LoadError, Parser};
use rstest::rstest;
use serde_json::{json, Value};

fn digit_rule(expression: &str) -> Value {
    json!({
        "terminals": [],
        "rules": [{"name": "r", "expressions": [expression]}],
    })
}

#[rstest]
#[case("", 0)]
#[case("7", 1)]
#[case("77", 1)]
fn test_zero_or_one_matches_at_most_once(#[case] input: &str, #[case] children: usize) {
    let mut parser = parser_from(digit_rule("<digit?>"));
    let ast = parser.generate_ast(input).unwrap();
    assert_ast(&ast).child_count(children);
}

#[rstest]
#[case("")]
#[case("x")]
#[case("123456")]
fn test_zero_or_more_never_fails(#[case] input: &str) {
    let mut parser = parser_from(digit_rule("<digit*>"));
    assert!(parser.generate_ast(input).is_ok());
}

#[rstest]
#[case("", false)]
#[case("x", false)]
#[case("5", true)]
#[case("512", true)]
fn test_one_or_more_requires_a_match(#[case] input: &str, #[case] accepted: bool) {
    let mut parser = parser_from(digit_rule("<digit+>"));
    assert_eq!(parser.generate_ast(input).is_ok(), accepted);
}

#[test]
fn test_one_or_more_is_greedy() {
    let mut parser = parser_from(digit_rule("<digit+>"));
    let ast = parser.generate_ast("512").unwrap();
    assert_ast(&ast).leaf_values(&["5", "1", "2"]);
}

#[rstest]
#[case("1")]
#[case("12")]
#[case("123")]
#[case("1234")]
#[case("abc")]
fn test_exact_count_equals_degenerate_range(#[case] input: &str) {
    let mut exact = parser_from(digit_rule("<digit{2}>"));
    let mut range = parser_from(digit_rule("<digit{2:2}>"));
    assert_eq!(
        exact.generate_ast(input).is_ok(),
        range.generate_ast(input).is_ok(),
        "input: {input}"
    );
}

#[rstest]
#[case("1", false, 0)]
#[case("12", true, 2)]
#[case("123", true, 3)]
#[case("1234", true, 3)]
fn test_range_bounds(#[case] input: &str, #[case] accepted: bool, #[case] children: usize) {
    let mut parser = parser_from(digit_rule("<digit{2:3}>"));
    let result = parser.generate_ast(input);
    assert_eq!(result.is_ok(), accepted, "input: {input}");
    if let Ok(ast) = result {
        assert_ast(&ast).child_count(children);
    }
}

#[test]
fn test_inverted_range_rejected_at_load() {
    let result = Parser::from_value(&digit_rule("<digit{3:1}>"));
    assert!(matches!(result, Err(LoadError::Grammar(_))));
}

#[test]
fn test_quantified_rule_reference_builds_one_node_per_match() {
    let mut parser = parser_from(json!({
        "terminals": [],
        "rules": [
            {"name": "list", "expressions": ["<entry+>"]},
            {"name": "entry", "expressions": ["<digit>;"]},
        ],
    }));

    let ast = parser.generate_ast("1;2;3;").unwrap();
    assert_ast(&ast).rule("list").child_count(3).child(2, |entry| {
        entry.rule("entry").leaf_values(&["3", ";"]);
    });
}

#[test]
fn test_quantified_alternative_applies_to_chosen_branch() {
    let mut parser = parser_from(json!({
        "terminals": [
            {"name": "a", "regex": "a"},
            {"name": "b", "regex": "b"},
        ],
        "rules": [{"name": "r", "expressions": ["<a|b{2}>"]}],
    }));

    // two of the same branch match
    let ast = parser.generate_ast("bb").unwrap();
    assert_ast(&ast).child_count(2).leaf_values(&["b", "b"]);

    // one of each is not two of either branch
    assert!(parser.generate_ast("ab").is_err());
}

#[test]
fn test_optional_reference_backtracks_cleanly() {
    // the optional sign must not consume the digit
    let mut parser = parser_from(json!({
        "terminals": [{"name": "sign", "regex": "[+-]"}],
        "rules": [{"name": "num", "expressions": ["<sign?><digit>"]}],
    }));

    let ast = parser.generate_ast("-5").unwrap();
    assert_ast(&ast).child_count(2).leaf_values(&["-", "5"]);

    let ast = parser.generate_ast("5").unwrap();
    assert_ast(&ast).child_count(1).leaf_values(&["5"]);
}
