//! End-to-end tests for `sigcall parse`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::*;
use serde_json::{Value, json};

fn parsed(output: &std::process::Output) -> Value {
    assert!(output.status.success(), "{}", stderr(output));
    serde_json::from_str(&stdout(output)).expect("output should be JSON")
}

#[test]
fn test_parse_reports_args_and_kwargs() {
    let output = sigcall(&[
        "parse",
        "f(one: str, two: int, /, three: bool = false, *, four: list | None = None)",
        "test",
        "1",
        "true",
        "--four",
        "a",
        "b c",
        "d",
    ]);
    assert_eq!(
        parsed(&output),
        json!({"args": ["test", 1], "kwargs": {"three": true, "four": ["a", "b c", "d"]}})
    );
}

#[test]
fn test_parse_keeps_declaration_order() {
    let output = sigcall(&["parse", "f(*, zeta: int, alpha: str)", "--alpha", "x", "--zeta", "1"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap(), "{text}");
}

#[test]
fn test_parse_fixed_tuple_and_literals() {
    let output = sigcall(&[
        "parse",
        r#"f(pair: tuple[int, str], /, mode: Literal["get", "set"] = "get")"#,
        "1",
        "a",
        "--mode",
        "set",
    ]);
    assert_eq!(parsed(&output), json!({"args": [[1, "a"]], "kwargs": {"mode": "set"}}));
}

#[test]
fn test_parse_structured_payloads() {
    let output = sigcall(&[
        "parse",
        "f(items: list, settings: dict)",
        "[1, 2]",
        r#"{"a": {"b": null}}"#,
    ]);
    assert_eq!(
        parsed(&output),
        json!({"args": [], "kwargs": {"items": [1, 2], "settings": {"a": {"b": null}}}})
    );
}

#[test]
fn test_parse_negative_numbers_and_double_dash() {
    let output = sigcall(&["parse", "f(a: int, b: float, c: str)", "-4", "-.5", "--", "--c"]);
    assert_eq!(
        parsed(&output),
        json!({"args": [], "kwargs": {"a": -4, "b": -0.5, "c": "--c"}})
    );
}

#[test]
fn test_parse_implicit_stdin() {
    let output = sigcall_piped(&["parse", "f(text: str, count: int = 1)", "3"], b"hello world\n");
    assert_eq!(
        parsed(&output),
        json!({"args": [], "kwargs": {"text": "hello world", "count": 3}})
    );
}

#[test]
fn test_parse_stdin_stream_parameter() {
    let output = sigcall_piped(&["parse", "f(name: str, data: TextIO)", "x"], b"payload");
    assert_eq!(
        parsed(&output),
        json!({"args": [], "kwargs": {"name": "x", "data": "<stdin>"}})
    );
}

#[test]
fn test_parse_invalid_signature() {
    let output = sigcall(&["parse", "f(a, a)"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error:"), "{err}");
    assert!(err.contains("duplicate"), "{err}");
}

#[test]
fn test_parse_invalid_choice() {
    let output = sigcall(&["parse", r#"f(mode: Literal["r", "w"], /)"#, "x"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("argument mode: invalid choice: 'x' (choose from r, w)"));
}

#[test]
fn test_parse_toggle_with_value() {
    let output = sigcall(&["parse", "f(*, verbose: bool = false)", "--verbose=yes"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ignored explicit argument 'yes'"));
}

#[test]
fn test_parse_help() {
    let output = sigcall(&["parse", "f(a: int, /, *, b: list[str] = [])", "-h"]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("positional only args"), "{help}");
    assert!(help.contains("keyword only args"), "{help}");
    assert!(help.contains("[str ...] (default: [])"), "{help}");
}
