use std::cell::Cell;

use codeflow::codeflow::normalize_line_endings;
use codeflow::config::ParseOptions;
use codeflow::errors::{CodeflowError, Result};
use codeflow::extraction::{SourceParser, TypeScriptParser};
use codeflow::syntax::SyntaxNode;
use codeflow::types::*;
use codeflow::{parse, parse_typescript};

const SAMPLE: &str = include_str!("fixtures/codeflow.ts");

/// The annotated function of the sample, without the class before it.
fn function_only() -> &'static str {
    let start = SAMPLE.find("/**\n * @codeflow id cf-1").unwrap();
    &SAMPLE[start..]
}

/// Wraps case clauses in an annotated function.
fn flow(cases: &str) -> String {
    format!(
        "/**\n * @codeflow id t-1\n * @codeflow name Test Flow\n */\nfunction run() {{\n    switch ($step) {{\n{cases}\n    }}\n}}\n"
    )
}

fn codes(sequence: &Sequence) -> Vec<&str> {
    sequence
        .steps
        .iter()
        .map(|step| step.code.as_deref().unwrap_or(""))
        .collect()
}

#[test]
fn test_single_annotated_function() {
    let (methods, text) = parse_typescript(function_only()).unwrap();
    assert_eq!(methods.len(), 1);

    let method = &methods[0];
    assert_eq!(method.id, "cf-1");
    assert_eq!(method.name, "My Codeflow on a function");
    assert_eq!(method.info, None);
    assert_eq!(method.indent, [4, 0]);

    let source = &text[method.span[0]..method.span[1]];
    assert!(source.starts_with("async function process(a: string) {"));
    assert!(source.ends_with("return $result;\n}"));

    let ids: Vec<i64> = method.body.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_local_variables() {
    let (methods, _) = parse_typescript(function_only()).unwrap();
    let vars = &methods[0].vars;
    let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);

    assert_eq!(vars[0].ty, None);
    assert_eq!(vars[0].init, Some(InitValue::Number(3i64.into())));
    assert_eq!(vars[1].ty.as_deref(), Some("string | number"));
    assert_eq!(vars[1].init, None);
    assert_eq!(vars[2].ty.as_deref(), Some("boolean"));
}

#[test]
fn test_first_step_group() {
    let (methods, _) = parse_typescript(function_only()).unwrap();
    let first = &methods[0].body[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.steps.len(), 4);

    let alert = &first.steps[0];
    assert_eq!(alert.code.as_deref(), Some("alert()"));
    assert_eq!(alert.assign, None);
    assert_eq!(alert.info.as_deref(), Some("Some description of this step."));
    assert_eq!(alert.name.as_deref(), Some("Some Name"));
    assert_eq!(alert.px.as_deref(), Some("grid data"));

    let prompt = &first.steps[1];
    assert_eq!(prompt.code.as_deref(), Some("prompt()"));
    assert_eq!(prompt.assign.as_deref(), Some("$test"));
    assert_eq!(prompt.name, None);
    assert_eq!(prompt.info, None);

    let yes = &first.steps[2];
    assert_eq!(yes.code, None);
    assert_eq!(yes.next, Some(Edge::new(4.0, Mode::And)));
    assert_eq!(yes.px.as_deref(), Some("edge data"));
    assert_eq!(yes.info, None);

    let no = &first.steps[3];
    assert_eq!(no.next, Some(Edge::new(3.0, Mode::Or)));
    assert_eq!(no.px, None);
}

#[test]
fn test_multi_line_step_is_reindented() {
    let (methods, _) = parse_typescript(function_only()).unwrap();
    let second = &methods[0].body[1];
    assert_eq!(second.id, 2);
    assert_eq!(
        codes(second),
        vec![
            "alert()",
            "myfuncs.someFeature({\n    input1: 0,\n    input2: \"\",\n})"
        ]
    );
}

#[test]
fn test_step_json_shape() {
    let (methods, _) = parse_typescript(function_only()).unwrap();
    let json = serde_json::to_value(&methods[0]).unwrap();
    assert_eq!(
        json["body"][0]["steps"][2],
        serde_json::json!({ "next": "4 &&", "px": "edge data" })
    );
    assert_eq!(
        json["body"][0]["steps"][1],
        serde_json::json!({ "code": "prompt()", "assign": "$test" })
    );
    assert_eq!(
        json["vars"][1],
        serde_json::json!({ "name": "y", "type": "string | number" })
    );
    assert_eq!(json["indent"], "4 0");
    let span = format!("{} {}", methods[0].span[0], methods[0].span[1]);
    assert_eq!(json["span"], span.as_str());
}

#[test]
fn test_full_sample_includes_class_method() {
    let (methods, text) = parse_typescript(SAMPLE).unwrap();
    let ids: Vec<&str> = methods.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["cf-0", "cf-1"]);

    let method = &methods[0];
    assert_eq!(method.name, "My Codeflow on a method");
    assert_eq!(method.indent, [4, 4]);
    assert!(method.body.is_empty());
    assert!(method.vars.is_empty());
    assert_eq!(
        &text[method.span[0]..method.span[1]],
        "static method() {\n    }"
    );

    let json = serde_json::to_value(method).unwrap();
    assert!(json.get("body").is_none());
    assert!(json.get("vars").is_none());
}

#[test]
fn test_extraction_is_deterministic() {
    let first = parse_typescript(SAMPLE).unwrap();
    let second = parse_typescript(SAMPLE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_crlf_source_matches_lf_source() {
    let crlf = SAMPLE.replace('\n', "\r\n");
    let (from_crlf, crlf_text) = parse_typescript(&crlf).unwrap();
    let (from_lf, lf_text) = parse_typescript(SAMPLE).unwrap();
    assert_eq!(from_crlf, from_lf);
    assert_eq!(crlf_text, lf_text);
}

#[test]
fn test_line_ending_normalization() {
    assert_eq!(normalize_line_endings("a  \r\n\r\n  b\n"), "a\n  b\n");
    assert_eq!(normalize_line_endings("x;\t\n"), "x;\n");
    assert_eq!(normalize_line_endings("no break"), "no break");
}

#[test]
fn test_unannotated_source_yields_nothing() {
    let source = "class A {\n    run() {}\n}\n\n// plain comment\nfunction f() {\n    switch ($step) {\n        case 1:\n            g();\n    }\n}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    assert!(methods.is_empty());

    let (methods, _) = parse_typescript("").unwrap();
    assert!(methods.is_empty());
}

#[test]
fn test_break_ends_a_step_group() {
    let source = flow(
        "        case 1:\n            first();\n            break;\n            unreachable();\n        case 2:\n            second();\n            return;\n            third();\n            break;",
    );
    let (methods, _) = parse_typescript(&source).unwrap();
    let body = &methods[0].body;
    assert_eq!(codes(&body[0]), vec!["first()"]);
    assert_eq!(codes(&body[1]), vec!["second()", "return;", "third()"]);
}

#[test]
fn test_unsupported_cases_are_skipped() {
    let source = flow(
        "        case 1.5:\n            half();\n            break;\n        case \"named\":\n            named();\n            break;\n        case 4:\n            break;\n        default:\n            fallback();\n            break;\n        case 3:\n            last();",
    );
    let (methods, _) = parse_typescript(&source).unwrap();
    let ids: Vec<i64> = methods[0].body.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![3]);
    assert_eq!(codes(&methods[0].body[0]), vec!["last()"]);
}

#[test]
fn test_literal_initializers_only() {
    let source = "/**\n * @codeflow id t-2\n * @codeflow name Vars\n */\nfunction vars() {\n    let s = \"hi\";\n    const b = true;\n    var f = 1.5;\n    let o = {};\n    let i = other;\n    let p = 1, q;\n    let $hidden = 0;\n}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    let vars = &methods[0].vars;
    let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["s", "b", "f", "o", "i", "p", "q"]);

    assert_eq!(vars[0].init, Some(InitValue::String("hi".to_string())));
    assert_eq!(vars[1].init, Some(InitValue::Bool(true)));
    assert_eq!(
        vars[2].init,
        serde_json::Number::from_f64(1.5).map(InitValue::Number)
    );
    assert_eq!(vars[3].init, None);
    assert_eq!(vars[4].init, None);
    assert_eq!(vars[5].init, Some(InitValue::Number(1i64.into())));
    assert_eq!(vars[6].init, None);
}

#[test]
fn test_nested_functions_are_not_candidates() {
    let source = "function outer() {\n    /**\n     * @codeflow id inner\n     * @codeflow name Inner\n     */\n    function inner() {}\n}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    assert!(methods.is_empty());
}

#[test]
fn test_header_info_and_px() {
    let source = "/**\n * @codeflow id t-3\n * @codeflow name Described\n * @codeflow info Runs the thing.\n * @codeflow px 10 20\n */\nfunction described() {}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    assert_eq!(methods[0].info.as_deref(), Some("Runs the thing."));
    assert_eq!(methods[0].px.as_deref(), Some("10 20"));
}

#[test]
fn test_syntax_error_is_rejected() {
    let err = parse_typescript("function broken( {\n").unwrap_err();
    assert!(matches!(err, CodeflowError::Validation { .. }));
}

#[test]
fn test_parser_is_injected_with_fixed_options() {
    let calls = Cell::new(0);
    let parser = |source: &str, options: &ParseOptions| -> Result<SyntaxNode> {
        calls.set(calls.get() + 1);
        assert_eq!(*options, ParseOptions::default());
        TypeScriptParser.parse(source, options)
    };
    let (methods, _) = parse(SAMPLE, &parser).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(methods.len(), 2);
}

#[test]
fn test_parser_failure_propagates() {
    let parser = |_: &str, _: &ParseOptions| -> Result<SyntaxNode> {
        Err(CodeflowError::Parse {
            message: "unexpected token".to_string(),
            line: Some(1),
        })
    };
    let err = parse(SAMPLE, &parser).unwrap_err();
    assert!(matches!(err, CodeflowError::Parse { line: Some(1), .. }));
}

#[test]
fn test_decorated_class_method() {
    let source = "class A {\n    /**\n     * @codeflow id d-1\n     * @codeflow name Decorated\n     */\n    @dec()\n    @other\n    run() {\n        switch ($step) {\n            case 1:\n                go();\n                break;\n        }\n    }\n}\n";
    let (methods, text) = parse_typescript(source).unwrap();
    assert_eq!(methods.len(), 1);

    let method = &methods[0];
    assert_eq!(method.id, "d-1");
    assert_eq!(method.indent, [4, 4]);
    assert!(text[method.span[0]..method.span[1]].starts_with("@dec()\n    @other\n    run() {"));
    assert_eq!(codes(&method.body[0]), vec!["go()"]);
}

#[test]
fn test_private_and_constructor_methods_are_not_candidates() {
    let source = "class A {\n    /**\n     * @codeflow id p-1\n     * @codeflow name Private\n     */\n    #run() {}\n\n    /**\n     * @codeflow id c-1\n     * @codeflow name Constructor\n     */\n    constructor() {}\n}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    assert!(methods.is_empty());
}

#[test]
fn test_bigint_initializer_is_not_captured() {
    let source = "/**\n * @codeflow id t-4\n * @codeflow name Big\n */\nfunction big() {\n    let b = 10n;\n    let h = 0x1Fn;\n    let n = 10;\n}\n";
    let (methods, _) = parse_typescript(source).unwrap();
    let vars = &methods[0].vars;
    assert_eq!(vars[0].name, "b");
    assert_eq!(vars[0].init, None);
    assert_eq!(vars[1].init, None);
    assert_eq!(vars[2].init, Some(InitValue::Number(10i64.into())));

    let json = serde_json::to_value(vars).unwrap();
    assert_eq!(json[0], serde_json::json!({ "name": "b" }));
}
