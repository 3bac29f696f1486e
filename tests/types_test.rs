use codeflow::types::*;

#[test]
fn mode_from_operator() {
    assert_eq!(Mode::from_operator("&&"), Some(Mode::And));
    assert_eq!(Mode::from_operator("||"), Some(Mode::Or));
    assert_eq!(Mode::from_operator("|"), None);
    assert_eq!(Mode::from_operator("??"), None);
}

#[test]
fn edge_kind_from_variable() {
    assert_eq!(EdgeKind::from_variable("$fail"), Some(EdgeKind::Fail));
    assert_eq!(EdgeKind::from_variable("$last"), Some(EdgeKind::Last));
    assert_eq!(EdgeKind::from_variable("$next"), Some(EdgeKind::Next));
    assert_eq!(EdgeKind::from_variable("$step"), None);
    assert_eq!(EdgeKind::from_variable("next"), None);
}

#[test]
fn edge_display_and_parse() {
    let edge = Edge::new(4.0, Mode::And);
    assert_eq!(edge.to_string(), "4 &&");
    assert_eq!(Edge::new(2.5, Mode::Or).to_string(), "2.5 ||");

    let parsed: Edge = "3 ||".parse().unwrap();
    assert_eq!(parsed, Edge::new(3.0, Mode::Or));
    assert!("3".parse::<Edge>().is_err());
    assert!("x &&".parse::<Edge>().is_err());
    assert!("3 |".parse::<Edge>().is_err());
}

#[test]
fn edge_serializes_as_string() {
    let step = Step::decision(EdgeKind::Next, Edge::new(4.0, Mode::And));
    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(json, serde_json::json!({ "next": "4 &&" }));

    let back: Step = serde_json::from_value(json).unwrap();
    assert_eq!(back, step);
    assert_eq!(back.edge(), Some((EdgeKind::Next, Edge::new(4.0, Mode::And))));
}

#[test]
fn code_step_omits_absent_fields() {
    let mut step = Step::code("prompt()".to_string(), Some("$test".to_string()));
    step.annotate(Annotations {
        name: Some("Ask".to_string()),
        info: None,
        px: None,
    });
    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "code": "prompt()", "assign": "$test", "name": "Ask" })
    );
    assert_eq!(step.edge(), None);
}

#[test]
fn method_omits_empty_vars_and_body() {
    let method = Method {
        id: "cf-0".to_string(),
        name: "Empty".to_string(),
        info: None,
        px: None,
        indent: [4, 4],
        span: [10, 40],
        vars: Vec::new(),
        body: Vec::new(),
    };
    let json = serde_json::to_value(&method).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": "cf-0",
            "name": "Empty",
            "indent": "4 4",
            "span": "10 40",
        })
    );

    let back: Method = serde_json::from_value(json).unwrap();
    assert_eq!(back, method);
}

#[test]
fn method_rejects_malformed_pairs() {
    let json = serde_json::json!({
        "id": "cf-0",
        "name": "Broken",
        "indent": "4",
        "span": "10 40",
    });
    assert!(serde_json::from_value::<Method>(json).is_err());

    let json = serde_json::json!({
        "id": "cf-0",
        "name": "Broken",
        "indent": "4 x",
        "span": "10 40",
    });
    assert!(serde_json::from_value::<Method>(json).is_err());
}

#[test]
fn var_spec_serializes_type_and_literal_init() {
    let vars = vec![
        VarSpec {
            name: "x".to_string(),
            ty: None,
            init: Some(InitValue::Number(3i64.into())),
        },
        VarSpec {
            name: "y".to_string(),
            ty: Some("string | number".to_string()),
            init: None,
        },
        VarSpec {
            name: "s".to_string(),
            ty: None,
            init: Some(InitValue::String("hi".to_string())),
        },
        VarSpec {
            name: "b".to_string(),
            ty: None,
            init: Some(InitValue::Bool(false)),
        },
    ];
    let json = serde_json::to_value(&vars).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            { "name": "x", "init": 3 },
            { "name": "y", "type": "string | number" },
            { "name": "s", "init": "hi" },
            { "name": "b", "init": false },
        ])
    );
}

#[test]
fn format_number_drops_integral_fraction() {
    assert_eq!(format_number(4.0), "4");
    assert_eq!(format_number(-2.0), "-2");
    assert_eq!(format_number(0.5), "0.5");
}
