//! Step-argument classification.
//!
//! Callers hand the builder loosely-typed values; before a step is
//! appended each one is classified into a closed `StepArg` variant so the
//! rendering code matches exhaustively instead of re-testing shape at
//! every use site.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::GraphConfig;

use super::query::Traversal;

/// Tokens the remote engine resolves itself: `g.`-rooted traversals,
/// bare comparison operators, and class references.
static GRAPH_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^T\.(gt|gte|eq|neq|lte|lt)$|^g\.|^Vertex\.class\b|^Edge\.class\b")
        .expect("graph-reference grammar")
});

/// A whole value delimited by `{ }` is a closure fragment.
static CLOSURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{.*\}$").expect("closure grammar"));

/// A raw argument as supplied by the caller.
#[derive(Debug, Clone)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Structured document, rendered as a bracketed map literal
    Doc(Value),
    /// Sub-traversal whose script is embedded verbatim
    Query(Traversal),
    /// Escape hatch: emitted unchanged, no classification
    Verbatim(String),
}

impl Arg {
    /// Wrap a value so it bypasses classification entirely.
    pub fn verbatim(text: impl Into<String>) -> Self {
        Arg::Verbatim(text.into())
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Doc(v)
    }
}

impl From<Traversal> for Arg {
    fn from(v: Traversal) -> Self {
        Arg::Query(v)
    }
}

impl From<&Traversal> for Arg {
    fn from(v: &Traversal) -> Self {
        Arg::Query(v.clone())
    }
}

/// A classified step argument.
///
/// Every variant carries text (or a document) ready for rendering; the
/// only behavioral split left for the builder is that closures are
/// appended after the step's closing parenthesis instead of inside it.
#[derive(Debug, Clone, PartialEq)]
pub enum StepArg {
    /// Graph-reference token, embedded unquoted
    Reference(String),
    /// `{ .. }` fragment, appended out-of-band after the step
    Closure(String),
    /// Caller-supplied literal, emitted unchanged
    Verbatim(String),
    /// Structured document, rendered as a bracketed map literal
    Structured(Value),
    /// Quoted or raw scalar literal, already in final form
    Scalar(String),
}

impl StepArg {
    pub fn is_closure(&self) -> bool {
        matches!(self, StepArg::Closure(_))
    }

    /// The wire text for this argument.
    pub fn render(&self) -> String {
        match self {
            StepArg::Reference(s)
            | StepArg::Closure(s)
            | StepArg::Verbatim(s)
            | StepArg::Scalar(s) => s.clone(),
            StepArg::Structured(doc) => bracketed(doc),
        }
    }
}

/// Classify a raw argument against the literal rules.
///
/// String classification applies, in priority order: graph-reference
/// grammar, closure grammar, already-quoted literal, configured identity
/// pattern, numeric parse. Everything that falls through is a quoted
/// string literal.
pub fn classify(arg: Arg, config: &GraphConfig) -> StepArg {
    match arg {
        Arg::Query(t) => StepArg::Reference(t.script().to_string()),
        Arg::Verbatim(s) => StepArg::Verbatim(s),
        Arg::Doc(doc) => StepArg::Structured(doc),
        Arg::Bool(b) => StepArg::Scalar(b.to_string()),
        Arg::Int(i) => StepArg::Scalar(i.to_string()),
        Arg::Float(f) => StepArg::Scalar(f.to_string()),
        Arg::Str(s) => classify_str(s, config),
    }
}

fn classify_str(s: String, config: &GraphConfig) -> StepArg {
    if GRAPH_REF.is_match(&s) {
        return StepArg::Reference(s);
    }
    if CLOSURE.is_match(&s) {
        return StepArg::Closure(s);
    }
    // Re-classifying an already-rendered literal must not change it.
    if is_quoted(&s) {
        return StepArg::Scalar(s);
    }
    if config.is_id_string(&s) {
        return StepArg::Scalar(quote(&s));
    }
    if s.parse::<f64>().is_ok() {
        return StepArg::Scalar(s);
    }
    StepArg::Scalar(quote(&s))
}

/// Scalar literal for a JSON value inside an index specification.
pub(crate) fn value_literal(value: &Value, config: &GraphConfig) -> String {
    match value {
        Value::String(s) => classify_str(s.clone(), config).render(),
        other => other.to_string(),
    }
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'')
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "\\'"))
}

/// Render a structured document as a traversal-language map literal:
/// the document's braces become brackets at every nesting level. This is
/// structural re-serialization, not text substitution, so brace
/// characters inside string values are left alone.
pub(crate) fn bracketed(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), bracketed(v)))
                .collect();
            format!("[{}]", entries.join(","))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(bracketed).collect();
            format!("[{}]", rendered.join(","))
        }
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GraphConfig {
        GraphConfig::default()
    }

    #[test]
    fn test_graph_reference_verbatim() {
        assert_eq!(
            classify("g.v(1)".into(), &config()),
            StepArg::Reference("g.v(1)".to_string())
        );
        assert_eq!(
            classify("T.eq".into(), &config()),
            StepArg::Reference("T.eq".to_string())
        );
        assert_eq!(
            classify("Vertex.class".into(), &config()),
            StepArg::Reference("Vertex.class".to_string())
        );
    }

    #[test]
    fn test_closure_detected() {
        let arg = classify("{it.name=='marko'}".into(), &config());
        assert!(arg.is_closure());
        assert_eq!(arg.render(), "{it.name=='marko'}");
    }

    #[test]
    fn test_plain_string_quoted() {
        assert_eq!(classify("marko".into(), &config()).render(), "'marko'");
    }

    #[test]
    fn test_numeric_string_raw() {
        assert_eq!(classify("42".into(), &config()).render(), "42");
        assert_eq!(classify("0.6".into(), &config()).render(), "0.6");
    }

    #[test]
    fn test_partial_numeric_string_quoted() {
        // No prefix parsing: "5a" is not a number.
        assert_eq!(classify("5a".into(), &config()).render(), "'5a'");
    }

    #[test]
    fn test_id_pattern_quotes_numeric_looking_value() {
        let config = GraphConfig::default()
            .with_id_regex(regex::Regex::new(r"^[0-9]+:[0-9]+$").unwrap());
        assert_eq!(classify("12:7".into(), &config).render(), "'12:7'");
    }

    #[test]
    fn test_native_scalars_raw() {
        assert_eq!(classify(9i64.into(), &config()).render(), "9");
        assert_eq!(classify(0.5f64.into(), &config()).render(), "0.5");
        assert_eq!(classify(true.into(), &config()).render(), "true");
    }

    #[test]
    fn test_classification_idempotent() {
        let inputs = ["g.v(1)", "{it.age}", "marko", "42", "T.lt"];
        for input in inputs {
            let once = classify(input.into(), &config()).render();
            let twice = classify(once.clone().into(), &config()).render();
            assert_eq!(once, twice, "literal for {input:?} drifted");
        }
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(classify("o'brien".into(), &config()).render(), "'o\\'brien'");
    }

    #[test]
    fn test_bracketed_map_all_levels() {
        let doc = json!({"name": "marko", "nested": {"age": 29}});
        assert_eq!(
            bracketed(&doc),
            r#"["name":"marko","nested":["age":29]]"#
        );
    }

    #[test]
    fn test_bracketed_leaves_braces_in_strings() {
        let doc = json!({"fragment": "{a}"});
        assert_eq!(bracketed(&doc), r#"["fragment":"{a}"]"#);
    }

    #[test]
    fn test_verbatim_bypasses_rules() {
        let arg = classify(Arg::verbatim("x.y.z"), &config());
        assert_eq!(arg, StepArg::Verbatim("x.y.z".to_string()));
        assert_eq!(arg.render(), "x.y.z");
    }
}
