//! Typed-literal codec for the property-update protocol.
//!
//! The remote engine's batch endpoint wants every scalar in an update
//! document wrapped in a `(tag,value)` pair: `b` for booleans, `l` for
//! integers, `d` for floating-point, untouched text for strings. Arrays
//! become `(list,(..))`, nested maps `(map,(k=v,..))`. Create operations
//! send raw documents; only update staging routes through here.

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// Control fields of an operation record. Passed through unconverted at
/// the top level only, so an already-partially-tagged record can be fed
/// back through the codec without corrupting its bookkeeping.
const RESERVED_KEYS: [&str; 5] = ["_id", "_type", "_action", "_outV", "_inV"];

/// Convert a document into its type-tagged textual form.
///
/// Top-level `null` passes through; a top-level keyed map keeps its
/// reserved control fields and tags everything else; any other shape is
/// encoded as a nested value.
pub fn encode_document(doc: &Value) -> Value {
    match doc {
        Value::Null => Value::Null,
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    out.insert(key.clone(), value.clone());
                } else {
                    out.insert(key.clone(), Value::String(encode_nested(value)));
                }
            }
            Value::Object(out)
        }
        other => Value::String(encode_nested(other)),
    }
}

/// `(long,<epoch-milliseconds>)` — the tagged form for date properties.
pub fn date_literal(dt: &DateTime<Utc>) -> String {
    format!("(long,{})", dt.timestamp_millis())
}

fn encode_nested(value: &Value) -> String {
    match value {
        Value::Null => "(null,null)".to_string(),
        Value::Bool(b) => format!("(b,{})", b),
        Value::Number(n) => number_literal(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let encoded: Vec<String> = items.iter().map(encode_nested).collect();
            format!("(list,({}))", encoded.join(","))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}={}", k, encode_nested(v)))
                .collect();
            format!("(map,({}))", entries.join(","))
        }
    }
}

/// Integer coercion first; accept it only if the integer's text
/// round-trips to the original. Then float coercion under the same
/// round-trip rule. A value that survives neither is shipped as opaque
/// text and reported to the diagnostic sink.
fn number_literal(n: &Number) -> String {
    let text = n.to_string();
    if let Some(i) = n.as_i64() {
        if i.to_string() == text {
            return format!("(l,{})", i);
        }
    }
    if let Some(f) = n.as_f64() {
        let round_trips = Number::from_f64(f)
            .map(|m| m.to_string() == text)
            .unwrap_or(false);
        if round_trips {
            return format!("(d,{})", text);
        }
    }
    warn!(value = %text, "numeric literal failed integer and float round-trip, sending as text");
    text
}
