//! Dynamically typed port values.
//!
//! Values flow through the engine as tagged JSON (`serde_json::Value`).
//! The scheduler never coerces between types — coercion, where it's
//! needed at all, lives in the node that cares (e.g. the RAG node's
//! `mode` string normalization). The one exception is [`is_truthy`], kept
//! central so every node and the scheduler's `active` gate agree on what
//! "truthy" means.

pub use serde_json::Value;

/// Evaluate the "truthy" rule used by the scheduler's `active` gate and by
/// any node that needs a boolean-ish read of a dynamically typed value.
///
/// Rules: booleans as-is; numbers are truthy unless zero; strings are
/// truthy unless empty; arrays/objects are truthy unless empty; `null` and
/// a missing value are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_rules() {
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&json!(true)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!([1])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!({"a": 1})));
    }

    #[test]
    fn missing_input_defaults_to_true_per_active_gate_contract() {
        // `active` with no producer and no default is treated as `true`
        // by the scheduler (see scheduler::StrictFlow), independent of
        // this helper — documented here because both rely on the same
        // truthy semantics.
        assert!(is_truthy(&json!(true)));
    }
}
