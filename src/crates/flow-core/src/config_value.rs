//! Config-value resolution (C5): a small sum type describing how to
//! obtain a runtime value, resolved centrally so nodes never inline their
//! own environment lookups (§9 design notes).

use crate::context::Context;
use crate::error::{FlowError, Result};
use crate::value::Value;
use serde::Deserialize;
use uuid::Uuid;

/// How to obtain a value at bind time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ValueSpec {
    /// Use `value` verbatim.
    Fixed { value: Value },
    /// Same resolution as `fixed`; distinguished only for readability in
    /// flow documents (a port's own default vs. an explicit override).
    Default { value: Value },
    /// Read environment variable `key`, falling back to `default` (or
    /// `Value::Null`) if unset.
    Env {
        key: String,
        #[serde(default)]
        default: Option<Value>,
    },
    /// Look up a dotted path in the installed process config tree,
    /// falling back to `default` if the path is missing.
    Config {
        key: String,
        #[serde(default)]
        default: Option<Value>,
    },
    /// Generate a random value. `kind` defaults to `"string"`.
    Random {
        #[serde(default = "default_random_kind")]
        kind: RandomKind,
        #[serde(default = "default_random_length")]
        length: usize,
    },
    /// Generate a fresh UUID v4 string.
    Uuid,
    /// Copy a variable from the run's [`Context`] by name.
    Inherit { key: String },
}

fn default_random_kind() -> RandomKind {
    RandomKind::String
}

fn default_random_length() -> usize {
    16
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomKind {
    String,
    Int,
}

/// A value spec, or a plain scalar used as shorthand for `fixed`. Flow
/// documents write either form; `ValueOrSpec::into_spec` normalizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueOrSpec {
    Spec(ValueSpec),
    Scalar(Value),
}

impl ValueOrSpec {
    pub fn into_spec(self) -> ValueSpec {
        match self {
            ValueOrSpec::Spec(spec) => spec,
            ValueOrSpec::Scalar(value) => ValueSpec::Fixed { value },
        }
    }
}

/// Resolves [`ValueSpec`]s against an explicit config tree. Not tied to
/// `flow_tooling::config`'s process-global singleton so resolution stays
/// testable without global state; a binary wires the two together at
/// startup if it wants `install_process_config` to feed this.
#[derive(Clone, Default)]
pub struct ConfigResolver {
    config: Option<std::sync::Arc<Value>>,
}

impl ConfigResolver {
    pub fn new(config: Option<std::sync::Arc<Value>>) -> Self {
        Self { config }
    }

    pub fn resolve(&self, spec: &ValueSpec, ctx: &Context) -> Result<Value> {
        match spec {
            ValueSpec::Fixed { value } | ValueSpec::Default { value } => Ok(value.clone()),
            ValueSpec::Env { key, default } => {
                Ok(std::env::var(key).map(Value::String).unwrap_or_else(|_| {
                    default.clone().unwrap_or(Value::Null)
                }))
            }
            ValueSpec::Config { key, default } => Ok(self
                .lookup_config(key)
                .unwrap_or_else(|| default.clone().unwrap_or(Value::Null))),
            ValueSpec::Random { kind, length } => Ok(generate_random(*kind, *length)),
            ValueSpec::Uuid => Ok(Value::String(Uuid::new_v4().to_string())),
            ValueSpec::Inherit { key } => ctx
                .get_var(key)
                .ok_or_else(|| FlowError::validation(format!("no inherited value for '{key}'"))),
        }
    }

    fn lookup_config(&self, path: &str) -> Option<Value> {
        let root = self.config.as_deref()?;
        let mut current = root;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }
}

fn generate_random(kind: RandomKind, length: usize) -> Value {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    match kind {
        RandomKind::String => {
            const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
            let s: String = (0..length)
                .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
                .collect();
            Value::String(s)
        }
        RandomKind::Int => Value::from(rng.gen_range(0..i64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMemory;
    use serde_json::json;
    use std::sync::Arc;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(Some(Arc::new(json!({ "db": { "host": "localhost" } }))))
    }

    fn ctx() -> Context {
        Context::new(Arc::new(InMemoryMemory::new()))
    }

    #[test]
    fn fixed_returns_value_verbatim() {
        let spec = ValueSpec::Fixed { value: json!(42) };
        assert_eq!(resolver().resolve(&spec, &ctx()).unwrap(), json!(42));
    }

    #[test]
    fn env_falls_back_to_default_when_unset() {
        std::env::remove_var("FLOW_CORE_TEST_ENV_VAR");
        let spec = ValueSpec::Env {
            key: "FLOW_CORE_TEST_ENV_VAR".into(),
            default: Some(json!("fallback")),
        };
        assert_eq!(resolver().resolve(&spec, &ctx()).unwrap(), json!("fallback"));
    }

    #[test]
    fn config_resolves_dotted_path() {
        let spec = ValueSpec::Config { key: "db.host".into(), default: None };
        assert_eq!(resolver().resolve(&spec, &ctx()).unwrap(), json!("localhost"));
    }

    #[test]
    fn config_missing_path_falls_back_to_default() {
        let spec = ValueSpec::Config { key: "db.port".into(), default: Some(json!(5432)) };
        assert_eq!(resolver().resolve(&spec, &ctx()).unwrap(), json!(5432));
    }

    #[test]
    fn uuid_mode_produces_a_parseable_uuid() {
        let value = resolver().resolve(&ValueSpec::Uuid, &ctx()).unwrap();
        let s = value.as_str().unwrap();
        assert!(Uuid::parse_str(s).is_ok());
    }

    #[test]
    fn inherit_reads_context_var() {
        let context = ctx();
        context.set_var("session_id", json!("abc"));
        let spec = ValueSpec::Inherit { key: "session_id".into() };
        assert_eq!(resolver().resolve(&spec, &context).unwrap(), json!("abc"));
    }

    #[test]
    fn inherit_missing_var_is_an_error() {
        let spec = ValueSpec::Inherit { key: "missing".into() };
        assert!(resolver().resolve(&spec, &ctx()).is_err());
    }

    #[test]
    fn scalar_shorthand_normalizes_to_fixed() {
        let parsed: ValueOrSpec = serde_json::from_value(json!("hello")).unwrap();
        match parsed.into_spec() {
            ValueSpec::Fixed { value } => assert_eq!(value, json!("hello")),
            other => panic!("expected Fixed, got {other:?}"),
        }
    }
}
