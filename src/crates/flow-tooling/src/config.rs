//! Configuration loading: environment variables, `.env` files, and a
//! process-wide JSON config tree that the config-value resolver (C5 in
//! `flow-core`) reads from under its `config` mode.

use crate::{Result, ToolingError};
use serde_json::Value;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// Load a `.env` file (if present) into the process environment. Mirrors
/// `dotenvy::dotenv()`; never errors if the file is simply absent.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Read an environment variable as a string.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::General(format!(
            "environment variable {key} contains invalid UTF-8"
        ))),
    }
}

/// Read and parse an environment variable into `T`.
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => val
            .parse::<T>()
            .map(Some)
            .map_err(|e| ToolingError::General(format!("failed to parse {key}: {e}"))),
        None => Ok(None),
    }
}

/// Read an environment variable, falling back to `default` if unset.
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Read a boolean environment variable. Recognizes `true/1/yes/on` and
/// `false/0/no/off` case-insensitively.
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    match get_env(key)? {
        None => Ok(None),
        Some(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            other => Err(ToolingError::General(format!(
                "environment variable {key} is not a valid boolean: {other}"
            ))),
        },
    }
}

static PROCESS_CONFIG: OnceLock<Value> = OnceLock::new();

/// Install the process-wide config tree used by the `config` value-spec
/// mode. Only the first call takes effect; later calls are ignored (the
/// config tree is meant to be installed once, at flow-factory startup).
pub fn install_process_config(config: Value) {
    let _ = PROCESS_CONFIG.set(config);
}

/// Look up a dotted path (`"db.host"`) in the installed process config
/// tree. Returns `None` if no config was installed, or if any segment is
/// missing.
pub fn get_config_path(path: &str) -> Option<Value> {
    let root = PROCESS_CONFIG.get()?;
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_common_spellings() {
        env::set_var("FLOW_TOOLING_TEST_BOOL", "yes");
        assert_eq!(get_env_bool("FLOW_TOOLING_TEST_BOOL").unwrap(), Some(true));
        env::remove_var("FLOW_TOOLING_TEST_BOOL");
        assert_eq!(get_env_bool("FLOW_TOOLING_TEST_BOOL").unwrap(), None);
    }

    #[test]
    fn env_or_falls_back_to_default() {
        env::remove_var("FLOW_TOOLING_TEST_MISSING");
        assert_eq!(
            get_env_or("FLOW_TOOLING_TEST_MISSING", "fallback").unwrap(),
            "fallback"
        );
    }
}
