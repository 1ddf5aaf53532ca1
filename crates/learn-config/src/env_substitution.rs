use learn_core::{LearnError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::env;

// Supports both ${VAR} and ${VAR:-default}
static ENV_VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Recursively substitute environment variables in a JSON value
pub fn substitute_env_vars(value: &mut Value) -> Result<()> {
    substitute_with(value, &|name| env::var(name).ok())
}

/// Same as [`substitute_env_vars`] but resolves variables through `lookup`.
pub fn substitute_with(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) -> Result<()> {
    match value {
        Value::String(s) => {
            *s = substitute_in_string(s, lookup)?;
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                substitute_with(v, lookup)?;
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                substitute_with(v, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn substitute_in_string(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut missing_vars = Vec::new();

    let result = ENV_VAR_REGEX.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match lookup(var_name) {
            Some(value) => value,
            None => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    missing_vars.push(var_name.to_string());
                    cap[0].to_string()
                }
            },
        }
    });

    if !missing_vars.is_empty() {
        return Err(LearnError::ConfigError(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result.into_owned())
}
