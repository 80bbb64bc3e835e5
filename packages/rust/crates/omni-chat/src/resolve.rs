//! CLI > environment > settings file > default resolution helpers.

use std::str::FromStr;

pub(crate) fn resolve_string(
    cli_value: Option<String>,
    env_name: &str,
    settings_value: Option<&str>,
    default: &str,
) -> String {
    if let Some(value) = cli_value.filter(|v| !v.trim().is_empty()) {
        return value;
    }
    if let Some(value) = non_empty_env(env_name) {
        return value;
    }
    if let Some(value) = settings_value.map(str::trim).filter(|v| !v.is_empty()) {
        return value.to_string();
    }
    default.to_string()
}

pub(crate) fn resolve_positive_u64(
    cli_value: Option<u64>,
    env_name: &str,
    settings_value: Option<u64>,
    default: u64,
) -> u64 {
    if let Some(value) = cli_value
        && value > 0
    {
        return value;
    }
    if let Some(value) = parse_positive_u64_from_env(env_name) {
        return value;
    }
    if let Some(value) = settings_value
        && value > 0
    {
        return value;
    }
    default
}

/// `None` means unlimited.
pub(crate) fn resolve_optional_positive_usize(
    cli_value: Option<usize>,
    env_name: &str,
    settings_value: Option<usize>,
) -> Option<usize> {
    if let Some(value) = cli_value
        && value > 0
    {
        return Some(value);
    }
    if let Some(value) = parse_positive_usize_from_env(env_name) {
        return Some(value);
    }
    settings_value.filter(|value| *value > 0)
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_positive_u32_from_env(name: &str) -> Option<u32> {
    parse_positive_from_env(name)
}

pub(crate) fn parse_positive_usize_from_env(name: &str) -> Option<usize> {
    parse_positive_from_env(name)
}

pub(crate) fn parse_positive_u64_from_env(name: &str) -> Option<u64> {
    parse_positive_from_env(name)
}

/// Zero and unparsable values are logged and treated as unset.
fn parse_positive_from_env<T>(name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            tracing::warn!(
                env_var = %name,
                value = %raw,
                "ignoring env override: expected a positive integer"
            );
            None
        }
    }
}

/// Sampling temperature from env; accepts `0.0..=2.0`.
pub(crate) fn parse_temperature_from_env(name: &str) -> Option<f32> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f32>() {
        Ok(value) if (0.0..=2.0).contains(&value) => Some(value),
        _ => {
            tracing::warn!(
                env_var = %name,
                value = %raw,
                "ignoring env override: temperature must be within 0.0..=2.0"
            );
            None
        }
    }
}

pub(crate) fn parse_bool_from_env(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(
                env_var = %name,
                value = %raw,
                "ignoring env override: expected true/false"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/resolve.rs"]
mod tests;
