//! Environment-driven settings
//!
//! Every numeric setting falls back to its default, with a warning, when the
//! variable is present but does not parse.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CONVERSATION_IDLE_SECS: u64 = 30 * 60;

/// Parse `raw` or warn and return `default`
pub fn parse_or<T: FromStr + Copy + Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Ignoring unparsable setting");
            default
        }),
    }
}

/// Look up `key`, treating blank values as unset
pub fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Look up and parse `key`, falling back to `default`
pub fn read_or<T: FromStr + Copy + Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    parse_or(key, non_empty(lookup, key), default)
}

/// Process-level server settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    /// Conversations untouched for this long are dropped
    pub conversation_idle: Duration,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: read_or(&lookup, "SOFTSELL_PORT", DEFAULT_PORT),
            conversation_idle: Duration::from_secs(read_or(
                &lookup,
                "SOFTSELL_CONVERSATION_IDLE_SECS",
                DEFAULT_CONVERSATION_IDLE_SECS,
            )),
        }
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}
