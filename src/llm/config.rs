//! Configuration for the chat widget's remote completion tier

use super::openai::DEFAULT_ENDPOINT;
use crate::settings::{non_empty, read_or};
use crate::system_prompt::BROKERAGE_PROMPT;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Remote resolver settings, fixed for the life of the process.
///
/// `api_key` selects the strategy: with a key the resolver asks the remote
/// endpoint first, without one it answers from the keyword table only.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: BROKERAGE_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            endpoint: non_empty(&lookup, "SOFTSELL_LLM_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: non_empty(&lookup, "OPENAI_API_KEY"),
            model: non_empty(&lookup, "SOFTSELL_LLM_MODEL").unwrap_or(defaults.model),
            system_prompt: defaults.system_prompt,
            max_tokens: read_or(&lookup, "SOFTSELL_LLM_MAX_TOKENS", defaults.max_tokens),
            temperature: read_or(&lookup, "SOFTSELL_LLM_TEMPERATURE", defaults.temperature),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
