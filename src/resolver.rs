//! Chat reply resolution
//!
//! Remote completion when a credential is configured, then the keyword
//! table, then a fixed default. Callers always get a reply.

mod keywords;

#[cfg(test)]
mod proptests;

pub use keywords::KeywordTable;

use crate::llm::{
    LlmError, LlmMessage, LlmRequest, LlmService, LoggingService, OpenAIService, ResolverConfig,
    SystemContent,
};
use crate::system_prompt::DEFAULT_REPLY;
use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can answer a visitor's message
#[async_trait]
pub trait ReplySource: Send + Sync {
    /// Produce reply text. Implementations handle their own failures.
    async fn reply(&self, message: &str) -> String;
}

#[async_trait]
impl<T: ReplySource + ?Sized> ReplySource for Arc<T> {
    async fn reply(&self, message: &str) -> String {
        (**self).reply(message).await
    }
}

struct RemoteTier {
    service: Arc<dyn LlmService>,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

/// Three-tier resolver: remote, keyword, default
pub struct ResponseResolver {
    keywords: KeywordTable,
    remote: Option<RemoteTier>,
}

impl ResponseResolver {
    /// Keyword table and default only
    pub fn local(keywords: KeywordTable) -> Self {
        Self {
            keywords,
            remote: None,
        }
    }

    /// Build the production resolver. The `OpenAI` provider is only
    /// constructed when the config carries a credential.
    pub fn from_config(config: &ResolverConfig, keywords: KeywordTable) -> Result<Self, LlmError> {
        let Some(api_key) = &config.api_key else {
            return Ok(Self::local(keywords));
        };
        let provider = OpenAIService::new(api_key.clone(), &config.endpoint, &config.model)?;
        let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(provider)));
        Ok(Self::with_service(config, keywords, service))
    }

    /// Use `service` as the remote tier, but only if `config` has a credential
    pub fn with_service(
        config: &ResolverConfig,
        keywords: KeywordTable,
        service: Arc<dyn LlmService>,
    ) -> Self {
        let remote = config.has_credential().then(|| RemoteTier {
            service,
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        });
        Self { keywords, remote }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn resolve(&self, message: &str) -> String {
        if let Some(remote) = &self.remote {
            if let Some(text) = Self::resolve_remote(remote, message).await {
                return text;
            }
        }
        self.resolve_local(message)
    }

    /// Keyword match, else the default reply. Pure.
    pub fn resolve_local(&self, message: &str) -> String {
        self.keywords
            .lookup(message)
            .unwrap_or(DEFAULT_REPLY)
            .to_string()
    }

    async fn resolve_remote(remote: &RemoteTier, message: &str) -> Option<String> {
        let request = LlmRequest {
            system: vec![SystemContent::new(&remote.system_prompt)],
            messages: vec![LlmMessage::user(message)],
            max_tokens: Some(remote.max_tokens),
            temperature: Some(remote.temperature),
        };

        match remote.service.complete(&request).await {
            Ok(response) => {
                let text = response.text.trim();
                if text.is_empty() {
                    tracing::warn!("Remote completion was blank, using keyword table");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = ?e.kind,
                    "Remote completion failed, using keyword table"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ReplySource for ResponseResolver {
    async fn reply(&self, message: &str) -> String {
        self.resolve(message).await
    }
}
