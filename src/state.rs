// src/state.rs
use std::sync::Arc;

use crate::config::{Contact, ProxyConfig};
use crate::policy::Policy;
use crate::services::upstream::{AnthropicClient, LlmProvider};

pub type SharedState = Arc<AppState>;

/// Read-only configuration shared by every proxy invocation.
pub struct AppState {
    pub provider: Arc<dyn LlmProvider>,
    pub policy: Policy,
    pub model: String,
    pub max_tokens: u32,
    pub contact: Contact,
}

impl AppState {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: Policy, config: &ProxyConfig) -> Self {
        Self {
            provider,
            policy,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            contact: config.contact.clone(),
        }
    }

    pub fn from_config(config: &ProxyConfig, policy: Policy) -> Self {
        let provider = AnthropicClient::new(config.api_key.clone(), config.upstream_url.clone());
        Self::new(Arc::new(provider), policy, config)
    }
}
