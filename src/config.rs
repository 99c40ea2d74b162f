// src/config.rs
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::services::upstream::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_UPSTREAM_URL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/chat";
const DEFAULT_OWNER: &str = "Noah";
const DEFAULT_EMAIL: &str = "Noahbooner@gmail.com";

/// Who visitors are pointed at when the assistant cannot help.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub owner: String,
    pub email: String,
}

impl Default for Contact {
    fn default() -> Self {
        Self { owner: DEFAULT_OWNER.to_string(), email: DEFAULT_EMAIL.to_string() }
    }
}

impl Contact {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Contact::default();
        Self {
            owner: non_empty(lookup, "OWNER_NAME").unwrap_or(defaults.owner),
            email: non_empty(lookup, "CONTACT_EMAIL").unwrap_or(defaults.email),
        }
    }

    /// Proxy reply when the provider answers without text.
    pub fn upstream_fallback(&self) -> String {
        format!("I'm not sure, try reaching {} at {}!", self.owner, self.email)
    }

    /// Widget reply when the proxy answers without a `reply`.
    pub fn empty_reply_fallback(&self) -> String {
        format!(
            "I'm not sure about that. Feel free to reach out to {} directly at {}!",
            self.owner, self.email
        )
    }

    /// Widget reply when the proxy could not be reached.
    pub fn connection_fallback(&self) -> String {
        format!(
            "Hmm, couldn't connect right now. Try reaching {} directly at {}!",
            self.owner, self.email
        )
    }
}

#[derive(Clone)]
pub struct ProxyConfig {
    pub api_key: String,
    pub upstream_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub policy_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub contact: Contact,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("upstream_url", &self.upstream_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("policy_path", &self.policy_path)
            .field("bind_addr", &self.bind_addr)
            .field("contact", &self.contact)
            .finish_non_exhaustive()
    }
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(api_key) = non_empty(&lookup, "ANTHROPIC_API_KEY") else {
            bail!("ANTHROPIC_API_KEY must be set");
        };

        let max_tokens = match non_empty(&lookup, "MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("MAX_TOKENS is not a number: {raw}"))?,
            None => DEFAULT_MAX_TOKENS,
        };

        let bind_raw = non_empty(&lookup, "BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {bind_raw}"))?;

        Ok(Self {
            api_key,
            upstream_url: non_empty(&lookup, "UPSTREAM_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            model: non_empty(&lookup, "UPSTREAM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            policy_path: non_empty(&lookup, "SYSTEM_PROMPT_PATH").map(PathBuf::from),
            bind_addr,
            contact: Contact::from_lookup(&lookup),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub contact: Contact,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            proxy_url: non_empty(&lookup, "PROXY_URL").unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
            contact: Contact::from_lookup(&lookup),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let cfg = ProxyConfig::from_lookup(env(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.max_tokens, 350);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert!(cfg.policy_path.is_none());
        assert_eq!(cfg.contact, Contact::default());
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert!(ProxyConfig::from_lookup(env(&[])).is_err());
        assert!(ProxyConfig::from_lookup(env(&[("ANTHROPIC_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = ProxyConfig::from_lookup(env(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("MAX_TOKENS", "64"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SYSTEM_PROMPT_PATH", "/etc/policy.txt"),
            ("OWNER_NAME", "Ada"),
            ("CONTACT_EMAIL", "ada@example.com"),
        ]))
        .unwrap();
        assert_eq!(cfg.max_tokens, 64);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.policy_path, Some(PathBuf::from("/etc/policy.txt")));
        assert_eq!(
            cfg.contact.connection_fallback(),
            "Hmm, couldn't connect right now. Try reaching Ada directly at ada@example.com!"
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let result = ProxyConfig::from_lookup(env(&[("ANTHROPIC_API_KEY", "k"), ("MAX_TOKENS", "lots")]));
        assert!(result.is_err());
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let cfg = ProxyConfig::from_lookup(env(&[("ANTHROPIC_API_KEY", "sk-very-secret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("sk-very-secret"));
    }

    #[test]
    fn client_defaults_to_the_local_proxy() {
        let cfg = ClientConfig::from_lookup(env(&[]));
        assert_eq!(cfg.proxy_url, DEFAULT_PROXY_URL);
        assert!(cfg.contact.empty_reply_fallback().contains("Noahbooner@gmail.com"));
    }
}
