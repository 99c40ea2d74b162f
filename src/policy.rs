// src/policy.rs
use std::path::Path;

use anyhow::{Context, Result, bail};

const BUILTIN_POLICY: &str = include_str!("../policy/system_prompt.txt");
const VERSION_PREFIX: &str = "# version:";

/// The system prompt attached to every upstream call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    pub version: String,
    pub text: String,
}

impl Policy {
    /// Split an optional `# version: ...` first line off the policy text.
    pub fn parse(raw: &str, fallback_version: &str) -> Result<Self> {
        let raw = raw.trim_start_matches('\u{feff}');
        let (version, body) = match raw.split_once('\n') {
            Some((first, rest)) if first.trim_start().starts_with(VERSION_PREFIX) => {
                (label_of(first), rest)
            }
            None if raw.trim_start().starts_with(VERSION_PREFIX) => (label_of(raw), ""),
            _ => (fallback_version.to_string(), raw),
        };

        let text = body.trim().to_string();
        if text.is_empty() {
            bail!("policy {version} has no prompt text");
        }
        Ok(Self { version, text })
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_POLICY, "builtin")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading policy file {}", path.display()))?;
        let fallback = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&raw, &fallback)
    }
}

fn label_of(line: &str) -> String {
    line.trim_start()
        .trim_start_matches(VERSION_PREFIX)
        .trim()
        .to_string()
}
