// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod error;
mod mock;
mod openai_compat;
mod provider;
mod types;

pub use error::ModelError;
pub use mock::{MockProvider, ScriptedMockProvider};
pub use openai_compat::OpenAICompatProvider;
pub use provider::ModelProvider;
pub use types::*;

use anyhow::bail;
use fetch_config::ModelConfig;

/// Construct a boxed [`ModelProvider`] from configuration.
///
/// `"mock"` (default) needs no network access and is used for local smoke
/// testing; `"openai"` speaks the generic OpenAI-compatible wire format
/// against `base_url` (default the hosted OpenAI API).
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Box<dyn ModelProvider>> {
    let api_key = cfg
        .api_key_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok());

    match cfg.provider.as_str() {
        "mock" => Ok(Box::new(MockProvider)),
        "openai" => Ok(Box::new(OpenAICompatProvider::new(
            cfg.name.clone(),
            api_key,
            cfg.base_url.as_deref(),
        ))),
        other => bail!("unknown model provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_mock_provider() {
        let cfg = ModelConfig {
            provider: "mock".into(),
            ..ModelConfig::default()
        };
        let provider = from_config(&cfg).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn from_config_openai_provider() {
        let cfg = ModelConfig {
            provider: "openai".into(),
            name: "gpt-4o-mini".into(),
            ..ModelConfig::default()
        };
        let provider = from_config(&cfg).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn from_config_unknown_provider_errors() {
        let cfg = ModelConfig {
            provider: "unknown-driver".into(),
            ..ModelConfig::default()
        };
        assert!(from_config(&cfg).is_err());
    }
}
