// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::HarnessAdapter;
use crate::adapters::{ClaudeLikeAdapter, CopilotLikeAdapter, GeminiLikeAdapter};
use crate::error::HarnessError;

/// `auto` resolves to the first adapter in this order. Fixed rather than
/// configurable: the orchestrator has no basis for preferring one CLI over
/// another beyond "try the most capable first".
const AUTO_ORDER: &[&str] = &["claude-like", "gemini-like", "copilot-like"];

/// Adapters keyed by agent name, with `auto` resolving to a fixed
/// preference order.
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn HarnessAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut adapters: HashMap<&'static str, Arc<dyn HarnessAdapter>> = HashMap::new();
        let claude = Arc::new(ClaudeLikeAdapter) as Arc<dyn HarnessAdapter>;
        let gemini = Arc::new(GeminiLikeAdapter) as Arc<dyn HarnessAdapter>;
        let copilot = Arc::new(CopilotLikeAdapter::default()) as Arc<dyn HarnessAdapter>;
        adapters.insert(claude.agent(), claude);
        adapters.insert(gemini.agent(), gemini);
        adapters.insert(copilot.agent(), copilot);
        Self { adapters }
    }
}

impl AdapterRegistry {
    pub fn resolve(&self, agent: &str) -> Result<Arc<dyn HarnessAdapter>, HarnessError> {
        if agent == "auto" {
            for candidate in AUTO_ORDER {
                if let Some(adapter) = self.adapters.get(candidate) {
                    return Ok(adapter.clone());
                }
            }
            unreachable!("AUTO_ORDER names must all be registered");
        }
        self.adapters
            .get(agent)
            .cloned()
            .ok_or_else(|| HarnessError::UnknownAgent(agent.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_to_first_in_fixed_order() {
        let registry = AdapterRegistry::default();
        let adapter = registry.resolve("auto").unwrap();
        assert_eq!(adapter.agent(), "claude-like");
    }

    #[test]
    fn resolves_named_agent() {
        let registry = AdapterRegistry::default();
        assert_eq!(registry.resolve("gemini-like").unwrap().agent(), "gemini-like");
    }

    #[test]
    fn unknown_agent_is_an_error() {
        let registry = AdapterRegistry::default();
        assert!(matches!(registry.resolve("nonexistent"), Err(HarnessError::UnknownAgent(_))));
    }
}
