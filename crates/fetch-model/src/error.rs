// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Errors a [`crate::ModelProvider`] can surface. Carries enough structure
/// (HTTP status) for the caller's retry policy to classify the failure
/// without string-matching `anyhow::Error`.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ModelError {
    /// 429 and 5xx are transient; 4xx other than 429 indicate a bad request
    /// or bad credentials and are not worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Http { status, .. } => *status == 429 || *status >= 500,
            ModelError::Transport(_) => true,
        }
    }
}
