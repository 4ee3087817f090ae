// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("rate limited, retry shortly")]
    RateLimited,
    #[error("invalid mode transition: {from} -> {to}")]
    InvalidModeTransition { from: String, to: String },
    #[error(transparent)]
    Store(#[from] fetch_store::StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
