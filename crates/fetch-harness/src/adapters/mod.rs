// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod claude_like;
mod copilot_like;
mod gemini_like;

pub use claude_like::ClaudeLikeAdapter;
pub use copilot_like::CopilotLikeAdapter;
pub use gemini_like::GeminiLikeAdapter;
