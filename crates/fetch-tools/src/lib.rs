// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod builtin;
pub mod events;
pub mod policy;
pub mod ports;
pub mod registry;
pub mod tool;

pub use events::ToolEvent;
pub use policy::ApprovalPolicy;
pub use ports::{TaskPort, TaskSummary, WorkspacePort, WorkspaceSummary};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{OutputCategory, Tool, ToolCall, ToolOutput, ToolOutputPart};

pub use builtin::ask_user::AskUserTool;
pub use builtin::report_progress::ReportProgressTool;
pub use builtin::task_cancel::TaskCancelTool;
pub use builtin::task_create::TaskCreateTool;
pub use builtin::task_respond::TaskRespondTool;
pub use builtin::workspace_create::WorkspaceCreateTool;
pub use builtin::workspace_delete::WorkspaceDeleteTool;
pub use builtin::workspace_list::WorkspaceListTool;
pub use builtin::workspace_select::WorkspaceSelectTool;
pub use builtin::workspace_status::WorkspaceStatusTool;
