// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fetch",
    about = "Agentic chat orchestrator: routes messages to reflexes, slash commands, and an LM-driven tool loop",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the orchestrator against the local smoke-test transport.
    ///
    /// Wires the router, session store, task manager, and harness registry
    /// from config and reads lines from stdin as if they were chat messages
    /// from a single thread.
    Serve {
        /// Thread id to use for the smoke-test session.
        #[arg(long, default_value = "local")]
        thread: String,
    },

    /// Print the effective configuration and exit.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Dump the resolved configuration as YAML.
    Show,
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "fetch", &mut std::io::stdout());
}
