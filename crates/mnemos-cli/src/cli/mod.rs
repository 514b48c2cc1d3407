//! CLI command definitions for the `mnemos` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod adapter;
pub mod invoke;
pub mod profile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Per-owner memory profiles with runtime-extensible capabilities.
#[derive(Parser)]
#[command(name = "mnemos", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans as OpenTelemetry traces on stdout.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or extend an owner's memory profile.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Invoke a capability on a memory entity.
    Invoke {
        /// Owner id (e.g. "676").
        owner: String,

        /// Entity (role) name, e.g. "SemanticMemory".
        entity: String,

        /// Namespace the entity's fragments live in.
        namespace: String,

        /// Capability name, e.g. "add_memories".
        capability: String,

        /// Capability arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,

        /// Grant the capability to the entity before invoking it.
        #[arg(long)]
        grant: bool,
    },

    /// List the capability names with a built-in implementation.
    #[command(alias = "ops")]
    Operations,

    /// Classify a piece of content into the content taxonomy.
    Classify {
        /// Text to classify.
        text: String,

        /// Print the prompt that would be sent and exit without calling the model.
        #[arg(long)]
        show_prompt: bool,
    },

    /// Transcribe an audio file.
    Transcribe {
        path: PathBuf,
    },

    /// Describe what an image shows.
    #[command(name = "describe-image")]
    DescribeImage {
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Resolve an owner (creating the profile on first sight) and print it.
    Show {
        owner: String,
    },

    /// Add names to an owner's vocabulary and persist them.
    Extend {
        owner: String,

        /// Attribute name to add (repeatable).
        #[arg(long = "attribute")]
        attributes: Vec<String>,

        /// Capability name to add (repeatable).
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
}
