//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Moonquake - a declarative build-description engine for native C/C++ projects
#[derive(Parser)]
#[command(name = "moonquake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a description file is valid, entering every conditional
    /// branch so errors cannot hide behind unmatched patterns
    Validate(ValidateArgs),

    /// Resolve a description file into an ordered, fully-pathed build graph
    Build(BuildArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input description file
    pub input: PathBuf,

    /// Treat <INPUT> as a directory and load '<INPUT>/<dirname>.mqroot'
    #[arg(short, long)]
    pub directory: bool,

    /// Turn Include() directives into no-ops so only the given file is
    /// validated
    #[arg(short = 'i', long = "include-disable")]
    pub include_disable: bool,

    /// Print the interpreted AST
    #[arg(long)]
    pub dump_ast: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Input description file
    pub input: PathBuf,

    /// Treat <INPUT> as a directory and load '<INPUT>/<dirname>.mqroot'
    #[arg(short, long)]
    pub directory: bool,

    /// Root to build (required when the file declares several)
    #[arg(long)]
    pub root: Option<String>,

    /// Configuration to order the build for (defaults to the root's first)
    #[arg(long)]
    pub config: Option<String>,

    /// Architecture to order the build for (defaults to the host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Write the JSON build plan to this path
    #[arg(long)]
    pub emit_plan: Option<PathBuf>,

    /// Skip emitting Definitions.<Module>.h headers
    #[arg(long)]
    pub skip_headers: bool,

    /// Discard previous outputs first (every build is full; accepted for
    /// command-line symmetry)
    #[arg(long)]
    pub rebuild: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
