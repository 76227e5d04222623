//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--json`: Machine-readable output
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gitward - repository state service with commit-time secret scanning
#[derive(Parser, Debug)]
#[command(name = "gitward")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitward was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (overrides GITWARD_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a repository and install the pre-commit hook
    #[command(after_help = "\
EXAMPLES:
    # Initialize the current directory
    gitward init

    # Create and initialize a new directory
    gitward init ../new-project")]
    Init {
        /// Directory to initialize (defaults to the working directory)
        path: Option<PathBuf>,
    },

    /// Clone a repository
    #[command(after_help = "\
EXAMPLES:
    # Clone with a token from the environment (stored for later push/pull)
    GITWARD_TOKEN=... gitward clone https://github.com/org/repo.git repo")]
    Clone {
        url: String,

        /// Destination directory
        path: PathBuf,

        /// Access token, saved to the credential store before cloning
        #[arg(long, env = "GITWARD_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Show staged, unstaged and untracked paths
    Status,

    /// Show recent commits, newest first
    Log {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Stage paths (a missing path stages its deletion)
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Unstage paths
    Reset {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Commit the index
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Author as "Name <email>" (defaults to the configured identity)
        #[arg(long)]
        author: Option<String>,
    },

    /// List, create, switch, merge and delete branches
    Branch {
        #[command(subcommand)]
        command: BranchCommand,
    },

    /// Push a branch to a remote
    Push {
        /// Remote name (defaults to the configured remote, usually origin)
        remote: Option<String>,

        /// Branch (defaults to the current branch)
        branch: Option<String>,
    },

    /// Fetch a remote and merge its branch into HEAD
    Pull {
        /// Remote name (defaults to the configured remote, usually origin)
        remote: Option<String>,

        /// Branch (defaults to the current branch)
        branch: Option<String>,
    },

    /// Scan content for secrets
    #[command(after_help = "\
EXAMPLES:
    # Scan what is about to be committed (what the pre-commit hook runs)
    gitward scan --staged

    # Scan a file
    gitward scan config/prod.env

    # Scan standard input
    cat notes.txt | gitward scan

Exits non-zero when anything is found.")]
    Scan {
        /// Scan staged changes in the current repository
        #[arg(long, conflicts_with = "file")]
        staged: bool,

        /// File to scan (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Manage the pre-commit hook
    Hook {
        #[command(subcommand)]
        command: HookCommand,
    },

    /// Store remote credentials
    #[command(after_help = "\
EXAMPLES:
    # Prompt for a token (input is hidden)
    gitward auth

    # Check whether a token is stored (never prints it)
    gitward auth --status

    # Remove stored credentials
    gitward auth --logout")]
    Auth {
        /// Token (prompted for when omitted)
        #[arg(long, env = "GITWARD_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Username to pair with the token
        #[arg(long)]
        username: Option<String>,

        /// Show whether credentials are stored
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove stored credentials
        #[arg(long)]
        logout: bool,
    },

    /// Compute and show repository analytics
    Analytics {
        /// Recompute even if the snapshot is fresh
        #[arg(long)]
        force: bool,

        /// Seconds to wait for the computation
        #[arg(long, default_value_t = 10)]
        wait: u64,
    },

    /// Monitor the repository and print change events
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Milliseconds between ticks
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// List local and remote-tracking branches
    List,

    /// Create a branch
    Create {
        name: String,

        /// Commit-ish to start from (defaults to HEAD)
        start_point: Option<String>,
    },

    /// Switch to a branch
    Checkout { name: String },

    /// Merge a branch into HEAD
    Merge { name: String },

    /// Delete a branch
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum HookCommand {
    /// Install (or overwrite) the pre-commit hook
    Install,
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
