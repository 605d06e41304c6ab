//! Clap derive structures for the `postview` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Also
//! compiled by `build.rs` for man page generation, so it may only depend on
//! clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// postview -- browse a paginated posts feed from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "postview",
    version,
    about = "Browse a paginated posts feed from the command line",
    long_about = "Reads posts and users from a json-server style REST API.\n\n\
        Pages are followed through the Link header and kept in a persistent\n\
        local cache, so repeated queries are answered without the network.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API base URL (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Keep pages in memory only; never read or write the cache file
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Cache database file (overrides config)
    #[arg(long, global = true, value_name = "FILE")]
    pub cache_path: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one line per item (scripting)
    Plain,
}

/// Title sort direction.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List posts, optionally sorted by title or filtered by author
    #[command(alias = "p")]
    Posts(PostsArgs),

    /// List the users available for the author filter
    Users,

    /// Inspect or clear the persistent page cache
    Cache(CacheArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Posts ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PostsArgs {
    /// Sort by title in this direction
    #[arg(long, short = 's', value_enum)]
    pub sort: Option<SortDirection>,

    /// Only show posts by this user ID
    #[arg(long = "user", value_name = "ID")]
    pub user_id: Option<u64>,

    /// Number of pages to load (stops early at the last page)
    #[arg(
        long,
        short = 'n',
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pages: u32,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the cache database location
    Path,

    /// Remove every cached page
    Clear,

    /// Show entry count and size on disk
    Stats,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file populated with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (file + environment)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
