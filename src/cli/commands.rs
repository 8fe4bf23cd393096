//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GitBook API command-line client
#[derive(Parser, Debug)]
#[command(name = "gitbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API token (defaults to $GITBOOK_TOKEN)
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// API base URL (defaults to $GITBOOK_API_URL or the public API)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a user (the authenticated one unless --id is given)
    User {
        /// User id
        #[arg(long)]
        id: Option<String>,
    },

    /// Show a space
    Space {
        /// Space id
        id: String,
    },

    /// List the authenticated user's spaces
    Spaces {
        #[command(flatten)]
        pages: PageArgs,
    },

    /// List organizations
    Orgs {
        #[command(flatten)]
        pages: PageArgs,
    },

    /// List the spaces of an organization
    OrgSpaces {
        /// Organization id
        organization_id: String,

        #[command(flatten)]
        pages: PageArgs,
    },
}

/// Paging options shared by the list commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PageArgs {
    /// Items per page
    #[arg(long)]
    pub limit: Option<u32>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Indented JSON
    Pretty,
}
