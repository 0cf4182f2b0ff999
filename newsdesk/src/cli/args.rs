//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Newsdesk - ask questions about your news knowledge base
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the backend API (overrides config and NEWSDESK_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides config and NEWSDESK_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and print a token to export as NEWSDESK_TOKEN
    Login {
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the user the current token belongs to
    Whoami,

    /// Ask a single question
    Ask {
        /// Session to ask in (a new one is created when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Title for the new session
        #[arg(long, conflicts_with = "session")]
        title: Option<String>,

        /// Do not follow pipeline status
        #[arg(long)]
        quiet: bool,

        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        message: Vec<String>,
    },

    /// Interactive conversation
    Chat {
        /// Session to continue (a new one is created when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Do not follow pipeline status
        #[arg(long)]
        quiet: bool,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Add documents to the knowledge base
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Preview or ingest RSS feeds
    Rss {
        #[command(subcommand)]
        action: RssAction,
    },

    /// Browse and remove knowledge-base documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Knowledge-base statistics
    Stats,

    /// Backend health and retrieval configuration
    Health,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// List sessions
    List,
    /// Create a session
    New {
        #[arg(trailing_var_arg = true)]
        title: Vec<String>,
    },
    /// Show a session's messages
    Show { id: String },
    /// Delete a session
    Delete { id: String },
    /// Remove all messages from a session
    Clear { id: String },
}

#[derive(Subcommand, Debug)]
pub enum IngestSource {
    /// Upload one or more files
    File {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Scrape and ingest an article URL
    Url { url: String },
    /// Ingest raw text
    Text {
        #[arg(long)]
        title: String,

        /// Source label stored with the document
        #[arg(long)]
        source: Option<String>,

        /// Read the text from a file instead of the arguments
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,

        #[arg(trailing_var_arg = true)]
        content: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RssAction {
    /// Show the newest entries of a feed
    Preview {
        feed_url: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Ingest the newest entries of a feed
    Ingest {
        feed_url: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// List documents
    List {
        /// Full-text filter
        #[arg(long)]
        search: Option<String>,

        /// Only documents from this source
        #[arg(long)]
        source: Option<String>,

        #[arg(short, long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Delete a document
    Delete { id: String },
}
