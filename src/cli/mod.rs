//! CLI module for rag-search
//!
//! Provides command-line interface parsing for the rag-search binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rag-search - build a local vector index over documents and ask questions against it
#[derive(Parser, Debug)]
#[command(
    name = "rag-search",
    version,
    about = "Retrieval-augmented search over a local document folder",
    long_about = "Chunks and embeds plain-text documents into a persisted flat L2 index,\n\
                  retrieves the closest chunks for a query, and asks an LLM to answer\n\
                  from them.",
    after_help = "EXAMPLES:\n    \
                  rag-search build --data ./data         # Index every .txt/.sql/.md file\n    \
                  rag-search query \"invoice table\" -k 3  # Show the nearest chunks\n    \
                  rag-search ask \"Who approves refunds?\" # Answer with the LLM\n    \
                  rag-search status                      # Show what is on disk"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragsearch.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and persist every document under the data directory
    ///
    /// Replaces any previously persisted store once the new one is complete.
    Build {
        /// Directory to read documents from (overrides `data_dir`)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Print the chunks closest to a query
    Query {
        /// Query text
        text: String,

        /// Number of chunks to return (overrides `retrieval.top_k`)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the retrieved context
    Ask {
        /// The question
        question: String,

        /// Number of chunks to use as context (overrides `retrieval.top_k`)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show the persisted store's build information
    Status,

    /// Show configuration information
    Config {
        /// Validate the configuration, including referenced env vars
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
