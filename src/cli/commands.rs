//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paged JSON streaming toolkit
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides the config file)
        #[arg(long)]
        host: Option<String>,
    },

    /// Write a synthetic paged document
    Generate {
        /// Catalog size
        #[arg(short = 'n', long, default_value = "100")]
        count: u64,

        /// Items per page
        #[arg(long, default_value = "10")]
        page_size: u32,

        /// 1-based page to write
        #[arg(long, default_value = "1")]
        page: u32,

        /// Write the whole catalog with pagination after the items
        #[arg(long)]
        trailing: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a paged document from a URL, a file or stdin (`-`)
    Read {
        /// http(s) URL, file path or `-`
        source: String,
    },
}
