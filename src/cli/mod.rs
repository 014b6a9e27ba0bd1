//! CLI module
//!
//! Command-line interface for serving, writing and reading paged documents.
//!
//! # Commands
//!
//! - `serve` - Start HTTP server mode
//! - `generate` - Write a synthetic paged document
//! - `read` - Print the items and pagination of a paged document

mod commands;
mod runner;
mod sample;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use sample::{catalog_page, catalog_stream, sample_registry, SampleItem};
pub use server::{router, serve};
