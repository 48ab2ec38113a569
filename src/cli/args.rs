//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// metahead - resolve and render page metadata
#[derive(Parser, Debug)]
#[command(name = "metahead")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file; searched for in the default locations when unset
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

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
    /// Compile the configured definitions and show their record schemas
    #[command(
        name = "check",
        long_about = "Compile the configured definitions and show their record schemas.\n\n\
            Every definition in the configuration file is compiled. Configuration \
            errors such as reserved field names, unknown group members or dangling \
            populate_from references are reported and the command fails.",
        after_help = "\
EXAMPLES:
    # Check the configuration found in the default locations
    metahead check

    # Check a specific file
    metahead --config site.toml check"
    )]
    Check,

    /// Resolve metadata for a path and print it
    #[command(
        name = "resolve",
        long_about = "Resolve metadata for a request path and print it.\n\n\
            Records are loaded from a JSON fixture file into an in-memory store. \
            By default the rendered head block is printed; --field and --group \
            print a single field or group, --json prints every raw value.",
        after_help = "\
EXAMPLES:
    # Print the head block for /about/
    metahead resolve /about/ --records records.json

    # Print the rendered title only
    metahead resolve /about/ --records records.json --field title

    # Resolve for one site and language
    metahead resolve / --records records.json --site 2 --domain example.org --language de"
    )]
    Resolve {
        /// Request path, e.g. /about/
        path: String,

        /// Print a single rendered field
        #[arg(long, conflicts_with_all = ["group", "json"])]
        field: Option<String>,

        /// Print a rendered group
        #[arg(long, conflicts_with = "json")]
        group: Option<String>,

        /// Print every raw value as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Inject the head block into an HTML document
    #[command(
        name = "inject",
        long_about = "Inject the rendered head block into an HTML document.\n\n\
            The block is inserted right after the first <head> tag and the \
            resulting document is printed. Documents without a <head> tag are \
            printed unchanged.",
        after_help = "\
EXAMPLES:
    metahead inject page.html /about/ --records records.json"
    )]
    Inject {
        /// HTML document to read
        html: PathBuf,

        /// Request path the document is served at
        path: String,

        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Options shared by commands that resolve metadata.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// JSON file with the records to resolve against
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Definition name; needed when several are configured
    #[arg(long)]
    pub definition: Option<String>,

    /// Current site id
    #[arg(long, value_name = "ID", requires = "domain")]
    pub site: Option<u32>,

    /// Current site domain
    #[arg(long, requires = "site")]
    pub domain: Option<String>,

    /// Current language code
    #[arg(long)]
    pub language: Option<String>,

    /// JSON object of variables for view-level templates
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Bypass the in-process cache even for definitions that use it
    #[arg(long)]
    pub no_cache: bool,
}
