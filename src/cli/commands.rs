use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "journalist")]
#[command(about = "Forum and link-aggregator digests with Quaily publishing")]
#[command(version)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, env = "JOURNALIST_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run collectors, digest builders and the janitor until interrupted
    Serve,

    /// Generate a digest for a channel right now
    Generate {
        /// Channel name from the configuration
        channel: String,

        /// Leave out items already used in a recent digest
        #[arg(long)]
        respect_skips: bool,

        /// Publish the generated file to Quaily
        #[arg(long)]
        publish: bool,
    },

    /// Create and publish a Quaily post from a Markdown file
    Publish {
        /// Markdown file with a metadata block
        path: String,

        /// Quaily channel slug
        channel: String,
    },

    /// Deliver a published Quaily post to subscribers
    Send {
        /// Markdown file or post slug
        path_or_slug: String,

        /// Quaily channel slug
        channel: String,
    },

    /// Show the metadata keys and body size of a Markdown file
    DebugParse {
        /// Markdown file to inspect
        path: String,
    },

    /// Inspect or clean the local database
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Print row counts
    Stats,

    /// Delete expired rows
    Purge {
        /// Also drop ranked entries not refreshed within this duration (e.g. 240h)
        #[arg(long)]
        retention: Option<String>,
    },
}
