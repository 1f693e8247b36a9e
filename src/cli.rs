use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eventimg")]
#[command(author, version, about = "Event image ingestion service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Create an event to attach images to
    CreateEvent {
        /// Event title
        #[arg(long)]
        title: String,
    },

    /// Transcode and store a local image file
    Ingest {
        /// Event ID
        #[arg(long)]
        event: i64,

        /// Quality tier (original, compressed, thumbnail)
        #[arg(long, default_value = "compressed")]
        tier: String,

        /// Mark the image as the event's primary image
        #[arg(long)]
        primary: bool,

        /// Image file to ingest
        #[arg(required = true)]
        file: PathBuf,
    },

    /// List the images of an event as JSON
    List {
        /// Event ID
        #[arg(long)]
        event: i64,
    },

    /// Delete an image of an event
    Delete {
        /// Event ID
        #[arg(long)]
        event: i64,

        /// Image ID
        #[arg(long)]
        image: i64,
    },

    /// Display version information
    Version,
}
