use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "m4bforge")]
#[command(author, version, about = "Convert MP3 audiobooks to chaptered M4B files")]
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
    /// Start the web server
    Web {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Log every request at debug level
        #[arg(long)]
        debug: bool,
    },

    /// Convert a single MP3 (or M3U8 playlist) file
    Convert {
        /// Input MP3 or M3U8 file
        #[arg(required = true)]
        input: PathBuf,

        /// Output M4B (or MKV) file
        #[arg(required = true)]
        output: PathBuf,

        /// Add a chapter; START_TIME is seconds or MM:SS
        #[arg(
            long = "chapter",
            num_args = 2,
            value_names = ["TITLE", "START_TIME"],
            action = ArgAction::Append
        )]
        chapter: Vec<String>,

        /// Audio bitrate, e.g. 64k
        #[arg(long)]
        bitrate: Option<String>,
    },

    /// Check that ffmpeg is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
