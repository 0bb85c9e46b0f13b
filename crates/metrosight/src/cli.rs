use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "metrosight", about = "Mini Metro screenshot analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a single screenshot.
    Analyze {
        /// Path to the screenshot (PNG, JPEG, BMP).
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file with region overrides.
        #[arg(short, long)]
        regions: Option<PathBuf>,

        /// Path to write the snapshot as protobuf. Prints a summary only when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to save the debug overlay image.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// Tesseract executable used for digit recognition.
        #[arg(long, default_value = "tesseract")]
        tesseract: PathBuf,
    },
    /// Analyze a directory of screenshots as one game session.
    Session {
        /// Directory of screenshots, processed in file-name order.
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Path to write the snapshots as length-delimited protobuf.
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file with region overrides.
        #[arg(short, long)]
        regions: Option<PathBuf>,

        /// Number of recent in-game snapshots to keep.
        #[arg(long, default_value_t = metrosight_core::history::DEFAULT_HISTORY_CAPACITY)]
        history: usize,

        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u32>,

        /// Directory to save debug frames with region and detection overlays.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// Tesseract executable used for digit recognition.
        #[arg(long, default_value = "tesseract")]
        tesseract: PathBuf,
    },
}
