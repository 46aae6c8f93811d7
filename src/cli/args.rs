//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::payload::ColorMode;

/// Encode raw gray8 video into C64 multicolor charset streams
#[derive(Parser, Debug)]
#[command(name = "a64enc")]
#[command(version, about = "C64 multicolor charset video encoder", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode raw gray8 frames
    #[command(after_help = "EXAMPLES:
    # Pipe frames from ffmpeg
    ffmpeg -i in.mp4 -vf scale=320:200 -pix_fmt gray -f rawvideo - | \\
        a64enc encode -i - -o out.a64 --width 320 --height 200

    # Five colors, a new charset every 8 frames
    a64enc encode -i frames.gray -o out.a64 -W 320 -H 200 --mode multi5 --lifetime 8")]
    Encode(EncodeArgs),
    /// Show stream geometry and payload sizes
    Info {
        /// Frames per charset
        #[arg(long)]
        lifetime: Option<usize>,
        /// Color mode
        #[arg(long)]
        mode: Option<ColorMode>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct EncodeArgs {
    /// Raw gray8 input, `-` for stdin
    #[arg(long, short)]
    pub input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(long, short)]
    pub output: PathBuf,

    /// Input frame width in pixels
    #[arg(long, short = 'W')]
    pub width: u32,

    /// Input frame height in pixels
    #[arg(long, short = 'H')]
    pub height: u32,

    /// Input row stride in bytes (default: width)
    #[arg(long)]
    pub stride: Option<usize>,

    /// Frames per charset, overrides quality
    #[arg(long, short)]
    pub lifetime: Option<usize>,

    /// Lambda-scale quality (below 1: 4 frames per charset)
    #[arg(long, short, allow_negative_numbers = true)]
    pub quality: Option<i32>,

    /// Color mode
    #[arg(long, short)]
    pub mode: Option<ColorMode>,

    /// Quantizer refinement passes
    #[arg(long)]
    pub steps: Option<u32>,

    /// Quantizer seed
    #[arg(long)]
    pub seed: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
