use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaconv")]
#[command(author, version, about = "Transcoding flag compiler and ffmpeg conversion driver")]
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
    /// Compile a conversion request into ffmpeg flags
    Compile {
        /// Request as a JSON file, `-` for stdin, or inline JSON
        request: String,

        /// Compile for one pass of a two-pass encode
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        pass: Option<u8>,

        /// Output the flags as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Convert a media file
    Convert {
        /// Source file
        input: PathBuf,

        /// Destination file
        output: PathBuf,

        /// Request as a JSON file, `-` for stdin, or inline JSON
        #[arg(short, long)]
        request: String,

        /// Encode in two passes
        #[arg(long)]
        two_pass: bool,

        /// Seconds to wait for each progress update (0 waits forever)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Split a media file into MPEG-TS segments with an m3u8 playlist
    Segment {
        /// Source file
        input: PathBuf,

        /// Directory the playlist is written to
        #[arg(long)]
        workdir: PathBuf,

        /// Playlist file name, relative to the working directory
        #[arg(long, default_value = "playlist.m3u8")]
        playlist: String,

        /// Segment directory, relative to the working directory
        #[arg(long, default_value = "segments")]
        output_dir: String,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Report attached cover art separately instead of as video
        #[arg(long)]
        no_posters_as_video: bool,
    },

    /// Extract a still frame
    Thumbnail {
        /// Source file
        file: PathBuf,

        /// Position in seconds
        time: f64,

        /// Image to write
        output: PathBuf,

        /// Output size as WxH
        #[arg(long)]
        size: Option<String>,

        /// JPEG quality, 1 (best) to 31
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=31))]
        quality: u32,
    },

    /// List supported codecs and formats
    Codecs,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
