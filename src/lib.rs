//! mediaconv - compile transcoding requests into ffmpeg flags and drive
//! ffmpeg through single-pass, two-pass and segmented conversions.
//!
//! The codec tables and option compiler live in `mediaconv-codecs`, the
//! ffmpeg engine in `mediaconv-av`. This crate wires them together.

pub mod config;
pub mod conversion;

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

pub use conversion::{Converter, ConverterSettings, Pass};

/// Read a request given on the command line.
///
/// `-` reads stdin, an existing path is read as a JSON file, anything else
/// is parsed as inline JSON.
pub fn read_request(arg: &str) -> Result<Value> {
    let content = if arg == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read request from stdin")?;
        content
    } else if Path::new(arg).is_file() {
        std::fs::read_to_string(arg).with_context(|| format!("Failed to read request file: {}", arg))?
    } else {
        arg.to_string()
    };

    serde_json::from_str(&content).context("Request is not valid JSON")
}
