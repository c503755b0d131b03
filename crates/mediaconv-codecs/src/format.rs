//! Container formats.

use crate::descriptor::FormatDescriptor;
use crate::schema::{OptionKind, SafeOptions, Schema};

/// Options understood by every format.
pub fn base_schema() -> Schema {
    Schema::new(&[("format", OptionKind::Str)])
}

fn no_flags(_: &SafeOptions) -> Vec<String> {
    Vec::new()
}

// Moves the index to the front of the file so playback can start early.
fn faststart_flags(safe: &SafeOptions) -> Vec<String> {
    if safe.bool("faststart") == Some(true) {
        vec!["-movflags".to_string(), "faststart".to_string()]
    } else {
        Vec::new()
    }
}

/// Built-in format descriptors, in registration order.
pub fn descriptors() -> Vec<FormatDescriptor> {
    let plain = |name: &str, engine: &str| FormatDescriptor::new(name, engine, base_schema(), no_flags);
    let quicktime = |name: &str| {
        FormatDescriptor::new(
            name,
            name,
            base_schema().extend(&[("faststart", OptionKind::Bool)]),
            faststart_flags,
        )
    };

    vec![
        plain("ogg", "ogg"),
        plain("avi", "avi"),
        plain("mkv", "matroska"),
        plain("webm", "webm"),
        plain("flv", "flv"),
        quicktime("mov"),
        quicktime("mp4"),
        plain("mpg", "mpegts"),
        plain("mp3", "mp3"),
        plain("wmv", "msmpeg4"),
    ]
}
