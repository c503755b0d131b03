//! Subtitle codec families.

use mediaconv_common::StreamKind;

use crate::descriptor::{no_extra_flags, no_refine, CodecDescriptor, PreparedStream};
use crate::schema::{OptionKind, SafeOptions, Schema};

/// Options understood by every subtitle encoder.
pub fn base_schema() -> Schema {
    Schema::new(&[
        ("codec", OptionKind::Str),
        ("language", OptionKind::Str),
        ("forced", OptionKind::Int),
        ("default", OptionKind::Int),
    ])
}

pub(crate) fn prepare(mut options: SafeOptions) -> PreparedStream {
    options.keep_int_within("forced", 0..=1);
    options.keep_int_within("default", 0..=1);
    if options.str("language").is_some_and(|l| l.chars().count() > 3) {
        options.remove("language");
    }
    PreparedStream {
        options,
        ..Default::default()
    }
}

/// Stream metadata flags for a validated subtitle request.
///
/// `language` becomes stream metadata and `default`/`forced` become a
/// disposition on the first subtitle stream. These flags are emitted on top
/// of validation, so a validated language or disposition always reaches the
/// output.
pub(crate) fn base_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = Vec::new();
    if let Some(language) = safe.str("language") {
        flags.extend(["-metadata:s:s:0".to_string(), format!("language={language}")]);
    }

    let dispositions: Vec<(&str, i64)> = ["default", "forced"]
        .into_iter()
        .filter_map(|key| safe.int(key).map(|v| (key, v)))
        .collect();
    if !dispositions.is_empty() {
        let set: Vec<&str> = dispositions
            .iter()
            .filter(|(_, v)| *v == 1)
            .map(|(k, _)| *k)
            .collect();
        let value = if set.is_empty() {
            "0".to_string()
        } else {
            set.join("+")
        };
        flags.extend(["-disposition:s:0".to_string(), value]);
    }
    flags
}

/// Built-in subtitle descriptors, in registration order.
pub fn descriptors() -> Vec<CodecDescriptor> {
    let mut descriptors = vec![
        CodecDescriptor::disabled(StreamKind::Subtitle),
        CodecDescriptor::copy(StreamKind::Subtitle),
    ];
    descriptors.extend(["mov_text", "ass", "subrip", "dvbsub", "dvdsub"].map(|name| {
        CodecDescriptor::encoder(
            StreamKind::Subtitle,
            name,
            name,
            base_schema(),
            no_refine,
            no_extra_flags,
        )
    }));
    descriptors
}
