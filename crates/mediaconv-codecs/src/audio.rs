//! Audio codec families.

use mediaconv_common::StreamKind;

use crate::descriptor::{no_extra_flags, no_refine, CodecDescriptor, PreparedStream};
use crate::schema::{OptionKind, SafeOptions, Schema};

/// Options understood by every audio encoder.
pub fn base_schema() -> Schema {
    Schema::new(&[
        ("codec", OptionKind::Str),
        ("channels", OptionKind::Int),
        ("bitrate", OptionKind::Int),
        ("samplerate", OptionKind::Int),
    ])
}

pub(crate) fn prepare(mut options: SafeOptions) -> PreparedStream {
    options.keep_int_within("channels", 1..=12);
    options.keep_int_within("bitrate", 8..=512);
    options.keep_int_within("samplerate", 1000..=50000);
    PreparedStream {
        options,
        ..Default::default()
    }
}

pub(crate) fn base_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = Vec::new();
    flags.extend(safe.flag("channels", "-ac").into_iter().flatten());
    if let Some(bitrate) = safe.int("bitrate") {
        flags.extend(["-ab".to_string(), format!("{bitrate}k")]);
    }
    flags.extend(safe.flag("samplerate", "-ar").into_iter().flatten());
    flags
}

/// Built-in audio descriptors, in registration order.
pub fn descriptors() -> Vec<CodecDescriptor> {
    let quality_int = base_schema().extend(&[("quality", OptionKind::Int)]);
    let quality_float = base_schema().extend(&[("quality", OptionKind::Float)]);
    let plain = |name: &str, engine: &str| {
        CodecDescriptor::encoder(
            StreamKind::Audio,
            name,
            engine,
            base_schema(),
            no_refine,
            no_extra_flags,
        )
    };

    vec![
        CodecDescriptor::disabled(StreamKind::Audio),
        CodecDescriptor::copy(StreamKind::Audio),
        CodecDescriptor::encoder(
            StreamKind::Audio,
            "vorbis",
            "libvorbis",
            quality_int.clone(),
            no_refine,
            qscale_flags,
        ),
        CodecDescriptor::encoder(
            StreamKind::Audio,
            "aac",
            "aac",
            quality_float,
            refine_aac,
            aac_flags,
        ),
        CodecDescriptor::encoder(
            StreamKind::Audio,
            "libfdk_aac",
            "libfdk_aac",
            quality_int.clone(),
            refine_fdk_aac,
            fdk_aac_flags,
        ),
        plain("ac3", "ac3"),
        plain("flac", "flac"),
        plain("dts", "dts"),
        CodecDescriptor::encoder(
            StreamKind::Audio,
            "mp3",
            "libmp3lame",
            quality_int,
            refine_mp3,
            qscale_flags,
        ),
        plain("mp2", "mp2"),
        plain("wma", "wmav2"),
    ]
}

fn refine_aac(stream: &mut PreparedStream) {
    stream.options.keep_float_within("quality", 0.0..=9.0);
}

fn refine_fdk_aac(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 1..=5);
}

fn refine_mp3(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 0..=9);
}

fn qscale_flags(stream: &PreparedStream) -> Vec<String> {
    stream
        .options
        .flag("quality", "-qscale:a")
        .into_iter()
        .flatten()
        .collect()
}

// The native encoder still sits behind the experimental gate on older builds.
fn aac_flags(stream: &PreparedStream) -> Vec<String> {
    let mut flags = vec!["-strict".to_string(), "experimental".to_string()];
    flags.extend(qscale_flags(stream));
    flags
}

fn fdk_aac_flags(stream: &PreparedStream) -> Vec<String> {
    stream
        .options
        .flag("quality", "-vbr")
        .into_iter()
        .flatten()
        .collect()
}
