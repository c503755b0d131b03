//! Video codec families.
//!
//! Video is the only kind whose options interact: requested dimensions are
//! normalized (even values, SAR correction, rotation) and reconciled with the
//! source frame through [`crate::geometry::resolve`] before any flag is
//! emitted. Family hooks then see the final frame size and filter chain.

use mediaconv_common::{Result, StreamKind};

use crate::descriptor::{
    no_extra_flags, no_refine, CodecDescriptor, ExtraFlagsHook, PreparedStream, RefineHook,
};
use crate::geometry::{self, AspectMode, Geometry, Rotation};
use crate::schema::{OptionKind, SafeOptions, Schema};

/// Pixel format used when the request names none or an unknown one.
pub const DEFAULT_PIX_FMT: &str = "yuv420p";

/// Pixel formats accepted for `pix_fmt`.
pub const PIXEL_FORMATS: &[&str] = &[
    "yuv420p", "yuyv422", "rgb24", "bgr24", "yuv422p", "yuv444p", "yuv410p", "yuv411p",
    "gray", "monow", "monob", "pal8", "yuvj420p", "yuvj422p", "yuvj444p", "uyvy422",
    "uyyvyy411", "bgr8", "bgr4", "bgr4_byte", "rgb8", "rgb4", "rgb4_byte", "nv12", "nv21",
    "argb", "rgba", "abgr", "bgra", "gray16be", "gray16le", "yuv440p", "yuvj440p",
    "yuva420p", "rgb48be", "rgb48le", "rgb565be", "rgb565le", "rgb555be", "rgb555le",
    "bgr565be", "bgr565le", "bgr555be", "bgr555le", "yuv420p16le", "yuv420p16be",
    "yuv422p16le", "yuv422p16be", "yuv444p16le", "yuv444p16be", "yuv420p9be",
    "yuv420p9le", "yuv420p10be", "yuv420p10le", "yuv422p10be", "yuv422p10le",
    "yuv444p9be", "yuv444p9le", "yuv444p10be", "yuv444p10le", "yuv422p9be", "yuv422p9le",
    "gbrp", "gbrp9be", "gbrp9le", "gbrp10be", "gbrp10le", "gbrp16be", "gbrp16le",
    "yuva422p", "yuva444p", "nv16", "nv20le", "nv20be", "yvyu422", "ya8", "ya16be",
    "ya16le", "gbrap", "gbrap16be", "gbrap16le", "yuv420p12be", "yuv420p12le",
    "yuv420p14be", "yuv420p14le", "yuv422p12be", "yuv422p12le", "yuv444p12be",
    "yuv444p12le", "p010le", "p010be", "p016le", "p016be", "gray10le", "gray12le",
    "nv24", "nv42",
];

/// Options understood by every video encoder.
pub fn base_schema() -> Schema {
    Schema::new(&[
        ("codec", OptionKind::Str),
        ("pix_fmt", OptionKind::Str),
        ("bitrate", OptionKind::Int),
        ("max_bitrate", OptionKind::Int),
        ("fps", OptionKind::Int),
        ("keyframe_interval", OptionKind::Int),
        ("width", OptionKind::Int),
        ("height", OptionKind::Int),
        ("mode", OptionKind::Str),
        ("src_width", OptionKind::Int),
        ("src_height", OptionKind::Int),
        ("display_aspect_ratio", OptionKind::Float),
        ("sample_aspect_ratio", OptionKind::Float),
        ("rotate", OptionKind::Str),
    ])
}

pub(crate) fn prepare(mut options: SafeOptions) -> Result<PreparedStream> {
    options.keep_int_within("fps", 1..=120);
    options.keep_int_within("keyframe_interval", 1..=1500);
    options.keep_int_within("bitrate", 16..=15000);
    options.keep_int_within("max_bitrate", 16..=15000);
    if options
        .str("pix_fmt")
        .is_some_and(|p| !PIXEL_FORMATS.contains(&p))
    {
        options.remove("pix_fmt");
    }

    let sar = options
        .float("sample_aspect_ratio")
        .filter(|sar| sar.is_finite() && *sar > 0.0);
    let rotation = options
        .str("rotate")
        .and_then(|r| r.parse::<Rotation>().ok())
        .unwrap_or_default();

    let mut width = options
        .int("width")
        .filter(|w| (16..=4000).contains(w))
        .map(|w| w - w % 2);
    let mut height = options
        .int("height")
        .filter(|h| (16..=3000).contains(h))
        .map(|h| match sar {
            Some(sar) => (h as f64 / sar).round_ties_even() as i64,
            None => h,
        })
        .map(|h| h - h % 2)
        .filter(|h| *h > 0);
    if rotation.is_transposed() {
        std::mem::swap(&mut width, &mut height);
    }
    let width = width.and_then(|w| u32::try_from(w).ok());
    let height = height.and_then(|h| u32::try_from(h).ok());

    let source = |key: &str| {
        options
            .int(key)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
    };
    let (source_width, source_height) = match (source("src_width"), source("src_height")) {
        (Some(w), Some(h)) => (Some(w), Some(h)),
        _ => (None, None),
    };

    let mode = match options.str("mode") {
        Some(mode) => mode.parse::<AspectMode>().unwrap_or_else(|e| {
            tracing::debug!("{e}, falling back to stretch");
            AspectMode::Stretch
        }),
        None => AspectMode::Stretch,
    };

    let resolved = geometry::resolve(&Geometry {
        source_width,
        source_height,
        target_width: width,
        target_height: height,
        sample_aspect_ratio: sar,
        rotation,
        mode,
    })?;

    Ok(PreparedStream {
        options,
        width: resolved.width,
        height: resolved.height,
        filters: resolved.filter,
        aspect: width.zip(height),
    })
}

pub(crate) fn base_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = vec![
        "-pix_fmt".to_string(),
        safe.str("pix_fmt").unwrap_or(DEFAULT_PIX_FMT).to_string(),
    ];
    flags.extend(safe.flag("fps", "-r").into_iter().flatten());
    flags.extend(safe.flag("keyframe_interval", "-g").into_iter().flatten());
    if let Some(bitrate) = safe.int("bitrate") {
        flags.extend(["-vb".to_string(), format!("{bitrate}k")]);
    }
    if let Some(max) = safe.int("max_bitrate") {
        flags.extend([
            "-maxrate".to_string(),
            format!("{max}k"),
            "-bufsize".to_string(),
            format!("{max}k"),
        ]);
    }
    if let (Some(w), Some(h)) = (stream.width, stream.height) {
        flags.extend(["-s".to_string(), format!("{w}x{h}")]);
        if let Some((ow, oh)) = stream.aspect {
            flags.extend(["-aspect".to_string(), format!("{ow}:{oh}")]);
        }
    }
    if let Some(filters) = &stream.filters {
        flags.extend(["-vf".to_string(), filters.clone()]);
    }
    flags
}

/// Built-in video descriptors, in registration order.
pub fn descriptors() -> Vec<CodecDescriptor> {
    let with_quality = base_schema().extend(&[("quality", OptionKind::Int)]);
    let x264 = with_quality.clone().extend(&[
        ("preset", OptionKind::Str),
        ("profile", OptionKind::Str),
        ("level", OptionKind::Str),
        ("tune", OptionKind::Str),
    ]);
    let vaapi = with_quality.clone().extend(&[
        ("preset", OptionKind::Str),
        ("profile", OptionKind::Str),
        ("level", OptionKind::Str),
    ]);
    let vp8 = with_quality
        .clone()
        .extend(&[("threads", OptionKind::Int)]);
    let vp9 = base_schema().extend(&[("deadline", OptionKind::Str), ("cpu-used", OptionKind::Int)]);

    let encoder = |name: &str,
                   engine: &str,
                   schema: &Schema,
                   refine: RefineHook,
                   extra_flags: ExtraFlagsHook| {
        CodecDescriptor::encoder(
            StreamKind::Video,
            name,
            engine,
            schema.clone(),
            refine,
            extra_flags,
        )
    };
    let base = base_schema();

    vec![
        CodecDescriptor::disabled(StreamKind::Video),
        CodecDescriptor::copy(StreamKind::Video),
        encoder("theora", "libtheora", &with_quality, refine_theora, qscale_flags),
        encoder("h264", "libx264", &x264, refine_crf, x264_flags),
        encoder("h264_vaapi", "h264_vaapi", &vaapi, refine_crf, vaapi_flags),
        encoder("divx", "mpeg4", &with_quality, refine_qscale, qscale_flags),
        encoder("vp8", "libvpx", &vp8, refine_vp8, vp8_flags),
        encoder("vp9", "libvpx-vp9", &vp9, refine_vp9, vp9_flags),
        encoder("h263", "h263", &base, no_refine, no_extra_flags),
        encoder("flv", "flv", &base, no_refine, no_extra_flags),
        encoder("mpeg1", "mpeg1video", &with_quality, refine_mpeg, qscale_flags),
        encoder("mpeg2", "mpeg2video", &with_quality, refine_mpeg, qscale_flags),
        encoder("wmv", "msmpeg4", &with_quality, refine_qscale, qscale_flags),
    ]
}

fn refine_theora(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 0..=10);
}

fn refine_crf(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 0..=51);
}

fn refine_qscale(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 1..=31);
}

fn refine_vp8(stream: &mut PreparedStream) {
    stream.options.keep_int_within("quality", 0..=63);
    stream.options.keep_int_within("threads", 1..=i64::MAX);
}

fn refine_vp9(stream: &mut PreparedStream) {
    stream.options.keep_int_within("cpu-used", 0..=i64::MAX);
}

// The MPEG encoders lose the display aspect unless it is restated in the
// filter chain, ahead of any crop or pad.
fn refine_mpeg(stream: &mut PreparedStream) {
    if let (Some(w), Some(h)) = (stream.width, stream.height) {
        let aspect = format!("aspect={w}:{h}");
        stream.filters = Some(match stream.filters.take() {
            Some(filters) => format!("{aspect},{filters}"),
            None => aspect,
        });
    }
    refine_qscale(stream);
}

fn push_flag(flags: &mut Vec<String>, safe: &SafeOptions, key: &str, flag: &str) {
    flags.extend(safe.flag(key, flag).into_iter().flatten());
}

fn qscale_flags(stream: &PreparedStream) -> Vec<String> {
    let mut flags = Vec::new();
    push_flag(&mut flags, &stream.options, "quality", "-qscale:v");
    flags
}

fn x264_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = Vec::new();
    push_flag(&mut flags, safe, "preset", "-preset");
    push_flag(&mut flags, safe, "quality", "-crf");
    push_flag(&mut flags, safe, "profile", "-profile:v");
    push_flag(&mut flags, safe, "level", "-level");
    push_flag(&mut flags, safe, "tune", "-tune");
    flags
}

// Hardware upload; the engine additionally needs a VAAPI device among the
// pre-input flags.
fn vaapi_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = vec!["-vf".to_string(), "format=nv12|vaapi,hwupload".to_string()];
    push_flag(&mut flags, safe, "preset", "-preset");
    push_flag(&mut flags, safe, "quality", "-crf");
    push_flag(&mut flags, safe, "profile", "-profile:v");
    push_flag(&mut flags, safe, "level", "-level");
    flags
}

fn vp8_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = Vec::new();
    if let Some(quality) = safe.int("quality") {
        flags.extend(["-crf".to_string(), quality.to_string()]);
        if let Some(max) = safe.int("max_bitrate") {
            flags.extend(["-vb".to_string(), format!("{max}k")]);
        }
    }
    push_flag(&mut flags, safe, "threads", "-threads");
    flags
}

fn vp9_flags(stream: &PreparedStream) -> Vec<String> {
    let safe = &stream.options;
    let mut flags = Vec::new();
    push_flag(&mut flags, safe, "deadline", "-deadline");
    push_flag(&mut flags, safe, "cpu-used", "-cpu-used");
    flags
}
