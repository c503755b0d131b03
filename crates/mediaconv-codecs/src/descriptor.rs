//! Codec and format descriptors.
//!
//! A descriptor is plain data: names, an option schema and a pair of function
//! hooks. Family specific behavior lives in the hooks, the shared compile
//! pipeline lives here.

use mediaconv_common::{Error, Result, StreamKind};
use serde_json::Value;

use crate::schema::{RawOptions, SafeOptions, Schema};
use crate::{audio, subtitle, video};

/// Options of one stream after coercion, range checks and geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedStream {
    pub options: SafeOptions,
    /// Output frame width (video only).
    pub width: Option<u32>,
    /// Output frame height (video only).
    pub height: Option<u32>,
    /// Filter chain for `-vf` (video only).
    pub filters: Option<String>,
    /// Box the caller asked for, used as the display aspect (video only).
    pub aspect: Option<(u32, u32)>,
}

/// Family hook adjusting prepared options before flags are emitted.
pub type RefineHook = fn(&mut PreparedStream);

/// Family hook producing the flags that follow the shared per-option flags.
pub type ExtraFlagsHook = fn(&PreparedStream) -> Vec<String>;

/// Format hook producing the flags that follow `-f <name>`.
pub type FormatFlagsHook = fn(&SafeOptions) -> Vec<String>;

/// Refine hook for families without extra constraints.
pub fn no_refine(_: &mut PreparedStream) {}

/// Extra-flags hook for families without extra flags.
pub fn no_extra_flags(_: &PreparedStream) -> Vec<String> {
    Vec::new()
}

/// What a codec descriptor does when compiled.
#[derive(Debug, Clone, Copy)]
pub enum CodecBehavior {
    /// Disable the stream entirely (`-an`, `-vn`, `-sn`).
    Disabled,
    /// Pass the source stream through untouched.
    Copy,
    /// Encode with the given family hooks.
    Encode {
        refine: RefineHook,
        extra_flags: ExtraFlagsHook,
    },
}

/// A registered codec.
#[derive(Debug, Clone)]
pub struct CodecDescriptor {
    pub kind: StreamKind,
    /// Name used in requests; `None` for the codec that disables the stream.
    pub public_name: Option<String>,
    /// Name passed to the engine after the codec selector.
    pub engine_name: String,
    pub schema: Schema,
    pub behavior: CodecBehavior,
}

impl CodecDescriptor {
    /// An encoding descriptor of the given family.
    pub fn encoder(
        kind: StreamKind,
        public_name: &str,
        engine_name: &str,
        schema: Schema,
        refine: RefineHook,
        extra_flags: ExtraFlagsHook,
    ) -> Self {
        Self {
            kind,
            public_name: Some(public_name.to_string()),
            engine_name: engine_name.to_string(),
            schema,
            behavior: CodecBehavior::Encode {
                refine,
                extra_flags,
            },
        }
    }

    /// The reserved descriptor that disables a stream.
    pub fn disabled(kind: StreamKind) -> Self {
        Self {
            kind,
            public_name: None,
            engine_name: String::new(),
            schema: Schema::default(),
            behavior: CodecBehavior::Disabled,
        }
    }

    /// The reserved descriptor that copies a stream.
    pub fn copy(kind: StreamKind) -> Self {
        Self {
            kind,
            public_name: Some("copy".to_string()),
            engine_name: "copy".to_string(),
            schema: Schema::default(),
            behavior: CodecBehavior::Copy,
        }
    }

    /// Display name, `none` for the disabling descriptor.
    pub fn name(&self) -> &str {
        self.public_name.as_deref().unwrap_or("none")
    }

    /// Compile a stream specification into engine flags.
    ///
    /// The disable and copy descriptors short-circuit without looking at
    /// `raw` at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCodecSpecification`] when `raw["codec"]` does
    /// not name this descriptor.
    pub fn compile(&self, raw: &RawOptions) -> Result<Vec<String>> {
        let (refine, extra_flags) = match self.behavior {
            CodecBehavior::Disabled => return Ok(vec![disable_flag(self.kind).to_string()]),
            CodecBehavior::Copy => {
                return Ok(vec![selector(self.kind).to_string(), "copy".to_string()])
            }
            CodecBehavior::Encode {
                refine,
                extra_flags,
            } => (refine, extra_flags),
        };

        self.check_codec_name(raw)?;

        let safe = self.schema.coerce(raw);
        let mut stream = match self.kind {
            StreamKind::Audio => audio::prepare(safe),
            StreamKind::Video => video::prepare(safe)?,
            StreamKind::Subtitle => subtitle::prepare(safe),
        };
        refine(&mut stream);

        let mut flags = vec![selector(self.kind).to_string(), self.engine_name.clone()];
        flags.extend(match self.kind {
            StreamKind::Audio => audio::base_flags(&stream),
            StreamKind::Video => video::base_flags(&stream),
            StreamKind::Subtitle => subtitle::base_flags(&stream),
        });
        flags.extend(extra_flags(&stream));

        tracing::trace!(kind = %self.kind, codec = self.name(), ?flags, "compiled codec options");
        Ok(flags)
    }

    fn check_codec_name(&self, raw: &RawOptions) -> Result<()> {
        let matches = match (raw.get("codec"), self.public_name.as_deref()) {
            (Some(Value::String(given)), Some(expected)) => given == expected,
            (Some(Value::Null), None) => true,
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(Error::invalid_codec(format!(
                "{} codec '{}' cannot compile {}",
                self.kind,
                self.name(),
                raw.get("codec").map_or("a specification without codec".to_string(), |v| {
                    format!("codec {v}")
                })
            )))
        }
    }
}

/// A registered container format.
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    pub public_name: String,
    pub engine_name: String,
    pub schema: Schema,
    pub extra_flags: FormatFlagsHook,
}

impl FormatDescriptor {
    pub fn new(
        public_name: &str,
        engine_name: &str,
        schema: Schema,
        extra_flags: FormatFlagsHook,
    ) -> Self {
        Self {
            public_name: public_name.to_string(),
            engine_name: engine_name.to_string(),
            schema,
            extra_flags,
        }
    }

    /// Compile the format part of a request into engine flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormatSpecification`] when `raw["format"]`
    /// does not name this descriptor.
    pub fn compile(&self, raw: &RawOptions) -> Result<Vec<String>> {
        let safe = self.schema.coerce(raw);
        if safe.str("format") != Some(self.public_name.as_str()) {
            return Err(Error::invalid_format(format!(
                "format '{}' cannot compile format {}",
                self.public_name,
                raw.get("format").unwrap_or(&Value::Null)
            )));
        }

        let mut flags = vec!["-f".to_string(), self.engine_name.clone()];
        flags.extend((self.extra_flags)(&safe));
        Ok(flags)
    }
}

/// Flag that selects the codec of a stream kind.
pub fn selector(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Audio => "-acodec",
        StreamKind::Video => "-vcodec",
        StreamKind::Subtitle => "-scodec",
    }
}

/// Flag that drops every stream of a kind.
pub fn disable_flag(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Audio => "-an",
        StreamKind::Video => "-vn",
        StreamKind::Subtitle => "-sn",
    }
}
