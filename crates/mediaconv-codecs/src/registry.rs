//! Name-to-descriptor lookup for codecs and formats.
//!
//! The built-in registry is assembled once, on first use, from the family
//! tables and never changes afterwards. Callers that need extra descriptors
//! start from [`Registry::with_builtins`] and register their own before
//! sharing the result.

use mediaconv_common::{Error, Result, StreamKind};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::descriptor::{CodecDescriptor, FormatDescriptor};
use crate::{audio, format, subtitle, video};

type CodecKey = (StreamKind, Option<String>);

/// Registered codec and format descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    codecs: Vec<CodecDescriptor>,
    codec_index: HashMap<CodecKey, usize>,
    formats: Vec<FormatDescriptor>,
    format_index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in descriptor.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let codecs = audio::descriptors()
            .into_iter()
            .chain(video::descriptors())
            .chain(subtitle::descriptors());
        for descriptor in codecs {
            registry.insert_codec(descriptor);
        }
        for descriptor in format::descriptors() {
            registry.insert_format(descriptor);
        }
        registry
    }

    /// The process-wide built-in registry.
    pub fn builtin() -> Arc<Registry> {
        static BUILTIN: OnceLock<Arc<Registry>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                let registry = Registry::with_builtins();
                tracing::debug!(
                    codecs = registry.codecs.len(),
                    formats = registry.formats.len(),
                    "built-in codec registry initialized"
                );
                Arc::new(registry)
            })
            .clone()
    }

    /// Register a codec descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDescriptor`] if the (kind, name) pair is
    /// already bound.
    pub fn register_codec(&mut self, descriptor: CodecDescriptor) -> Result<()> {
        let key = (descriptor.kind, descriptor.public_name.clone());
        if self.codec_index.contains_key(&key) {
            return Err(Error::duplicate(
                descriptor.kind.as_str(),
                descriptor.name(),
            ));
        }
        self.insert_codec(descriptor);
        Ok(())
    }

    /// Register a format descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDescriptor`] if the name is already bound.
    pub fn register_format(&mut self, descriptor: FormatDescriptor) -> Result<()> {
        if self.format_index.contains_key(&descriptor.public_name) {
            return Err(Error::duplicate("format", descriptor.public_name));
        }
        self.insert_format(descriptor);
        Ok(())
    }

    /// Look up a codec. `None` names the descriptor that disables the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCodec`] if nothing is registered under the name.
    pub fn codec(&self, kind: StreamKind, name: Option<&str>) -> Result<&CodecDescriptor> {
        self.codec_index
            .get(&(kind, name.map(str::to_string)))
            .map(|&i| &self.codecs[i])
            .ok_or_else(|| Error::unknown_codec(kind, name.unwrap_or("none")))
    }

    /// Look up a format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] if nothing is registered under the name.
    pub fn format(&self, name: &str) -> Result<&FormatDescriptor> {
        self.format_index
            .get(name)
            .map(|&i| &self.formats[i])
            .ok_or_else(|| Error::unknown_format(name))
    }

    /// Codecs of one kind, in registration order.
    pub fn codecs(&self, kind: StreamKind) -> impl Iterator<Item = &CodecDescriptor> {
        self.codecs.iter().filter(move |d| d.kind == kind)
    }

    /// Formats, in registration order.
    pub fn formats(&self) -> impl Iterator<Item = &FormatDescriptor> {
        self.formats.iter()
    }

    fn insert_codec(&mut self, descriptor: CodecDescriptor) {
        let key = (descriptor.kind, descriptor.public_name.clone());
        self.codec_index.insert(key, self.codecs.len());
        self.codecs.push(descriptor);
    }

    fn insert_format(&mut self, descriptor: FormatDescriptor) {
        self.format_index
            .insert(descriptor.public_name.clone(), self.formats.len());
        self.formats.push(descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{no_extra_flags, no_refine};
    use crate::schema::Schema;
    use assert_matches::assert_matches;

    #[test]
    fn test_builtin_tables_have_no_duplicates() {
        let mut registry = Registry::new();
        for descriptor in audio::descriptors()
            .into_iter()
            .chain(video::descriptors())
            .chain(subtitle::descriptors())
        {
            registry.register_codec(descriptor).unwrap();
        }
        for descriptor in format::descriptors() {
            registry.register_format(descriptor).unwrap();
        }
        assert_eq!(registry.formats().count(), 10);
        assert_eq!(registry.codecs(StreamKind::Audio).count(), 11);
        assert_eq!(registry.codecs(StreamKind::Video).count(), 13);
        assert_eq!(registry.codecs(StreamKind::Subtitle).count(), 7);
    }

    #[test]
    fn test_lookup() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.codec(StreamKind::Video, Some("h264")).unwrap().engine_name,
            "libx264"
        );
        assert_eq!(
            registry.codec(StreamKind::Audio, Some("mp3")).unwrap().engine_name,
            "libmp3lame"
        );
        assert_eq!(registry.codec(StreamKind::Subtitle, None).unwrap().name(), "none");
        assert_eq!(registry.format("mkv").unwrap().engine_name, "matroska");
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::builtin();
        assert_matches!(
            registry.codec(StreamKind::Audio, Some("h264")),
            Err(Error::UnknownCodec { kind: StreamKind::Audio, .. })
        );
        assert_matches!(
            registry.codec(StreamKind::Video, Some("none")),
            Err(Error::UnknownCodec { .. })
        );
        assert_matches!(registry.format("xyz"), Err(Error::UnknownFormat(_)));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = Registry::with_builtins();
        let clash = CodecDescriptor::encoder(
            StreamKind::Audio,
            "aac",
            "aac_at",
            Schema::default(),
            no_refine,
            no_extra_flags,
        );
        assert_matches!(
            registry.register_codec(clash),
            Err(Error::DuplicateDescriptor { .. })
        );

        let fresh = CodecDescriptor::encoder(
            StreamKind::Audio,
            "opus",
            "libopus",
            audio::base_schema(),
            no_refine,
            no_extra_flags,
        );
        registry.register_codec(fresh).unwrap();
        assert!(registry.codec(StreamKind::Audio, Some("opus")).is_ok());
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(Arc::ptr_eq(&Registry::builtin(), &Registry::builtin()));
    }
}
