//! # mediaconv-codecs
//!
//! Compiles declarative stream specifications into ordered ffmpeg flags.
//!
//! - [`Registry`]: codec and format descriptors by name
//! - [`schema`]: option schemas and the lenient coercion into [`SafeOptions`]
//! - [`geometry`]: aspect-ratio reconciliation (stretch, crop, pad)
//! - family tables in [`audio`], [`video`], [`subtitle`] and [`format`]
//!
//! Everything here is pure: no I/O, no process spawning.
//!
//! ## Example
//!
//! ```
//! use mediaconv_codecs::{RawOptions, Registry};
//! use mediaconv_common::StreamKind;
//! use serde_json::json;
//!
//! let registry = Registry::builtin();
//! let theora = registry.codec(StreamKind::Video, Some("theora"))?;
//! let raw: RawOptions = json!({"codec": "theora", "fps": 25})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//!
//! assert_eq!(
//!     theora.compile(&raw)?,
//!     ["-vcodec", "libtheora", "-pix_fmt", "yuv420p", "-r", "25"]
//! );
//! # Ok::<(), mediaconv_common::Error>(())
//! ```

pub mod audio;
pub mod descriptor;
pub mod format;
pub mod geometry;
pub mod registry;
pub mod schema;
pub mod subtitle;
pub mod video;

pub use descriptor::{CodecBehavior, CodecDescriptor, FormatDescriptor, PreparedStream};
pub use geometry::{AspectMode, Geometry, GeometryResult, Rotation};
pub use registry::Registry;
pub use schema::{OptionKind, OptionValue, RawOptions, SafeOptions, Schema};
