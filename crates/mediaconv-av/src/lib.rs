//! # mediaconv-av
//!
//! The engine side of mediaconv.
//!
//! - [`Engine`]: the contract the conversion orchestrator drives (probe,
//!   convert with streamed progress, thumbnails)
//! - [`FfmpegEngine`]: the implementation backed by the `ffmpeg` and
//!   `ffprobe` command line tools
//! - [`tools`]: locating and checking those tools
//!
//! ## Example
//!
//! ```no_run
//! use mediaconv_av::{Engine, EngineJob, FfmpegEngine};
//! use std::time::Duration;
//!
//! let engine = FfmpegEngine::discover(None, None)?;
//! let job = EngineJob::new("in.mkv", "out.ogg", vec!["-f".into(), "ogg".into()])
//!     .with_timeout(Some(Duration::from_secs(10)));
//! for timecode in engine.convert(&job)? {
//!     println!("{:.1}s encoded", timecode?);
//! }
//! # Ok::<(), mediaconv_common::Error>(())
//! ```

pub mod engine;
pub mod ffmpeg;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod thumbnail;
pub mod tools;

pub use engine::{Engine, EngineJob, ThumbnailRequest, TimecodeStream};
pub use ffmpeg::FfmpegEngine;
pub use tools::{check_tool, check_tools, locate_tool, ToolInfo};
