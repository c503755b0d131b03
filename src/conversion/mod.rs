//! Conversion orchestration.
//!
//! [`Converter`] validates a request, probes the source, compiles the flags
//! for every pass up front and then hands the work to an
//! [`Engine`](mediaconv_av::Engine):
//!
//! - single pass: progress is `timecode / duration`
//! - two pass: audio is disabled on the first pass; the passes report in
//!   `[0, 0.5)` and `[0.5, 1]`
//! - segment: stream copy into MPEG-TS chunks with an m3u8 playlist,
//!   progress as an integer percentage

mod converter;
mod progress;
mod request;
mod segment;

pub use converter::{Converter, ConverterSettings};
pub use progress::{ConversionJob, ConversionProgress};
pub use request::{compile_request, launch_options, Pass};
pub use segment::{segment_flags, segment_output, SegmentJob, SegmentProgress, WorkingDirGuard};
