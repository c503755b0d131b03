//! The contract between the conversion orchestrator and a transcoding engine.

use mediaconv_common::{MediaInfo, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw progress of a running conversion: seconds of output produced so far.
///
/// The stream ends when the engine finishes successfully. A failure or a
/// timeout is yielded as the last item. Dropping the stream stops the
/// underlying work.
pub type TimecodeStream = Box<dyn Iterator<Item = Result<f64>> + Send>;

/// One engine invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineJob {
    /// Flags placed before the input (decoder or device setup).
    pub pre_options: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Compiled flags placed between input and output.
    pub flags: Vec<String>,
    /// Longest allowed gap between two progress updates.
    pub timeout: Option<Duration>,
}

impl EngineJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, flags: Vec<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            flags,
            ..Default::default()
        }
    }

    pub fn with_pre_options(mut self, pre_options: Vec<String>) -> Self {
        self.pre_options = pre_options;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A still frame to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    /// Position in seconds.
    pub time: f64,
    pub output: PathBuf,
    /// Output size as `WxH`.
    pub size: Option<String>,
    /// JPEG quality scale, 1 (best) to 31.
    pub quality: u32,
}

impl ThumbnailRequest {
    pub const DEFAULT_QUALITY: u32 = 4;

    pub fn new(time: f64, output: impl Into<PathBuf>) -> Self {
        Self {
            time,
            output: output.into(),
            size: None,
            quality: Self::DEFAULT_QUALITY,
        }
    }
}

/// A transcoding engine.
pub trait Engine: Send + Sync {
    /// Probe a file. `None` when the file cannot be analyzed.
    ///
    /// With `posters_as_video` unset, attached pictures are reported in
    /// [`MediaInfo::posters`] instead of as video streams.
    fn probe(&self, path: &Path, posters_as_video: bool) -> Option<MediaInfo>;

    /// Start a conversion and return its progress.
    fn convert(&self, job: &EngineJob) -> Result<TimecodeStream>;

    /// Extract still frames from `path`.
    fn thumbnails(&self, path: &Path, requests: &[ThumbnailRequest]) -> Result<()>;
}
