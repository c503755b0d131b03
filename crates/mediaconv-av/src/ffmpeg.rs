//! [`Engine`] implementation driving the ffmpeg and ffprobe binaries.

use mediaconv_common::{MediaInfo, Result};
use std::path::{Path, PathBuf};

use crate::engine::{Engine, EngineJob, ThumbnailRequest, TimecodeStream};
use crate::probe::probe_with_ffprobe;
use crate::runner::FfmpegRun;
use crate::thumbnail::extract_thumbnails;
use crate::tools::locate_tool;

/// Engine backed by the ffmpeg command line tools.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Locate both tools, preferring configured paths over `PATH`.
    pub fn discover(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        let engine = Self::new(locate_tool("ffmpeg", ffmpeg)?, locate_tool("ffprobe", ffprobe)?);
        tracing::debug!(
            "Using ffmpeg at {:?}, ffprobe at {:?}",
            engine.ffmpeg,
            engine.ffprobe
        );
        Ok(engine)
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }
}

impl Engine for FfmpegEngine {
    fn probe(&self, path: &Path, posters_as_video: bool) -> Option<MediaInfo> {
        if !path.exists() {
            return None;
        }
        match probe_with_ffprobe(&self.ffprobe, path, posters_as_video) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!("Probe of {:?} failed: {}", path, e);
                None
            }
        }
    }

    fn convert(&self, job: &EngineJob) -> Result<TimecodeStream> {
        Ok(Box::new(FfmpegRun::spawn(&self.ffmpeg, job)?))
    }

    fn thumbnails(&self, path: &Path, requests: &[ThumbnailRequest]) -> Result<()> {
        extract_thumbnails(&self.ffmpeg, path, requests)
    }
}
