//! Shared test harness for integration tests.
//!
//! Provides [`MockEngine`], a scripted [`Engine`] that records every job it
//! is asked to run together with the working directory at that moment.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use mediaconv_av::{Engine, EngineJob, ThumbnailRequest, TimecodeStream};
use mediaconv_common::{Error, MediaFormatInfo, MediaInfo, MediaStreamInfo, Result, StreamKind};

/// What one `convert` call does.
pub enum Run {
    /// Report these timecodes, then finish successfully.
    Timecodes(Vec<f64>),
    /// Report these timecodes, then fail.
    FailAfter(Vec<f64>, String),
    /// Refuse to start.
    Refuse(String),
}

/// A job as seen by the engine.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub job: EngineJob,
    pub cwd: PathBuf,
}

pub struct MockEngine {
    info: Option<MediaInfo>,
    runs: Mutex<VecDeque<Run>>,
    jobs: Mutex<Vec<RecordedJob>>,
    thumbnails: Mutex<Vec<ThumbnailRequest>>,
}

impl MockEngine {
    pub fn new(info: Option<MediaInfo>) -> Arc<Self> {
        Self::with_runs(info, Vec::new())
    }

    pub fn with_runs(info: Option<MediaInfo>, runs: Vec<Run>) -> Arc<Self> {
        Arc::new(Self {
            info,
            runs: Mutex::new(runs.into()),
            jobs: Mutex::new(Vec::new()),
            thumbnails: Mutex::new(Vec::new()),
        })
    }

    pub fn jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().clone()
    }

    pub fn thumbnails_requested(&self) -> Vec<ThumbnailRequest> {
        self.thumbnails.lock().clone()
    }
}

impl Engine for MockEngine {
    fn probe(&self, path: &Path, _posters_as_video: bool) -> Option<MediaInfo> {
        if !path.exists() {
            return None;
        }
        self.info.clone()
    }

    fn convert(&self, job: &EngineJob) -> Result<TimecodeStream> {
        self.jobs.lock().push(RecordedJob {
            job: job.clone(),
            cwd: std::env::current_dir()?,
        });

        let items: Vec<Result<f64>> = match self.runs.lock().pop_front() {
            None => Vec::new(),
            Some(Run::Timecodes(timecodes)) => timecodes.into_iter().map(Ok).collect(),
            Some(Run::FailAfter(timecodes, message)) => timecodes
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(Error::engine("mock", message))))
                .collect(),
            Some(Run::Refuse(message)) => return Err(Error::engine("mock", message)),
        };
        Ok(Box::new(items.into_iter()))
    }

    fn thumbnails(&self, _path: &Path, requests: &[ThumbnailRequest]) -> Result<()> {
        self.thumbnails.lock().extend_from_slice(requests);
        Ok(())
    }
}

/// Probe result for a source with the given duration and streams.
pub fn media_info(duration: Option<f64>, video: Option<(u32, u32)>, audio: bool) -> MediaInfo {
    let mut streams = Vec::new();
    if let Some((width, height)) = video {
        let mut stream = MediaStreamInfo::new(0, StreamKind::Video, "h264");
        stream.width = Some(width);
        stream.height = Some(height);
        streams.push(stream);
    }
    if audio {
        let index = streams.len() as u32;
        streams.push(MediaStreamInfo::new(index, StreamKind::Audio, "aac"));
    }

    MediaInfo {
        format: MediaFormatInfo {
            format_name: "matroska,webm".to_string(),
            duration,
            ..Default::default()
        },
        streams,
        posters: Vec::new(),
    }
}

/// An existing, empty source file.
pub fn source_file() -> tempfile::NamedTempFile {
    tempfile::Builder::new()
        .suffix(".mkv")
        .tempfile()
        .unwrap()
}
