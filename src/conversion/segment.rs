//! HLS style segmentation: stream copy into MPEG-TS chunks plus an m3u8 list.

use mediaconv_av::{Engine, EngineJob, TimecodeStream};
use mediaconv_common::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Flags for segmenting into `output_dir`, listing chunks in `playlist`.
pub fn segment_flags(playlist: &str, output_dir: &str) -> Vec<String> {
    let prefix = format!("{output_dir}/");
    [
        "-flags",
        "-global_header",
        "-f",
        "segment",
        "-segment_time",
        "1",
        "-segment_list",
        playlist,
        "-segment_list_type",
        "m3u8",
        "-segment_format",
        "mpegts",
        "-segment_list_entry_prefix",
        prefix.as_str(),
        "-map",
        "0",
        "-map",
        "-0:d",
        "-bsf",
        "h264_mp4toannexb",
        "-vcodec",
        "copy",
        "-acodec",
        "copy",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Chunk file pattern inside `output_dir`.
pub fn segment_output(output_dir: &str) -> String {
    format!("{output_dir}/media%05d.ts")
}

/// Switches the process working directory and restores it on drop.
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        tracing::debug!("Working directory changed to {:?}", dir);
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                "Failed to restore working directory {:?}: {}",
                self.previous,
                e
            );
        }
    }
}

/// A prepared segmentation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentJob {
    /// Absolute path of the source.
    pub input: PathBuf,
    pub working_dir: PathBuf,
    pub playlist: String,
    pub output_dir: String,
    pub duration: f64,
}

impl SegmentJob {
    pub fn engine_job(&self, timeout: Option<Duration>) -> EngineJob {
        EngineJob::new(
            self.input.clone(),
            segment_output(&self.output_dir),
            segment_flags(&self.playlist, &self.output_dir),
        )
        .with_timeout(timeout)
    }

    fn percent(&self, timecode: f64) -> u8 {
        let percent = 100.0 * timecode / self.duration;
        if percent.is_finite() {
            percent.clamp(0.0, 100.0) as u8
        } else {
            0
        }
    }
}

/// Lazily driven segmentation yielding integer percentages.
///
/// The working directory is switched on the first pull and restored once
/// the engine finishes, fails, or the iterator is dropped.
pub struct SegmentProgress {
    engine: Arc<dyn Engine>,
    job: SegmentJob,
    timeout: Option<Duration>,
    stream: Option<TimecodeStream>,
    guard: Option<WorkingDirGuard>,
    started: bool,
    last: u8,
}

impl SegmentProgress {
    pub(crate) fn new(engine: Arc<dyn Engine>, job: SegmentJob, timeout: Option<Duration>) -> Self {
        Self {
            engine,
            job,
            timeout,
            stream: None,
            guard: None,
            started: false,
            last: 0,
        }
    }

    pub fn job(&self) -> &SegmentJob {
        &self.job
    }

    fn start(&mut self) -> Result<()> {
        let guard = WorkingDirGuard::enter(&self.job.working_dir)?;
        tracing::info!(
            "Segmenting {:?} into {:?}",
            self.job.input,
            self.job.working_dir.join(&self.job.output_dir)
        );
        self.stream = Some(self.engine.convert(&self.job.engine_job(self.timeout))?);
        self.guard = Some(guard);
        Ok(())
    }

    fn finish(&mut self) {
        self.stream = None;
        self.guard = None;
    }
}

impl Iterator for SegmentProgress {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Err(e) = self.start() {
                self.finish();
                return Some(Err(e));
            }
        }

        let item = self.stream.as_mut()?.next();
        match item {
            Some(Ok(timecode)) => {
                self.last = self.job.percent(timecode).max(self.last);
                Some(Ok(self.last))
            }
            Some(Err(e)) => {
                self.finish();
                Some(Err(e))
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl Drop for SegmentProgress {
    fn drop(&mut self) {
        // stop the engine before leaving its working directory
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_flags() {
        let flags = segment_flags("playlist.m3u8", "chunks");
        assert_eq!(flags.len(), 24);
        assert_eq!(flags[7], "playlist.m3u8");
        assert_eq!(flags[13], "chunks/");
        assert_eq!(flags[flags.len() - 4..], ["-vcodec", "copy", "-acodec", "copy"]);
        assert_eq!(segment_output("chunks"), "chunks/media%05d.ts");
    }

    #[test]
    fn test_percent() {
        let job = SegmentJob {
            input: PathBuf::from("/in.mp4"),
            working_dir: PathBuf::from("/tmp"),
            playlist: "p.m3u8".into(),
            output_dir: "out".into(),
            duration: 8.0,
        };
        assert_eq!(job.percent(0.0), 0);
        assert_eq!(job.percent(3.0), 37);
        assert_eq!(job.percent(8.0), 100);
        assert_eq!(job.percent(9.5), 100);

        let engine_job = job.engine_job(None);
        assert_eq!(engine_job.output, PathBuf::from("out/media%05d.ts"));
        assert!(engine_job.pre_options.is_empty());
    }
}
