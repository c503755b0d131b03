//! The conversion orchestrator.

use mediaconv_av::{Engine, ThumbnailRequest};
use mediaconv_codecs::Registry;
use mediaconv_common::{Error, MediaInfo, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::progress::{ConversionJob, ConversionProgress};
use super::request::{compile_request, launch_options, Pass};
use super::segment::{SegmentJob, SegmentProgress};

/// Runtime knobs of a [`Converter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterSettings {
    /// Longest wait for a single progress update. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Shortest source duration accepted, in seconds.
    pub min_duration: f64,
    /// Whether attached pictures count as video streams when probing.
    pub posters_as_video: bool,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            min_duration: 0.01,
            posters_as_video: true,
        }
    }
}

/// Validates requests, probes sources and drives an [`Engine`].
pub struct Converter {
    engine: Arc<dyn Engine>,
    registry: Arc<Registry>,
    settings: ConverterSettings,
}

impl Converter {
    /// Converter over the built-in codec and format tables.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_registry(engine, Registry::builtin())
    }

    pub fn with_registry(engine: Arc<dyn Engine>, registry: Arc<Registry>) -> Self {
        Self {
            engine,
            registry,
            settings: ConverterSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ConverterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    /// Compile `request` into engine flags without touching any file.
    pub fn parse_options(&self, request: &Value, pass: Option<Pass>) -> Result<Vec<String>> {
        compile_request(&self.registry, request, pass)
    }

    /// Probe `input` and compile every pass of the conversion.
    ///
    /// Nothing is started; all input and configuration errors surface here.
    pub fn prepare(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        request: &Value,
        two_pass: bool,
    ) -> Result<ConversionJob> {
        let input = input.as_ref();
        if !request.is_object() {
            return Err(Error::configuration("Invalid output specification"));
        }
        let info = self.probe_source(input)?;

        let mut request = request.clone();
        let source = info.video();
        if let Some(stream) = source {
            if let Some(video) = request.get_mut("video").and_then(Value::as_object_mut) {
                if let Some(width) = stream.width {
                    video.insert("src_width".into(), width.into());
                }
                if let Some(height) = stream.height {
                    video.insert("src_height".into(), height.into());
                }
            }
        }
        let pre_options = match source {
            Some(_) => launch_options(&request)?,
            None => Vec::new(),
        };

        let duration = self.checked_duration(&info)?;

        let passes = if two_pass {
            vec![
                self.parse_options(&request, Some(Pass::First))?,
                self.parse_options(&request, Some(Pass::Second))?,
            ]
        } else {
            vec![self.parse_options(&request, None)?]
        };

        Ok(ConversionJob {
            input: input.to_path_buf(),
            output: output.as_ref().to_path_buf(),
            pre_options,
            passes,
            duration,
        })
    }

    /// Run a prepared job.
    pub fn run(&self, job: ConversionJob) -> ConversionProgress {
        ConversionProgress::new(Arc::clone(&self.engine), job, self.settings.timeout)
    }

    /// Convert `input` into `output` as described by `request`.
    ///
    /// The returned iterator drives the engine; each item is overall
    /// progress in `[0, 1]`. With `two_pass` the first pass fills
    /// `[0, 0.5)` and the second `[0.5, 1]`.
    ///
    /// # Errors
    ///
    /// Input and configuration errors are returned before anything runs.
    /// Engine failures and timeouts are yielded by the iterator.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        request: &Value,
        two_pass: bool,
    ) -> Result<ConversionProgress> {
        let job = self.prepare(input, output, request, two_pass)?;
        Ok(self.run(job))
    }

    /// Split `input` into MPEG-TS chunks under `working_dir/output_dir` with
    /// an m3u8 `playlist` in `working_dir`.
    ///
    /// Progress is reported as an integer percentage. The process working
    /// directory is `working_dir` while the engine runs.
    pub fn segment(
        &self,
        input: impl AsRef<Path>,
        working_dir: impl AsRef<Path>,
        playlist: &str,
        output_dir: &str,
    ) -> Result<SegmentProgress> {
        let input = input.as_ref();
        let working_dir = working_dir.as_ref();
        let info = self.probe_source(input)?;
        let duration = self.checked_duration(&info)?;

        std::fs::create_dir_all(working_dir.join(output_dir))?;

        let job = SegmentJob {
            input: std::fs::canonicalize(input)?,
            working_dir: std::fs::canonicalize(working_dir)?,
            playlist: playlist.to_string(),
            output_dir: output_dir.to_string(),
            duration,
        };
        Ok(SegmentProgress::new(
            Arc::clone(&self.engine),
            job,
            self.settings.timeout,
        ))
    }

    /// Probe with the configured poster handling.
    pub fn probe(&self, path: impl AsRef<Path>) -> Option<MediaInfo> {
        self.probe_with_posters(path, self.settings.posters_as_video)
    }

    pub fn probe_with_posters(&self, path: impl AsRef<Path>, posters_as_video: bool) -> Option<MediaInfo> {
        self.engine.probe(path.as_ref(), posters_as_video)
    }

    /// Extract one still frame at `time` seconds.
    pub fn thumbnail(
        &self,
        path: impl AsRef<Path>,
        time: f64,
        output: impl Into<PathBuf>,
        size: Option<String>,
        quality: u32,
    ) -> Result<()> {
        let mut request = ThumbnailRequest::new(time, output);
        request.size = size;
        request.quality = quality;
        self.thumbnails(path, &[request])
    }

    pub fn thumbnails(&self, path: impl AsRef<Path>, requests: &[ThumbnailRequest]) -> Result<()> {
        self.engine.thumbnails(path.as_ref(), requests)
    }

    fn probe_source(&self, input: &Path) -> Result<MediaInfo> {
        if !input.exists() {
            return Err(Error::input(format!(
                "Source file doesn't exist: {}",
                input.display()
            )));
        }
        let info = self
            .probe(input)
            .ok_or_else(|| Error::input("Can't get information about source file"))?;
        if !info.has_media_streams() {
            return Err(Error::input("Source file has no audio or video streams"));
        }
        Ok(info)
    }

    fn checked_duration(&self, info: &MediaInfo) -> Result<f64> {
        match info.duration() {
            Some(duration) if duration >= self.settings.min_duration => Ok(duration),
            _ => Err(Error::input("Zero-length media")),
        }
    }
}
