//! Structured description of a probed media file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The three elementary stream kinds a conversion can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
    Subtitle,
}

impl StreamKind {
    /// All kinds, in the order their flags are emitted.
    pub const ALL: [StreamKind; 3] = [StreamKind::Audio, StreamKind::Video, StreamKind::Subtitle];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Audio => "audio",
            StreamKind::Video => "video",
            StreamKind::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(StreamKind::Audio),
            "video" => Ok(StreamKind::Video),
            "subtitle" => Ok(StreamKind::Subtitle),
            other => Err(format!("unknown stream kind: {other}")),
        }
    }
}

/// Container-level information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFormatInfo {
    /// Short demuxer name(s), e.g. `mov,mp4,m4a,3gp,3g2,mj2`.
    pub format_name: String,
    pub format_long_name: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Overall bitrate in bits per second.
    pub bitrate: Option<u64>,
    /// File size in bytes.
    pub size: Option<u64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A single elementary stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStreamInfo {
    pub index: u32,
    pub kind: StreamKind,
    pub codec: String,
    pub codec_long_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
    pub bitrate: Option<u64>,
    pub duration: Option<f64>,
    /// Still image attached to the container (cover art).
    #[serde(default)]
    pub attached_pic: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl MediaStreamInfo {
    /// An empty stream of the given kind; probers fill in what they know.
    pub fn new(index: u32, kind: StreamKind, codec: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            codec: codec.into(),
            codec_long_name: None,
            width: None,
            height: None,
            fps: None,
            channels: None,
            sample_rate: None,
            bitrate: None,
            duration: None,
            attached_pic: false,
            metadata: BTreeMap::new(),
        }
    }
}

/// Everything the orchestrator needs to know about a source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub format: MediaFormatInfo,
    pub streams: Vec<MediaStreamInfo>,
    /// Attached pictures, populated only when posters are not treated as video.
    #[serde(default)]
    pub posters: Vec<MediaStreamInfo>,
}

impl MediaInfo {
    /// First video stream, if any.
    pub fn video(&self) -> Option<&MediaStreamInfo> {
        self.first(StreamKind::Video)
    }

    /// First audio stream, if any.
    pub fn audio(&self) -> Option<&MediaStreamInfo> {
        self.first(StreamKind::Audio)
    }

    /// First subtitle stream, if any.
    pub fn subtitle(&self) -> Option<&MediaStreamInfo> {
        self.first(StreamKind::Subtitle)
    }

    /// Whether the file carries anything worth converting.
    pub fn has_media_streams(&self) -> bool {
        self.video().is_some() || self.audio().is_some()
    }

    /// Source duration in seconds.
    ///
    /// Falls back to the longest stream duration when the container does
    /// not report one.
    pub fn duration(&self) -> Option<f64> {
        self.format.duration.or_else(|| {
            self.streams
                .iter()
                .filter_map(|s| s.duration)
                .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))))
        })
    }

    /// Move attached pictures out of `streams` into `posters`.
    pub fn split_posters(&mut self) {
        let (posters, streams): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.streams)
                .into_iter()
                .partition(|s| s.kind == StreamKind::Video && s.attached_pic);
        self.streams = streams;
        self.posters.extend(posters);
    }

    fn first(&self, kind: StreamKind) -> Option<&MediaStreamInfo> {
        self.streams.iter().find(|s| s.kind == kind)
    }
}
