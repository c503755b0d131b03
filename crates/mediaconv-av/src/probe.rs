//! FFprobe-based media probing.

use mediaconv_common::{Error, MediaFormatInfo, MediaInfo, MediaStreamInfo, Result, StreamKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    format_long_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    bit_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

/// Probe a media file using ffprobe.
pub fn probe_with_ffprobe(ffprobe: &Path, path: &Path, posters_as_video: bool) -> Result<MediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffprobe")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::engine("ffprobe", stderr.trim().to_string()));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::engine("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    parse_ffprobe_json(&json_str, posters_as_video)
}

pub(crate) fn parse_ffprobe_json(json: &str, posters_as_video: bool) -> Result<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)?;
    let format = output
        .format
        .ok_or_else(|| Error::engine("ffprobe", "no format section in output"))?;

    let mut info = MediaInfo {
        format: MediaFormatInfo {
            format_name: format.format_name,
            format_long_name: format.format_long_name,
            duration: format.duration.and_then(|s| parse_number(&s)),
            bitrate: format.bit_rate.and_then(|s| s.parse().ok()),
            size: format.size.and_then(|s| s.parse().ok()),
            metadata: format.tags,
        },
        streams: output.streams.into_iter().filter_map(convert_stream).collect(),
        posters: Vec::new(),
    };

    if !posters_as_video {
        info.split_posters();
    }

    Ok(info)
}

fn convert_stream(stream: FfprobeStream) -> Option<MediaStreamInfo> {
    let kind = stream.codec_type.as_deref()?.parse::<StreamKind>().ok()?;
    let mut info = MediaStreamInfo::new(stream.index, kind, stream.codec_name.unwrap_or_default());
    info.codec_long_name = stream.codec_long_name;
    info.bitrate = stream.bit_rate.and_then(|s| s.parse().ok());
    info.duration = stream.duration.and_then(|s| parse_number(&s));
    info.metadata = stream.tags;

    match kind {
        StreamKind::Video => {
            info.width = stream.width;
            info.height = stream.height;
            info.fps = stream
                .avg_frame_rate
                .and_then(|s| parse_frame_rate(&s))
                .or_else(|| stream.r_frame_rate.and_then(|s| parse_frame_rate(&s)));
            info.attached_pic = stream.disposition.attached_pic == 1;
        }
        StreamKind::Audio => {
            info.channels = stream.channels;
            info.sample_rate = stream.sample_rate.and_then(|s| s.parse().ok());
        }
        StreamKind::Subtitle => {}
    }

    Some(info)
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
        return None;
    }
    parse_number(rate_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_long_name": "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10",
                "codec_type": "video",
                "width": 640,
                "height": 480,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001",
                "duration": "33.033367",
                "bit_rate": "1205959",
                "disposition": {"default": 1, "attached_pic": 0},
                "tags": {"language": "und"}
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "44100",
                "channels": 2,
                "bit_rate": "128004"
            },
            {
                "index": 2,
                "codec_name": "mjpeg",
                "codec_type": "video",
                "width": 300,
                "height": 300,
                "r_frame_rate": "90000/1",
                "avg_frame_rate": "0/0",
                "disposition": {"attached_pic": 1}
            },
            {
                "index": 3,
                "codec_type": "data",
                "codec_name": "bin_data"
            }
        ],
        "format": {
            "filename": "test1.ogg",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "format_long_name": "QuickTime / MOV",
            "duration": "33.074000",
            "size": "5398832",
            "bit_rate": "1305867",
            "tags": {"major_brand": "isom"}
        }
    }"#;

    #[test]
    fn test_parse_streams() {
        let info = parse_ffprobe_json(SAMPLE, true).unwrap();
        assert_eq!(info.format.format_name, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!(info.format.duration, Some(33.074));
        assert_eq!(info.format.size, Some(5398832));
        assert_eq!(info.format.metadata.get("major_brand").map(String::as_str), Some("isom"));
        assert_eq!(info.streams.len(), 3);

        let video = info.video().unwrap();
        assert_eq!(video.codec, "h264");
        assert_eq!((video.width, video.height), (Some(640), Some(480)));
        assert!((video.fps.unwrap() - 29.97).abs() < 0.01);

        let audio = info.audio().unwrap();
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.sample_rate, Some(44100));
    }

    #[test]
    fn test_posters_split_out() {
        let info = parse_ffprobe_json(SAMPLE, false).unwrap();
        assert_eq!(info.streams.len(), 2);
        assert_eq!(info.posters.len(), 1);
        assert_eq!(info.posters[0].codec, "mjpeg");
        // the attached picture reports 0/0 average fps, so r_frame_rate wins
        assert_eq!(info.posters[0].fps, Some(90000.0));
    }

    #[test]
    fn test_missing_format_is_an_error() {
        assert!(parse_ffprobe_json(r#"{"streams": []}"#, true).is_err());
        assert!(parse_ffprobe_json("not json", true).is_err());
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(23.976023976023978));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }
}
