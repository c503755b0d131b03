//! Compilation of a whole conversion request into one flag list.

use mediaconv_codecs::{RawOptions, Registry};
use mediaconv_common::{Error, Result, StreamKind};
use serde_json::Value;

/// Which half of a two-pass encode a flag list is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

impl Pass {
    pub fn number(&self) -> u8 {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
        }
    }
}

/// Validate `request` and compile it into ordered engine flags.
///
/// Flags are emitted as audio, video, subtitle, format, then `-map N` and the
/// `-pass N` marker when present. An omitted stream compiles to its disable
/// flag; the first pass of a two-pass encode always disables audio.
///
/// # Errors
///
/// Returns a configuration-category error for a malformed request or any
/// unknown or mismatched codec or format.
pub fn compile_request(registry: &Registry, request: &Value, pass: Option<Pass>) -> Result<Vec<String>> {
    let request = request
        .as_object()
        .ok_or_else(|| Error::configuration("Invalid output specification"))?;

    let format_name = match request.get("format") {
        None => return Err(Error::configuration("Format not specified")),
        Some(Value::String(name)) => name.as_str(),
        Some(other) => return Err(Error::unknown_format(other.to_string())),
    };
    let mut format_flags = registry.format(format_name)?.compile(request)?;

    if !request.contains_key("audio") && !request.contains_key("video") {
        return Err(Error::configuration(
            "Neither audio nor video streams requested",
        ));
    }

    let mut flags = Vec::new();
    for kind in StreamKind::ALL {
        let spec = match request.get(kind.as_str()) {
            Some(_) if kind == StreamKind::Audio && pass == Some(Pass::First) => None,
            Some(spec) => Some(stream_spec(kind, spec)?),
            None => None,
        };
        flags.extend(compile_stream(registry, kind, spec)?);
    }

    if let Some(map) = request.get("map") {
        let index = map
            .as_i64()
            .ok_or_else(|| Error::configuration("map needs to be an integer"))?;
        format_flags.extend(["-map".to_string(), index.to_string()]);
    }
    flags.extend(format_flags);

    if let Some(pass) = pass {
        flags.extend(["-pass".to_string(), pass.number().to_string()]);
    }

    Ok(flags)
}

fn stream_spec(kind: StreamKind, spec: &Value) -> Result<&RawOptions> {
    spec.as_object()
        .filter(|spec| spec.contains_key("codec"))
        .ok_or_else(|| Error::configuration(format!("Invalid {kind} codec specification")))
}

fn compile_stream(registry: &Registry, kind: StreamKind, spec: Option<&RawOptions>) -> Result<Vec<String>> {
    let Some(spec) = spec else {
        return registry.codec(kind, None)?.compile(&RawOptions::new());
    };
    let name = match spec.get("codec") {
        Some(Value::String(name)) => Some(name.as_str()),
        Some(Value::Null) | None => None,
        Some(other) => return Err(Error::unknown_codec(kind, other.to_string())),
    };
    registry.codec(kind, name)?.compile(spec)
}

/// Pre-input flags requested through `video.launch_options`.
///
/// Accepts a whitespace separated string or an array of strings.
pub fn launch_options(request: &Value) -> Result<Vec<String>> {
    match request.get("video").and_then(|v| v.get("launch_options")) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s.split_whitespace().map(String::from).collect()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| Error::configuration("launch_options entries must be strings"))
            })
            .collect(),
        Some(_) => Err(Error::configuration(
            "launch_options must be a string or an array of strings",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn compile(request: Value, pass: Option<Pass>) -> Result<Vec<String>> {
        compile_request(&Registry::builtin(), &request, pass)
    }

    #[test]
    fn test_theora_only() {
        let flags = compile(
            json!({"format": "ogg", "video": {"codec": "theora", "fps": 25}}),
            None,
        )
        .unwrap();
        assert_eq!(
            flags,
            ["-an", "-vcodec", "libtheora", "-pix_fmt", "yuv420p", "-r", "25", "-sn", "-f", "ogg"]
        );
    }

    #[test]
    fn test_copy_and_null_streams() {
        let flags = compile(
            json!({
                "format": "ogg",
                "audio": {"codec": "copy"},
                "video": {"codec": "copy"},
                "subtitle": {"codec": null}
            }),
            None,
        )
        .unwrap();
        assert_eq!(flags, ["-acodec", "copy", "-vcodec", "copy", "-sn", "-f", "ogg"]);
    }

    #[test]
    fn test_map_and_passes() {
        let request = json!({
            "format": "mkv",
            "audio": {"codec": "mp3", "bitrate": 128},
            "video": {"codec": "h264"},
            "map": 0
        });

        let first = compile(request.clone(), Some(Pass::First)).unwrap();
        assert_eq!(first[0], "-an");
        assert!(first.ends_with(&[
            "-f".to_string(),
            "matroska".to_string(),
            "-map".to_string(),
            "0".to_string(),
            "-pass".to_string(),
            "1".to_string()
        ]));

        let second = compile(request, Some(Pass::Second)).unwrap();
        assert_eq!(second[..4], ["-acodec", "libmp3lame", "-ab", "128k"]);
        assert_eq!(second[second.len() - 2..], ["-pass", "2"]);
    }

    #[test]
    fn test_request_errors() {
        assert_matches!(compile(json!([]), None), Err(Error::Configuration(_)));
        assert_matches!(
            compile(json!({"audio": {"codec": "mp3"}}), None),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            compile(json!({"format": "xyz", "audio": {"codec": "mp3"}}), None),
            Err(Error::UnknownFormat(_))
        );
        assert_matches!(compile(json!({"format": "ogg"}), None), Err(Error::Configuration(_)));
        assert_matches!(
            compile(json!({"format": "ogg", "audio": "mp3"}), None),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            compile(json!({"format": "ogg", "audio": {"bitrate": 128}}), None),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            compile(json!({"format": "ogg", "audio": {"codec": "opus"}}), None),
            Err(Error::UnknownCodec { .. })
        );
        assert_matches!(
            compile(json!({"format": "ogg", "video": {"codec": "copy"}, "map": "0"}), None),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn test_first_pass_ignores_invalid_audio() {
        let request = json!({"format": "ogg", "audio": "garbage", "video": {"codec": "theora"}});
        assert!(compile(request.clone(), Some(Pass::First)).is_ok());
        assert!(compile(request, None).is_err());
    }

    #[test]
    fn test_launch_options() {
        assert_eq!(
            launch_options(&json!({"video": {"launch_options": " -hwaccel  vaapi "}})).unwrap(),
            ["-hwaccel", "vaapi"]
        );
        assert_eq!(
            launch_options(&json!({"video": {"launch_options": ["-vaapi_device", "/dev/dri/renderD128"]}}))
                .unwrap(),
            ["-vaapi_device", "/dev/dri/renderD128"]
        );
        assert!(launch_options(&json!({"audio": {}})).unwrap().is_empty());
        assert!(launch_options(&json!({"video": {"launch_options": 3}})).is_err());
    }
}
