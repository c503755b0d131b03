//! Still frame extraction.

use mediaconv_common::{Error, Result};
use std::path::Path;
use std::process::Command;

use crate::engine::ThumbnailRequest;

/// ffmpeg arguments extracting every request in a single decode pass.
pub fn thumbnail_args(input: &Path, requests: &[ThumbnailRequest]) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-y".to_string(),
        "-an".to_string(),
    ];
    for request in requests {
        args.extend([
            "-ss".to_string(),
            request.time.to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            request.quality.to_string(),
        ]);
        if let Some(size) = &request.size {
            args.extend(["-s".to_string(), size.clone()]);
        }
        args.push(request.output.to_string_lossy().into_owned());
    }
    args
}

/// Extract the requested frames and verify each output was written.
pub fn extract_thumbnails(ffmpeg: &Path, input: &Path, requests: &[ThumbnailRequest]) -> Result<()> {
    if !input.exists() {
        return Err(Error::input(format!("File not found: {}", input.display())));
    }
    if requests.is_empty() {
        return Ok(());
    }

    let args = thumbnail_args(input, requests);
    tracing::debug!("Extracting {} thumbnail(s): {:?}", requests.len(), args);

    let output = Command::new(ffmpeg)
        .args(&args)
        .stdin(std::process::Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr.lines().rev().take(3).collect::<Vec<_>>().join("; ");
        return Err(Error::engine("ffmpeg", format!("thumbnail extraction failed: {tail}")));
    }

    let missing: Vec<String> = requests
        .iter()
        .filter(|r| !r.output.exists())
        .map(|r| r.output.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::engine(
            "ffmpeg",
            format!("thumbnail not created: {}", missing.join(", ")),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_args() {
        let mut second = ThumbnailRequest::new(12.5, "/tmp/b.jpg");
        second.size = Some("320x240".to_string());
        second.quality = 2;
        let args = thumbnail_args(
            Path::new("in.mp4"),
            &[ThumbnailRequest::new(1.0, "/tmp/a.jpg"), second],
        );

        assert_eq!(
            args,
            [
                "-i", "in.mp4", "-y", "-an", "-ss", "1", "-vframes", "1", "-q:v", "4",
                "/tmp/a.jpg", "-ss", "12.5", "-vframes", "1", "-q:v", "2", "-s", "320x240",
                "/tmp/b.jpg"
            ]
        );
    }

    #[test]
    fn test_missing_input() {
        let err = extract_thumbnails(
            Path::new("ffmpeg"),
            Path::new("/nonexistent/input.mp4"),
            &[ThumbnailRequest::new(1.0, "/tmp/a.jpg")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
