//! External tool detection.

use mediaconv_common::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// ffmpeg and ffprobe print their version for `-version`.
///
/// # Example
///
/// ```no_run
/// use mediaconv_av::check_tool;
///
/// let info = check_tool("ffprobe", None);
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, configured: Option<&Path>) -> ToolInfo {
    let unavailable = || ToolInfo {
        name: name.to_string(),
        available: false,
        version: None,
        path: None,
    };

    let Ok(path) = locate_tool(name, configured) else {
        return unavailable();
    };

    match Command::new(&path).arg("-version").output() {
        Ok(output) if output.status.success() => ToolInfo {
            name: name.to_string(),
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string()),
            path: Some(path),
        },
        _ => unavailable(),
    }
}

/// Check ffmpeg and ffprobe.
pub fn check_tools(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Vec<ToolInfo> {
    vec![check_tool("ffmpeg", ffmpeg), check_tool("ffprobe", ffprobe)]
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] when the configured path does not exist
/// and the tool is not on `PATH`.
pub fn locate_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured {} path {:?} does not exist, searching PATH",
            name,
            path
        );
    }

    which::which(name).map_err(|_| Error::tool_not_found(name))
}
