//! Aspect-ratio reconciliation between source and requested frame sizes.
//!
//! [`resolve`] decides the frame size handed to the scaler and, for the crop
//! and pad policies, the filter expression that turns that frame into the
//! requested box. It is a pure function of its [`Geometry`] input.

use mediaconv_common::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// How a source is fitted into a box of a different aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectMode {
    /// Scale to the requested box, distorting if needed.
    #[default]
    Stretch,
    /// Scale to cover the box, then cut the overflow.
    Crop,
    /// Scale to fit inside the box, then add borders.
    Pad,
}

impl FromStr for AspectMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stretch" => Ok(AspectMode::Stretch),
            "crop" => Ok(AspectMode::Crop),
            "pad" => Ok(AspectMode::Pad),
            other => Err(Error::geometry(format!("unknown aspect mode: {other}"))),
        }
    }
}

impl fmt::Display for AspectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AspectMode::Stretch => "stretch",
            AspectMode::Crop => "crop",
            AspectMode::Pad => "pad",
        })
    }
}

/// Display rotation carried in the source metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Whether the rotation swaps the horizontal and vertical axes.
    pub fn is_transposed(&self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarter)
    }
}

impl FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" => Ok(Rotation::None),
            "90" | "-270" => Ok(Rotation::Quarter),
            "180" | "-180" => Ok(Rotation::Half),
            "270" | "-90" => Ok(Rotation::ThreeQuarter),
            other => Err(Error::geometry(format!("unsupported rotation: {other}"))),
        }
    }
}

/// Input to [`resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub source_width: Option<u32>,
    pub source_height: Option<u32>,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub sample_aspect_ratio: Option<f64>,
    pub rotation: Rotation,
    pub mode: AspectMode,
}

/// Frame size for the scaler plus an optional crop/pad expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryResult {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filter: Option<String>,
}

impl Geometry {
    fn validate(&self) -> Result<()> {
        if let Some(sar) = self.sample_aspect_ratio {
            if !sar.is_finite() || sar <= 0.0 {
                return Err(Error::geometry(format!(
                    "sample aspect ratio must be positive, got {sar}"
                )));
            }
        }
        if self.target_width == Some(0) || self.target_height == Some(0) {
            return Err(Error::geometry("target dimensions must be non-zero"));
        }
        Ok(())
    }

    fn unchanged(&self) -> GeometryResult {
        GeometryResult {
            width: self.target_width,
            height: self.target_height,
            filter: None,
        }
    }

    /// Display aspect of the source, corrected for SAR and rotation.
    fn source_aspect(&self) -> Option<f64> {
        let (sw, sh) = match (self.source_width, self.source_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return None,
        };
        let mut aspect = f64::from(sw) / f64::from(sh);
        if let Some(sar) = self.sample_aspect_ratio {
            aspect /= sar;
        }
        if self.rotation.is_transposed() {
            aspect = 1.0 / aspect;
        }
        Some(aspect)
    }
}

/// Reconcile the requested box with the source aspect ratio.
///
/// # Errors
///
/// Returns [`Error::GeometryContractViolation`] for a non-positive sample
/// aspect ratio or a zero target dimension.
pub fn resolve(geometry: &Geometry) -> Result<GeometryResult> {
    geometry.validate()?;

    let Some(aspect) = geometry.source_aspect() else {
        return Ok(geometry.unchanged());
    };

    let (w, h) = match (geometry.target_width, geometry.target_height) {
        (None, None) => return Ok(geometry.unchanged()),
        (Some(w), None) => {
            return Ok(GeometryResult {
                width: Some(w),
                height: derived_dim(f64::from(w) / aspect),
                filter: None,
            })
        }
        (None, Some(h)) => {
            return Ok(GeometryResult {
                width: derived_dim(aspect * f64::from(h)),
                height: Some(h),
                filter: None,
            })
        }
        (Some(w), Some(h)) => (w, h),
    };

    if round_dim(aspect * f64::from(h)) == w {
        return Ok(geometry.unchanged());
    }

    let target_aspect = f64::from(w) / f64::from(h);
    let fitted = match geometry.mode {
        AspectMode::Stretch => None,
        AspectMode::Crop => crop(w, h, aspect, target_aspect),
        AspectMode::Pad => pad(w, h, aspect, target_aspect),
    };

    Ok(fitted.unwrap_or_else(|| geometry.unchanged()))
}

fn round_dim(x: f64) -> u32 {
    x.round() as u32
}

// A dimension that rounds away to nothing is left for the encoder to pick.
fn derived_dim(x: f64) -> Option<u32> {
    Some(round_dim(x)).filter(|d| *d > 0)
}

fn truncate_dim(x: f64) -> u32 {
    x as u32
}

// Scale to cover the box; the returned frame overflows it on one axis.
fn crop(w: u32, h: u32, aspect: f64, target_aspect: f64) -> Option<GeometryResult> {
    if target_aspect > aspect {
        let h0 = truncate_dim(f64::from(w) / aspect);
        (h0 > h).then(|| GeometryResult {
            width: Some(w),
            height: Some(h0),
            filter: Some(format!("crop={}:{}:0:{}", w, h, (h0 - h) / 2)),
        })
    } else {
        let w0 = truncate_dim(f64::from(h) * aspect);
        (w0 > w).then(|| GeometryResult {
            width: Some(w0),
            height: Some(h),
            filter: Some(format!("crop={}:{}:{}:0", w, h, (w0 - w) / 2)),
        })
    }
}

// Scale to fit inside the box; the returned frame underflows it on one axis.
fn pad(w: u32, h: u32, aspect: f64, target_aspect: f64) -> Option<GeometryResult> {
    if target_aspect < aspect {
        let h1 = truncate_dim(f64::from(w) / aspect);
        (h1 > 0 && h1 < h).then(|| GeometryResult {
            width: Some(w),
            height: Some(h1),
            filter: Some(format!("pad={}:{}:0:{}", w, h, (h - h1) / 2)),
        })
    } else {
        let w1 = truncate_dim(f64::from(h) * aspect);
        (w1 > 0 && w1 < w).then(|| GeometryResult {
            width: Some(w1),
            height: Some(h),
            filter: Some(format!("pad={}:{}:{}:0", w, h, (w - w1) / 2)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn geometry(sw: u32, sh: u32, w: Option<u32>, h: Option<u32>, mode: AspectMode) -> Geometry {
        Geometry {
            source_width: Some(sw),
            source_height: Some(sh),
            target_width: w,
            target_height: h,
            mode,
            ..Default::default()
        }
    }

    fn result(w: u32, h: u32, filter: Option<&str>) -> GeometryResult {
        GeometryResult {
            width: Some(w),
            height: Some(h),
            filter: filter.map(str::to_string),
        }
    }

    #[test]
    fn test_crop_wider_source() {
        let g = geometry(640, 400, Some(320), Some(240), AspectMode::Crop);
        assert_eq!(resolve(&g).unwrap(), result(384, 240, Some("crop=320:240:32:0")));
    }

    #[test]
    fn test_crop_taller_source() {
        let g = geometry(640, 480, Some(320), Some(200), AspectMode::Crop);
        assert_eq!(resolve(&g).unwrap(), result(320, 240, Some("crop=320:200:0:20")));
    }

    #[test]
    fn test_pad_wider_source() {
        let g = geometry(640, 400, Some(320), Some(240), AspectMode::Pad);
        assert_eq!(resolve(&g).unwrap(), result(320, 200, Some("pad=320:240:0:20")));
    }

    #[test]
    fn test_pad_taller_source() {
        let g = geometry(640, 480, Some(320), Some(200), AspectMode::Pad);
        assert_eq!(resolve(&g).unwrap(), result(266, 200, Some("pad=320:200:27:0")));
    }

    #[test]
    fn test_stretch_keeps_target() {
        let g = geometry(640, 400, Some(320), Some(240), AspectMode::Stretch);
        assert_eq!(resolve(&g).unwrap(), result(320, 240, None));
    }

    #[test]
    fn test_single_dimension_is_derived() {
        let g = geometry(640, 480, Some(320), None, AspectMode::Crop);
        assert_eq!(resolve(&g).unwrap(), result(320, 240, None));

        let g = geometry(640, 480, None, Some(240), AspectMode::Pad);
        assert_eq!(resolve(&g).unwrap(), result(320, 240, None));
    }

    #[test]
    fn test_matching_aspect_needs_no_filter() {
        let g = geometry(1920, 1080, Some(640), Some(360), AspectMode::Crop);
        assert_eq!(resolve(&g).unwrap(), result(640, 360, None));
    }

    #[test]
    fn test_unknown_source_passes_through() {
        let g = Geometry {
            target_width: Some(320),
            target_height: Some(240),
            mode: AspectMode::Crop,
            ..Default::default()
        };
        assert_eq!(resolve(&g).unwrap(), result(320, 240, None));

        let g = geometry(0, 480, Some(320), None, AspectMode::Crop);
        assert_eq!(resolve(&g).unwrap().height, None);
    }

    #[test]
    fn test_sample_aspect_ratio_and_rotation() {
        let mut g = geometry(720, 576, Some(500), None, AspectMode::Stretch);
        g.sample_aspect_ratio = Some(1.0);
        assert_eq!(resolve(&g).unwrap().height, Some(400));

        g.sample_aspect_ratio = Some(0.5);
        assert_eq!(resolve(&g).unwrap().height, Some(200));

        let mut g = geometry(1920, 1080, Some(360), None, AspectMode::Stretch);
        g.rotation = Rotation::Quarter;
        assert_eq!(resolve(&g).unwrap().height, Some(640));
    }

    #[test]
    fn test_crop_covers_and_pad_fits() {
        let sources = [(640, 400), (640, 480), (1920, 1080), (720, 576), (1080, 1920)];
        let targets = [(320, 240), (320, 200), (640, 360), (400, 400), (176, 144)];

        for (sw, sh) in sources {
            for (w, h) in targets {
                let cropped = resolve(&geometry(sw, sh, Some(w), Some(h), AspectMode::Crop)).unwrap();
                assert!(cropped.width.unwrap() >= w && cropped.height.unwrap() >= h);

                let padded = resolve(&geometry(sw, sh, Some(w), Some(h), AspectMode::Pad)).unwrap();
                assert!(padded.width.unwrap() <= w && padded.height.unwrap() <= h);
            }
        }
    }

    #[test]
    fn test_degenerate_derived_dimension() {
        let g = geometry(4000, 16, Some(16), None, AspectMode::Stretch);
        assert_eq!(
            resolve(&g).unwrap(),
            GeometryResult {
                width: Some(16),
                height: None,
                filter: None,
            }
        );

        let g = geometry(16, 4000, None, Some(16), AspectMode::Stretch);
        assert_eq!(resolve(&g).unwrap().width, None);

        // nothing left to pad into; keep the requested box
        let g = geometry(16, 4000, Some(16), Some(16), AspectMode::Pad);
        assert_eq!(resolve(&g).unwrap(), result(16, 16, None));
        let g = geometry(4000, 16, Some(16), Some(16), AspectMode::Pad);
        assert_eq!(resolve(&g).unwrap(), result(16, 16, None));
    }

    #[test]
    fn test_contract_violations() {
        let mut g = geometry(640, 480, Some(320), Some(240), AspectMode::Crop);
        g.sample_aspect_ratio = Some(0.0);
        assert_matches!(resolve(&g), Err(Error::GeometryContractViolation(_)));

        let g = geometry(640, 480, Some(0), Some(240), AspectMode::Crop);
        assert_matches!(resolve(&g), Err(Error::GeometryContractViolation(_)));
    }

    #[test]
    fn test_parse_mode_and_rotation() {
        assert_eq!("crop".parse::<AspectMode>().unwrap(), AspectMode::Crop);
        assert_matches!(
            "zoom".parse::<AspectMode>(),
            Err(Error::GeometryContractViolation(_))
        );
        assert!("270".parse::<Rotation>().unwrap().is_transposed());
        assert!(!"180".parse::<Rotation>().unwrap().is_transposed());
        assert!("45".parse::<Rotation>().is_err());
    }
}
