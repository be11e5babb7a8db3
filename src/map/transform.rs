use glam::DVec2;
use serde::Deserialize;

/// Pan/zoom transform applied to the whole scene: `screen = scene * k + translate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub translate: DVec2,
    /// Zoom factor
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        translate: DVec2::ZERO,
        k: 1.0,
    };

    pub fn new(translate: DVec2, k: f64) -> Self {
        Self { translate, k }
    }

    /// Scene coordinates to screen coordinates
    #[inline(always)]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.k + self.translate
    }

    /// Screen coordinates back to scene coordinates
    #[inline(always)]
    pub fn invert(&self, p: DVec2) -> DVec2 {
        (p - self.translate) / self.k
    }

    /// Pan by a screen-space delta
    pub fn translated(&self, delta: DVec2) -> Self {
        Self::new(self.translate + delta, self.k)
    }

    /// Change the zoom factor to `k` keeping the scene point under `pointer` fixed
    pub fn scaled_to_at(&self, k: f64, pointer: DVec2) -> Self {
        let anchor = self.invert(pointer);
        Self::new(pointer - anchor * k, k)
    }
}

/// Allowed range of zoom factors and the factor applied per zoom step.
/// Deserialization rejects an extent that is not `0 < min <= max` with
/// finite bounds, or a step that is not finite and positive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ZoomFields")]
pub struct ZoomConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub step: f64,
}

#[derive(Deserialize)]
#[serde(default)]
struct ZoomFields {
    min_scale: f64,
    max_scale: f64,
    step: f64,
}

impl Default for ZoomFields {
    fn default() -> Self {
        let zoom = ZoomConfig::default();
        Self {
            min_scale: zoom.min_scale,
            max_scale: zoom.max_scale,
            step: zoom.step,
        }
    }
}

impl TryFrom<ZoomFields> for ZoomConfig {
    type Error = String;

    fn try_from(fields: ZoomFields) -> Result<Self, Self::Error> {
        let ZoomFields {
            min_scale,
            max_scale,
            step,
        } = fields;
        if !(min_scale.is_finite() && max_scale.is_finite()) {
            return Err(format!("zoom extent must be finite, got [{min_scale}, {max_scale}]"));
        }
        if min_scale <= 0.0 || min_scale > max_scale {
            return Err(format!("zoom extent must satisfy 0 < min <= max, got [{min_scale}, {max_scale}]"));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(format!("zoom step must be finite and positive, got {step}"));
        }
        Ok(Self {
            min_scale,
            max_scale,
            step,
        })
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 10.0,
            step: 1.5,
        }
    }
}

impl ZoomConfig {
    /// Never panics, even for a hand-built inverted extent
    pub fn clamp(&self, k: f64) -> f64 {
        k.max(self.min_scale).min(self.max_scale)
    }
}
