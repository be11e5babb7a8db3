use crate::data::CityPoint;
use crate::error::RenderPrecondition;

/// Linear map from the observed radius-basis extent to a pixel radius range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMapping {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl ScaleMapping {
    /// Map a radius basis to a pixel radius. A degenerate domain
    /// (min == max) maps everything to the middle of the range.
    #[inline(always)]
    pub fn apply(&self, x: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 { 0.5 } else { (x - d0) / span };
        r0 + t * (r1 - r0)
    }
}

/// Extent of the radius basis over all points in a single pass, ignoring
/// non-finite values
pub fn extent(points: &[CityPoint]) -> Option<[f64; 2]> {
    points
        .iter()
        .map(|p| p.radius_basis)
        .filter(|x| x.is_finite())
        .fold(None, |acc, x| match acc {
            None => Some([x, x]),
            Some([lo, hi]) => Some([lo.min(x), hi.max(x)]),
        })
}

pub fn build_scale(points: &[CityPoint], range: [f64; 2]) -> Result<ScaleMapping, RenderPrecondition> {
    let domain = extent(points).ok_or(RenderPrecondition::EmptyDomain)?;
    Ok(ScaleMapping { domain, range })
}
