use glam::DVec2;

/// A ring of geographic coordinates (lon, lat) in degrees
pub type Ring = Vec<(f64, f64)>;

/// Polygon as exterior ring followed by holes
pub type Polygon = Vec<Ring>;

/// Wrap a longitude in degrees into [-180, 180)
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap an angle in radians into [-PI, PI]
#[inline(always)]
pub fn wrap_radians(lambda: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if lambda.abs() > PI {
        lambda - (lambda / TAU).round() * TAU
    } else {
        lambda
    }
}

/// Even-odd point in ring test on planar coordinates
pub fn ring_contains(ring: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Axis aligned bounds of a set of planar rings, `None` when empty
pub fn bounds<'a>(rings: impl IntoIterator<Item = &'a Vec<DVec2>>) -> Option<(DVec2, DVec2)> {
    let mut iter = rings.into_iter().flatten();
    let first = *iter.next()?;
    Some(iter.fold((first, first), |(min, max), &p| (min.min(p), max.max(p))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-105.0), -105.0);
        assert_eq!(wrap_lon(180.0), -180.0);
    }

    #[test]
    fn test_ring_contains() {
        let square = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ];
        assert!(ring_contains(&square, DVec2::new(5.0, 5.0)));
        assert!(!ring_contains(&square, DVec2::new(15.0, 5.0)));
        assert!(!ring_contains(&[], DVec2::ZERO));
    }

    #[test]
    fn test_bounds() {
        let rings = vec![vec![DVec2::new(1.0, 5.0), DVec2::new(-2.0, 3.0)]];
        let (min, max) = bounds(&rings).unwrap();
        assert_eq!(min, DVec2::new(-2.0, 3.0));
        assert_eq!(max, DVec2::new(1.0, 5.0));
    }
}
