//! Geo-coordinate parsing and proximity checks.
//!
//! Pings and registered check-in/check-out points arrive as raw
//! `"lat,lng"` strings owned by the surrounding product; parsing happens
//! at evaluation time so a malformed point fails only the worker it
//! belongs to.

use crate::error::GeoError;

/// A parsed latitude/longitude pair, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse a `"lat,lng"` string.
    ///
    /// # Errors
    /// Returns an error if the string is not two comma-separated numeric
    /// components.
    pub fn parse(raw: &str) -> Result<Self, GeoError> {
        let mut parts = raw.splitn(2, ',');
        let (lat_str, lng_str) = match (parts.next(), parts.next()) {
            (Some(lat), Some(lng)) => (lat.trim(), lng.trim()),
            _ => return Err(GeoError::Malformed(raw.to_string())),
        };
        if lat_str.is_empty() || lng_str.is_empty() {
            return Err(GeoError::Malformed(raw.to_string()));
        }
        let lat = lat_str
            .parse::<f64>()
            .map_err(|_| GeoError::NonNumeric(raw.to_string()))?;
        let lng = lng_str
            .parse::<f64>()
            .map_err(|_| GeoError::NonNumeric(raw.to_string()))?;
        Ok(Self { lat, lng })
    }

    /// Whether `self` lies within `tolerance` degrees of `other` on both
    /// axes. Axis-wise absolute difference, not great-circle distance.
    pub fn is_near(&self, other: GeoPoint, tolerance: f64) -> bool {
        let lat_diff = (self.lat - other.lat).abs();
        let lng_diff = (self.lng - other.lng).abs();
        lat_diff < tolerance && lng_diff < tolerance
    }
}

/// Convenience over raw strings: parse both sides, then compare.
///
/// # Errors
/// Propagates the parse failure of either side.
pub fn is_within_proximity(
    current: &str,
    designated: &str,
    tolerance: f64,
) -> Result<bool, GeoError> {
    let current = GeoPoint::parse(current)?;
    let designated = GeoPoint::parse(designated)?;
    Ok(current.is_near(designated, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.001;

    #[test]
    fn parse_plain_pair() {
        let p = GeoPoint::parse("41.0082,28.9784").unwrap();
        assert_eq!(p.lat, 41.0082);
        assert_eq!(p.lng, 28.9784);
    }

    #[test]
    fn parse_tolerates_spaces() {
        let p = GeoPoint::parse(" 41.0082 , 28.9784 ").unwrap();
        assert_eq!(p.lat, 41.0082);
        assert_eq!(p.lng, 28.9784);
    }

    #[test]
    fn parse_rejects_missing_component() {
        assert!(matches!(
            GeoPoint::parse("41.0082"),
            Err(GeoError::Malformed(_))
        ));
        assert!(matches!(GeoPoint::parse("41.0082,"), Err(GeoError::Malformed(_))));
        assert!(matches!(GeoPoint::parse(""), Err(GeoError::Malformed(_))));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert!(matches!(
            GeoPoint::parse("here,there"),
            Err(GeoError::NonNumeric(_))
        ));
    }

    #[test]
    fn near_when_both_axes_inside_tolerance() {
        let a = GeoPoint::new(41.0000, 29.0000);
        let b = GeoPoint::new(41.0005, 29.0005);
        assert!(a.is_near(b, TOLERANCE));
    }

    #[test]
    fn far_when_either_axis_outside_tolerance() {
        let a = GeoPoint::new(41.0000, 29.0000);
        assert!(!a.is_near(GeoPoint::new(41.0020, 29.0000), TOLERANCE));
        assert!(!a.is_near(GeoPoint::new(41.0000, 29.0020), TOLERANCE));
    }

    #[test]
    fn exact_tolerance_is_far() {
        // strict less-than on both axes
        let a = GeoPoint::new(41.0, 29.0);
        let b = GeoPoint::new(41.001, 29.0);
        assert!(!a.is_near(b, TOLERANCE));
    }

    #[test]
    fn string_level_proximity() {
        assert!(is_within_proximity("41.0,29.0", "41.0005,29.0005", TOLERANCE).unwrap());
        assert!(!is_within_proximity("41.0,29.0", "41.002,29.0", TOLERANCE).unwrap());
        assert!(is_within_proximity("bogus", "41.0,29.0", TOLERANCE).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn proximity_is_symmetric(
                lat_a in -90.0f64..90.0,
                lng_a in -180.0f64..180.0,
                lat_b in -90.0f64..90.0,
                lng_b in -180.0f64..180.0,
            ) {
                let a = GeoPoint::new(lat_a, lng_a);
                let b = GeoPoint::new(lat_b, lng_b);
                prop_assert_eq!(a.is_near(b, TOLERANCE), b.is_near(a, TOLERANCE));
            }

            #[test]
            fn point_is_near_itself(
                lat in -90.0f64..90.0,
                lng in -180.0f64..180.0,
            ) {
                let p = GeoPoint::new(lat, lng);
                prop_assert!(p.is_near(p, TOLERANCE));
            }

            #[test]
            fn roundtrip_through_string(
                lat in -90.0f64..90.0,
                lng in -180.0f64..180.0,
            ) {
                let p = GeoPoint::new(lat, lng);
                let parsed = GeoPoint::parse(&format!("{lat},{lng}")).unwrap();
                prop_assert_eq!(parsed, p);
            }
        }
    }
}
