//! Sexagesimal `ddmm.mmmm` <-> signed decimal degrees

/// Converts `ddmm.mmmm` (or `dddmm.mmmm`) into decimal degrees,
/// negated when `negative` (southern or western hemisphere).
pub fn ddmm_to_degrees(ddmm: f64, negative: bool) -> f64 {
    let degrees = (ddmm / 100.0).floor();
    let minutes = ddmm - degrees * 100.0;
    let value = degrees + minutes / 60.0;

    if negative { -value } else { value }
}

/// Converts signed decimal degrees into unsigned `ddmm.mmmm`,
/// returning the hemisphere sign separately.
pub fn degrees_to_ddmm(degrees: f64) -> (f64, bool) {
    let negative = degrees < 0.0;
    let magnitude = degrees.abs();

    let whole = magnitude.floor();
    let ddmm = whole * 100.0 + 60.0 * (magnitude - whole);

    (ddmm, negative)
}

/// Latitude hemisphere letter
pub fn latitude_hemisphere(negative: bool) -> char {
    if negative { 'S' } else { 'N' }
}

/// Longitude hemisphere letter
pub fn longitude_hemisphere(negative: bool) -> char {
    if negative { 'W' } else { 'E' }
}

#[cfg(test)]
mod test {
    use super::{ddmm_to_degrees, degrees_to_ddmm};

    #[test]
    fn test_ddmm_decoding() {
        assert!((ddmm_to_degrees(4807.038, false) - 48.1173).abs() < 1E-4);
        assert!((ddmm_to_degrees(1131.000, false) - 11.516_666).abs() < 1E-6);
        assert!((ddmm_to_degrees(12311.12, true) + 123.185_333).abs() < 1E-6);
        assert_eq!(ddmm_to_degrees(0.0, false), 0.0);
    }

    #[test]
    fn test_ddmm_encoding() {
        let (ddmm, negative) = degrees_to_ddmm(47.8);
        assert!((ddmm - 4748.0).abs() < 1E-9);
        assert!(!negative);

        let (ddmm, negative) = degrees_to_ddmm(-122.1);
        assert!((ddmm - 12206.0).abs() < 1E-9);
        assert!(negative);
    }

    #[test]
    fn test_round_trip() {
        for degrees in [
            48.1173, -48.1173, 11.5167, -11.5167, 0.0, 89.9999, -179.9999, 0.5, -0.5,
        ] {
            let (ddmm, negative) = degrees_to_ddmm(degrees);
            let decoded = ddmm_to_degrees(ddmm, negative);
            assert!(
                (decoded - degrees).abs() < 1E-4,
                "{} decoded as {}",
                degrees,
                decoded
            );
        }
    }
}
