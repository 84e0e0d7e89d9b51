//! GPGGA (Global Positioning System Fix Data) sentence

use std::str::FromStr;

use crate::{
    error::{Error, SentenceError},
    fix::Fix,
    nmea::{
        checksum,
        coordinate::{
            ddmm_to_degrees, degrees_to_ddmm, latitude_hemisphere, longitude_hemisphere,
        },
    },
};

/// Payload tag, case sensitive as received
pub const TAG: &str = "GPGGA,";

// comma separated fields following the tag
const UTC: usize = 0;
const LATITUDE: usize = 1;
const NS: usize = 2;
const LONGITUDE: usize = 3;
const EW: usize = 4;
const QUALITY: usize = 5;
const SATELLITES: usize = 6;
const HDOP: usize = 7;
const ALTITUDE: usize = 8;
const GEOID_SEPARATION: usize = 10;
const NUM_FIELDS: usize = 12;

/// Parses a validated payload (see [checksum::validate_and_strip_checksum])
/// into a [Fix]. The returned [Fix] is not stamped yet (`sequence` = 0).
pub fn parse_gpgga(payload: &[u8]) -> Result<Fix, SentenceError> {
    let text = std::str::from_utf8(payload).map_err(|_| SentenceError::Malformed("sentence"))?;
    let body = text.strip_prefix(TAG).ok_or(SentenceError::NotGpgga)?;

    let mut fields = [""; NUM_FIELDS];
    for (slot, field) in fields.iter_mut().zip(body.split(',')) {
        *slot = field.trim();
    }

    let quality = fields[QUALITY]
        .parse::<u8>()
        .map_err(|_| SentenceError::Malformed("fix quality"))?;

    if quality == 0 {
        return Err(SentenceError::NoFix);
    }

    let (utc_hours, utc_minutes, utc_seconds) = parse_utc(fields[UTC])?;

    let latitude = parse_ddmm(fields[LATITUDE], "latitude")?;
    let south = parse_hemisphere(fields[NS], b'N', b'S', "N/S")?;

    let longitude = parse_ddmm(fields[LONGITUDE], "longitude")?;
    let west = parse_hemisphere(fields[EW], b'E', b'W', "E/W")?;

    Ok(Fix {
        sequence: 0,
        utc_hours,
        utc_minutes,
        utc_seconds,
        latitude_deg: ddmm_to_degrees(latitude, south),
        longitude_deg: ddmm_to_degrees(longitude, west),
        altitude_m: parse_or_zero(fields[ALTITUDE], "altitude")?,
        geoid_separation_m: parse_or_zero(fields[GEOID_SEPARATION], "geoid separation")?,
        quality,
        satellites: parse_or_zero(fields[SATELLITES], "satellite count")?,
        hdop: parse_or_zero(fields[HDOP], "HDOP")?,
    })
}

/// Synthesizes a complete GPGGA sentence (checksum and CR/LF included)
/// describing `fix`.
pub fn format_gpgga(fix: &Fix) -> String {
    let (latitude, south) = degrees_to_ddmm(fix.latitude_deg);
    let (longitude, west) = degrees_to_ddmm(fix.longitude_deg);

    let payload = format!(
        "{}{:02}{:02}{:02},{:09.4},{},{:010.4},{},{},{:02},{:.2},{:.3},M,{:.1},M,,",
        TAG,
        fix.utc_hours,
        fix.utc_minutes,
        fix.utc_seconds,
        latitude,
        latitude_hemisphere(south),
        longitude,
        longitude_hemisphere(west),
        fix.quality,
        fix.satellites,
        fix.hdop,
        fix.altitude_m,
        fix.geoid_separation_m,
    );

    checksum::frame(&payload)
}

// hhmmss[.sss]: fractional seconds are dropped, not rounded
fn parse_utc(field: &str) -> Result<(u32, u32, u32), SentenceError> {
    let (whole, fraction) = field.split_once('.').unwrap_or((field, ""));

    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(SentenceError::Malformed("UTC"));
    }

    let hms = whole
        .parse::<u32>()
        .map_err(|_| SentenceError::Malformed("UTC"))?;

    Ok(((hms / 10_000) % 100, (hms / 100) % 100, hms % 100))
}

fn parse_ddmm(field: &str, name: &'static str) -> Result<f64, SentenceError> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(SentenceError::Malformed(name)),
    }
}

/// Returns true for the negative hemisphere
fn parse_hemisphere(
    field: &str,
    positive: u8,
    negative: u8,
    name: &'static str,
) -> Result<bool, SentenceError> {
    match field.as_bytes() {
        [c] if c.to_ascii_uppercase() == positive => Ok(false),
        [c] if c.to_ascii_uppercase() == negative => Ok(true),
        _ => Err(SentenceError::Malformed(name)),
    }
}

fn parse_or_zero<T: FromStr + Default>(
    field: &str,
    name: &'static str,
) -> Result<T, SentenceError> {
    if field.is_empty() {
        Ok(T::default())
    } else {
        field.parse::<T>().map_err(|_| SentenceError::Malformed(name))
    }
}

/// Injected position, parsed from `lat,lon,alt,h,m,s`
/// (decimal degrees, meters, UTC time of day).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GpggaSpec {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
    pub utc_hours: u32,
    pub utc_minutes: u32,
    pub utc_seconds: u32,
}

impl GpggaSpec {
    /// Fix quality of injected sentences
    pub const QUALITY: u8 = 1;

    /// Satellite count of injected sentences
    pub const SATELLITES: u8 = 8;

    /// HDOP of injected sentences
    pub const HDOP: f64 = 0.9;

    /// Geoid separation of injected sentences, in meters
    pub const GEOID_SEPARATION_M: f64 = 46.9;

    /// Converts to the [Fix] that will be transmitted
    pub fn to_fix(&self) -> Fix {
        Fix {
            sequence: 0,
            utc_hours: self.utc_hours,
            utc_minutes: self.utc_minutes,
            utc_seconds: self.utc_seconds,
            latitude_deg: self.latitude_deg,
            longitude_deg: self.longitude_deg,
            altitude_m: self.altitude_m,
            geoid_separation_m: Self::GEOID_SEPARATION_M,
            quality: Self::QUALITY,
            satellites: Self::SATELLITES,
            hdop: Self::HDOP,
        }
    }
}

impl FromStr for GpggaSpec {
    type Err = Error;

    /// Trailing items may be omitted and default to 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items = s.split(',').map(str::trim).collect::<Vec<_>>();

        if items.len() > 6 || items[0].is_empty() {
            return Err(Error::Config(format!(
                "invalid GPGGA specification \"{}\", expecting lat,lon,alt,h,m,s",
                s
            )));
        }

        fn item<T: FromStr + Default>(items: &[&str], index: usize, name: &str) -> Result<T, Error> {
            match items.get(index) {
                None => Ok(T::default()),
                Some(text) => text
                    .parse::<T>()
                    .map_err(|_| Error::Config(format!("invalid GPGGA {}: \"{}\"", name, text))),
            }
        }

        let spec = Self {
            latitude_deg: item(&items, 0, "latitude")?,
            longitude_deg: item(&items, 1, "longitude")?,
            altitude_m: item(&items, 2, "altitude")?,
            utc_hours: item(&items, 3, "hours")?,
            utc_minutes: item(&items, 4, "minutes")?,
            utc_seconds: item(&items, 5, "seconds")?,
        };

        if !(-90.0..=90.0).contains(&spec.latitude_deg)
            || !(-180.0..=180.0).contains(&spec.longitude_deg)
        {
            return Err(Error::Config(format!("GPGGA position out of range: \"{}\"", s)));
        }

        if spec.utc_hours > 23 || spec.utc_minutes > 59 || spec.utc_seconds > 60 {
            return Err(Error::Config(format!("GPGGA time out of range: \"{}\"", s)));
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod test {
    use super::{GpggaSpec, format_gpgga, parse_gpgga};
    use crate::{error::SentenceError, nmea::checksum::validate_and_strip_checksum};
    use std::str::FromStr;

    fn parse(line: &str) -> Result<crate::fix::Fix, SentenceError> {
        parse_gpgga(validate_and_strip_checksum(line.as_bytes())?)
    }

    #[test]
    fn test_reference_fix() {
        let fix =
            parse("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\n").unwrap();

        assert_eq!(fix.sequence, 0);
        assert_eq!((fix.utc_hours, fix.utc_minutes, fix.utc_seconds), (12, 35, 19));
        assert!((fix.latitude_deg - 48.1173).abs() < 1E-4);
        assert!((fix.longitude_deg - 11.5167).abs() < 1E-4);
        assert_eq!(fix.altitude_m, 545.4);
        assert_eq!(fix.geoid_separation_m, 46.9);
        assert_eq!(fix.quality, 1);
        assert_eq!(fix.satellites, 8);
        assert_eq!(fix.hdop, 0.9);
    }

    #[test]
    fn test_no_fix() {
        assert_eq!(
            parse("$GPGGA,123519,4807.038,N,01131.000,E,0,08,0.9,545.4,M,46.9,M,,*46\n"),
            Err(SentenceError::NoFix)
        );

        // typical cold start output: empty position fields
        let payload = b"GPGGA,,,,,,0,00,99.99,,,,,,";
        assert_eq!(parse_gpgga(payload), Err(SentenceError::NoFix));
    }

    #[test]
    fn test_hemispheres() {
        let fix = parse_gpgga(b"GPGGA,000000,3345.500,S,07036.000,W,2,05,1.2,10.0,M,-20.5,M,,")
            .unwrap();
        assert!((fix.latitude_deg + 33.758_333).abs() < 1E-6);
        assert!((fix.longitude_deg + 70.6).abs() < 1E-9);
        assert_eq!(fix.geoid_separation_m, -20.5);
        assert_eq!(fix.quality, 2);

        // lowercase hemisphere letters
        let fix = parse_gpgga(b"GPGGA,000000,3345.500,s,07036.000,w,1,05,1.2,10.0,M,0,M,,")
            .unwrap();
        assert!(fix.latitude_deg < 0.0 && fix.longitude_deg < 0.0);
    }

    #[test]
    fn test_fractional_seconds_truncated() {
        let fix = parse_gpgga(b"GPGGA,235959.999,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,")
            .unwrap();
        assert_eq!((fix.utc_hours, fix.utc_minutes, fix.utc_seconds), (23, 59, 59));
    }

    #[test]
    fn test_optional_fields() {
        let fix = parse_gpgga(b"GPGGA,101010,4807.038,N,01131.000,E,1,,,,,,,,").unwrap();
        assert_eq!(fix.altitude_m, 0.0);
        assert_eq!(fix.geoid_separation_m, 0.0);
        assert_eq!(fix.satellites, 0);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            parse_gpgga(b"GPRMC,225446,A,4916.45,N,12311.12,W,000.5,054.7,191194,020.3,E"),
            Err(SentenceError::NotGpgga)
        );
        assert_eq!(
            parse_gpgga(b"gpgga,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(SentenceError::NotGpgga)
        );
        assert_eq!(
            parse_gpgga(b"GPGGA,123519,4807.038,X,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(SentenceError::Malformed("N/S"))
        );
        assert_eq!(
            parse_gpgga(b"GPGGA,12:35,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(SentenceError::Malformed("UTC"))
        );
        assert_eq!(
            parse_gpgga(b"GPGGA,123519,,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            Err(SentenceError::Malformed("latitude"))
        );
        assert_eq!(
            parse_gpgga(b"GPGGA,123519"),
            Err(SentenceError::Malformed("fix quality"))
        );
    }

    #[test]
    fn test_gpgga_spec() {
        let spec = GpggaSpec::from_str("47.8,-122.1,100.0,12,34,56").unwrap();
        assert_eq!(spec.latitude_deg, 47.8);
        assert_eq!(spec.longitude_deg, -122.1);
        assert_eq!(spec.altitude_m, 100.0);
        assert_eq!((spec.utc_hours, spec.utc_minutes, spec.utc_seconds), (12, 34, 56));

        let spec = GpggaSpec::from_str("47.8,-122.1").unwrap();
        assert_eq!(spec.altitude_m, 0.0);
        assert_eq!(spec.utc_hours, 0);

        assert!(GpggaSpec::from_str("").is_err());
        assert!(GpggaSpec::from_str("north,-122.1").is_err());
        assert!(GpggaSpec::from_str("95.0,0").is_err());
        assert!(GpggaSpec::from_str("0,0,0,25,0,0").is_err());
        assert!(GpggaSpec::from_str("0,0,0,1,2,3,4").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let spec = GpggaSpec::from_str("47.8,-122.1,100.0,12,34,56").unwrap();
        let sentence = format_gpgga(&spec.to_fix());

        assert!(sentence.starts_with("$GPGGA,123456,4748.0000,N,12206.0000,W,1,08,0.90,100.000,M,46.9,M,,*"));
        assert!(sentence.ends_with("\r\n"));

        let fix = parse(&sentence).unwrap();
        assert!((fix.latitude_deg - 47.8).abs() < 1E-4);
        assert!((fix.longitude_deg + 122.1).abs() < 1E-4);
        assert!((fix.altitude_m - 100.0).abs() < 1E-3);
        assert_eq!((fix.utc_hours, fix.utc_minutes, fix.utc_seconds), (12, 34, 56));
        assert_eq!(fix.geoid_separation_m, 46.9);
    }

    #[test]
    fn test_format_pads_small_values() {
        let spec = GpggaSpec::from_str("5.5,7.25,0,1,2,3").unwrap();
        let sentence = format_gpgga(&spec.to_fix());
        assert!(sentence.starts_with("$GPGGA,010203,0530.0000,N,00715.0000,E,"));

        let fix = parse(&sentence).unwrap();
        assert!((fix.latitude_deg - 5.5).abs() < 1E-6);
        assert!((fix.longitude_deg - 7.25).abs() < 1E-6);
    }
}
