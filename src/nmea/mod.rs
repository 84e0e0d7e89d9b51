//! NMEA 0183 sentence codec.
//!
//! Pure functions only: framing and checksum validation, GPGGA decoding
//! into a [crate::fix::Fix] and GPGGA synthesis for injection.

pub mod checksum;
pub mod coordinate;
pub mod gga;

pub use checksum::{frame, validate_and_strip_checksum};
pub use coordinate::{ddmm_to_degrees, degrees_to_ddmm};
pub use gga::{GpggaSpec, format_gpgga, parse_gpgga};

use crate::{error::SentenceError, fix::Fix};

/// Validates a complete line and decodes it as a GPGGA fix.
pub fn decode_line(line: &[u8]) -> Result<Fix, SentenceError> {
    let payload = validate_and_strip_checksum(line)?;
    parse_gpgga(payload)
}
