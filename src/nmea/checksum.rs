//! NMEA 0183 framing: `$<payload>*HH` followed by CR/LF.

use crate::error::SentenceError;

/// Sentence start delimiter
pub const START: u8 = b'$';

/// Checksum delimiter
pub const DELIMITER: u8 = b'*';

/// XOR of all bytes, as used by the `*HH` suffix.
pub fn xor(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Frames a payload (text between `$` and `*`) into a complete
/// sentence, terminated by CR/LF.
pub fn frame(payload: &str) -> String {
    format!("${}*{:02X}\r\n", payload, xor(payload.as_bytes()))
}

/// Validates a received line and returns its payload (the bytes between
/// `$` and the last `*`). Trailing CR/LF are ignored.
pub fn validate_and_strip_checksum(line: &[u8]) -> Result<&[u8], SentenceError> {
    let line = trim_terminator(line);

    let body = match line.split_first() {
        Some((&START, body)) => body,
        _ => return Err(SentenceError::MissingStart),
    };

    let star = body
        .iter()
        .rposition(|byte| *byte == DELIMITER)
        .ok_or(SentenceError::MissingChecksum)?;

    let (payload, digits) = (&body[..star], &body[star + 1..]);

    let expected = parse_hex_pair(digits).ok_or(SentenceError::BadChecksumDigits)?;
    let computed = xor(payload);

    if expected != computed {
        return Err(SentenceError::ChecksumMismatch { expected, computed });
    }

    Ok(payload)
}

fn trim_terminator(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

fn parse_hex_pair(digits: &[u8]) -> Option<u8> {
    match digits {
        [hi, lo] => Some((hex_digit(*hi)? << 4) | hex_digit(*lo)?),
        _ => None,
    }
}

// uppercase only: the wire protocol never emits lowercase hex
fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
