use thiserror::Error as ThisError;

/// Session and transport level [Error]s.
///
/// In-stream noise (bad checksums, truncated lines, sentences without a
/// fix) is never reported through this type, see [SentenceError].
#[derive(Debug, ThisError)]
pub enum Error {
    /// Unknown transport, malformed address or command line token
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport could not be opened
    #[error("couldn't open {address}: {reason}")]
    Open { address: String, reason: String },

    /// I/O failure on an opened transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port failure
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Operation requires a connected [crate::session::Session]
    #[error("not connected")]
    NotConnected,

    /// Transmit attempted on a read-only (file replay) transport
    #[error("transport is read-only")]
    ReadOnly,

    /// Acquisition task could not be created
    #[error("failed to start acquisition worker: {0}")]
    Spawn(String),

    /// Worker did not reach a terminal state within its grace period
    #[error("acquisition worker did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    /// Injector mode: the sentence was transmitted and the link closed.
    /// Not a failure, but the session is not connected afterwards.
    #[error("one-shot GPGGA transmitted: {sentence}")]
    OneShot { sentence: String },
}

/// Reasons a received line did not produce a [crate::fix::Fix].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum SentenceError {
    #[error("line does not start with '$'")]
    MissingStart,

    #[error("missing '*' checksum delimiter")]
    MissingChecksum,

    #[error("checksum must be two uppercase hex digits")]
    BadChecksumDigits,

    #[error("checksum mismatch: got {expected:02X}, computed {computed:02X}")]
    ChecksumMismatch { expected: u8, computed: u8 },

    #[error("not a GPGGA sentence")]
    NotGpgga,

    /// Fix quality field is 0
    #[error("no fix")]
    NoFix,

    #[error("malformed {0} field")]
    Malformed(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
