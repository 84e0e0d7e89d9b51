use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// One validated position report.
///
/// A [Fix] is never mutated once published: the next accepted sentence
/// supersedes it as a whole.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct Fix {
    /// Publication counter, 1 for the first fix of a connection.
    /// 0 until the [FixPublisher] stamps it.
    pub sequence: u64,

    /// UTC hours
    pub utc_hours: u32,

    /// UTC minutes
    pub utc_minutes: u32,

    /// UTC seconds (fractional part truncated)
    pub utc_seconds: u32,

    /// Signed decimal degrees, negative south
    pub latitude_deg: f64,

    /// Signed decimal degrees, negative west
    pub longitude_deg: f64,

    /// Altitude above mean sea level, in meters
    pub altitude_m: f64,

    /// Geoid separation, in meters
    pub geoid_separation_m: f64,

    /// GPGGA fix quality indicator (never 0 for a published fix)
    pub quality: u8,

    /// Number of satellites in use
    pub satellites: u8,

    /// Horizontal dilution of precision
    pub hdop: f64,
}

impl std::fmt::Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fix {}: Lat {:.6}, long {:.6}, alt {:.6}",
            self.sequence, self.latitude_deg, self.longitude_deg, self.altitude_m
        )
    }
}

#[derive(Debug, Default)]
struct Register {
    /// Last published [Fix]
    latest: Option<Fix>,

    /// Sequence of the last published [Fix]
    published: u64,

    /// Sequence last delivered to the reader
    observed: u64,
}

/// Creates a new fix register, returning its single writer and reader.
pub fn register() -> (FixPublisher, FixReader) {
    let inner = Arc::new(Mutex::new(Register::default()));
    (
        FixPublisher {
            inner: Arc::clone(&inner),
        },
        FixReader { inner },
    )
}

/// Writing end of the fix register, owned by the acquisition worker.
#[derive(Debug)]
pub struct FixPublisher {
    inner: Arc<Mutex<Register>>,
}

impl FixPublisher {
    /// Stamps `fix` with the next sequence number and makes it the
    /// latest value. Returns the assigned sequence.
    pub fn publish(&self, mut fix: Fix) -> u64 {
        let mut register = self.inner.lock();
        register.published += 1;
        fix.sequence = register.published;
        register.latest = Some(fix);
        register.published
    }
}

/// Reading end of the fix register, owned by the session.
#[derive(Debug)]
pub struct FixReader {
    inner: Arc<Mutex<Register>>,
}

impl FixReader {
    /// Returns the latest [Fix] if it was published after the previous
    /// call. Fixes published in between are coalesced: only the most
    /// recent one is delivered.
    pub fn update(&self) -> Option<Fix> {
        let mut register = self.inner.lock();

        if register.published == register.observed {
            return None;
        }

        register.observed = register.published;
        register.latest
    }

    /// Sequence number of the latest published [Fix]
    pub fn sequence(&self) -> u64 {
        self.inner.lock().published
    }
}
