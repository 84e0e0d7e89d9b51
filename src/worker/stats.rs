use crate::error::SentenceError;

/// Acquisition counters, reported when the worker exits
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Statistics {
    /// '$' lines handed to the codec
    pub lines: u64,

    /// Published fixes
    pub accepted: u64,

    /// Framing or checksum failures
    pub rejected: u64,

    /// GPGGA sentences with quality 0
    pub no_fix: u64,

    /// Valid sentences of other types
    pub ignored: u64,

    /// Lines not starting with '$'
    pub discarded: u64,

    /// Truncated lines
    pub overflows: u64,
}

impl Statistics {
    /// Accounts for one decoding failure
    pub fn count_error(&mut self, error: &SentenceError) {
        match error {
            SentenceError::NoFix => self.no_fix += 1,
            SentenceError::NotGpgga => self.ignored += 1,
            _ => self.rejected += 1,
        }
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lines: {} fixes, {} rejected, {} without fix, {} ignored, {} discarded, {} overflows",
            self.lines,
            self.accepted,
            self.rejected,
            self.no_fix,
            self.ignored,
            self.discarded,
            self.overflows
        )
    }
}

#[cfg(test)]
mod test {
    use super::Statistics;
    use crate::error::SentenceError;

    #[test]
    fn test_error_accounting() {
        let mut stats = Statistics::default();
        stats.count_error(&SentenceError::NoFix);
        stats.count_error(&SentenceError::NotGpgga);
        stats.count_error(&SentenceError::MissingChecksum);
        stats.count_error(&SentenceError::ChecksumMismatch {
            expected: 0,
            computed: 0x47,
        });

        assert_eq!(stats.no_fix, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.accepted, 0);
    }
}
