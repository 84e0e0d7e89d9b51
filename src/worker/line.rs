//! Sentence line accumulation.

use crate::nmea::checksum::START;

/// Lines growing past this length, before any LF, are dropped
pub const MAX_LINE_LEN: usize = 1024;

/// What happened to a closed line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Line started with '$' and was handed over
    Complete,

    /// Line did not start with '$'
    Discarded,

    /// Line exceeded the buffer capacity and was dropped
    Overflowed,
}

/// Accumulates received bytes into `$`-started, LF-terminated lines.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
    overflows: u64,
    overflowing: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(MAX_LINE_LEN)
    }
}

impl LineBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len),
            max_len,
            overflows: 0,
            overflowing: false,
        }
    }

    /// Number of lines that were truncated
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pushes received bytes, invoking `on_line` with each closed line
    /// that starts with '$' (LF included) and fits the buffer.
    pub fn push<F: FnMut(&[u8])>(&mut self, bytes: &[u8], mut on_line: F) -> Vec<LineEvent> {
        let mut events = Vec::new();

        for byte in bytes {
            match *byte {
                START => {
                    self.buf.clear();
                    self.overflowing = false;
                    self.buf.push(START);
                },
                b'\n' => {
                    if self.overflowing {
                        events.push(LineEvent::Overflowed);
                    } else if self.buf.first() == Some(&START) {
                        self.buf.push(b'\n');
                        on_line(&self.buf);
                        events.push(LineEvent::Complete);
                    } else {
                        events.push(LineEvent::Discarded);
                    }

                    self.buf.clear();
                    self.overflowing = false;
                },
                byte => {
                    if self.buf.len() < self.max_len {
                        self.buf.push(byte);
                    } else if !self.overflowing {
                        self.overflowing = true;
                        self.overflows += 1;
                    }
                },
            }
        }

        events
    }

    /// Drops any partial line
    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowing = false;
    }
}
