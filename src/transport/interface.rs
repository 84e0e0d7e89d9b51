use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

/// Boxed byte source
pub type Source = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed byte sink
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Why a [Interface::receive] call returned
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReceiveReason {
    /// Terminator byte received (and included)
    Terminated,

    /// Requested maximal length reached before the terminator
    Full,

    /// Nothing received within the read timeout, or the stream stalled
    /// for longer than the dropout timeout
    Timeout,

    /// Stream closed (end of file, or peer disconnection)
    EndOfInput,
}

/// Outcome of one [Interface::receive] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub bytes: Vec<u8>,
    pub reason: ReceiveReason,
}

/// Reading side of a transport
pub enum Interface {
    /// [Interface::Port] is a live link (serial port, TCP/IP),
    /// read with timeouts.
    Port(BufReader<Source>),

    /// [Interface::ReadOnly] is dedicated to captured data (files),
    /// read until the terminator or end of input.
    ReadOnly(BufReader<Source>),
}

impl Interface {
    /// Creates a new live [Interface]
    pub fn from_port<R: AsyncRead + Send + Unpin + 'static>(reader: R) -> Self {
        Self::Port(BufReader::new(Box::new(reader)))
    }

    /// Creates a new read-only [Interface]
    pub fn from_capture<R: AsyncRead + Send + Unpin + 'static>(reader: R) -> Self {
        Self::ReadOnly(BufReader::new(Box::new(reader)))
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly(_))
    }

    /// Receives up to `max_bytes`, stopping after `terminator`.
    ///
    /// Live links wait up to `read_timeout` for the first byte and up to
    /// `dropout_timeout` between following bytes. Read-only interfaces
    /// have no timeouts. Bytes following the terminator stay buffered
    /// for the next call.
    pub async fn receive(
        &mut self,
        max_bytes: usize,
        terminator: u8,
        read_timeout: Duration,
        dropout_timeout: Duration,
    ) -> Result<Received> {
        match self {
            Self::Port(reader) => {
                receive_until(
                    reader,
                    max_bytes,
                    terminator,
                    Some((read_timeout, dropout_timeout)),
                )
                .await
            },
            Self::ReadOnly(reader) => receive_until(reader, max_bytes, terminator, None).await,
        }
    }
}

async fn receive_until(
    reader: &mut BufReader<Source>,
    max_bytes: usize,
    terminator: u8,
    timeouts: Option<(Duration, Duration)>,
) -> Result<Received> {
    let mut bytes = Vec::with_capacity(max_bytes.min(1024));

    let reason = loop {
        if bytes.len() >= max_bytes {
            break ReceiveReason::Full;
        }

        let pending = reader.fill_buf();

        let available = match timeouts {
            Some((read_timeout, dropout_timeout)) => {
                let timeout = if bytes.is_empty() {
                    read_timeout
                } else {
                    dropout_timeout
                };

                match tokio::time::timeout(timeout, pending).await {
                    Ok(available) => available?,
                    Err(_) => break ReceiveReason::Timeout,
                }
            },
            None => pending.await?,
        };

        if available.is_empty() {
            break ReceiveReason::EndOfInput;
        }

        let window = &available[..available.len().min(max_bytes - bytes.len())];

        let (used, terminated) = match window.iter().position(|byte| *byte == terminator) {
            Some(index) => (index + 1, true),
            None => (window.len(), false),
        };

        bytes.extend_from_slice(&window[..used]);
        reader.consume(used);

        if terminated {
            break ReceiveReason::Terminated;
        }
    };

    Ok(Received { bytes, reason })
}

/// Writing side of a transport
pub enum Output {
    /// Live link
    Port(Sink),

    /// Captured data cannot be written to
    ReadOnly,
}

impl Output {
    /// Creates a new live [Output]
    pub fn from_port<W: AsyncWrite + Send + Unpin + 'static>(writer: W) -> Self {
        Self::Port(Box::new(writer))
    }

    /// Writes and flushes all bytes
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Port(writer) => {
                writer.write_all(data).await?;
                writer.flush().await?;
                Ok(())
            },
            Self::ReadOnly => Err(Error::ReadOnly),
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        match self {
            Self::Port(writer) => Ok(writer.shutdown().await?),
            Self::ReadOnly => Ok(()),
        }
    }
}
