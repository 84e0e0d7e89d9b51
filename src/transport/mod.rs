//! Byte transports: serial port, TCP/IP and captured files.

use std::{str::FromStr, time::Duration};

use log::{debug, info};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};

pub mod file;
pub mod interface;
pub mod serial;
pub mod tcp;

pub use interface::{Interface, Output, ReceiveReason, Received};
pub use serial::SerialSettings;

/// Connection attempts are abandoned after this delay
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Physical link to the receiver
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// NMEA receiver on a serial port
    SerialNmea,

    /// NMEA stream over TCP/IP
    TcpNmea,

    /// Captured NMEA text file
    FileNmea,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerialNmea => write!(f, "serial port"),
            Self::TcpNmea => write!(f, "TCP/IP"),
            Self::FileNmea => write!(f, "file"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_lowercase();
        match trimmed.as_str() {
            "serial" | "nmea" => Ok(Self::SerialNmea),
            "tcp" | "ip" | "nmip" => Ok(Self::TcpNmea),
            "file" | "nmfile" => Ok(Self::FileNmea),
            _ => Err(Error::Config(format!("unknown transport \"{}\"", s))),
        }
    }
}

/// Opened byte link, both directions
pub struct Transport {
    kind: TransportKind,
    address: String,
    interface: Interface,
    output: Output,
}

impl Transport {
    /// Opens the link to `address`
    pub async fn open(kind: TransportKind, address: &str) -> Result<Self> {
        debug!("opening {} \"{}\"", kind, address);

        let transport = match kind {
            TransportKind::SerialNmea => {
                let settings = SerialSettings::from_str(address)?;

                let stream = serial::open(&settings, CONNECT_TIMEOUT).map_err(|e| Error::Open {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;

                info!(
                    "{} opened at {} bauds",
                    settings.port, settings.baud_rate
                );

                Self::from_stream(kind, address, stream)
            },
            TransportKind::TcpNmea => {
                let stream =
                    tcp::connect(address, CONNECT_TIMEOUT)
                        .await
                        .map_err(|e| match e {
                            Error::Config(_) => e,
                            e => Error::Open {
                                address: address.to_string(),
                                reason: e.to_string(),
                            },
                        })?;

                info!("connected to {}", address);

                let (reader, writer) = stream.into_split();

                Self {
                    kind,
                    address: address.to_string(),
                    interface: Interface::from_port(reader),
                    output: Output::from_port(writer),
                }
            },
            TransportKind::FileNmea => {
                let interface = file::open(address).await.map_err(|e| Error::Open {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;

                info!("replaying {}", address);

                Self {
                    kind,
                    address: address.to_string(),
                    interface,
                    output: Output::ReadOnly,
                }
            },
        };

        Ok(transport)
    }

    /// Wraps an already opened bidirectional stream
    pub fn from_stream<S>(kind: TransportKind, address: &str, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            kind,
            address: address.to_string(),
            interface: Interface::from_port(reader),
            output: Output::from_port(writer),
        }
    }

    /// Wraps captured data
    pub fn from_capture<R>(address: &str, capture: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            kind: TransportKind::FileNmea,
            address: address.to_string(),
            interface: Interface::from_capture(capture),
            output: Output::ReadOnly,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_read_only(&self) -> bool {
        self.interface.is_read_only()
    }

    /// Writes and flushes all bytes
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.output.send(data).await
    }

    /// See [Interface::receive]
    pub async fn receive(
        &mut self,
        max_bytes: usize,
        terminator: u8,
        read_timeout: Duration,
        dropout_timeout: Duration,
    ) -> Result<Received> {
        self.interface
            .receive(max_bytes, terminator, read_timeout, dropout_timeout)
            .await
    }

    /// Closes the writing side. The reading side is released on drop.
    pub async fn close(mut self) -> Result<()> {
        debug!("closing {} \"{}\"", self.kind, self.address);
        self.output.close().await
    }

    /// Separates both directions, so each may be owned by a different task
    pub fn split(self) -> (Interface, Output) {
        (self.interface, self.output)
    }
}

#[cfg(test)]
mod test {
    use super::{Transport, TransportKind};
    use crate::error::Error;
    use std::{str::FromStr, time::Duration};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_transport_kind() {
        assert_eq!(
            TransportKind::from_str("Serial").unwrap(),
            TransportKind::SerialNmea
        );
        assert_eq!(TransportKind::from_str("tcp").unwrap(), TransportKind::TcpNmea);
        assert_eq!(
            TransportKind::from_str(" file ").unwrap(),
            TransportKind::FileNmea
        );
        assert!(TransportKind::from_str("usb").is_err());
        assert_eq!(TransportKind::TcpNmea.to_string(), "TCP/IP");
    }

    #[tokio::test]
    async fn test_stream_transport() {
        let (mut host, device) = tokio::io::duplex(256);
        let mut transport = Transport::from_stream(TransportKind::SerialNmea, "com2", device);
        assert!(!transport.is_read_only());
        assert_eq!(transport.address(), "com2");

        transport.send(b"$PMTK220,1000*1F\r\n").await.unwrap();

        let mut buf = [0; 18];
        host.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"$PMTK220,1000*1F\r\n");

        host.write_all(b"$GPGGA\r\n").await.unwrap();
        let received = transport
            .receive(512, b'\n', Duration::from_millis(50), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(received.bytes, b"$GPGGA\r\n");

        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_capture_transport() {
        let capture: &'static [u8] = b"$GPGGA\r\n";
        let mut transport = Transport::from_capture("capture.txt", capture);
        assert!(transport.is_read_only());
        assert_eq!(transport.kind(), TransportKind::FileNmea);
        assert!(matches!(transport.send(b"27").await, Err(Error::ReadOnly)));
    }

    #[tokio::test]
    async fn test_open_failures() {
        assert!(matches!(
            Transport::open(TransportKind::TcpNmea, "no port").await,
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Transport::open(TransportKind::FileNmea, "/no/such/capture.txt").await,
            Err(Error::Open { .. })
        ));
        assert!(
            Transport::open(TransportKind::SerialNmea, "/dev/no-such-port")
                .await
                .is_err()
        );
    }
}
