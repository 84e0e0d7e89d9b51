//! Captured NMEA file backend. Files ending with `.gz` are gzip
//! compressed captures.

use std::{io::Cursor, io::Read, path::Path};

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

use super::interface::Interface;

/// True for gzip compressed captures
pub fn is_gzip_compressed(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".gz")
}

/// Opens a capture as a read-only [Interface]
pub async fn open(path: &str) -> Result<Interface> {
    if !Path::new(path).is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a file", path),
        )));
    }

    if is_gzip_compressed(path) {
        let path = path.to_string();

        let content = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
            let fd = std::fs::File::open(&path)?;
            let mut decoder = GzDecoder::new(fd);
            let mut content = Vec::new();
            decoder.read_to_end(&mut content)?;
            Ok(content)
        })
        .await
        .map_err(|e| Error::Spawn(e.to_string()))??;

        Ok(Interface::from_capture(Cursor::new(content)))
    } else {
        let fd = tokio::fs::File::open(path).await?;
        Ok(Interface::from_capture(fd))
    }
}

#[cfg(test)]
mod test {
    use super::{is_gzip_compressed, open};
    use crate::transport::interface::ReceiveReason;
    use flate2::{Compression, write::GzEncoder};
    use std::{io::Write, time::Duration};

    const CAPTURE: &[u8] = b"$GPRMC,ignored*00\r\n$GPGGA,last*00\r\n";

    async fn read_all(path: &str) -> Vec<u8> {
        let mut interface = open(path).await.unwrap();
        assert!(interface.is_read_only());

        let mut content = Vec::new();
        loop {
            let received = interface
                .receive(512, b'\n', Duration::ZERO, Duration::ZERO)
                .await
                .unwrap();
            content.extend_from_slice(&received.bytes);
            if received.reason == ReceiveReason::EndOfInput {
                break;
            }
        }
        content
    }

    #[test]
    fn test_gzip_detection() {
        assert!(is_gzip_compressed("capture.txt.gz"));
        assert!(is_gzip_compressed("CAPTURE.GZ"));
        assert!(!is_gzip_compressed("capture.txt"));
    }

    #[tokio::test]
    async fn test_plain_capture() {
        let mut file = tempfile::Builder::new().suffix(".nmea").tempfile().unwrap();
        file.write_all(CAPTURE).unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert_eq!(read_all(&path).await, CAPTURE);
    }

    #[tokio::test]
    async fn test_gzip_capture() {
        let mut file = tempfile::Builder::new().suffix(".nmea.gz").tempfile().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(CAPTURE).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert_eq!(read_all(&path).await, CAPTURE);
    }

    #[tokio::test]
    async fn test_missing_capture() {
        assert!(open("/this/capture/does/not/exist.txt").await.is_err());
    }
}
