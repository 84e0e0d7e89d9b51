//! TCP/IP backend, for NMEA streams served by network receivers
//! or serial port servers.

use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Splits and validates `host:port`
pub fn parse_address(address: &str) -> Result<(&str, u16)> {
    let address = address.trim();

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| Error::Config(format!("expecting host:port, got \"{}\"", address)))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');

    if host.is_empty() {
        return Err(Error::Config(format!("missing host in \"{}\"", address)));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|port| *port > 0)
        .ok_or_else(|| Error::Config(format!("invalid port in \"{}\"", address)))?;

    Ok((host, port))
}

/// Connects to `host:port`, giving up after `timeout`
pub async fn connect(address: &str, timeout: Duration) -> Result<TcpStream> {
    let (host, port) = parse_address(address)?;

    let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(stream) => stream?,
        Err(_) => {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no answer within {:?}", timeout),
            )));
        },
    };

    // sentences are short and interactive
    stream.set_nodelay(true)?;

    Ok(stream)
}

#[cfg(test)]
mod test {
    use super::{connect, parse_address};
    use std::time::Duration;
    use tokio::{io::AsyncReadExt, net::TcpListener};

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("ke5fx.dyndns.org:9999").unwrap(),
            ("ke5fx.dyndns.org", 9999)
        );
        assert_eq!(parse_address("127.0.0.1:2947").unwrap(), ("127.0.0.1", 2947));
        assert_eq!(parse_address("[::1]:10110").unwrap(), ("::1", 10110));

        assert!(parse_address("localhost").is_err());
        assert!(parse_address(":9999").is_err());
        assert!(parse_address("localhost:").is_err());
        assert!(parse_address("localhost:0").is_err());
        assert!(parse_address("localhost:70000").is_err());
    }

    #[tokio::test]
    async fn test_connect_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut content = String::new();
            socket.read_to_string(&mut content).await.unwrap();
            content
        });

        let mut stream = connect(&address, Duration::from_secs(1)).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut stream, b"hello\r\n")
            .await
            .unwrap();
        drop(stream);

        assert_eq!(server.await.unwrap(), "hello\r\n");
    }
}
