//! Session configuration and command line token parser.
//!
//! Recognized tokens (prefixes are matched regardless of case):
//!
//! - `-nmea:<port[settings]>` NMEA receiver on a serial port
//! - `-nmip:<host:port>` NMEA stream over TCP/IP
//! - `-nmfile:<path>` captured NMEA text file
//! - `-nmout:<text>` text transmitted once after connection
//! - `-gpgga:<lat,lon,alt,h,m,s>` transmit one GPGGA sentence, then disconnect
//!
//! A value starting with `[` extends over the following arguments
//! until one ends with `]`, so it may contain spaces:
//! `-nmea:[com2:baud=4800 parity=n data=8 stop=1]`.
//!
//! Only `-nmip:` selects TCP/IP. A `-nmea:` value is always a serial
//! port: `-nmea:host:9999` opens port `host` at 9999 bauds.

use std::str::FromStr;

use crate::{
    error::{Error, Result},
    nmea::GpggaSpec,
    transport::TransportKind,
    worker::Settings as WorkerSettings,
};

#[derive(Debug, Copy, Clone, PartialEq)]
enum Token {
    Serial,
    File,
    Tcp,
    StartupText,
    Gpgga,
}

impl Token {
    const ALL: [(Self, &'static str); 5] = [
        (Self::Serial, "-nmea:"),
        (Self::File, "-nmfile:"),
        (Self::Tcp, "-nmip:"),
        (Self::StartupText, "-nmout:"),
        (Self::Gpgga, "-gpgga:"),
    ];

    /// Identifies a token, returning its value part
    fn recognize(arg: &str) -> Option<(Self, &str)> {
        Self::ALL.iter().find_map(|(token, prefix)| {
            let head = arg.get(..prefix.len())?;
            if head.eq_ignore_ascii_case(prefix) {
                Some((*token, &arg[prefix.len()..]))
            } else {
                None
            }
        })
    }
}

/// [crate::session::Session] configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Selected [TransportKind], None until a source is specified
    pub transport: Option<TransportKind>,

    /// Serial port (and settings), `host:port` or file path
    pub address: String,

    /// Raw text transmitted once after connection
    pub startup_text: Option<String>,

    /// `lat,lon,alt,h,m,s`: when defined, the session transmits a single
    /// GPGGA sentence and disconnects (injector mode)
    pub gpgga_text: Option<String>,

    /// Acquisition worker [WorkerSettings]
    pub worker: WorkerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: None,
            address: String::new(),
            startup_text: None,
            gpgga_text: None,
            worker: WorkerSettings::default(),
        }
    }
}

impl Config {
    /// NMEA receiver on a serial port, for example `COM2`
    /// or `/dev/ttyUSB0:baud=9600`
    pub fn serial(address: &str) -> Self {
        Self::with_transport(TransportKind::SerialNmea, address)
    }

    /// NMEA stream over TCP/IP (`host:port`)
    pub fn tcp(address: &str) -> Self {
        Self::with_transport(TransportKind::TcpNmea, address)
    }

    /// Captured NMEA file replay
    pub fn file(path: &str) -> Self {
        Self::with_transport(TransportKind::FileNmea, path)
    }

    fn with_transport(kind: TransportKind, address: &str) -> Self {
        Self {
            transport: Some(kind),
            address: address.to_string(),
            ..Default::default()
        }
    }

    /// Defines text to transmit once connected
    pub fn with_startup_text(mut self, text: &str) -> Self {
        self.startup_text = Some(text.to_string());
        self
    }

    /// Switches to injector mode
    pub fn with_gpgga_text(mut self, text: &str) -> Self {
        self.gpgga_text = Some(text.to_string());
        self
    }

    /// Customizes the [WorkerSettings]
    pub fn with_worker_settings(mut self, settings: WorkerSettings) -> Self {
        self.worker = settings;
        self
    }

    /// Returns the selected [TransportKind], or a configuration error
    /// when no source was specified.
    pub fn transport_kind(&self) -> Result<TransportKind> {
        let kind = self
            .transport
            .ok_or_else(|| Error::Config("no GNSS source specified".to_string()))?;

        if self.address.trim().is_empty() {
            return Err(Error::Config(format!("missing {} address", kind)));
        }

        Ok(kind)
    }

    /// Parses the injector specification, if any
    pub fn gpgga_spec(&self) -> Result<Option<GpggaSpec>> {
        self.gpgga_text
            .as_deref()
            .map(GpggaSpec::from_str)
            .transpose()
    }
}

/// Extracts GNSS tokens from `args`. Returns the resulting [Config]
/// and the arguments that were not recognized, in their original order.
pub fn parse_config<I, S>(args: I) -> Result<(Config, Vec<String>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = Config::default();
    let mut remaining = Vec::new();

    let mut args = args.into_iter().map(|arg| arg.as_ref().to_string());

    while let Some(arg) = args.next() {
        let Some((token, value)) = Token::recognize(&arg) else {
            remaining.push(arg);
            continue;
        };

        let value = match value.strip_prefix('[') {
            Some(opened) => {
                let mut value = opened.to_string();

                while !value.ends_with(']') {
                    let next = args.next().ok_or_else(|| {
                        Error::Config(format!("unterminated '[' in \"{}\"", arg))
                    })?;
                    value.push(' ');
                    value.push_str(&next);
                }

                value.pop();
                value
            },
            None => value.to_string(),
        };

        if value.trim().is_empty() {
            return Err(Error::Config(format!("missing value in \"{}\"", arg)));
        }

        match token {
            Token::Serial => {
                config.transport = Some(TransportKind::SerialNmea);
                config.address = value;
            },
            Token::File => {
                config.transport = Some(TransportKind::FileNmea);
                config.address = value;
            },
            Token::Tcp => {
                config.transport = Some(TransportKind::TcpNmea);
                config.address = value;
            },
            Token::StartupText => {
                config.startup_text = Some(value);
            },
            Token::Gpgga => {
                GpggaSpec::from_str(&value)?;
                config.gpgga_text = Some(value);
            },
        }
    }

    Ok((config, remaining))
}

#[cfg(test)]
mod test {
    use super::{Config, parse_config};
    use crate::{
        error::Error,
        transport::{TransportKind, serial::SerialSettings},
    };
    use std::str::FromStr;

    #[test]
    fn test_serial_token() {
        let (config, remaining) = parse_config(["-nmea:com2"]).unwrap();
        assert_eq!(config.transport, Some(TransportKind::SerialNmea));
        assert_eq!(config.address, "com2");
        assert!(remaining.is_empty());

        // case insensitive prefix, value case preserved
        let (config, _) = parse_config(["-NMEA:/dev/ttyUSB0"]).unwrap();
        assert_eq!(config.address, "/dev/ttyUSB0");
    }

    #[test]
    fn test_bracketed_values() {
        let (config, remaining) = parse_config([
            "-nmea:[com2:baud=4800",
            "parity=n",
            "data=8",
            "stop=1]",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.address, "com2:baud=4800 parity=n data=8 stop=1");
        assert_eq!(remaining, vec!["-v".to_string()]);

        let (config, _) = parse_config(["-nmfile:[captured data.txt]"]).unwrap();
        assert_eq!(config.transport, Some(TransportKind::FileNmea));
        assert_eq!(config.address, "captured data.txt");

        let (config, _) = parse_config(["-nmout:[$PMTK", "220,1000*1F]"]).unwrap();
        assert_eq!(config.startup_text.as_deref(), Some("$PMTK 220,1000*1F"));

        assert!(matches!(
            parse_config(["-nmfile:[never", "closed"]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_full_command_line() {
        let (config, remaining) = parse_config([
            "--json",
            "-nmip:ke5fx.dyndns.org:9999",
            "-nmout:SYST:STAT?",
            "--count",
            "3",
        ])
        .unwrap();

        assert_eq!(config.transport, Some(TransportKind::TcpNmea));
        assert_eq!(config.address, "ke5fx.dyndns.org:9999");
        assert_eq!(config.startup_text.as_deref(), Some("SYST:STAT?"));
        assert!(config.gpgga_text.is_none());
        assert_eq!(remaining, vec!["--json", "--count", "3"]);
    }

    #[test]
    fn test_gpgga_token() {
        let (config, _) =
            parse_config(["-nmea:com2", "-gpgga:47.8,-122.1,100.0,12,34,56"]).unwrap();
        assert_eq!(
            config.gpgga_text.as_deref(),
            Some("47.8,-122.1,100.0,12,34,56")
        );
        assert!(config.gpgga_spec().unwrap().is_some());

        assert!(parse_config(["-gpgga:north,west"]).is_err());
    }

    #[test]
    fn test_serial_token_never_tcp() {
        let (config, _) = parse_config(["-nmea:[localhost:9999]"]).unwrap();
        assert_eq!(config.transport, Some(TransportKind::SerialNmea));
        assert_eq!(config.address, "localhost:9999");

        let settings = SerialSettings::from_str(&config.address).unwrap();
        assert_eq!(settings.port, "localhost");
        assert_eq!(settings.baud_rate, 9999);
    }

    #[test]
    fn test_last_source_wins() {
        let (config, _) = parse_config(["-nmea:com2", "-nmfile:log.txt"]).unwrap();
        assert_eq!(config.transport, Some(TransportKind::FileNmea));
        assert_eq!(config.address, "log.txt");
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(parse_config(["-nmea:"]), Err(Error::Config(_))));
        assert!(matches!(parse_config(["-nmip:[]"]), Err(Error::Config(_))));

        // not ours
        let (config, remaining) = parse_config(["-nmeax", "-n"]).unwrap();
        assert!(config.transport.is_none());
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn test_transport_kind() {
        assert!(matches!(
            Config::default().transport_kind(),
            Err(Error::Config(_))
        ));
        assert!(Config::serial(" ").transport_kind().is_err());
        assert_eq!(
            Config::tcp("localhost:2947").transport_kind().unwrap(),
            TransportKind::TcpNmea
        );
    }
}
