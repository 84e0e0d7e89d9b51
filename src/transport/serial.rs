//! Serial port backend.
//!
//! Address grammar: `PORT[:SETTINGS]`, where settings are either
//! `key=value` pairs (`baud=4800 parity=n data=8 stop=1`, separated by
//! spaces or commas) or the positional form `BAUD[,PARITY,DATA,STOP]`.

use std::{str::FromStr, time::Duration};

use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::error::{Error, Result};

/// NMEA 0183 standard data rate
pub const DEFAULT_BAUD_RATE: u32 = 4800;

/// Serial port settings parsed from an address
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    /// Port name, for example `COM2` or `/dev/ttyUSB0`
    pub port: String,
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
}

impl SerialSettings {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            "baud" => {
                self.baud_rate = value
                    .parse::<u32>()
                    .ok()
                    .filter(|baud| *baud > 0)
                    .ok_or_else(|| invalid("baud rate", value))?;
            },
            "parity" => {
                self.parity = match value.to_ascii_lowercase().as_str() {
                    "n" | "none" => Parity::None,
                    "e" | "even" => Parity::Even,
                    "o" | "odd" => Parity::Odd,
                    _ => return Err(invalid("parity", value)),
                };
            },
            "data" => {
                self.data_bits = match value {
                    "5" => DataBits::Five,
                    "6" => DataBits::Six,
                    "7" => DataBits::Seven,
                    "8" => DataBits::Eight,
                    _ => return Err(invalid("data bits", value)),
                };
            },
            "stop" => {
                self.stop_bits = match value {
                    "1" => StopBits::One,
                    "2" => StopBits::Two,
                    _ => return Err(invalid("stop bits", value)),
                };
            },
            _ => {
                return Err(Error::Config(format!(
                    "unknown serial port setting \"{}\"",
                    key
                )));
            },
        }
        Ok(())
    }
}

fn invalid(what: &str, value: &str) -> Error {
    Error::Config(format!("invalid {}: \"{}\"", what, value))
}

impl FromStr for SerialSettings {
    type Err = Error;

    fn from_str(address: &str) -> Result<Self> {
        let address = address.trim();

        let (port, settings) = match address.split_once(':') {
            Some((port, settings)) => (port.trim(), settings.trim()),
            None => (address, ""),
        };

        if port.is_empty() {
            return Err(Error::Config(format!(
                "missing serial port name in \"{}\"",
                address
            )));
        }

        let mut serial = Self::new(port);

        let items = settings
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty());

        if settings.contains('=') {
            for item in items {
                let (key, value) = item
                    .split_once('=')
                    .ok_or_else(|| invalid("serial port setting", item))?;
                serial.apply(key.trim(), value.trim())?;
            }
        } else {
            for (key, value) in ["baud", "parity", "data", "stop"].into_iter().zip(items) {
                serial.apply(key, value)?;
            }
        }

        Ok(serial)
    }
}

/// Opens the serial port described by `settings`
pub fn open(settings: &SerialSettings, timeout: Duration) -> Result<SerialStream> {
    let stream = tokio_serial::new(&settings.port, settings.baud_rate)
        .parity(settings.parity)
        .data_bits(settings.data_bits)
        .stop_bits(settings.stop_bits)
        .flow_control(FlowControl::None)
        .timeout(timeout)
        .open_native_async()?;

    Ok(stream)
}
