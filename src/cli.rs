use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command, value_parser};

use std::time::Duration;

const GNSS_TOKENS: &str = "GNSS source (one required, last one wins):
  -nmea:<PORT[:SETTINGS]>   NMEA receiver on a serial port.
                            SETTINGS: baud=4800 parity=n data=8 stop=1, or 4800,n,8,1.
                            Use brackets when settings contain spaces:
                            -nmea:[COM2:baud=9600 parity=n]
  -nmip:<HOST:PORT>         NMEA stream over TCP/IP
  -nmfile:<PATH>            Replay a captured NMEA file ('.gz' supported)

Options:
  -nmout:<TEXT>             Transmit TEXT once connected
  -gpgga:<lat,lon,alt,h,m,s>
                            Transmit a single GPGGA sentence, then exit

Examples:
  gps -nmea:/dev/ttyUSB0
  gps -nmip:localhost:10110 --json --count 10
  gps -nmea:COM2 -gpgga:47.8,-122.1,100.0,12,34,56";

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

impl Cli {
    pub fn command() -> Command {
        Command::new("gps")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Acquires GNSS position fixes from an NMEA 0183 receiver")
            .color(ColorChoice::Always)
            .after_help(GNSS_TOKENS)
            .next_help_heading("Acquisition")
            .arg(
                Arg::new("interval")
                    .short('i')
                    .long("interval")
                    .value_name("MS")
                    .value_parser(value_parser!(u64).range(1..))
                    .default_value("10")
                    .help("Polling period, in milliseconds"),
            )
            .arg(
                Arg::new("count")
                    .short('n')
                    .long("count")
                    .value_name("N")
                    .value_parser(value_parser!(u64).range(1..))
                    .help("Exit after N fixes"),
            )
            .arg(
                Arg::new("timeout")
                    .short('t')
                    .long("timeout")
                    .value_name("SECONDS")
                    .value_parser(value_parser!(u64))
                    .help("Exit with an error if no fix is received within this delay"),
            )
            .next_help_heading("Output")
            .arg(
                Arg::new("json")
                    .short('j')
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print each fix as a JSON line"),
            )
            .next_help_heading("Serial ports")
            .arg(
                Arg::new("list-ports")
                    .short('l')
                    .long("list-ports")
                    .action(ArgAction::SetTrue)
                    .help("List available serial ports and exit"),
            )
    }

    /// Builds new [Cli] from the arguments the GNSS parser did not consume
    /// (program name excluded).
    pub fn new(args: Vec<String>) -> Self {
        let args = std::iter::once("gps".to_string()).chain(args);
        Self {
            matches: Self::command().get_matches_from(args),
        }
    }

    pub fn interval(&self) -> Duration {
        let ms = self.matches.get_one::<u64>("interval").copied().unwrap_or(10);
        Duration::from_millis(ms)
    }

    pub fn count(&self) -> Option<u64> {
        self.matches.get_one::<u64>("count").copied()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.matches
            .get_one::<u64>("timeout")
            .map(|secs| Duration::from_secs(*secs))
    }

    pub fn json(&self) -> bool {
        self.matches.get_flag("json")
    }

    pub fn list_ports(&self) -> bool {
        self.matches.get_flag("list-ports")
    }
}
