//! Caller facing [Session] handle.

use log::{debug, error, info};

use crate::{
    config::{Config, parse_config},
    error::{Error, Result},
    fix::{Fix, FixReader, register},
    nmea::format_gpgga,
    transport::{Output, Transport, TransportKind},
    worker::{Statistics, StopOutcome, Worker, WorkerState},
};

/// Command line terminator appended to transmitted text
const EOL: &str = "\r\n";

/// Active link: write side and acquisition worker
struct Connection {
    kind: TransportKind,
    address: String,
    output: Output,
    worker: Worker,
    reader: FixReader,
}

/// Connection to one GNSS receiver.
///
/// Typical use: [Session::connect], then periodic [Session::update]
/// calls, then [Session::disconnect].
#[derive(Default)]
pub struct Session {
    config: Config,
    error_text: String,
    connection: Option<Connection>,
    last_fix: Option<Fix>,
    last_stop: Option<StopOutcome>,
    stats: Option<Statistics>,
}

async fn open(config: &Config) -> Result<Transport> {
    let kind = config.transport_kind()?;
    config.gpgga_spec()?;
    Transport::open(kind, &config.address).await
}

/// Transmits the startup text, if any
async fn handshake(config: &Config, transport: &mut Transport) -> Result<()> {
    if let Some(text) = &config.startup_text {
        debug!("startup: \"{}\"", text);
        transport.send(format!("{}{}", text, EOL).as_bytes()).await?;
    }
    Ok(())
}

/// Creates an unconfigured [Session]
pub fn startup() -> Session {
    Session::default()
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Extracts GNSS tokens from `args` into this [Session]'s [Config].
    /// Returns the arguments left for the embedding application.
    pub fn parse_config<I, S>(&mut self, args: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match parse_config(args) {
            Ok((config, remaining)) => {
                self.config = config;
                Ok(remaining)
            },
            Err(e) => Err(self.failure(e)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Human readable reason of the last failure. In injector mode,
    /// holds the transmitted sentence.
    pub fn error_text(&self) -> &str {
        &self.error_text
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// State of the acquisition worker, if connected
    pub fn worker_state(&self) -> Option<WorkerState> {
        self.connection
            .as_ref()
            .map(|connection| connection.worker.state())
    }

    /// How the last worker was stopped
    pub fn last_stop(&self) -> Option<StopOutcome> {
        self.last_stop
    }

    /// Statistics of the last cooperatively stopped worker
    pub fn stats(&self) -> Option<Statistics> {
        self.stats
    }

    fn failure(&mut self, e: Error) -> Error {
        self.error_text = e.to_string();
        e
    }

    /// Opens the configured transport, then either starts acquisition
    /// or, in injector mode, transmits one GPGGA sentence and returns
    /// [Error::OneShot].
    pub async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            self.disconnect().await;
        }

        let transport = match open(&self.config).await {
            Ok(transport) => transport,
            Err(e) => {
                error!("{}", e);
                return Err(self.failure(e));
            },
        };

        self.attach(transport).await
    }

    /// Same as [Session::connect], on an already opened [Transport]
    pub async fn attach(&mut self, mut transport: Transport) -> Result<()> {
        if self.connection.is_some() {
            self.disconnect().await;
        }

        self.error_text.clear();

        let injection = match self.config.gpgga_spec() {
            Ok(spec) => spec.map(|spec| format_gpgga(&spec.to_fix())),
            Err(e) => {
                error!("{}: {}", transport.address(), e);
                if let Err(e) = transport.close().await {
                    debug!("close: {}", e);
                }
                return Err(self.failure(e));
            },
        };

        if let Err(e) = handshake(&self.config, &mut transport).await {
            error!("{}: {}", transport.address(), e);
            if let Err(e) = transport.close().await {
                debug!("close: {}", e);
            }
            return Err(self.failure(e));
        }

        if let Some(sentence) = injection {
            let sent = transport.send(sentence.as_bytes()).await;

            if let Err(e) = transport.close().await {
                debug!("close: {}", e);
            }

            if let Err(e) = sent {
                error!("GPGGA injection: {}", e);
                return Err(self.failure(e));
            }

            info!("GPGGA sentence transmitted");

            let sentence = sentence.trim_end().to_string();
            self.error_text = sentence.clone();
            return Err(Error::OneShot { sentence });
        }

        let kind = transport.kind();
        let address = transport.address().to_string();

        let (interface, output) = transport.split();
        let (publisher, reader) = register();

        let worker = match Worker::start(interface, publisher, &self.config.worker) {
            Ok(worker) => worker,
            Err(e) => {
                error!("{}", e);
                return Err(self.failure(e));
            },
        };

        info!("{} {} connected", kind, address);

        self.last_fix = None;
        self.last_stop = None;
        self.stats = None;

        self.connection = Some(Connection {
            kind,
            address,
            output,
            worker,
            reader,
        });

        Ok(())
    }

    /// Returns the latest [Fix] if a new one was published since the
    /// previous call. Never blocks on the worker.
    pub fn update(&mut self) -> Option<Fix> {
        let fix = self.connection.as_ref()?.reader.update()?;
        self.last_fix = Some(fix);
        Some(fix)
    }

    /// Last known [Fix], kept when no new one is available
    pub fn fix(&self) -> Option<Fix> {
        self.last_fix
    }

    /// Transmits `text` (CR/LF appended) to the receiver
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let data = format!("{}{}", text, EOL);

        let result = match self.connection.as_mut() {
            Some(connection) => {
                debug!("send: \"{}\"", text);
                connection.output.send(data.as_bytes()).await
            },
            None => Err(Error::NotConnected),
        };

        result.map_err(|e| self.failure(e))
    }

    /// Stops the worker and releases the transport.
    /// No-op when not connected.
    pub async fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        let grace_period = connection.worker.grace_period();
        let outcome = connection.worker.request_stop().await;

        match outcome {
            StopOutcome::Cooperative { state, stats } => {
                debug!("worker {}: {}", state, stats);
                self.stats = Some(stats);
            },
            StopOutcome::Terminated => {
                let e = self.failure(Error::ShutdownTimeout(grace_period));
                error!("{}", e);
            },
        }

        self.last_stop = Some(outcome);

        if let Err(e) = connection.output.close().await {
            debug!("close: {}", e);
        }

        info!(
            "{} {} disconnected",
            connection.kind, connection.address
        );
    }
}
