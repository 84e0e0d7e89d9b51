//! `gps`: prints GNSS position fixes acquired from an NMEA 0183 receiver.

use std::process::ExitCode;

use env_logger::{Builder, Target};

use log::{error, info};

use tokio::time::{Instant, MissedTickBehavior};

use gnss::{Error, Session, fix::Fix, worker::WorkerState};

mod cli;

use cli::Cli;

fn list_ports() -> ExitCode {
    match serialport::available_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                info!("no serial port found");
            }
            for port in ports {
                println!("{} ({:?})", port.port_name, port.port_type);
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("failed to enumerate serial ports: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn print_fix(fix: &Fix, json: bool) {
    if json {
        match serde_json::to_string(fix) {
            Ok(content) => println!("{}", content),
            Err(e) => error!("fix serialization: {}", e),
        }
    } else {
        println!("{}", fix);
    }
}

/// Polls the session until interrupted, or done
async fn acquire(session: &mut Session, cli: &Cli) -> ExitCode {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticker = tokio::time::interval(cli.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let json = cli.json();
    let count = cli.count();
    let timeout = cli.timeout();

    let mut fixes = 0;
    let mut last_fix = Instant::now();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                return ExitCode::SUCCESS;
            },
            _ = ticker.tick() => {},
        }

        // sampled first: fixes published before exit are still delivered
        let state = session.worker_state();

        if let Some(fix) = session.update() {
            print_fix(&fix, json);

            fixes += 1;
            last_fix = Instant::now();

            if count == Some(fixes) {
                return ExitCode::SUCCESS;
            }
        } else if let Some(timeout) = timeout {
            if last_fix.elapsed() > timeout {
                error!("no fix received within {:?}", timeout);
                return ExitCode::FAILURE;
            }
        }

        match state {
            Some(WorkerState::ExitOk) => {
                info!("acquisition completed");
                return ExitCode::SUCCESS;
            },
            Some(state) if state.is_terminal() => {
                error!("acquisition aborted: {}", state);
                return ExitCode::FAILURE;
            },
            Some(_) => {},
            None => return ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let mut builder = Builder::from_default_env();

    builder
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let mut session = gnss::startup();

    let remaining = match session.parse_config(std::env::args().skip(1)) {
        Ok(remaining) => remaining,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    // GNSS tokens apart, regular options
    let cli = Cli::new(remaining);

    if cli.list_ports() {
        return list_ports();
    }

    if session.config().transport.is_none() {
        error!("no GNSS source specified");
        if let Err(e) = Cli::command().print_help() {
            error!("{}", e);
        }
        return ExitCode::FAILURE;
    }

    match session.connect().await {
        Ok(()) => {},
        Err(Error::OneShot { sentence }) => {
            println!("{}", sentence);
            return ExitCode::SUCCESS;
        },
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        },
    }

    let code = acquire(&mut session, &cli).await;

    session.disconnect().await;

    if let Some(stats) = session.stats() {
        info!("{}", stats);
    }

    code
}
