//! Acquisition worker: turns a byte stream into published
//! [crate::fix::Fix]es.

use std::time::Duration;

use log::{debug, error, info, trace, warn};

use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

use crate::{
    error::{Error, Result},
    fix::FixPublisher,
    nmea,
    transport::{Interface, ReceiveReason, Received},
};

mod line;
mod state;
mod stats;

pub use line::{LineBuffer, LineEvent, MAX_LINE_LEN};
pub use state::{WorkerCommand, WorkerState};
pub use stats::Statistics;

/// NMEA end of sentence
pub const TERMINATOR: u8 = b'\n';

/// Worker timings and sizes
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time left to the worker to stop on request, before it is terminated
    pub grace_period: Duration,

    /// Wait for the first byte of a read, on live links
    pub read_timeout: Duration,

    /// Maximal silence between two bytes of a read, on live links
    pub dropout_timeout: Duration,

    /// Pause before each line of a captured file
    pub replay_pacing: Duration,

    /// Maximal number of bytes per read
    pub max_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            read_timeout: Duration::from_millis(100),
            dropout_timeout: Duration::from_millis(100),
            replay_pacing: Duration::from_millis(100),
            max_len: 512,
        }
    }
}

/// How a stop request concluded
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Worker reached a terminal state on its own
    Cooperative {
        state: WorkerState,
        stats: Statistics,
    },

    /// Worker was aborted (see [Worker::terminate]).
    /// Its transport should be considered unusable.
    Terminated,
}

/// Handle on a running acquisition task
#[derive(Debug)]
pub struct Worker {
    handle: JoinHandle<Statistics>,
    command: watch::Sender<WorkerCommand>,
    state: watch::Receiver<WorkerState>,
    grace_period: Duration,
}

impl Worker {
    /// Spawns the acquisition task on the current tokio runtime.
    /// Returns immediately.
    pub fn start(interface: Interface, publisher: FixPublisher, settings: &Settings) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Spawn(e.to_string()))?;

        let (command_tx, command_rx) = watch::channel(WorkerCommand::None);
        let (state_tx, state_rx) = watch::channel(WorkerState::PreStart);

        let mut acquisition = Acquisition {
            interface,
            publisher,
            settings: settings.clone(),
            command: command_rx,
            state: state_tx,
            buffer: LineBuffer::default(),
            stats: Statistics::default(),
        };

        acquisition.transition(WorkerState::Starting);

        let handle = runtime.spawn(acquisition.run());

        Ok(Self {
            handle,
            command: command_tx,
            state: state_rx,
            grace_period: settings.grace_period,
        })
    }

    /// Current [WorkerState]
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Delay granted to a stop request before termination
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Waits until the worker reaches a terminal state
    pub async fn wait_exit(&mut self) -> WorkerState {
        let state = self
            .state
            .wait_for(|state| state.is_terminal())
            .await
            .map(|state| *state);

        // sender dropped without a terminal state: task was aborted
        state.unwrap_or_else(|_| *self.state.borrow())
    }

    /// Requests a clean exit, see [Worker::request_stop_with]
    pub async fn request_stop(self) -> StopOutcome {
        self.request_stop_with(WorkerCommand::ForceExit).await
    }

    /// Sends `command` and waits up to the grace period for the task
    /// to return. Past that delay, the task is terminated.
    pub async fn request_stop_with(mut self, command: WorkerCommand) -> StopOutcome {
        self.command.send_replace(command);

        match tokio::time::timeout(self.grace_period, &mut self.handle).await {
            Ok(Ok(stats)) => StopOutcome::Cooperative {
                state: *self.state.borrow(),
                stats,
            },
            Ok(Err(e)) => {
                error!("acquisition worker failure: {}", e);
                StopOutcome::Cooperative {
                    state: WorkerState::ExitError,
                    stats: Statistics::default(),
                }
            },
            Err(_) => {
                warn!(
                    "acquisition worker did not stop within {:?}",
                    self.grace_period
                );
                self.terminate()
            },
        }
    }

    /// Aborts the acquisition task without letting it conclude.
    /// Last resort: the transport is abandoned in an unknown state.
    pub fn terminate(self) -> StopOutcome {
        warn!("terminating acquisition worker");
        self.handle.abort();
        StopOutcome::Terminated
    }
}

struct Acquisition {
    interface: Interface,
    publisher: FixPublisher,
    settings: Settings,
    command: watch::Receiver<WorkerCommand>,
    state: watch::Sender<WorkerState>,
    buffer: LineBuffer,
    stats: Statistics,
}

impl Acquisition {
    fn transition(&mut self, next: WorkerState) {
        let current = *self.state.borrow();

        if !current.can_transition_to(next) {
            error!("illegal worker transition {} -> {}", current, next);
            return;
        }

        info!("acquisition {}", next);
        self.state.send_replace(next);
    }

    async fn run(mut self) -> Statistics {
        self.transition(WorkerState::Running);

        let read_only = self.interface.is_read_only();

        let exit = loop {
            if let Some(exit) = self.command.borrow_and_update().exit_state() {
                break exit;
            }

            if read_only && !self.settings.replay_pacing.is_zero() {
                tokio::select! {
                    changed = self.command.changed() => {
                        match changed {
                            Ok(_) => continue,
                            Err(_) => break WorkerState::ExitOk,
                        }
                    },
                    _ = tokio::time::sleep(self.settings.replay_pacing) => {},
                }
            }

            let received = tokio::select! {
                changed = self.command.changed() => {
                    match changed {
                        Ok(_) => continue,
                        // handle dropped
                        Err(_) => break WorkerState::ExitOk,
                    }
                },
                received = self.interface.receive(
                    self.settings.max_len,
                    TERMINATOR,
                    self.settings.read_timeout,
                    self.settings.dropout_timeout,
                ) => received,
            };

            match received {
                Ok(Received { bytes, reason }) => {
                    self.process(&bytes);

                    if reason == ReceiveReason::EndOfInput {
                        self.buffer.clear();

                        if read_only {
                            debug!("end of capture");
                            break WorkerState::ExitOk;
                        } else {
                            warn!("link closed by peer");
                            break WorkerState::ExitWarning;
                        }
                    }
                },
                Err(e) => {
                    error!("read error: {}", e);
                    break WorkerState::ExitError;
                },
            }
        };

        self.transition(exit);
        debug!("{}", self.stats);
        self.stats
    }

    fn process(&mut self, bytes: &[u8]) {
        let publisher = &self.publisher;
        let stats = &mut self.stats;

        let events = self.buffer.push(bytes, |line| {
            stats.lines += 1;

            match nmea::decode_line(line) {
                Ok(fix) => {
                    let sequence = publisher.publish(fix);
                    stats.accepted += 1;
                    trace!("fix #{}", sequence);
                },
                Err(e) => {
                    stats.count_error(&e);
                    trace!(
                        "\"{}\": {}",
                        String::from_utf8_lossy(line).trim_end(),
                        e
                    );
                },
            }
        });

        self.stats.discarded += events
            .iter()
            .filter(|event| **event == LineEvent::Discarded)
            .count() as u64;

        self.stats.overflows = self.buffer.overflows();
    }
}
