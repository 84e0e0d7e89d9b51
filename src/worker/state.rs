/// Acquisition [WorkerState] machine:
/// `PreStart → Starting → Running → {ExitOk, ExitWarning, ExitFault, ExitError}`.
///
/// Terminal states are final.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, nothing requested yet
    #[default]
    PreStart,

    /// Start requested, task scheduled
    Starting,

    /// Processing lines
    Running,

    /// Clean stop request, or end of a captured file
    ExitOk,

    /// Live link closed by the peer
    ExitWarning,

    /// Stopped on [WorkerCommand::ForceExitError]
    ExitFault,

    /// Unrecoverable transport I/O failure
    ExitError,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreStart => write!(f, "pre-start"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::ExitOk => write!(f, "exit (ok)"),
            Self::ExitWarning => write!(f, "exit (warning)"),
            Self::ExitFault => write!(f, "exit (fault)"),
            Self::ExitError => write!(f, "exit (error)"),
        }
    }
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ExitOk | Self::ExitWarning | Self::ExitFault | Self::ExitError
        )
    }

    /// True when `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::PreStart => next == Self::Starting,
            Self::Starting => next == Self::Running || next.is_terminal(),
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// Caller to worker signal
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    #[default]
    None,

    /// Stop, exiting with [WorkerState::ExitOk]
    ForceExit,

    /// Stop, exiting with [WorkerState::ExitFault]
    ForceExitError,
}

impl WorkerCommand {
    /// Terminal state this command leads to, if any
    pub fn exit_state(&self) -> Option<WorkerState> {
        match self {
            Self::None => None,
            Self::ForceExit => Some(WorkerState::ExitOk),
            Self::ForceExitError => Some(WorkerState::ExitFault),
        }
    }
}
