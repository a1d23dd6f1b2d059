use crate::debugger::error::Error;
use nix::unistd::Pid;

/// Target state after an execution-control operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopEvent {
    /// Threads that are stopped now.
    pub stopped: Vec<Pid>,
    /// Threads that exit since the previous stop.
    pub exited: Vec<Pid>,
    /// Thread that causes a stop (breakpoint hit, signal, etc.), if any.
    pub focus: Option<Pid>,
}

/// Execution-control collaborator: resumes a target and waits for its next stop.
pub trait ExecutionControl {
    /// Return the state the target is currently stopped in.
    fn current_stop(&self) -> StopEvent;

    /// Resume all threads and block until the target stops again.
    ///
    /// # Errors
    ///
    /// [`Error::ProcessExit`] if the target has already exited.
    fn resume(&mut self) -> Result<StopEvent, Error>;
}
