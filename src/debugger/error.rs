use crate::debugger::address::RelocatedAddress;
use nix::unistd::Pid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- navigation errors -----------------------------------------
    #[error("frame number {index} is out of range (stack depth: {depth})")]
    OutOfRange { index: u32, depth: u32 },
    #[error("thread has no unwindable frames")]
    NoFrames,
    #[error("no frame with program counter {0} found")]
    NotFound(RelocatedAddress),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unwind interrupted by user, {0} frames are unwound")]
    Interrupted(u32),

    // --------------------------------- debugger entity not found----------------------------------
    #[error("thread {0} not found")]
    ThreadNotFound(Pid),
    #[error("thread number {0} not found")]
    ThreadNumberNotFound(u32),
    #[error("no thread in focus")]
    NoThreadInFocus,
    #[error("thread {0} is running, stop it to inspect frames")]
    ThreadRunning(Pid),

    // --------------------------------- collaborator errors ---------------------------------------
    #[error("unwind: {0}")]
    Unwind(String),
    #[error("symbol lookup: {0}")]
    Symbol(String),

    // --------------------------------- scripted target errors ------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("snapshot parsing error: {0}")]
    Snapshot(#[from] toml::de::Error),
    #[error("malformed snapshot: {0}")]
    SnapshotFormat(String),
    #[error("target process exited")]
    ProcessExit,
}

impl Error {
    /// Return a hint to an interface - continue debugging after error or stop whole process.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::OutOfRange { .. } => false,
            Error::NoFrames => false,
            Error::NotFound(_) => false,
            Error::InvalidArgument(_) => false,
            Error::Interrupted(_) => false,
            Error::ThreadNotFound(_) => false,
            Error::ThreadNumberNotFound(_) => false,
            Error::NoThreadInFocus => false,
            Error::ThreadRunning(_) => false,
            Error::Unwind(_) => false,
            Error::Symbol(_) => false,
            Error::ProcessExit => false,

            // a target that can't be loaded leaves nothing to debug
            Error::IO(_) => true,
            Error::Snapshot(_) => true,
            Error::SnapshotFormat(_) => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!($crate::fstk_warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!($crate::fstk_warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!($crate::fstk_debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!($crate::fstk_debug, $res, $msg)
    };
}
