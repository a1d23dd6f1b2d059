//! An interface to a debugger.
//! This is the most preferred way to use a debugger functional from UI layer.
//!
//! Contains commands and corresponding command handlers. Command is a request to debugger
//! that defines an action and a list of input arguments. Command handler validates command,
//! defines what exactly debugger must do and returns result of it.

pub mod backtrace;
pub mod r#continue;
pub mod frame;
pub mod parser;
pub mod thread;

use crate::debugger::Error;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the debugger.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Frame(frame::Command),
    PrintBacktrace(backtrace::Command),
    Thread(thread::Command),
    Continue,
    SkipInput,
    Help {
        command: Option<String>,
        reason: Option<String>,
    },
    Quit,
}
