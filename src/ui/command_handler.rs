//! Execution of parsed commands, shared by interactive console and batch mode.

use crate::debugger::{Debugger, Target};
use crate::fstk_error;
use crate::ui::command::{
    backtrace, frame, r#continue, thread, Command, CommandError, CommandResult,
};
use crate::ui::config::OutputFormat;
use crate::ui::console::help;
use crate::ui::print;
use crate::ui::render::{ErrorKind, Render, Report, Status};
use serde::Serialize;

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Report(Report),
    /// Error after which debugging can't continue.
    Fatal(Report),
    Quit,
}

pub struct CommandHandler<'a, T: Target> {
    debugger: &'a mut Debugger<T>,
    format: OutputFormat,
}

impl<'a, T: Target> CommandHandler<'a, T> {
    pub fn new(debugger: &'a mut Debugger<T>, format: OutputFormat) -> Self {
        Self { debugger, format }
    }

    /// Parse and execute a single line of user input.
    pub fn handle_line(&mut self, input: &str) -> Outcome {
        match Command::parse(input) {
            Ok(cmd) => self.handle_command(cmd),
            Err(e) => Outcome::Report(Report::error(&e, self.format)),
        }
    }

    pub fn handle_command(&mut self, cmd: Command) -> Outcome {
        // interrupt requested while waiting for input belongs to nothing
        self.debugger.interrupt().reset();

        match cmd {
            Command::Frame(cmd) => {
                let result = self
                    .debugger
                    .stack()
                    .map_err(CommandError::from)
                    .and_then(|ctx| frame::Handler::new(ctx).handle(&cmd));
                self.report(result)
            }
            Command::PrintBacktrace(cmd) => {
                let result = backtrace::Handler::new(self.debugger).handle(cmd);
                self.report(result)
            }
            Command::Thread(cmd) => {
                let result = thread::Handler::new(self.debugger).handle(cmd);
                self.report(result)
            }
            Command::Continue => {
                let result = r#continue::Handler::new(self.debugger).handle();
                self.report(result)
            }
            Command::SkipInput => Outcome::Report(Report::new(Status::Success, "")),
            Command::Help { command, reason } => {
                let Some(text) = help::help_for_command(command.as_deref()) else {
                    let name = command.unwrap_or_default();
                    return Outcome::Report(Report::new(
                        Status::Error(ErrorKind::InvalidArgument),
                        format!("unknown command `{name}`, type help for list of commands"),
                    ));
                };
                let mut text = match reason {
                    Some(reason) => format!("{reason}\n{text}"),
                    None => text.to_string(),
                };
                if !print::is_colored() {
                    text = text.replace("\x1b[32;1m", "").replace("\x1b[0m", "");
                }
                Outcome::Report(Report::message(text.trim(), self.format))
            }
            Command::Quit => Outcome::Quit,
        }
    }

    fn report<R: Render + Serialize>(&self, result: CommandResult<R>) -> Outcome {
        let fatal = matches!(&result, Err(CommandError::Handle(e)) if e.is_fatal());
        let report = Report::from_result(result, self.format);
        if fatal {
            fstk_error!(target: "debugger", "shutdown debugger: {}", report.text);
            return Outcome::Fatal(report);
        }
        Outcome::Report(report)
    }
}
