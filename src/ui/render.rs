//! Rendering of command results into a [`Report`]: a text (or JSON) representation
//! and a machine-checkable status.

use crate::debugger::Error;
use crate::ui::command::backtrace::ThreadBacktrace;
use crate::ui::command::frame::{ExecutionResult as FrameResult, FrameSummary, VariableView};
use crate::ui::command::r#continue::ExecutionResult as ContinueResult;
use crate::ui::command::thread::{ExecutionResult as ThreadResult, ThreadView};
use crate::ui::command::{CommandError, CommandResult};
use crate::ui::config::OutputFormat;
use crate::ui::print::style::{
    AddressView, ErrorView, FilePathView, FunctionNameView, ImportantView, KeywordView, TypeView,
    WarningView, UNKNOWN_PLACEHOLDER,
};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutOfRange,
    NoFrames,
    NotFound,
    InvalidArgument,
    Interrupted,
    Internal,
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::NoFrames
            | Error::NoThreadInFocus
            | Error::ThreadRunning(_)
            | Error::ProcessExit => ErrorKind::NoFrames,
            Error::NotFound(_) | Error::ThreadNotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) | Error::ThreadNumberNotFound(_) => {
                ErrorKind::InvalidArgument
            }
            Error::Interrupted(_) => ErrorKind::Interrupted,
            Error::Unwind(_)
            | Error::Symbol(_)
            | Error::IO(_)
            | Error::Snapshot(_)
            | Error::SnapshotFormat(_) => ErrorKind::Internal,
        }
    }
}

impl From<&CommandError> for ErrorKind {
    fn from(err: &CommandError) -> Self {
        match err {
            CommandError::Parsing(_) => ErrorKind::InvalidArgument,
            CommandError::Handle(e) => ErrorKind::from(e),
        }
    }
}

/// Command execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    /// Command completes, but reports problems (e.g. stack consistency warnings).
    Diagnostic,
    Error(ErrorKind),
}

impl Status {
    /// Return a numeric status code: 0 for success, non-zero otherwise.
    pub fn code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Diagnostic => 1,
            Status::Error(ErrorKind::OutOfRange) => 2,
            Status::Error(ErrorKind::NoFrames) => 3,
            Status::Error(ErrorKind::NotFound) => 4,
            Status::Error(ErrorKind::InvalidArgument) => 5,
            Status::Error(ErrorKind::Interrupted) => 6,
            Status::Error(ErrorKind::Internal) => 7,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }
}

/// Result of a single command.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: Status,
    pub text: String,
}

impl Report {
    pub fn new(status: Status, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// Build report from a command result.
    pub fn from_result<R: Render + Serialize>(
        result: CommandResult<R>,
        format: OutputFormat,
    ) -> Self {
        match result {
            Ok(value) => {
                let status = value.status();
                let text = match format {
                    OutputFormat::Text => {
                        let mut out = String::new();
                        value.render(&mut out);
                        out.trim_end().to_string()
                    }
                    OutputFormat::Json => to_json(&serde_json::json!({
                        "status": status,
                        "result": value,
                    })),
                };
                Report { status, text }
            }
            Err(e) => Self::error(&e, format),
        }
    }

    pub fn error(err: &CommandError, format: OutputFormat) -> Self {
        let status = Status::Error(ErrorKind::from(err));
        let text = match format {
            OutputFormat::Text => ErrorView::from(format!("error: {err:#}")).to_string(),
            OutputFormat::Json => to_json(&serde_json::json!({
                "status": status,
                "error": err.to_string(),
            })),
        };
        Report { status, text }
    }

    /// Plain message (help, prompts), never fails.
    pub fn message(text: impl Into<String>, format: OutputFormat) -> Self {
        let text = text.into();
        let text = match format {
            OutputFormat::Text => text,
            OutputFormat::Json => to_json(&serde_json::json!({
                "status": Status::Success,
                "message": text,
            })),
        };
        Report::new(Status::Success, text)
    }
}

fn to_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Text representation of a command result.
pub trait Render {
    fn render(&self, out: &mut String);

    fn status(&self) -> Status {
        Status::Success
    }
}

fn place_text(summary: &FrameSummary) -> String {
    match &summary.place {
        Some(place) => format!(
            "{}:{}",
            FilePathView::from(place.file.display()),
            place.line_number
        ),
        None => FilePathView::<String>::from(None).to_string(),
    }
}

/// `frame #N: <pc> in <function> at <file>:<line>`.
pub fn frame_line(summary: &FrameSummary) -> String {
    let mut line = format!(
        "frame #{}: {} in {} at {}",
        summary.num,
        AddressView::from(summary.pc),
        FunctionNameView::from(summary.function.as_deref()),
        place_text(summary),
    );
    if summary.inlined {
        line.push_str(&format!(" {}", KeywordView::from("[inlined]")));
    }
    line
}

fn render_frame_details(summary: &FrameSummary, out: &mut String) {
    _ = writeln!(out, "{}", frame_line(summary));
    _ = writeln!(
        out,
        "    frame base: {}, return address: {}",
        AddressView::from(summary.frame_base),
        AddressView::from(summary.return_addr),
    );
}

fn render_variable(var: &VariableView, out: &mut String) {
    _ = writeln!(
        out,
        "{}: {} = {}",
        KeywordView::from(var.name.as_str()),
        TypeView::from(var.type_name.as_deref()),
        var.value
    );
}

impl Render for FrameResult {
    fn render(&self, out: &mut String) {
        match self {
            FrameResult::Selected(summary) | FrameResult::Info(summary) => {
                render_frame_details(summary, out)
            }
            FrameResult::Variables { frame, variables } => {
                _ = writeln!(out, "{}", frame_line(frame));
                if variables.is_empty() {
                    _ = writeln!(out, "no variables");
                }
                variables.iter().for_each(|var| render_variable(var, out));
            }
            FrameResult::Diagnosis(warnings) => {
                if warnings.is_empty() {
                    _ = writeln!(out, "no problems found");
                }
                for warning in warnings {
                    _ = writeln!(out, "{} {warning}", WarningView::from("warning:"));
                }
            }
        }
    }

    fn status(&self) -> Status {
        match self {
            FrameResult::Diagnosis(warnings) if !warnings.is_empty() => Status::Diagnostic,
            _ => Status::Success,
        }
    }
}

impl Render for Vec<ThreadBacktrace> {
    fn render(&self, out: &mut String) {
        for bt in self {
            let header = format!("thread #{}, pid: {}", bt.thread_num, bt.pid);
            if bt.in_focus {
                _ = writeln!(out, "{}", ImportantView::from(header));
            } else {
                _ = writeln!(out, "{header}");
            }

            if bt.running {
                _ = writeln!(out, "  running");
            }
            for frame in &bt.frames {
                let marker = if frame.selected { "*" } else { " " };
                _ = writeln!(out, "{marker} {}", frame_line(frame));
            }
            if let Some(reason) = &bt.truncated {
                _ = writeln!(out, "{} unwind stopped: {reason}", WarningView::from("warning:"));
            }
            if bt.interrupted {
                _ = writeln!(
                    out,
                    "{} unwind interrupted, backtrace is incomplete",
                    WarningView::from("warning:")
                );
            }
        }
    }
}

fn render_thread(thread: &ThreadView, out: &mut String) {
    let top = match (&thread.top_frame, thread.running) {
        (_, true) => "running".to_string(),
        (Some(frame), false) => frame_line(frame),
        (None, false) => UNKNOWN_PLACEHOLDER.to_string(),
    };
    let line = format!("#{} thread id: {}, {top}", thread.number, thread.pid);
    if thread.in_focus {
        _ = writeln!(out, "{}", ImportantView::from(line));
    } else {
        _ = writeln!(out, "{line}");
    }
}

impl Render for ThreadResult {
    fn render(&self, out: &mut String) {
        match self {
            ThreadResult::List(threads) => threads.iter().for_each(|t| render_thread(t, out)),
            ThreadResult::BroughtIntoFocus(thread) => {
                _ = writeln!(out, "thread #{} brought into focus", thread.number);
                render_thread(thread, out);
            }
        }
    }
}

impl Render for ContinueResult {
    fn render(&self, out: &mut String) {
        match self {
            ContinueResult::Stopped {
                thread_num,
                pid,
                frame,
            } => {
                _ = writeln!(out, "thread #{thread_num} (pid {pid}) stopped");
                if let Some(frame) = frame {
                    _ = writeln!(out, "{}", frame_line(frame));
                }
            }
            ContinueResult::Exited => {
                _ = writeln!(out, "process exited");
            }
        }
    }
}
