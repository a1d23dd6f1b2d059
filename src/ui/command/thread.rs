use crate::debugger::thread::ThreadStatus;
use crate::debugger::{Debugger, Error, Target};
use crate::muted_error;
use crate::ui::command;
use crate::ui::command::frame::FrameSummary;
use nix::unistd::Pid;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Info,
    Current,
    Switch(u32),
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub number: u32,
    pub pid: i32,
    pub in_focus: bool,
    pub running: bool,
    /// Innermost frame, if thread is stopped and has frames.
    pub top_frame: Option<FrameSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExecutionResult {
    List(Vec<ThreadView>),
    BroughtIntoFocus(ThreadView),
}

pub struct Handler<'a, T: Target> {
    dbg: &'a mut Debugger<T>,
}

impl<'a, T: Target> Handler<'a, T> {
    pub fn new(debugger: &'a mut Debugger<T>) -> Self {
        Self { dbg: debugger }
    }

    fn view(&mut self, pid: Pid) -> Option<ThreadView> {
        let thread = self.dbg.threads().get(pid)?;
        let number = thread.number;
        let running = thread.status == ThreadStatus::Running;
        let in_focus = self.dbg.threads().in_focus() == Some(pid);

        // only the innermost frame is unwound
        let top_frame = if running {
            None
        } else {
            let ctx = muted_error!(self.dbg.stack_of(pid))?;
            let selected = ctx.frames.selected();
            muted_error!(ctx.frames.frame_at(ctx.unwinder, 0), "thread top frame:")
                .map(|frame| FrameSummary::new(&frame, ctx.symbols, selected == 0))
        };

        Some(ThreadView {
            number,
            pid: pid.as_raw(),
            in_focus,
            running,
            top_frame,
        })
    }

    pub fn handle(&mut self, cmd: Command) -> command::CommandResult<ExecutionResult> {
        match cmd {
            Command::Info => {
                let pids = self.dbg.threads().pids();
                let views = pids.into_iter().filter_map(|pid| self.view(pid)).collect();
                Ok(ExecutionResult::List(views))
            }
            Command::Current => {
                let pid = self.dbg.thread_in_focus()?.pid;
                Ok(ExecutionResult::List(self.view(pid).into_iter().collect()))
            }
            Command::Switch(num) => {
                let pid = self.dbg.set_thread_into_focus(num)?.pid;
                let view = self.view(pid).ok_or(Error::ThreadNumberNotFound(num))?;
                Ok(ExecutionResult::BroughtIntoFocus(view))
            }
        }
    }
}
