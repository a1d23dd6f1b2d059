use crate::debugger::{Debugger, Error, Target};
use crate::ui::command;
use crate::ui::command::frame::FrameSummary;
use crate::weak_error;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Target stops again, frames of the thread in focus are fresh.
    Stopped {
        thread_num: u32,
        pid: i32,
        frame: Option<FrameSummary>,
    },
    Exited,
}

pub struct Handler<'a, T: Target> {
    dbg: &'a mut Debugger<T>,
}

impl<'a, T: Target> Handler<'a, T> {
    pub fn new(debugger: &'a mut Debugger<T>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self) -> command::CommandResult<ExecutionResult> {
        let stop = match self.dbg.continue_execution() {
            Ok(stop) => stop,
            Err(Error::ProcessExit) => return Ok(ExecutionResult::Exited),
            Err(e) => return Err(e.into()),
        };
        if stop.stopped.is_empty() {
            return Ok(ExecutionResult::Exited);
        }

        let thread = self.dbg.thread_in_focus()?;
        let (thread_num, pid) = (thread.number, thread.pid);
        let ctx = self.dbg.stack_of(pid)?;
        let frame = weak_error!(ctx.frames.selected_frame(ctx.unwinder), "stop frame:")
            .map(|frame| FrameSummary::new(&frame, ctx.symbols, true));

        Ok(ExecutionResult::Stopped {
            thread_num,
            pid: pid.as_raw(),
            frame,
        })
    }
}
