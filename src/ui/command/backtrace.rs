use crate::debugger::{Debugger, Error, Target};
use crate::ui::command;
use crate::ui::command::frame::FrameSummary;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CurrentThread,
    All,
}

/// Backtrace of a single thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadBacktrace {
    pub thread_num: u32,
    pub pid: i32,
    pub in_focus: bool,
    pub frames: Vec<FrameSummary>,
    /// Reason of unwind abort, if stack is unwound partially.
    pub truncated: Option<String>,
    pub interrupted: bool,
    /// Thread is running, it has no frames to show.
    pub running: bool,
}

pub struct Handler<'a, T: Target> {
    dbg: &'a mut Debugger<T>,
}

impl<'a, T: Target> Handler<'a, T> {
    pub fn new(debugger: &'a mut Debugger<T>) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: Command) -> command::CommandResult<Vec<ThreadBacktrace>> {
        let in_focus = self.dbg.threads().in_focus();
        let threads: Vec<_> = match &cmd {
            Command::CurrentThread => {
                let thread = self.dbg.thread_in_focus()?;
                vec![(thread.pid, thread.number)]
            }
            Command::All => self.dbg.threads().iter().map(|t| (t.pid, t.number)).collect(),
        };

        let mut backtraces = Vec::with_capacity(threads.len());
        for (pid, thread_num) in threads {
            let ctx = match self.dbg.stack_of(pid) {
                Ok(ctx) => ctx,
                // a running thread doesn't fail a backtrace of all threads
                Err(Error::ThreadRunning(_)) if cmd == Command::All => {
                    backtraces.push(ThreadBacktrace {
                        thread_num,
                        pid: pid.as_raw(),
                        in_focus: in_focus == Some(pid),
                        frames: vec![],
                        truncated: None,
                        interrupted: false,
                        running: true,
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let interrupted = match ctx.frames.unwind_all(ctx.unwinder) {
                Ok(()) => false,
                Err(Error::Interrupted(_)) => true,
                Err(e) => return Err(e.into()),
            };

            let selected = ctx.frames.selected();
            let frames = ctx
                .frames
                .frames()
                .iter()
                .map(|frame| FrameSummary::new(frame, ctx.symbols, frame.num() == selected))
                .collect();

            backtraces.push(ThreadBacktrace {
                thread_num,
                pid: pid.as_raw(),
                in_focus: in_focus == Some(pid),
                frames,
                truncated: ctx.frames.truncated().map(ToString::to_string),
                interrupted,
                running: false,
            });
        }

        Ok(backtraces)
    }
}
