pub mod address;
pub mod control;
pub mod error;
pub mod frame;
pub mod interrupt;
pub mod symbol;
pub mod thread;
pub mod unwind;

pub use error::Error;

use crate::debugger::control::{ExecutionControl, StopEvent};
use crate::debugger::frame::select::DEFAULT_ADDRESS_SEARCH_LIMIT;
use crate::debugger::frame::FrameList;
use crate::debugger::interrupt::Interrupt;
use crate::debugger::symbol::SymbolProvider;
use crate::debugger::thread::{FrameListOptions, Thread, ThreadRegistry};
use crate::debugger::unwind::Unwinder;
use crate::{fstk_debug, fstk_info};
use nix::unistd::Pid;

/// A debugged target: source of frames, symbols and execution control.
pub trait Target: Unwinder + SymbolProvider + ExecutionControl {}

impl<T: Unwinder + SymbolProvider + ExecutionControl> Target for T {}

/// Everything a frame command needs: frame list of a stopped thread and collaborators.
pub struct StackContext<'a> {
    pub frames: &'a mut FrameList,
    pub unwinder: &'a dyn Unwinder,
    pub symbols: &'a dyn SymbolProvider,
    /// Maximum number of frames inspected by a search by address.
    pub address_search_limit: u32,
}

impl StackContext<'_> {
    pub fn pid(&self) -> Pid {
        self.frames.pid()
    }
}

pub struct DebuggerBuilder {
    max_unwind_depth: u32,
    address_search_limit: u32,
    interrupt: Option<Interrupt>,
}

impl Default for DebuggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DebuggerBuilder {
    pub fn new() -> Self {
        Self {
            max_unwind_depth: FrameList::DEFAULT_MAX_DEPTH,
            address_search_limit: DEFAULT_ADDRESS_SEARCH_LIMIT,
            interrupt: None,
        }
    }

    /// Limit the number of frames unwound for a single thread.
    pub fn with_max_unwind_depth(self, depth: u32) -> Self {
        Self {
            max_unwind_depth: depth,
            ..self
        }
    }

    /// Limit the number of frames inspected by a frame search by address.
    pub fn with_address_search_limit(self, limit: u32) -> Self {
        Self {
            address_search_limit: limit,
            ..self
        }
    }

    /// Share interrupt flag with caller (usually with a Ctrl-C handler).
    pub fn with_interrupt(self, interrupt: Interrupt) -> Self {
        Self {
            interrupt: Some(interrupt),
            ..self
        }
    }

    /// Create debugger attached to a stopped `target`.
    pub fn build<T: Target>(self, target: T) -> Debugger<T> {
        let interrupt = self.interrupt.unwrap_or_default();
        let threads = ThreadRegistry::new(FrameListOptions {
            max_depth: self.max_unwind_depth,
            interrupt: interrupt.clone(),
        });
        let mut debugger = Debugger {
            target,
            threads,
            address_search_limit: self.address_search_limit,
            interrupt,
        };
        let stop = debugger.target.current_stop();
        debugger.apply_stop(&stop);
        debugger
    }
}

/// Main structure of a debugger. Tracks target threads and funnels execution-control events
/// into frame list invalidation.
pub struct Debugger<T: Target> {
    target: T,
    threads: ThreadRegistry,
    address_search_limit: u32,
    interrupt: Interrupt,
}

impl<T: Target> Debugger<T> {
    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    /// Return a handle of interrupt flag, checked by long-running unwinding.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Return thread in focus.
    pub fn thread_in_focus(&self) -> Result<&Thread, Error> {
        let pid = self.threads.in_focus().ok_or(Error::NoThreadInFocus)?;
        self.threads.get(pid).ok_or(Error::ThreadNotFound(pid))
    }

    /// Set thread with number `num` into focus.
    pub fn set_thread_into_focus(&mut self, num: u32) -> Result<&Thread, Error> {
        let thread = self.threads.set_in_focus_by_number(num)?;
        fstk_debug!(target: "debugger", "thread #{num} ({}) in focus", thread.pid);
        Ok(thread)
    }

    /// Return stack of the thread in focus.
    pub fn stack(&mut self) -> Result<StackContext<'_>, Error> {
        let pid = self.threads.in_focus().ok_or(Error::NoThreadInFocus)?;
        self.stack_of(pid)
    }

    /// Return stack of thread `pid`, thread must be stopped.
    pub fn stack_of(&mut self, pid: Pid) -> Result<StackContext<'_>, Error> {
        let thread = self.threads.stopped_mut(pid)?;
        Ok(StackContext {
            frames: thread.frames_mut(),
            unwinder: &self.target,
            symbols: &self.target,
            address_search_limit: self.address_search_limit,
        })
    }

    /// Thread `pid` resumes, its frames become invalid.
    pub fn on_resume(&mut self, pid: Pid) {
        self.threads.on_resume(pid);
    }

    /// Thread `pid` exits.
    pub fn on_exit(&mut self, pid: Pid) {
        self.threads.on_exit(pid);
    }

    /// Apply target stop: remove exited threads, register stopped ones and move focus.
    pub fn apply_stop(&mut self, stop: &StopEvent) {
        stop.exited.iter().for_each(|&pid| self.threads.on_exit(pid));
        stop.stopped.iter().for_each(|&pid| self.threads.on_stop(pid));
        if let Some(focus) = stop.focus {
            // focus of an unknown thread is ignored, current focus stays
            _ = self.threads.set_in_focus(focus);
        }
    }

    /// Resume all threads and wait for the next target stop.
    ///
    /// All frames of all threads are invalidated, selection of every thread resets to frame #0.
    pub fn continue_execution(&mut self) -> Result<StopEvent, Error> {
        for pid in self.threads.pids() {
            self.threads.on_resume(pid);
        }

        let stop = match self.target.resume() {
            Ok(stop) => stop,
            Err(Error::ProcessExit) => {
                self.threads.pids().into_iter().for_each(|pid| self.threads.on_exit(pid));
                return Err(Error::ProcessExit);
            }
            Err(e) => return Err(e),
        };

        self.apply_stop(&stop);
        if stop.stopped.is_empty() {
            fstk_info!(target: "debugger", "target process exited");
        } else {
            fstk_info!(
                target: "debugger",
                "target stopped, {} threads stopped, {} threads exited",
                stop.stopped.len(),
                stop.exited.len()
            );
        }
        Ok(stop)
    }
}
