use crate::debugger::error::Error;
use crate::debugger::frame::FrameList;
use crate::debugger::interrupt::Interrupt;
use crate::fstk_debug;
use indexmap::IndexMap;
use nix::unistd::Pid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThreadStatus {
    Stopped,
    Running,
}

/// Thread of a debugged process, owns frames of its current stop.
#[derive(Debug)]
pub struct Thread {
    /// Thread id.
    pub pid: Pid,
    /// Thread number, assigned in order of thread appearance.
    pub number: u32,
    pub status: ThreadStatus,
    frames: FrameList,
}

impl Thread {
    pub fn frames(&self) -> &FrameList {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameList {
        &mut self.frames
    }

    fn resume(&mut self) {
        self.frames.invalidate();
        self.status = ThreadStatus::Running;
    }
}

/// Frame list settings applied to every registered thread.
#[derive(Clone, Debug)]
pub(super) struct FrameListOptions {
    pub max_depth: u32,
    pub interrupt: Interrupt,
}

/// Registry of known threads, one of them is in focus.
#[derive(Debug)]
pub struct ThreadRegistry {
    threads: IndexMap<Pid, Thread>,
    in_focus: Option<Pid>,
    next_number: u32,
    options: FrameListOptions,
}

impl ThreadRegistry {
    pub(super) fn new(options: FrameListOptions) -> Self {
        Self {
            threads: IndexMap::new(),
            in_focus: None,
            next_number: 1,
            options,
        }
    }

    fn register(&mut self, pid: Pid) -> &mut Thread {
        let options = &self.options;
        let next_number = &mut self.next_number;
        self.threads.entry(pid).or_insert_with(|| {
            let number = *next_number;
            *next_number += 1;
            fstk_debug!(target: "debugger", "new thread #{number}, pid: {pid}");
            Thread {
                pid,
                number,
                status: ThreadStatus::Stopped,
                frames: FrameList::new(pid)
                    .with_max_depth(options.max_depth)
                    .with_interrupt(options.interrupt.clone()),
            }
        })
    }

    /// Thread stops. Frames are unwound lazily, so stop only updates a thread status.
    pub fn on_stop(&mut self, pid: Pid) {
        let thread = self.register(pid);
        thread.status = ThreadStatus::Stopped;
        if self.in_focus.is_none() {
            self.in_focus = Some(pid);
        }
    }

    /// Thread resumes (continue, step, etc.), all thread frames become invalid.
    pub fn on_resume(&mut self, pid: Pid) {
        if let Some(thread) = self.threads.get_mut(&pid) {
            thread.resume();
        }
    }

    /// Thread exits, drop it with its frames.
    pub fn on_exit(&mut self, pid: Pid) {
        if let Some(mut thread) = self.threads.shift_remove(&pid) {
            fstk_debug!(target: "debugger", "thread #{} exit, pid: {pid}", thread.number);
            thread.frames.invalidate();
        }
        if self.in_focus == Some(pid) {
            self.in_focus = self.threads.keys().next().copied();
        }
    }

    pub fn get(&self, pid: Pid) -> Option<&Thread> {
        self.threads.get(&pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Thread> {
        self.threads.get_mut(&pid)
    }

    /// Return all threads in order of appearance.
    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.threads.keys().copied().collect()
    }

    pub fn in_focus(&self) -> Option<Pid> {
        self.in_focus
    }

    /// Set thread with pid `pid` into focus.
    pub fn set_in_focus(&mut self, pid: Pid) -> Result<&Thread, Error> {
        let thread = self.threads.get(&pid).ok_or(Error::ThreadNotFound(pid))?;
        self.in_focus = Some(pid);
        Ok(thread)
    }

    /// Set thread with number `num` into focus.
    pub fn set_in_focus_by_number(&mut self, num: u32) -> Result<&Thread, Error> {
        let pid = self
            .threads
            .values()
            .find(|t| t.number == num)
            .map(|t| t.pid)
            .ok_or(Error::ThreadNumberNotFound(num))?;
        self.set_in_focus(pid)
    }

    /// Return stopped thread for frame inspection.
    pub fn stopped_mut(&mut self, pid: Pid) -> Result<&mut Thread, Error> {
        let thread = self
            .threads
            .get_mut(&pid)
            .ok_or(Error::ThreadNotFound(pid))?;
        if thread.status == ThreadStatus::Running {
            return Err(Error::ThreadRunning(pid));
        }
        Ok(thread)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::frame::stub::ChainUnwinder;

    fn registry() -> ThreadRegistry {
        ThreadRegistry::new(FrameListOptions {
            max_depth: FrameList::DEFAULT_MAX_DEPTH,
            interrupt: Interrupt::new(),
        })
    }

    #[test]
    fn test_thread_lifecycle() {
        let mut reg = registry();
        let (p1, p2) = (Pid::from_raw(10), Pid::from_raw(11));
        reg.on_stop(p1);
        reg.on_stop(p2);
        assert_eq!(reg.in_focus(), Some(p1));
        assert_eq!(reg.get(p2).unwrap().number, 2);

        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200]);
        let thread = reg.stopped_mut(p1).unwrap();
        thread.frames_mut().select(&unwinder, 1).unwrap();

        reg.on_resume(p1);
        assert!(matches!(reg.stopped_mut(p1), Err(Error::ThreadRunning(_))));
        assert_eq!(reg.get(p1).unwrap().frames().count(), 0);

        reg.on_stop(p1);
        assert_eq!(reg.stopped_mut(p1).unwrap().frames().selected(), 0);

        reg.on_exit(p1);
        assert!(reg.get(p1).is_none());
        assert_eq!(reg.in_focus(), Some(p2));

        // numbers are never reused
        reg.on_stop(Pid::from_raw(12));
        assert_eq!(reg.get(Pid::from_raw(12)).unwrap().number, 3);
    }

    #[test]
    fn test_switch_focus() {
        let mut reg = registry();
        reg.on_stop(Pid::from_raw(10));
        reg.on_stop(Pid::from_raw(11));

        let thread = reg.set_in_focus_by_number(2).unwrap();
        assert_eq!(thread.pid, Pid::from_raw(11));
        assert_eq!(reg.in_focus(), Some(Pid::from_raw(11)));
        assert!(matches!(
            reg.set_in_focus_by_number(5),
            Err(Error::ThreadNumberNotFound(5))
        ));
    }
}
