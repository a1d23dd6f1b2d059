use crate::debugger::error::Error;
use crate::debugger::frame::Frame;
use crate::debugger::interrupt::Interrupt;
use crate::debugger::unwind::{UnwindStep, Unwinder};
use crate::{fstk_debug, fstk_warn};
use nix::unistd::Pid;
use std::sync::Arc;

/// Per-thread cache of stack frames for the current thread stop.
///
/// Frames are unwound lazily, one unwinder step at a time, and only appended:
/// `frames[i].num() == i` holds for every cached frame. The list is cleared as a whole
/// by [`FrameList::invalidate`] when the thread resumes or exits.
#[derive(Debug)]
pub struct FrameList {
    pid: Pid,
    frames: Vec<Arc<Frame>>,
    unwind_complete: bool,
    selected: u32,
    /// Reason of unexpected unwind stop (unwinder error, loop in frame chain, etc.).
    truncated: Option<String>,
    max_depth: u32,
    interrupt: Interrupt,
}

impl FrameList {
    pub const DEFAULT_MAX_DEPTH: u32 = 4096;

    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            frames: vec![],
            unwind_complete: false,
            selected: 0,
            truncated: None,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            interrupt: Interrupt::new(),
        }
    }

    /// Never unwind more than `max_depth` frames.
    pub fn with_max_depth(self, max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
            ..self
        }
    }

    /// Check `interrupt` between unwind steps.
    pub fn with_interrupt(self, interrupt: Interrupt) -> Self {
        Self { interrupt, ..self }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Return number of frames unwound so far. This is a stack depth only if
    /// [`FrameList::is_complete`] is true.
    pub fn count(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Return true if the outermost frame is already unwound.
    pub fn is_complete(&self) -> bool {
        self.unwind_complete
    }

    /// Return selected frame number.
    pub fn selected(&self) -> u32 {
        self.selected
    }

    /// Return a reason of unwind abort, if unwinding stops before the outermost frame.
    pub fn truncated(&self) -> Option<&str> {
        self.truncated.as_deref()
    }

    /// Return already unwound frames.
    pub fn frames(&self) -> &[Arc<Frame>] {
        &self.frames
    }

    /// Return frame number `index`, unwind more frames if necessary.
    ///
    /// # Errors
    ///
    /// [`Error::NoFrames`] if stack has no frames at all, [`Error::OutOfRange`] if stack depth
    /// is less than `index + 1`, [`Error::Interrupted`] if user interrupts unwinding.
    pub fn frame_at(&mut self, unwinder: &dyn Unwinder, index: u32) -> Result<Arc<Frame>, Error> {
        self.unwind_to(unwinder, index)?;
        match self.frames.get(index as usize) {
            Some(frame) => Ok(Arc::clone(frame)),
            None if self.frames.is_empty() => Err(Error::NoFrames),
            None => Err(Error::OutOfRange {
                index,
                depth: self.count(),
            }),
        }
    }

    /// Set selected frame.
    pub fn select(&mut self, unwinder: &dyn Unwinder, index: u32) -> Result<Arc<Frame>, Error> {
        let frame = self.frame_at(unwinder, index)?;
        fstk_debug!(target: "frame", "thread {}: select frame #{index}", self.pid);
        self.selected = index;
        Ok(frame)
    }

    /// Return selected frame.
    pub fn selected_frame(&mut self, unwinder: &dyn Unwinder) -> Result<Arc<Frame>, Error> {
        self.frame_at(unwinder, self.selected)
    }

    /// Unwind frames until frame number `index` is available or there are no more frames.
    ///
    /// Interruption is checked between unwind steps, already unwound frames are kept.
    pub fn unwind_to(&mut self, unwinder: &dyn Unwinder, index: u32) -> Result<(), Error> {
        while !self.unwind_complete && self.frames.len() <= index as usize {
            if self.interrupt.take() {
                fstk_warn!(
                    target: "frame",
                    "thread {}: unwind interrupted at frame #{}", self.pid, self.count()
                );
                return Err(Error::Interrupted(self.count()));
            }
            self.step(unwinder);
        }
        Ok(())
    }

    /// Unwind whole stack (bounded by a max depth).
    pub fn unwind_all(&mut self, unwinder: &dyn Unwinder) -> Result<(), Error> {
        self.unwind_to(unwinder, u32::MAX)
    }

    fn step(&mut self, unwinder: &dyn Unwinder) {
        let num = self.count();
        let step = unwinder.next_frame(self.pid, self.frames.last().map(Arc::as_ref));
        match step {
            // stack is truncated only if there is a frame after the last allowed one
            Ok(UnwindStep::Frame(_)) if num >= self.max_depth => {
                self.finish(Some(format!("too deep stack, stop at {num} frames")));
            }
            Ok(UnwindStep::Frame(raw)) => {
                if let Some(prev) = self.frames.last() {
                    if prev.pc() == raw.pc && prev.frame_base() == raw.frame_base {
                        self.finish(Some(format!(
                            "frame #{num} repeats frame #{}, stack may be corrupted",
                            num - 1
                        )));
                        return;
                    }
                }
                fstk_debug!(
                    target: "frame",
                    "thread {}: unwind frame #{num}, pc: {}, frame base: {}",
                    self.pid, raw.pc, raw.frame_base
                );
                self.frames.push(Arc::new(Frame::new(num, raw)));
            }
            Ok(UnwindStep::End) => self.finish(None),
            Err(e) => {
                fstk_warn!(target: "frame", "thread {}: unwind frame #{num}: {e:#}", self.pid);
                self.finish(Some(e.to_string()))
            }
        }
    }

    fn finish(&mut self, truncated: Option<String>) {
        fstk_debug!(
            target: "frame",
            "thread {}: unwind complete, {} frames", self.pid, self.count()
        );
        self.unwind_complete = true;
        self.truncated = truncated;
    }

    /// Drop all frames and reset selection to the innermost frame.
    ///
    /// Must be called when thread resumes, steps or exits.
    pub fn invalidate(&mut self) {
        fstk_debug!(
            target: "frame",
            "thread {}: invalidate {} frames", self.pid, self.count()
        );
        self.frames.drain(..).for_each(|frame| frame.invalidate());
        self.unwind_complete = false;
        self.selected = 0;
        self.truncated = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::frame::stub::{raw, ChainUnwinder};

    fn pid() -> Pid {
        Pid::from_raw(1000)
    }

    #[test]
    fn test_frame_identity() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300, 0x400]);
        let mut list = FrameList::new(pid());

        // out of order access
        for i in [2, 0, 3, 1] {
            let frame = list.frame_at(&unwinder, i).unwrap();
            assert_eq!(frame.num(), i);
        }
        for (i, frame) in list.frames().iter().enumerate() {
            assert_eq!(frame.num(), i as u32);
        }
    }

    #[test]
    fn test_lazy_unwind() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300, 0x400, 0x500]);
        let mut list = FrameList::new(pid());

        list.frame_at(&unwinder, 0).unwrap();
        assert_eq!(list.count(), 1);
        assert_eq!(unwinder.steps.get(), 1);
        assert!(!list.is_complete());

        list.frame_at(&unwinder, 0).unwrap();
        assert_eq!(unwinder.steps.get(), 1);

        list.frame_at(&unwinder, 2).unwrap();
        assert_eq!(list.count(), 3);
        assert_eq!(unwinder.steps.get(), 3);
    }

    #[test]
    fn test_out_of_range() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(pid());

        let err = list.frame_at(&unwinder, 3).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { index: 3, depth: 3 }));
        assert!(list.is_complete());
        assert_eq!(list.count(), 3);
        assert!(list.truncated().is_none());

        // no more unwinder calls after completion
        let steps = unwinder.steps.get();
        assert!(list.frame_at(&unwinder, 10).is_err());
        assert_eq!(unwinder.steps.get(), steps);
    }

    #[test]
    fn test_empty_stack() {
        let mut unwinder = ChainUnwinder::new(vec![]);
        unwinder.fail_at_end = Some("no unwind info for pc");
        let mut list = FrameList::new(pid());

        assert!(matches!(list.frame_at(&unwinder, 0), Err(Error::NoFrames)));
        assert!(matches!(list.select(&unwinder, 0), Err(Error::NoFrames)));
        assert!(list.is_complete());
    }

    #[test]
    fn test_unwinder_error_truncates_stack() {
        let mut unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200]);
        unwinder.fail_at_end = Some("bad cfa rule");
        let mut list = FrameList::new(pid());

        list.unwind_all(&unwinder).unwrap();
        assert_eq!(list.count(), 2);
        assert!(list.is_complete());
        assert_eq!(list.truncated(), Some("unwind: bad cfa rule"));
        assert!(matches!(
            list.frame_at(&unwinder, 2),
            Err(Error::OutOfRange { index: 2, depth: 2 })
        ));
    }

    #[test]
    fn test_loop_in_frame_chain() {
        let unwinder = ChainUnwinder::new(vec![
            raw(0x100, 0x7000),
            raw(0x200, 0x7100),
            raw(0x200, 0x7100),
            raw(0x300, 0x7200),
        ]);
        let mut list = FrameList::new(pid());

        list.unwind_all(&unwinder).unwrap();
        assert_eq!(list.count(), 2);
        assert!(list.truncated().is_some());
    }

    #[test]
    fn test_max_depth() {
        let pcs: Vec<usize> = (1..=100).map(|i| i * 0x10).collect();
        let unwinder = ChainUnwinder::with_pcs(&pcs);
        let mut list = FrameList::new(pid()).with_max_depth(10);

        list.unwind_all(&unwinder).unwrap();
        assert_eq!(list.count(), 10);
        assert!(list.is_complete());
        assert!(list.truncated().is_some());
    }

    #[test]
    fn test_stack_as_deep_as_max_depth() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(pid()).with_max_depth(3);

        list.unwind_all(&unwinder).unwrap();
        assert_eq!(list.count(), 3);
        assert!(list.is_complete());
        assert!(list.truncated().is_none());
    }

    #[test]
    fn test_invalidate() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(pid());

        list.select(&unwinder, 2).unwrap();
        let held = list.frame_at(&unwinder, 1).unwrap();
        list.unwind_all(&unwinder).unwrap();
        assert_eq!(list.selected(), 2);
        assert!(held.is_valid());

        list.invalidate();
        assert!(!held.is_valid());
        assert_eq!(list.count(), 0);
        assert_eq!(list.selected(), 0);
        assert!(!list.is_complete());

        // behaves as a fresh list
        let new_stack = ChainUnwinder::with_pcs(&[0x900]);
        let frame = list.selected_frame(&new_stack).unwrap();
        assert_eq!(frame.num(), 0);
        assert_eq!(usize::from(frame.pc()), 0x900);
        assert!(matches!(
            list.select(&new_stack, 1),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_failed_select_keeps_selection() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(pid());

        list.select(&unwinder, 1).unwrap();
        assert!(list.select(&unwinder, 5).is_err());
        assert_eq!(list.selected(), 1);
    }

    #[test]
    fn test_interrupt_keeps_partial_progress() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300, 0x400]);
        let interrupt = Interrupt::new();
        let mut list = FrameList::new(pid()).with_interrupt(interrupt.clone());
        list.frame_at(&unwinder, 1).unwrap();

        interrupt.interrupt();
        let err = list.frame_at(&unwinder, 3).unwrap_err();
        assert!(matches!(err, Error::Interrupted(2)));
        assert_eq!(list.count(), 2);

        // interruption is consumed, next request continues from frame #2
        let frame = list.frame_at(&unwinder, 3).unwrap();
        assert_eq!(frame.num(), 3);
        assert_eq!(unwinder.steps.get(), 4);
    }
}
