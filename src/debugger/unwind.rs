use crate::debugger::address::RelocatedAddress;
use crate::debugger::error::Error;
use crate::debugger::frame::Frame;
use nix::unistd::Pid;

/// Register-derived description of a single activation record, as produced by an unwinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFrame {
    /// Program counter (instruction pointer) of the frame.
    pub pc: RelocatedAddress,
    /// Canonical frame address. Used as a frame base: identifies frame local storage
    /// and orders frames by stack depth (stack grows down, callers have greater bases).
    pub frame_base: RelocatedAddress,
    /// Address of the instruction that control returns to when this frame exits.
    pub return_addr: Option<RelocatedAddress>,
    /// True if frame is a function inlined into its caller (and shares caller frame base).
    pub inlined: bool,
}

/// Result of a single unwind step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwindStep {
    Frame(RawFrame),
    /// Outermost frame reached, there are no more frames.
    End,
}

/// Source of stack frames for a stopped thread.
///
/// An implementation reconstructs call frames from registers and binary debug information,
/// [`crate::debugger::frame::FrameList`] calls it one step at a time.
pub trait Unwinder {
    /// Unwind a frame that calls `current` frame.
    ///
    /// # Arguments
    ///
    /// * `pid`: thread for unwinding
    /// * `current`: already unwound innermost frame, `None` requests frame 0 (current registers)
    fn next_frame(&self, pid: Pid, current: Option<&Frame>) -> Result<UnwindStep, Error>;
}
