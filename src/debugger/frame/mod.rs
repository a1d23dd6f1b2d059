//! Stack frames of a stopped thread.
//!
//! [`Frame`] is an immutable snapshot of a single activation record. Frames are produced by an
//! [`crate::debugger::unwind::Unwinder`] and cached in a per-thread [`FrameList`], navigation over a list
//! is implemented in [`select`], stack consistency check in [`diagnose`].

pub mod diagnose;
mod list;
pub mod select;

pub use list::FrameList;

use crate::debugger::address::RelocatedAddress;
use crate::debugger::symbol::{SymbolContext, SymbolProvider};
use crate::debugger::unwind::RawFrame;
use crate::weak_error;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single stack frame (activation record) of a stopped thread.
///
/// Frame never changes after construction, except validity: when the owning thread resumes,
/// frame is invalidated and all holders of a frame can observe it with [`Frame::is_valid`].
#[derive(Debug)]
pub struct Frame {
    num: u32,
    raw: RawFrame,
    symbol: OnceCell<Option<SymbolContext>>,
    valid: AtomicBool,
}

impl Frame {
    /// Create frame with number `num` (0 is the innermost frame).
    pub fn new(num: u32, raw: RawFrame) -> Self {
        Self {
            num,
            raw,
            symbol: OnceCell::new(),
            valid: AtomicBool::new(true),
        }
    }

    #[inline(always)]
    pub fn num(&self) -> u32 {
        self.num
    }

    #[inline(always)]
    pub fn pc(&self) -> RelocatedAddress {
        self.raw.pc
    }

    #[inline(always)]
    pub fn frame_base(&self) -> RelocatedAddress {
        self.raw.frame_base
    }

    #[inline(always)]
    pub fn return_addr(&self) -> Option<RelocatedAddress> {
        self.raw.return_addr
    }

    #[inline(always)]
    pub fn is_inlined(&self) -> bool {
        self.raw.inlined
    }

    pub fn raw(&self) -> &RawFrame {
        &self.raw
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub(super) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release)
    }

    /// Return frame symbol context. Context resolved at first call and cached,
    /// `None` if there is no symbol information for frame program counter.
    pub fn symbol_context(&self, provider: &dyn SymbolProvider) -> Option<&SymbolContext> {
        self.symbol
            .get_or_init(|| {
                weak_error!(
                    provider.resolve_symbol_context(self.raw.pc),
                    "resolve symbol context:"
                )
                .flatten()
            })
            .as_ref()
    }

    /// Return already resolved symbol context, never call a symbol provider.
    pub fn resolved_symbol_context(&self) -> Option<&SymbolContext> {
        self.symbol.get().and_then(Option::as_ref)
    }
}
