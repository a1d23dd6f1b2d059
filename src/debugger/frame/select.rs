//! Navigation over a thread frame list: relative and absolute moves and search by address.
//!
//! All functions are stateless, a selection is stored in [`FrameList`] itself.

use crate::debugger::address::RelocatedAddress;
use crate::debugger::error::Error;
use crate::debugger::frame::FrameList;
use crate::debugger::unwind::Unwinder;

/// Default maximum number of frames inspected by [`select_by_address`].
pub const DEFAULT_ADDRESS_SEARCH_LIMIT: u32 = 1024;

/// Move selection by `delta` frames (positive delta moves to outer frames).
/// Selection clamps at both stack ends.
///
/// Return new selected frame number.
pub fn select_relative(
    list: &mut FrameList,
    unwinder: &dyn Unwinder,
    delta: i64,
) -> Result<u32, Error> {
    // stack must contain at least one frame
    list.frame_at(unwinder, 0)?;

    let target = (list.selected() as i64).saturating_add(delta).max(0);
    let target = u32::try_from(target).unwrap_or(u32::MAX);
    list.unwind_to(unwinder, target)?;

    let new_index = target.min(list.count() - 1);
    list.select(unwinder, new_index)?;
    Ok(new_index)
}

/// Select frame number `index`.
pub fn select_absolute(
    list: &mut FrameList,
    unwinder: &dyn Unwinder,
    index: i64,
) -> Result<u32, Error> {
    if index < 0 {
        return Err(Error::InvalidArgument(format!(
            "frame number must be non-negative, got {index}"
        )));
    }
    let index = u32::try_from(index)
        .map_err(|_| Error::InvalidArgument(format!("frame number {index} is too large")))?;
    list.select(unwinder, index)?;
    Ok(index)
}

/// Select the innermost frame with program counter equal to `pc`.
///
/// Search unwinds new frames if necessary, but inspects no more than `limit` frames.
pub fn select_by_address(
    list: &mut FrameList,
    unwinder: &dyn Unwinder,
    pc: RelocatedAddress,
    limit: u32,
) -> Result<u32, Error> {
    // already unwound frames first
    let unwound = list
        .frames()
        .iter()
        .take(limit as usize)
        .find(|frame| frame.pc() == pc)
        .map(|frame| frame.num());
    if let Some(found) = unwound {
        list.select(unwinder, found)?;
        return Ok(found);
    }

    for index in list.count()..limit {
        let frame = match list.frame_at(unwinder, index) {
            Ok(frame) => frame,
            Err(Error::OutOfRange { .. } | Error::NoFrames) => break,
            Err(e) => return Err(e),
        };
        if frame.pc() == pc {
            list.select(unwinder, index)?;
            return Ok(index);
        }
    }

    Err(Error::NotFound(pc))
}
