//! Heuristic consistency check of an unwound stack.
//!
//! Stack grows down, so a caller frame base must be strictly greater than the base of its callee.
//! A frame that breaks this rule most likely comes from a corrupted stack or from
//! unwind information that doesn't match optimized code.

use crate::debugger::address::RelocatedAddress;
use crate::debugger::error::Error;
use crate::debugger::frame::{Frame, FrameList};
use crate::debugger::unwind::Unwinder;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Frame base is not above the base of a callee frame.
    FrameBaseRegress {
        num: u32,
        frame_base: RelocatedAddress,
        callee_num: u32,
        callee_frame_base: RelocatedAddress,
    },
    /// Frame base is not below the base of a caller frame, while caller and callee
    /// of this frame are in order.
    FrameBaseAboveCaller {
        num: u32,
        frame_base: RelocatedAddress,
        caller_num: u32,
        caller_frame_base: RelocatedAddress,
    },
    NullProgramCounter {
        num: u32,
    },
    /// Unwinding stops before the outermost frame.
    Truncated {
        depth: u32,
        reason: String,
    },
    Interrupted {
        depth: u32,
    },
}

impl Warning {
    /// Return number of a frame this warning relates to.
    pub fn frame_num(&self) -> u32 {
        match self {
            Warning::FrameBaseRegress { num, .. } => *num,
            Warning::FrameBaseAboveCaller { num, .. } => *num,
            Warning::NullProgramCounter { num } => *num,
            Warning::Truncated { depth, .. } => *depth,
            Warning::Interrupted { depth } => *depth,
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::FrameBaseRegress {
                num,
                frame_base,
                callee_num,
                callee_frame_base,
            } => write!(
                f,
                "frame #{num}: frame base {frame_base} is not above frame base {callee_frame_base} of callee frame #{callee_num}"
            ),
            Warning::FrameBaseAboveCaller {
                num,
                frame_base,
                caller_num,
                caller_frame_base,
            } => write!(
                f,
                "frame #{num}: frame base {frame_base} is not below frame base {caller_frame_base} of caller frame #{caller_num}"
            ),
            Warning::NullProgramCounter { num } => {
                write!(f, "frame #{num}: program counter is null")
            }
            Warning::Truncated { depth, reason } => {
                write!(f, "unwind stopped after {depth} frames: {reason}")
            }
            Warning::Interrupted { depth } => {
                write!(f, "unwind interrupted after {depth} frames, check is incomplete")
            }
        }
    }
}

/// Unwind the whole stack and check frame bases ordering.
///
/// Never fails: problems (including interrupted unwinding) are returned as warnings.
pub fn diagnose(list: &mut FrameList, unwinder: &dyn Unwinder) -> Vec<Warning> {
    let mut warnings = vec![];

    if let Err(Error::Interrupted(depth)) = list.unwind_all(unwinder) {
        warnings.push(Warning::Interrupted { depth });
    }

    // each frame is compared with the last frame that passed the check (baseline) and with
    // its caller, so a single broken frame gives a single warning
    let frames = list.frames();
    let mut baseline: Option<&Frame> = None;
    for (i, frame) in frames.iter().map(|f| &**f).enumerate() {
        if frame.pc().is_null() {
            warnings.push(Warning::NullProgramCounter { num: frame.num() });
        }

        let Some(callee) = baseline else {
            baseline = Some(frame);
            continue;
        };

        if !in_order(callee, frame) {
            warnings.push(Warning::FrameBaseRegress {
                num: frame.num(),
                frame_base: frame.frame_base(),
                callee_num: callee.num(),
                callee_frame_base: callee.frame_base(),
            });
            continue;
        }

        // frame base is too high if the caller fits the baseline but not this frame
        if let Some(caller) = frames.get(i + 1) {
            if !in_order(frame, caller) && in_order(callee, caller) {
                warnings.push(Warning::FrameBaseAboveCaller {
                    num: frame.num(),
                    frame_base: frame.frame_base(),
                    caller_num: caller.num(),
                    caller_frame_base: caller.frame_base(),
                });
                continue;
            }
        }

        baseline = Some(frame);
    }

    if let Some(reason) = list.truncated() {
        warnings.push(Warning::Truncated {
            depth: list.count(),
            reason: reason.to_string(),
        });
    }

    warnings
}

/// Return true if `caller` frame base is above `callee` frame base.
/// An inlined function shares frame base with its caller.
fn in_order(callee: &Frame, caller: &Frame) -> bool {
    if callee.is_inlined() {
        caller.frame_base() >= callee.frame_base()
    } else {
        caller.frame_base() > callee.frame_base()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::frame::stub::{raw, ChainUnwinder};
    use crate::debugger::unwind::RawFrame;
    use nix::unistd::Pid;

    #[test]
    fn test_diagnose() {
        struct TestCase {
            name: &'static str,
            chain: Vec<RawFrame>,
            expected_frames: Vec<u32>,
        }

        let inlined = RawFrame {
            inlined: true,
            ..raw(0x150, 0x7000)
        };

        let cases = vec![
            TestCase {
                name: "well formed",
                chain: vec![raw(0x100, 0x7000), raw(0x200, 0x7100), raw(0x300, 0x7200)],
                expected_frames: vec![],
            },
            TestCase {
                name: "one corrupted frame base",
                chain: vec![
                    raw(0x100, 0x7000),
                    raw(0x200, 0x7100),
                    raw(0x300, 0x10),
                    raw(0x400, 0x7300),
                ],
                expected_frames: vec![2],
            },
            TestCase {
                name: "too high corrupted frame base",
                chain: vec![
                    raw(0x100, 0x7000),
                    raw(0x200, 0x7100),
                    raw(0x300, 0xFFFF0000),
                    raw(0x400, 0x7300),
                    raw(0x500, 0x7400),
                ],
                expected_frames: vec![2],
            },
            TestCase {
                name: "two corrupted frame bases",
                chain: vec![
                    raw(0x100, 0x7000),
                    raw(0x200, 0x10),
                    raw(0x300, 0x7200),
                    raw(0x400, 0xFFFF0000),
                    raw(0x500, 0x7400),
                ],
                expected_frames: vec![1, 3],
            },
            TestCase {
                name: "equal frame bases",
                chain: vec![raw(0x100, 0x7000), raw(0x200, 0x7000)],
                expected_frames: vec![1],
            },
            TestCase {
                name: "inlined callee shares frame base",
                chain: vec![inlined, raw(0x200, 0x7000), raw(0x300, 0x7100)],
                expected_frames: vec![],
            },
            TestCase {
                name: "null pc",
                chain: vec![raw(0x100, 0x7000), raw(0, 0x7100)],
                expected_frames: vec![1],
            },
        ];

        for tc in cases {
            let unwinder = ChainUnwinder::new(tc.chain);
            let mut list = FrameList::new(Pid::from_raw(1));
            let warnings = diagnose(&mut list, &unwinder);
            let frames: Vec<u32> = warnings.iter().map(Warning::frame_num).collect();
            assert_eq!(frames, tc.expected_frames, "case: {}", tc.name);
        }
    }

    #[test]
    fn test_too_high_frame_base_warning() {
        let unwinder = ChainUnwinder::new(vec![
            raw(0x100, 0x7000),
            raw(0x200, 0x9000),
            raw(0x300, 0x7200),
        ]);
        let mut list = FrameList::new(Pid::from_raw(1));

        let warnings = diagnose(&mut list, &unwinder);
        assert_eq!(
            warnings,
            vec![Warning::FrameBaseAboveCaller {
                num: 1,
                frame_base: RelocatedAddress::from(0x9000usize),
                caller_num: 2,
                caller_frame_base: RelocatedAddress::from(0x7200usize),
            }]
        );
        assert_eq!(
            warnings[0].to_string(),
            "frame #1: frame base 0x00000000009000 is not below frame base 0x00000000007200 of caller frame #2"
        );
    }

    #[test]
    fn test_diagnose_stack_as_deep_as_max_depth() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(Pid::from_raw(1)).with_max_depth(3);

        assert!(diagnose(&mut list, &unwinder).is_empty());
    }

    #[test]
    fn test_diagnose_truncated_stack() {
        let mut unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200]);
        unwinder.fail_at_end = Some("no fde for address");
        let mut list = FrameList::new(Pid::from_raw(1));

        let warnings = diagnose(&mut list, &unwinder);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], Warning::Truncated { depth: 2, .. }));
    }

    #[test]
    fn test_diagnose_keeps_selection() {
        let unwinder = ChainUnwinder::with_pcs(&[0x100, 0x200, 0x300]);
        let mut list = FrameList::new(Pid::from_raw(1));
        list.select(&unwinder, 1).unwrap();

        diagnose(&mut list, &unwinder);
        assert_eq!(list.selected(), 1);
        assert!(list.is_complete());
    }
}
