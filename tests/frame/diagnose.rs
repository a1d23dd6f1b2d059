use crate::common::{debugger_from_file, debugger_from_str, exec, exec_json};
use crate::{assert_status, FIVE_FRAMES};
use framestalker::ui::render::{ErrorKind, Status};

/// Build a single-thread snapshot from (pc, cfa) pairs.
fn snapshot(frames: &[(u64, u64)], unwind_error: Option<&str>) -> String {
    let mut snapshot = String::from("[[stop]]\n[[stop.thread]]\npid = 300\n");
    if let Some(err) = unwind_error {
        snapshot.push_str(&format!("unwind_error = \"{err}\"\n"));
    }
    for (pc, cfa) in frames {
        snapshot.push_str(&format!(
            "[[stop.thread.frame]]\npc = \"{pc:#X}\"\ncfa = \"{cfa:#X}\"\n"
        ));
    }
    snapshot
}

#[test]
fn test_diagnose_well_formed() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    let report = assert_status!(exec(&mut debugger, "frame diagnose"), Status::Success);
    assert_eq!(report.text, "no problems found");
    assert_eq!(report.status.code(), 0);
}

#[test]
fn test_diagnose() {
    struct TestCase {
        name: &'static str,
        snapshot: String,
        expected: Vec<&'static str>,
    }

    let cases = vec![
        TestCase {
            name: "single corrupted frame base",
            snapshot: snapshot(
                &[
                    (0x100, 0x7000),
                    (0x200, 0x7100),
                    (0x300, 0x6000),
                    (0x400, 0x7300),
                    (0x500, 0x7400),
                ],
                None,
            ),
            expected: vec![
                "warning: frame #2: frame base 0x00000000006000 is not above frame base 0x00000000007100 of callee frame #1",
            ],
        },
        TestCase {
            name: "too high corrupted frame base",
            snapshot: snapshot(
                &[
                    (0x100, 0x7000),
                    (0x200, 0x7100),
                    (0x300, 0xFFFF0000),
                    (0x400, 0x7300),
                    (0x500, 0x7400),
                ],
                None,
            ),
            expected: vec![
                "warning: frame #2: frame base 0x000000FFFF0000 is not below frame base 0x00000000007300 of caller frame #3",
            ],
        },
        TestCase {
            name: "null program counter",
            snapshot: snapshot(&[(0x100, 0x7000), (0x0, 0x7100)], None),
            expected: vec!["warning: frame #1: program counter is null"],
        },
        TestCase {
            name: "truncated unwind",
            snapshot: snapshot(&[(0x100, 0x7000), (0x200, 0x7100)], Some("no CFI for 0x300")),
            expected: vec!["warning: unwind stopped after 2 frames: unwind: no CFI for 0x300"],
        },
    ];

    for tc in cases {
        let mut debugger = debugger_from_str(&tc.snapshot);
        let report = assert_status!(exec(&mut debugger, "frame diag"), Status::Diagnostic);
        assert_eq!(report.status.code(), 1, "case: {}", tc.name);
        let lines: Vec<_> = report.text.lines().collect();
        assert_eq!(lines, tc.expected, "case: {}", tc.name);
    }
}

#[test]
fn test_diagnose_json() {
    let mut debugger = debugger_from_str(&snapshot(
        &[(0x100, 0x7000), (0x200, 0x6000), (0x300, 0x7200)],
        None,
    ));

    let json = exec_json(&mut debugger, "frame diagnose");
    assert_eq!(json["status"], "diagnostic");
    assert_eq!(json["result"]["kind"], "diagnosis");
    let warnings = json["result"]["data"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "frame_base_regress");
    assert_eq!(warnings[0]["num"], 1);
}

#[test]
fn test_truncated_backtrace() {
    let mut debugger = debugger_from_str(&snapshot(
        &[(0x100, 0x7000), (0x200, 0x7100)],
        Some("corrupted stack"),
    ));

    let report = assert_status!(exec(&mut debugger, "bt"), Status::Success);
    assert_eq!(report.text.matches("frame #").count(), 2);
    assert!(report
        .text
        .ends_with("warning: unwind stopped: unwind: corrupted stack"));

    // frames behind the truncation point don't exist
    assert_status!(
        exec(&mut debugger, "frame 2"),
        Status::Error(ErrorKind::OutOfRange)
    );
}

#[test]
fn test_no_frames() {
    let mut debugger = debugger_from_str(&snapshot(&[], Some("no registers")));
    for command in ["frame", "frame 0", "up", "frame variable"] {
        let report = exec(&mut debugger, command);
        assert_eq!(
            report.status,
            Status::Error(ErrorKind::NoFrames),
            "command: {command}"
        );
        assert_eq!(report.status.code(), 3);
    }
}
