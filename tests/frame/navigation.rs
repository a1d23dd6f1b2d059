use crate::common::{debugger_from_file, exec, selected};
use crate::{assert_status, FIVE_FRAMES};
use framestalker::ui::render::{ErrorKind, Status};

#[test]
fn test_select_then_continue() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);

    let report = assert_status!(exec(&mut debugger, "up 2"), Status::Success);
    assert!(report
        .text
        .starts_with("frame #2: 0x00000000000300 in process at src/process.rs:21"));

    let report = assert_status!(exec(&mut debugger, "frame info"), Status::Success);
    assert!(report.text.starts_with("frame #2:"));

    let report = assert_status!(exec(&mut debugger, "continue"), Status::Success);
    assert_eq!(
        report.text,
        "thread #1 (pid 100) stopped\nframe #0: 0x00000000000120 in leaf at src/leaf.rs:6"
    );

    // selection resets after resume
    let report = assert_status!(exec(&mut debugger, "frame info"), Status::Success);
    assert!(report
        .text
        .starts_with("frame #0: 0x00000000000120 in leaf at src/leaf.rs:6"));
    assert_eq!(selected(&mut debugger), 0);

    let report = assert_status!(exec(&mut debugger, "continue"), Status::Success);
    assert_eq!(report.text, "process exited");
    assert_status!(
        exec(&mut debugger, "frame info"),
        Status::Error(ErrorKind::NoFrames)
    );
}

#[test]
fn test_select_sequence() {
    struct TestCase {
        command: &'static str,
        expected: u32,
    }

    let cases = [
        TestCase {
            command: "frame 3",
            expected: 3,
        },
        TestCase {
            command: "down",
            expected: 2,
        },
        TestCase {
            command: "up 100",
            expected: 4,
        },
        TestCase {
            command: "down 10",
            expected: 0,
        },
        TestCase {
            command: "frame up",
            expected: 1,
        },
        TestCase {
            command: "frame select 0x300",
            expected: 2,
        },
        TestCase {
            command: "f s 0x500",
            expected: 4,
        },
        TestCase {
            command: "frame select",
            expected: 4,
        },
        TestCase {
            command: "frame select down -c 2",
            expected: 2,
        },
    ];

    let mut debugger = debugger_from_file(FIVE_FRAMES);
    for tc in cases {
        let report = exec(&mut debugger, tc.command);
        assert_eq!(
            report.status,
            Status::Success,
            "command: {}, output: {}",
            tc.command,
            report.text
        );
        assert!(
            report.text.starts_with(&format!("frame #{}:", tc.expected)),
            "command: {}, output: {}",
            tc.command,
            report.text
        );
        assert_eq!(selected(&mut debugger), tc.expected, "command: {}", tc.command);
    }
}

#[test]
fn test_select_by_address() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    for (addr, expected) in [("0x100", 0), ("0x200", 1), ("0x300", 2)] {
        assert_status!(exec(&mut debugger, &format!("frame {addr}")), Status::Success);
        assert_eq!(selected(&mut debugger), expected);
    }

    let report = assert_status!(
        exec(&mut debugger, "frame 0x999"),
        Status::Error(ErrorKind::NotFound)
    );
    assert_eq!(report.status.code(), 4);
    assert_eq!(selected(&mut debugger), 2);
}

#[test]
fn test_select_failures_keep_selection() {
    struct TestCase {
        command: &'static str,
        expected: ErrorKind,
        code: i32,
    }

    let cases = [
        TestCase {
            command: "frame 5",
            expected: ErrorKind::OutOfRange,
            code: 2,
        },
        TestCase {
            command: "frame -1",
            expected: ErrorKind::InvalidArgument,
            code: 5,
        },
        TestCase {
            command: "up 0",
            expected: ErrorKind::InvalidArgument,
            code: 5,
        },
        TestCase {
            command: "frame jump",
            expected: ErrorKind::InvalidArgument,
            code: 5,
        },
        TestCase {
            command: "frames",
            expected: ErrorKind::InvalidArgument,
            code: 5,
        },
        TestCase {
            command: "thread switch 9",
            expected: ErrorKind::InvalidArgument,
            code: 5,
        },
    ];

    let mut debugger = debugger_from_file(FIVE_FRAMES);
    assert_status!(exec(&mut debugger, "frame 1"), Status::Success);

    for tc in cases {
        let report = exec(&mut debugger, tc.command);
        assert_eq!(
            report.status,
            Status::Error(tc.expected),
            "command: {}",
            tc.command
        );
        assert_eq!(report.status.code(), tc.code, "command: {}", tc.command);
        assert!(report.text.starts_with("error: "), "command: {}", tc.command);
        assert_eq!(selected(&mut debugger), 1, "command: {}", tc.command);
    }
}

#[test]
fn test_thread_switch() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    assert_status!(exec(&mut debugger, "up"), Status::Success);

    let report = assert_status!(exec(&mut debugger, "thread switch 2"), Status::Success);
    assert!(report.text.starts_with("thread #2 brought into focus"));

    let report = assert_status!(exec(&mut debugger, "frame"), Status::Success);
    assert!(report
        .text
        .starts_with("frame #0: 0x00000000000300 in process at src/process.rs:21"));

    // every thread has its own selection
    assert_status!(exec(&mut debugger, "thread switch 1"), Status::Success);
    assert_eq!(selected(&mut debugger), 1);
}
