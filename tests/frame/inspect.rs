use crate::common::{debugger_from_file, exec, exec_json, selected};
use crate::{assert_status, FIVE_FRAMES};
use framestalker::ui::render::{ErrorKind, Status};
use nix::unistd::Pid;

#[test]
fn test_frame_variables() {
    struct TestCase {
        command: &'static str,
        expected: &'static [&'static str],
    }

    let cases = [
        TestCase {
            command: "frame variable",
            expected: &["x: u64 = 11", "y: u64 = <unavailable>"],
        },
        TestCase {
            command: "frame var -n y",
            expected: &["y: u64 = <unavailable>"],
        },
        TestCase {
            command: "frame v 1",
            expected: &["acc: i32 = -5"],
        },
        TestCase {
            command: "frame variable 2",
            expected: &["no variables"],
        },
        TestCase {
            command: "frame variable absent",
            expected: &["no variables"],
        },
    ];

    let mut debugger = debugger_from_file(FIVE_FRAMES);
    for tc in cases {
        let report = assert_status!(exec(&mut debugger, tc.command), Status::Success);
        // first line is a frame summary
        let lines: Vec<_> = report.text.lines().skip(1).collect();
        assert_eq!(lines, tc.expected, "command: {}", tc.command);
    }

    // inspection never moves selection
    assert_eq!(selected(&mut debugger), 0);
}

#[test]
fn test_variables_after_resume() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    assert_status!(exec(&mut debugger, "continue"), Status::Success);

    let report = assert_status!(exec(&mut debugger, "frame variable -n x"), Status::Success);
    assert_eq!(
        report.text,
        "frame #0: 0x00000000000120 in leaf at src/leaf.rs:6\nx: u64 = 12"
    );
}

#[test]
fn test_frame_info_json() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);

    let json = exec_json(&mut debugger, "frame info 1");
    assert_eq!(json["status"], "success");
    assert_eq!(json["result"]["kind"], "info");
    let data = &json["result"]["data"];
    assert_eq!(data["num"], 1);
    assert_eq!(data["pc"], "0x200");
    assert_eq!(data["frame_base"], "0x7100");
    assert_eq!(data["return_addr"], "0x300");
    assert_eq!(data["function"], "compute");
    assert_eq!(data["place"]["file"], "src/compute.rs");
    assert_eq!(data["selected"], false);

    let json = exec_json(&mut debugger, "frame info 7");
    assert_eq!(json["status"]["error"], "out_of_range");
    assert_eq!(
        json["error"],
        "frame number 7 is out of range (stack depth: 5)"
    );
}

#[test]
fn test_backtrace() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    assert_status!(exec(&mut debugger, "up"), Status::Success);

    let report = assert_status!(exec(&mut debugger, "bt"), Status::Success);
    let lines: Vec<_> = report.text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "thread #1, pid: 100",
            "  frame #0: 0x00000000000100 in leaf at src/leaf.rs:3",
            "* frame #1: 0x00000000000200 in compute at src/compute.rs:10",
            "  frame #2: 0x00000000000300 in process at src/process.rs:21",
            "  frame #3: 0x00000000000400 in run at src/run.rs:30",
            "  frame #4: 0x00000000000500 in main at src/main.rs:2",
        ]
    );

    let report = assert_status!(exec(&mut debugger, "bt all"), Status::Success);
    assert!(report.text.contains("thread #2, pid: 101"));
    assert_eq!(report.text.matches("frame #").count(), 7);
}

#[test]
fn test_backtrace_all_with_running_thread() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    debugger.on_resume(Pid::from_raw(101));

    let report = assert_status!(exec(&mut debugger, "bt all"), Status::Success);
    assert!(report.text.contains("thread #2, pid: 101\n  running"));
    assert_eq!(report.text.matches("frame #").count(), 5);

    let json = exec_json(&mut debugger, "bt all");
    assert_eq!(json["result"][1]["running"], true);
    assert_eq!(json["result"][1]["frames"].as_array().unwrap().len(), 0);
}

#[test]
fn test_thread_info() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);

    let report = assert_status!(exec(&mut debugger, "thread info"), Status::Success);
    assert_eq!(
        report.text,
        "#1 thread id: 100, frame #0: 0x00000000000100 in leaf at src/leaf.rs:3\n\
         #2 thread id: 101, frame #0: 0x00000000000300 in process at src/process.rs:21"
    );

    let json = exec_json(&mut debugger, "thread current");
    assert_eq!(json["result"]["kind"], "list");
    assert_eq!(json["result"]["data"][0]["pid"], 100);
    assert_eq!(json["result"]["data"][0]["in_focus"], true);
}

#[test]
fn test_help() {
    let mut debugger = debugger_from_file(FIVE_FRAMES);
    let report = assert_status!(exec(&mut debugger, "help frame"), Status::Success);
    assert!(report.text.starts_with("f, frame"));
    assert!(report.text.contains("frame diagnose"));

    assert_status!(
        exec(&mut debugger, "help step"),
        Status::Error(ErrorKind::InvalidArgument)
    );
}
