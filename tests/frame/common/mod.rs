use framestalker::debugger::{Debugger, DebuggerBuilder};
use framestalker::snapshot::SnapshotTarget;
use framestalker::ui::command_handler::{CommandHandler, Outcome};
use framestalker::ui::config::OutputFormat;
use framestalker::ui::render::Report;

pub type TestDebugger = Debugger<SnapshotTarget>;

pub fn debugger_from_file(path: &str) -> TestDebugger {
    let target = SnapshotTarget::from_file(path).unwrap();
    DebuggerBuilder::new().build(target)
}

pub fn debugger_from_str(snapshot: &str) -> TestDebugger {
    let target: SnapshotTarget = snapshot.parse().unwrap();
    DebuggerBuilder::new().build(target)
}

/// Execute a command in text mode.
pub fn exec(debugger: &mut TestDebugger, line: &str) -> Report {
    exec_with_format(debugger, line, OutputFormat::Text)
}

/// Execute a command in json mode and parse the output.
pub fn exec_json(debugger: &mut TestDebugger, line: &str) -> serde_json::Value {
    let report = exec_with_format(debugger, line, OutputFormat::Json);
    serde_json::from_str(&report.text).unwrap()
}

fn exec_with_format(debugger: &mut TestDebugger, line: &str, format: OutputFormat) -> Report {
    match CommandHandler::new(debugger, format).handle_line(line) {
        Outcome::Report(report) => report,
        other => panic!("command `{line}`: unexpected outcome {other:?}"),
    }
}

/// Return number of the selected frame of the thread in focus.
pub fn selected(debugger: &mut TestDebugger) -> u32 {
    debugger.stack().unwrap().frames.selected()
}

#[macro_export]
macro_rules! assert_status {
    ($report: expr, $status: expr) => {{
        let report = $report;
        assert_eq!(report.status, $status, "report text: {}", report.text);
        report
    }};
}
