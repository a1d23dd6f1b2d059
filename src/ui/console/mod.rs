//! Interactive console: a readline loop over [`CommandHandler`].
//!
//! Commands run on the same thread as the editor. While a command runs the terminal
//! is in a cooked mode, so Ctrl-C is delivered as `SIGINT` and raises the debugger interrupt flag
//! (long unwinding stops with a partial result). While the editor waits for input Ctrl-C just
//! clears the line.

use crate::debugger::{Debugger, Target};
use crate::ui::command_handler::{CommandHandler, Outcome};
use crate::ui::config::{OutputFormat, UIConfig};
use crate::ui::print;
use crate::ui::render::{Report, Status};
use crate::{fstk_debug, fstk_warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use std::sync::Once;

mod editor;
pub mod help;

const WELCOME_TEXT: &str = r#"
FrameStalker greets, type `help` for list of commands
"#;
const PROMT: &str = "(fstk) ";
const HISTORY_FILE: &str = ".fstk_history";

type FSEditor = Editor<editor::RLHelper, DefaultHistory>;

pub static LOGGER_ONCE: Once = Once::new();
static CTRLC_ONCE: Once = Once::new();

/// Initialize `env_logger` once per process.
pub fn init_logger(level: Option<log::LevelFilter>) {
    LOGGER_ONCE.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.init();
    });
}

/// Print command report, errors go to stderr.
pub fn print_report(report: &Report) {
    if report.text.is_empty() {
        return;
    }
    if matches!(report.status, Status::Success | Status::Diagnostic) {
        println!("{}", report.text);
    } else {
        eprintln!("{}", report.text);
    }
}

pub struct AppBuilder {
    config: UIConfig,
}

impl AppBuilder {
    pub fn new(config: UIConfig) -> Self {
        Self { config }
    }

    pub fn build<T: Target>(
        self,
        debugger: Debugger<T>,
    ) -> anyhow::Result<TerminalApplication<T>> {
        let editor = editor::create_editor(PROMT, print::is_colored())?;
        let history_file = self
            .config
            .save_history
            .then(home::home_dir)
            .flatten()
            .map(|home| home.join(HISTORY_FILE));

        Ok(TerminalApplication {
            debugger,
            editor,
            history_file,
            format: self.config.output,
        })
    }
}

pub struct TerminalApplication<T: Target> {
    debugger: Debugger<T>,
    editor: FSEditor,
    history_file: Option<PathBuf>,
    format: OutputFormat,
}

impl<T: Target> TerminalApplication<T> {
    pub fn run(mut self) -> anyhow::Result<()> {
        let interrupt = self.debugger.interrupt();
        let mut ctrlc_result = Ok(());
        CTRLC_ONCE.call_once(|| {
            ctrlc_result = ctrlc::set_handler(move || interrupt.interrupt());
        });
        ctrlc_result?;

        if let Some(ref path) = self.history_file {
            if path.exists() {
                if let Err(e) = self.editor.load_history(path) {
                    fstk_warn!(target: "console", "load history from {}: {e:#}", path.display());
                }
            }
        }

        println!("{WELCOME_TEXT}");

        let mut handler = CommandHandler::new(&mut self.debugger, self.format);
        loop {
            let input = match self.editor.readline(PROMT) {
                Ok(input) => input,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    break;
                }
            };
            if !input.trim().is_empty() {
                _ = self.editor.add_history_entry(input.as_str());
            }

            match handler.handle_line(&input) {
                Outcome::Report(report) => print_report(&report),
                Outcome::Fatal(report) => {
                    print_report(&report);
                    break;
                }
                Outcome::Quit => break,
            }
        }

        if let Some(ref path) = self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                fstk_warn!(target: "console", "save history into {}: {e:#}", path.display());
            }
        }
        fstk_debug!(target: "console", "console closed");
        Ok(())
    }
}

/// Execute commands one by one without an editor.
///
/// Execution stops on a fatal error or `quit` command. Return status code of the last command
/// that not succeeds, or 0.
pub fn run_batch<T: Target>(
    debugger: &mut Debugger<T>,
    commands: &[String],
    format: OutputFormat,
) -> i32 {
    let mut handler = CommandHandler::new(debugger, format);
    let mut code = 0;
    for cmd in commands {
        match handler.handle_line(cmd) {
            Outcome::Report(report) => {
                print_report(&report);
                if !report.status.is_success() {
                    code = report.status.code();
                }
            }
            Outcome::Fatal(report) => {
                print_report(&report);
                return report.status.code();
            }
            Outcome::Quit => break,
        }
    }
    code
}
