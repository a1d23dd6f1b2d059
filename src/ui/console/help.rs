use crate::ui::command::parser;

pub const HELP: &str = r#"
Available debugger commands:

f, frame <>|<subcommand> <options>         -- inspect or select stack frames of the thread in focus
up <count>                                 -- select caller frame (default count is 1)
down <count>                               -- select callee frame (default count is 1)
bt, backtrace <>|all                       -- print backtrace of the thread in focus or of all threads
thread info|current|switch <number>        -- show list of threads or current (in focus) thread or set thread in focus
c, continue                                -- resume target until the next stop
h, help <>|<command>                       -- show help
q, quit                                    -- exit the debugger
"#;

pub const HELP_FRAME: &str = "\
\x1b[32;1mf, frame\x1b[0m
Inspect or select stack frames of the thread in focus. Frames are numbered from the innermost one (#0).
Selection resets to frame #0 every time the target resumes.

Available subcommands:
frame                                         - same as `frame info`
frame select <number>|up [count]|down [count]|<address>
                                              - select frame by number, relatively to the selected one or by program counter
frame info [number]                           - show selected frame or frame with given number
frame variable [number] [-n|--name <name>]    - show variables of a frame, optionally filtered by name
frame diagnose                                - unwind whole stack and check it for consistency

Aliases: select - s, info - i, variable - var|v, diagnose - diag.
`frame <options>` without subcommand means `frame select <options>`.

Examples of usage:
frame 3          - select frame #3
frame up 2       - select caller of caller of the selected frame
frame 0x401a2f   - select innermost frame with given program counter
frame var -n x   - show variable `x` of the selected frame
";

pub const HELP_UP: &str = "\
\x1b[32;1mup\x1b[0m
Select caller frame, `up <count>` moves selection by count frames. Stops at the outermost frame.
";

pub const HELP_DOWN: &str = "\
\x1b[32;1mdown\x1b[0m
Select callee frame, `down <count>` moves selection by count frames. Stops at frame #0.
";

pub const HELP_BACKTRACE: &str = "\
\x1b[32;1mbt, backtrace\x1b[0m
Print backtrace of the thread in focus, selected frame marked with `*`.

Available subcommands:
backtrace all - print backtraces of all threads

Unwinding may be interrupted with Ctrl-C, in that case a partial backtrace is printed.
";

pub const HELP_THREAD: &str = "\
\x1b[32;1mthread\x1b[0m
Show threads information or set thread in focus.

Available subcomands:
thread info - print list of thread information
thread current - prints thread that has focus
thread switch <number> - set thread <number> in focus
";

pub const HELP_CONTINUE: &str = "\
\x1b[32;1mc, continue\x1b[0m
Resume target until the next stop. Frames of all threads are discarded.
";

pub const HELP_QUIT: &str = "\
\x1b[32;1mq, quit\x1b[0m
Exit the debugger.
";

/// Return help text for a command or `None` if command is unknown.
pub fn help_for_command(command: Option<&str>) -> Option<&'static str> {
    let help = match command {
        None => HELP,
        Some(parser::FRAME_COMMAND) | Some(parser::FRAME_COMMAND_SHORT) => HELP_FRAME,
        Some(parser::UP_COMMAND) => HELP_UP,
        Some(parser::DOWN_COMMAND) => HELP_DOWN,
        Some(parser::BACKTRACE_COMMAND) | Some(parser::BACKTRACE_COMMAND_SHORT) => HELP_BACKTRACE,
        Some(parser::THREAD_COMMAND) => HELP_THREAD,
        Some(parser::CONTINUE_COMMAND) | Some(parser::CONTINUE_COMMAND_SHORT) => HELP_CONTINUE,
        Some(parser::QUIT_COMMAND) | Some(parser::QUIT_COMMAND_SHORT) => HELP_QUIT,
        Some(parser::HELP_COMMAND) | Some(parser::HELP_COMMAND_SHORT) => HELP,
        _ => return None,
    };
    Some(help)
}
