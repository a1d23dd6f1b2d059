use crate::ui::command::frame::SUBCOMMANDS;
use crate::ui::command::parser::{
    BACKTRACE_COMMAND, BACKTRACE_COMMAND_SHORT, CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT,
    DOWN_COMMAND, FRAME_COMMAND, FRAME_COMMAND_SHORT, HELP_COMMAND, HELP_COMMAND_SHORT,
    QUIT_COMMAND, QUIT_COMMAND_SHORT, THREAD_COMMAND, THREAD_COMMAND_CURRENT_SUBCOMMAND,
    THREAD_COMMAND_INFO_SUBCOMMAND, THREAD_COMMAND_SWITCH_SUBCOMMAND, UP_COMMAND,
};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;

struct CommandHint {
    short: Option<&'static str>,
    long: &'static str,
    subcommands: Vec<&'static str>,
}

impl CommandHint {
    fn display_with_short(&self) -> String {
        match self.short {
            Some(short) if self.long.starts_with(short) => format!(
                "{}{}",
                short.bold().underlined(),
                &self.long[short.len()..]
            ),
            Some(short) => format!("{}|{}", self.long, short.bold().underlined()),
            None => self.long.to_string(),
        }
    }
}

impl From<&'static str> for CommandHint {
    fn from(value: &'static str) -> Self {
        CommandHint {
            short: None,
            long: value,
            subcommands: vec![],
        }
    }
}

impl From<(&'static str, &'static str)> for CommandHint {
    fn from((short, long): (&'static str, &'static str)) -> Self {
        CommandHint {
            short: Some(short),
            long,
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<&'static str, Vec<&'static str>>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .filter(|cmd| !cmd.subcommands.is_empty())
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long, cmd.subcommands.clone())];
                if let Some(short) = cmd.short {
                    hints.push((short, cmd.subcommands.clone()));
                }
                hints
            })
            .collect();

        Self {
            commands,
            subcommand_hints,
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        // `<command> <subcommand part>`
        if let Some((cmd, subcmd_part)) = line.split_once(' ') {
            let subcmd_part = subcmd_part.trim_start();
            if subcmd_part.contains(' ') {
                return Ok((0, vec![]));
            }

            if let Some(subcommands) = self.subcommand_hints.get(cmd.trim()) {
                let pos = line.len() - subcmd_part.len();
                let pairs = subcommands
                    .iter()
                    .filter(|subcmd| subcmd.starts_with(subcmd_part))
                    .map(|subcmd| Pair {
                        display: subcmd.to_string(),
                        replacement: subcmd.to_string(),
                    })
                    .collect();
                return Ok((pos, pairs));
            }
            return Ok((0, vec![]));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long.to_string(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    completer: CommandCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

fn command_hints() -> Vec<CommandHint> {
    vec![
        CommandHint {
            short: Some(FRAME_COMMAND_SHORT),
            long: FRAME_COMMAND,
            subcommands: SUBCOMMANDS.iter().map(|sub| sub.name).collect(),
        },
        UP_COMMAND.into(),
        DOWN_COMMAND.into(),
        CommandHint {
            short: Some(BACKTRACE_COMMAND_SHORT),
            long: BACKTRACE_COMMAND,
            subcommands: vec!["all"],
        },
        CommandHint {
            short: None,
            long: THREAD_COMMAND,
            subcommands: vec![
                THREAD_COMMAND_INFO_SUBCOMMAND,
                THREAD_COMMAND_SWITCH_SUBCOMMAND,
                THREAD_COMMAND_CURRENT_SUBCOMMAND,
            ],
        },
        (CONTINUE_COMMAND_SHORT, CONTINUE_COMMAND).into(),
        (HELP_COMMAND_SHORT, HELP_COMMAND).into(),
        (QUIT_COMMAND_SHORT, QUIT_COMMAND).into(),
    ]
}

pub fn create_editor(
    promt: &str,
    colored: bool,
) -> anyhow::Result<Editor<RLHelper, DefaultHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let colored_prompt = if colored {
        format!("{}", promt.with(Color::DarkGreen))
    } else {
        promt.to_string()
    };

    let h = RLHelper {
        completer: CommandCompleter::new(command_hints()),
        hinter: HistoryHinter {},
        colored_prompt,
    };

    let mut editor = Editor::with_history(config, DefaultHistory::new())?;
    editor.set_helper(Some(h));
    Ok(editor)
}
