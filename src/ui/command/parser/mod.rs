use super::frame::{Direction, FrameOptions};
use super::{backtrace, frame, thread, Command, CommandError, CommandResult};
use crate::debugger::address::RelocatedAddress;

pub const FRAME_COMMAND: &str = "frame";
pub const FRAME_COMMAND_SHORT: &str = "f";
pub const UP_COMMAND: &str = "up";
pub const DOWN_COMMAND: &str = "down";
pub const BACKTRACE_COMMAND: &str = "backtrace";
pub const BACKTRACE_COMMAND_SHORT: &str = "bt";
pub const THREAD_COMMAND: &str = "thread";
pub const THREAD_COMMAND_INFO_SUBCOMMAND: &str = "info";
pub const THREAD_COMMAND_CURRENT_SUBCOMMAND: &str = "current";
pub const THREAD_COMMAND_SWITCH_SUBCOMMAND: &str = "switch";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

use chumsky::error::Rich;
use chumsky::prelude::{choice, end, just};
use chumsky::{extra, text, Boxed, IterParser, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

pub fn hex<'a>() -> impl chumsky::Parser<'a, &'a str, RelocatedAddress, Err<'a>> + Clone {
    let prefix = just("0x").or(just("0X"));
    prefix
        .ignore_then(text::digits(16).at_least(1).to_slice())
        .try_map(|s: &str, span| {
            usize::from_str_radix(s, 16)
                .map(RelocatedAddress::from)
                .map_err(|e| Rich::custom(span, format!("invalid address: {e}")))
        })
        .padded()
        .labelled("hexidecimal number")
}

pub fn signed_int<'a>() -> impl chumsky::Parser<'a, &'a str, i64, Err<'a>> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<i64>()
                .map_err(|e| Rich::custom(span, format!("invalid number: {e}")))
        })
        .padded()
        .labelled("integer")
}

/// A single argument of `frame` command.
#[derive(Debug, Clone, PartialEq)]
enum FrameArg<'a> {
    Address(RelocatedAddress),
    Int(i64),
    Count(i64),
    Name(&'a str),
    Word(&'a str),
}

/// Turn `frame` command arguments into a sub-command with options.
///
/// First word (if it's not a direction) is a sub-command name or alias. Without explicit sub-command
/// `frame` means `frame info` and `frame <options>` means `frame select <options>`.
fn frame_command(args: Vec<FrameArg<'_>>) -> Result<frame::Command, String> {
    let mut args = args.into_iter().peekable();
    let subcommand = match args.peek() {
        Some(FrameArg::Word(w)) if !is_direction(w) => {
            // aliases turn into full names, unknown names are rejected by a handler
            let name = frame::find_subcommand(w).map_or(*w, |sub| sub.name).to_string();
            args.next();
            Some(name)
        }
        _ => None,
    };

    let mut opts = FrameOptions::default();
    for arg in args {
        match arg {
            FrameArg::Address(addr) if opts.address.is_none() => opts.address = Some(addr),
            FrameArg::Word(w) if is_direction(w) && opts.direction.is_none() => {
                opts.direction = w.parse::<Direction>().ok();
            }
            // a number after a direction is a step count
            FrameArg::Int(n) if opts.direction.is_some() && opts.count.is_none() => {
                opts.count = Some(n)
            }
            FrameArg::Int(n) if opts.index.is_none() => opts.index = Some(n),
            FrameArg::Count(n) if opts.count.is_none() => opts.count = Some(n),
            FrameArg::Name(name) | FrameArg::Word(name) if opts.name.is_none() => {
                opts.name = Some(name.to_string())
            }
            other => return Err(format!("unexpected argument {other:?}")),
        }
    }

    let subcommand = subcommand.unwrap_or_else(|| {
        if opts == FrameOptions::default() {
            frame::INFO_SUBCOMMAND.to_string()
        } else {
            frame::SELECT_SUBCOMMAND.to_string()
        }
    });
    Ok(frame::Command::new(subcommand, opts))
}

fn is_direction(word: &str) -> bool {
    word == UP_COMMAND || word == DOWN_COMMAND
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| {
                let msg = e
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown command".to_string());
                CommandError::Parsing(msg)
            })
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        // keyword must be a whole word: `f` matches `f 1` but not `foo`
        let op = |sym: &'static str| {
            text::ascii::ident()
                .filter(move |word: &&str| *word == sym)
                .padded()
        };
        let op2 = |full, short| op(full).or(op(short));

        let frame_arg = choice((
            hex().map(FrameArg::Address),
            just("--count")
                .or(just("-c"))
                .padded()
                .ignore_then(signed_int())
                .map(FrameArg::Count),
            just("--name")
                .or(just("-n"))
                .padded()
                .ignore_then(text::ascii::ident().padded())
                .map(FrameArg::Name),
            signed_int().map(FrameArg::Int),
            text::ascii::ident().padded().map(FrameArg::Word),
        ));

        let frame = op2(FRAME_COMMAND, FRAME_COMMAND_SHORT)
            .ignore_then(frame_arg.repeated().collect::<Vec<_>>())
            .try_map(|args, span| {
                frame_command(args)
                    .map(Command::Frame)
                    .map_err(|e| Rich::custom(span, e))
            })
            .boxed();

        let relative = |sym: &'static str, direction: Direction| {
            op(sym)
                .ignore_then(signed_int().or_not())
                .map(move |count| {
                    Command::Frame(frame::Command::new(
                        frame::SELECT_SUBCOMMAND,
                        FrameOptions {
                            direction: Some(direction),
                            count,
                            ..Default::default()
                        },
                    ))
                })
                .boxed()
        };
        let up = relative(UP_COMMAND, Direction::Up);
        let down = relative(DOWN_COMMAND, Direction::Down);

        let backtrace = op2(BACKTRACE_COMMAND, BACKTRACE_COMMAND_SHORT)
            .ignore_then(op("all").or_not())
            .map(|all| {
                if all.is_some() {
                    Command::PrintBacktrace(backtrace::Command::All)
                } else {
                    Command::PrintBacktrace(backtrace::Command::CurrentThread)
                }
            })
            .boxed();

        let thread = op(THREAD_COMMAND)
            .ignore_then(choice((
                op(THREAD_COMMAND_INFO_SUBCOMMAND).to(Command::Thread(thread::Command::Info)),
                op(THREAD_COMMAND_CURRENT_SUBCOMMAND)
                    .to(Command::Thread(thread::Command::Current)),
                op(THREAD_COMMAND_SWITCH_SUBCOMMAND)
                    .ignore_then(text::int(10).from_str().padded())
                    .try_map(|num: Result<u32, _>, span| {
                        num.map(|num| Command::Thread(thread::Command::Switch(num)))
                            .map_err(|e| Rich::custom(span, format!("invalid thread number: {e}")))
                    }),
            )))
            .boxed();

        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);
        let quit = op2(QUIT_COMMAND, QUIT_COMMAND_SHORT).to(Command::Quit);

        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT)
            .ignore_then(text::ident().or_not())
            .map(|s| Command::Help {
                command: s.map(ToOwned::to_owned),
                reason: None,
            })
            .padded()
            .boxed();

        let skip = text::whitespace().to(Command::SkipInput);

        choice((
            command(FRAME_COMMAND, frame),
            command(UP_COMMAND, up),
            command(DOWN_COMMAND, down),
            command(BACKTRACE_COMMAND, backtrace),
            command(THREAD_COMMAND, thread),
            command(CONTINUE_COMMAND, r#continue),
            command(HELP_COMMAND, help),
            command(QUIT_COMMAND, quit),
            command("empty input", skip),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type help for list of commands")
            } else {
                e
            }
        })
    }
}
