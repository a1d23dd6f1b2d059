//! `frame` command: a container of sub-commands operating on a stack of the thread in focus.
//!
//! Sub-commands are stored in a registration table ([`SUBCOMMANDS`]), each entry maps
//! a name (and aliases) to a handler function.

use crate::debugger::address::RelocatedAddress;
use crate::debugger::frame::diagnose::{self, Warning};
use crate::debugger::frame::{select, Frame};
use crate::debugger::symbol::{Place, SymbolProvider};
use crate::debugger::{Error, StackContext};
use crate::ui::command::CommandResult;
use crate::{muted_error, weak_error};
use serde::Serialize;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

pub const SELECT_SUBCOMMAND: &str = "select";
pub const INFO_SUBCOMMAND: &str = "info";
pub const VARIABLE_SUBCOMMAND: &str = "variable";
pub const DIAGNOSE_SUBCOMMAND: &str = "diagnose";

/// Value of a variable that can't be read.
pub const UNAVAILABLE: &str = "<unavailable>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// To outer (caller) frames.
    Up,
    /// To inner (callee) frames.
    Down,
}

impl Direction {
    fn delta(self, count: i64) -> i64 {
        match self {
            Direction::Up => count,
            Direction::Down => -count,
        }
    }
}

/// Parsed options of a frame sub-command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOptions {
    /// Target frame number.
    pub index: Option<i64>,
    /// Relative step magnitude.
    pub count: Option<i64>,
    /// Variable name filter.
    pub name: Option<String>,
    pub direction: Option<Direction>,
    /// Program counter of a frame to select.
    pub address: Option<RelocatedAddress>,
}

impl FrameOptions {
    fn present(&self) -> Vec<&'static str> {
        let mut present = vec![];
        if self.index.is_some() {
            present.push("index");
        }
        if self.count.is_some() {
            present.push("count");
        }
        if self.name.is_some() {
            present.push("name");
        }
        if self.direction.is_some() {
            present.push("direction");
        }
        if self.address.is_some() {
            present.push("address");
        }
        present
    }

    /// Fail if any option except `allowed` is set.
    fn allow_only(&self, subcommand: &str, allowed: &[&str]) -> Result<(), Error> {
        match self.present().into_iter().find(|opt| !allowed.contains(opt)) {
            None => Ok(()),
            Some(opt) => Err(Error::InvalidArgument(format!(
                "option `{opt}` is not supported by `frame {subcommand}`"
            ))),
        }
    }

    fn count(&self) -> Result<i64, Error> {
        match self.count {
            None => Ok(1),
            Some(count) if count <= 0 => Err(Error::InvalidArgument(format!(
                "count must be positive, got {count}"
            ))),
            Some(count) => Ok(count),
        }
    }
}

fn non_negative(index: i64) -> Result<u32, Error> {
    if index < 0 {
        return Err(Error::InvalidArgument(format!(
            "frame number must be non-negative, got {index}"
        )));
    }
    u32::try_from(index)
        .map_err(|_| Error::InvalidArgument(format!("frame number {index} is too large")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub subcommand: String,
    pub options: FrameOptions,
}

impl Command {
    pub fn new(subcommand: impl Into<String>, options: FrameOptions) -> Self {
        Self {
            subcommand: subcommand.into(),
            options,
        }
    }
}

/// Short frame description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub num: u32,
    pub pc: RelocatedAddress,
    pub frame_base: RelocatedAddress,
    pub return_addr: Option<RelocatedAddress>,
    pub function: Option<String>,
    pub place: Option<Place>,
    pub inlined: bool,
    pub selected: bool,
}

impl FrameSummary {
    pub fn new(frame: &Frame, symbols: &dyn SymbolProvider, selected: bool) -> Self {
        let ctx = frame.symbol_context(symbols);
        Self {
            num: frame.num(),
            pc: frame.pc(),
            frame_base: frame.frame_base(),
            return_addr: frame.return_addr(),
            function: ctx.and_then(|ctx| ctx.function.clone()),
            place: ctx.and_then(|ctx| ctx.place.clone()),
            inlined: frame.is_inlined(),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableView {
    pub name: String,
    pub type_name: Option<String>,
    /// Rendered value or [`UNAVAILABLE`].
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExecutionResult {
    Selected(FrameSummary),
    Info(FrameSummary),
    Variables {
        frame: FrameSummary,
        variables: Vec<VariableView>,
    },
    Diagnosis(Vec<Warning>),
}

type SubCommandHandler = fn(&mut StackContext<'_>, &FrameOptions) -> Result<ExecutionResult, Error>;

/// Registration table entry.
pub struct SubCommand {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// One-line description.
    pub help: &'static str,
    handler: SubCommandHandler,
}

pub static SUBCOMMANDS: &[SubCommand] = &[
    SubCommand {
        name: SELECT_SUBCOMMAND,
        aliases: &["s"],
        help: "select frame by number, relative to the selected one (up|down [count]) or by address",
        handler: handle_select,
    },
    SubCommand {
        name: INFO_SUBCOMMAND,
        aliases: &["i"],
        help: "show selected frame or frame with given number",
        handler: handle_info,
    },
    SubCommand {
        name: VARIABLE_SUBCOMMAND,
        aliases: &["var", "v"],
        help: "show variables of a frame, optionally filtered by name",
        handler: handle_variable,
    },
    SubCommand {
        name: DIAGNOSE_SUBCOMMAND,
        aliases: &["diag"],
        help: "unwind whole stack and check frame bases ordering",
        handler: handle_diagnose,
    },
];

/// Find sub-command by name or alias.
pub fn find_subcommand(name: &str) -> Option<&'static SubCommand> {
    SUBCOMMANDS
        .iter()
        .find(|sub| sub.name == name || sub.aliases.contains(&name))
}

fn handle_select(
    ctx: &mut StackContext<'_>,
    opts: &FrameOptions,
) -> Result<ExecutionResult, Error> {
    opts.allow_only(
        SELECT_SUBCOMMAND,
        &["index", "count", "direction", "address"],
    )?;
    let count = opts.count()?;
    if opts.count.is_some() && opts.direction.is_none() {
        return Err(Error::InvalidArgument(
            "count is allowed only with a direction (up or down)".to_string(),
        ));
    }

    let unwinder = ctx.unwinder;
    let index = match (opts.index, opts.direction, opts.address) {
        (Some(index), None, None) => select::select_absolute(ctx.frames, unwinder, index)?,
        (None, Some(direction), None) => {
            select::select_relative(ctx.frames, unwinder, direction.delta(count))?
        }
        (None, None, Some(pc)) => {
            select::select_by_address(ctx.frames, unwinder, pc, ctx.address_search_limit)?
        }
        (None, None, None) => ctx.frames.selected_frame(unwinder)?.num(),
        _ => {
            return Err(Error::InvalidArgument(
                "frame number, direction and address are mutually exclusive".to_string(),
            ))
        }
    };

    let frame = ctx.frames.frame_at(unwinder, index)?;
    Ok(ExecutionResult::Selected(FrameSummary::new(
        &frame,
        ctx.symbols,
        true,
    )))
}

/// Return frame with number from options or selected frame, selection never changes.
fn target_frame(ctx: &mut StackContext<'_>, opts: &FrameOptions) -> Result<Arc<Frame>, Error> {
    match opts.index {
        Some(index) => ctx.frames.frame_at(ctx.unwinder, non_negative(index)?),
        None => ctx.frames.selected_frame(ctx.unwinder),
    }
}

fn handle_info(
    ctx: &mut StackContext<'_>,
    opts: &FrameOptions,
) -> Result<ExecutionResult, Error> {
    opts.allow_only(INFO_SUBCOMMAND, &["index"])?;
    let frame = target_frame(ctx, opts)?;
    let selected = frame.num() == ctx.frames.selected();
    Ok(ExecutionResult::Info(FrameSummary::new(
        &frame,
        ctx.symbols,
        selected,
    )))
}

fn handle_variable(
    ctx: &mut StackContext<'_>,
    opts: &FrameOptions,
) -> Result<ExecutionResult, Error> {
    opts.allow_only(VARIABLE_SUBCOMMAND, &["index", "name"])?;
    let frame = target_frame(ctx, opts)?;
    let pid = ctx.pid();
    let symbols = ctx.symbols;

    let bindings = frame
        .symbol_context(symbols)
        .and_then(|sym| {
            weak_error!(
                symbols.enumerate_variables(sym, frame.frame_base()),
                "enumerate variables:"
            )
        })
        .unwrap_or_default();

    let variables = bindings
        .into_iter()
        .filter(|var| opts.name.as_ref().map_or(true, |name| &var.name == name))
        .map(|var| {
            let value = muted_error!(symbols.read_variable(pid, &frame, &var), "read variable:")
                .flatten()
                .unwrap_or_else(|| UNAVAILABLE.to_string());
            VariableView {
                name: var.name,
                type_name: var.type_name,
                value,
            }
        })
        .collect();

    let selected = frame.num() == ctx.frames.selected();
    Ok(ExecutionResult::Variables {
        frame: FrameSummary::new(&frame, symbols, selected),
        variables,
    })
}

fn handle_diagnose(
    ctx: &mut StackContext<'_>,
    opts: &FrameOptions,
) -> Result<ExecutionResult, Error> {
    opts.allow_only(DIAGNOSE_SUBCOMMAND, &[])?;
    let warnings = diagnose::diagnose(ctx.frames, ctx.unwinder);
    Ok(ExecutionResult::Diagnosis(warnings))
}

pub struct Handler<'a> {
    ctx: StackContext<'a>,
}

impl<'a> Handler<'a> {
    pub fn new(ctx: StackContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn handle(&mut self, cmd: &Command) -> CommandResult<ExecutionResult> {
        let sub = find_subcommand(&cmd.subcommand).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown frame subcommand `{}`", cmd.subcommand))
        })?;
        Ok((sub.handler)(&mut self.ctx, &cmd.options)?)
    }
}
