//! Scripted target: a stopped process described by a TOML document.
//!
//! Snapshot declares functions (address ranges, line tables and variables) and a sequence
//! of stops. Each stop lists threads with their raw frame chains, register and memory values.
//! Resuming a snapshot target moves it to the next stop, after the last stop all threads exit.
//!
//! ```toml
//! [[function]]
//! name = "main"
//! low_pc = "0x401000"
//! high_pc = "0x401100"
//! file = "src/main.rs"
//! line = 3
//! lines = [{ addr = "0x401010", line = 5 }]
//!
//! [[function.variable]]
//! name = "counter"
//! type = "u32"
//! offset = -8
//!
//! [[stop]]
//! focus = 100
//!
//! [[stop.thread]]
//! pid = 100
//!
//! [[stop.thread.frame]]
//! pc = "0x401012"
//! cfa = "0x7FFE0100"
//!
//! [stop.memory]
//! "0x7FFE00F8" = "42"
//! ```

use crate::debugger::address::RelocatedAddress;
use crate::debugger::control::{ExecutionControl, StopEvent};
use crate::debugger::error::Error;
use crate::debugger::frame::Frame;
use crate::debugger::symbol::{
    Place, SymbolContext, SymbolProvider, VariableBinding, VariableLocation,
};
use crate::debugger::unwind::{RawFrame, UnwindStep, Unwinder};
use crate::fstk_debug;
use indexmap::IndexMap;
use itertools::Itertools;
use nix::unistd::Pid;
use serde::Deserialize;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDecl {
    #[serde(default, rename = "function")]
    functions: Vec<FunctionDecl>,
    #[serde(default, rename = "stop")]
    stops: Vec<StopDecl>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionDecl {
    name: String,
    low_pc: RelocatedAddress,
    high_pc: RelocatedAddress,
    file: Option<PathBuf>,
    line: Option<u64>,
    #[serde(default)]
    lines: Vec<LineDecl>,
    #[serde(default, rename = "variable")]
    variables: Vec<VariableDecl>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LineDecl {
    addr: RelocatedAddress,
    line: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VariableDecl {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
    offset: Option<isize>,
    register: Option<String>,
    address: Option<RelocatedAddress>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StopDecl {
    focus: Option<i32>,
    #[serde(default, rename = "thread")]
    threads: Vec<ThreadDecl>,
    #[serde(default)]
    memory: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ThreadDecl {
    pid: i32,
    unwind_error: Option<String>,
    #[serde(default, rename = "frame")]
    frames: Vec<FrameDecl>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameDecl {
    pc: RelocatedAddress,
    cfa: RelocatedAddress,
    return_addr: Option<RelocatedAddress>,
    #[serde(default)]
    inlined: bool,
    #[serde(default)]
    registers: BTreeMap<String, String>,
}

struct Function {
    name: String,
    low_pc: RelocatedAddress,
    high_pc: RelocatedAddress,
    file: Option<PathBuf>,
    line: Option<u64>,
    /// Sorted by address.
    lines: Vec<(RelocatedAddress, u64)>,
    variables: Vec<VariableBinding>,
}

impl Function {
    fn contains(&self, pc: RelocatedAddress) -> bool {
        self.low_pc <= pc && pc < self.high_pc
    }

    fn line_for(&self, pc: RelocatedAddress) -> Option<u64> {
        self.lines
            .iter()
            .take_while(|(addr, _)| *addr <= pc)
            .last()
            .map(|(_, line)| *line)
            .or(self.line)
    }
}

struct ThreadStack {
    frames: Vec<FrameDecl>,
    unwind_error: Option<String>,
}

struct Stop {
    focus: Option<Pid>,
    threads: IndexMap<Pid, ThreadStack>,
    memory: HashMap<RelocatedAddress, String>,
}

impl Stop {
    fn pids(&self) -> Vec<Pid> {
        self.threads.keys().copied().collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Position {
    Stopped(usize),
    Exited,
}

/// Target process reconstructed from a snapshot file.
pub struct SnapshotTarget {
    functions: Vec<Function>,
    stops: Vec<Stop>,
    position: Position,
    unwind_calls: Cell<u32>,
}

fn format_err(msg: impl Into<String>) -> Error {
    Error::SnapshotFormat(msg.into())
}

impl SnapshotTarget {
    /// Load snapshot from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let target = data.parse::<SnapshotTarget>()?;
        fstk_debug!(
            target: "snapshot",
            "load snapshot {}: {} functions, {} stops",
            path.display(),
            target.functions.len(),
            target.stops.len()
        );
        Ok(target)
    }

    /// Return number of unwinder calls since snapshot creation.
    pub fn unwind_calls(&self) -> u32 {
        self.unwind_calls.get()
    }

    /// Return number of the current stop (starts from 0) or `None` if process exited.
    pub fn stop_number(&self) -> Option<usize> {
        match self.position {
            Position::Stopped(n) => Some(n),
            Position::Exited => None,
        }
    }

    fn current(&self) -> Result<&Stop, Error> {
        match self.position {
            Position::Stopped(n) => Ok(&self.stops[n]),
            Position::Exited => Err(Error::ProcessExit),
        }
    }

    fn thread(&self, pid: Pid) -> Result<&ThreadStack, Error> {
        self.current()?
            .threads
            .get(&pid)
            .ok_or(Error::ThreadNotFound(pid))
    }

    fn find_function(&self, pc: RelocatedAddress) -> Option<&Function> {
        self.functions.iter().find(|f| f.contains(pc))
    }

    fn function_by_ctx(&self, ctx: &SymbolContext) -> Option<&Function> {
        match ctx.fn_start {
            Some(start) => self.functions.iter().find(|f| f.low_pc == start),
            None => ctx
                .function
                .as_ref()
                .and_then(|name| self.functions.iter().find(|f| &f.name == name)),
        }
    }

    fn from_decl(decl: SnapshotDecl) -> Result<Self, Error> {
        if decl.stops.is_empty() {
            return Err(format_err("snapshot must declare at least one stop"));
        }

        let functions = decl
            .functions
            .into_iter()
            .map(Self::function_from_decl)
            .collect::<Result<Vec<_>, _>>()?;

        let stops = decl
            .stops
            .into_iter()
            .enumerate()
            .map(|(n, stop)| Self::stop_from_decl(n, stop))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            functions,
            stops,
            position: Position::Stopped(0),
            unwind_calls: Cell::new(0),
        })
    }

    fn function_from_decl(decl: FunctionDecl) -> Result<Function, Error> {
        if decl.low_pc >= decl.high_pc {
            return Err(format_err(format!(
                "function {}: empty address range [{}, {})",
                decl.name, decl.low_pc, decl.high_pc
            )));
        }

        let variables = decl
            .variables
            .into_iter()
            .map(|var| {
                let location = match (var.offset, var.register, var.address) {
                    (Some(offset), None, None) => VariableLocation::FrameOffset(offset),
                    (None, Some(register), None) => VariableLocation::Register(register),
                    (None, None, Some(addr)) => VariableLocation::Address(addr),
                    (None, None, None) => VariableLocation::OptimizedOut,
                    _ => {
                        return Err(format_err(format!(
                            "variable {} of function {}: more than one location",
                            var.name, decl.name
                        )))
                    }
                };
                Ok(VariableBinding {
                    name: var.name,
                    type_name: var.type_name,
                    location,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lines = decl
            .lines
            .into_iter()
            .map(|l| (l.addr, l.line))
            .sorted_by_key(|(addr, _)| *addr)
            .collect();

        Ok(Function {
            name: decl.name,
            low_pc: decl.low_pc,
            high_pc: decl.high_pc,
            file: decl.file,
            line: decl.line,
            lines,
            variables,
        })
    }

    fn stop_from_decl(num: usize, decl: StopDecl) -> Result<Stop, Error> {
        let mut threads = IndexMap::new();
        for thread in decl.threads {
            if thread.pid <= 0 {
                return Err(format_err(format!("stop #{num}: invalid pid {}", thread.pid)));
            }
            let pid = Pid::from_raw(thread.pid);
            let stack = ThreadStack {
                frames: thread.frames,
                unwind_error: thread.unwind_error,
            };
            if threads.insert(pid, stack).is_some() {
                return Err(format_err(format!("stop #{num}: duplicate thread {pid}")));
            }
        }

        let focus = decl.focus.map(Pid::from_raw);
        if let Some(focus) = focus {
            if !threads.contains_key(&focus) {
                return Err(format_err(format!(
                    "stop #{num}: focus thread {focus} is not declared"
                )));
            }
        }

        let memory = decl
            .memory
            .into_iter()
            .map(|(addr, value)| {
                let addr = RelocatedAddress::from_str(&addr)
                    .map_err(|e| format_err(format!("stop #{num}: {e}")))?;
                Ok((addr, value))
            })
            .collect::<Result<HashMap<_, _>, Error>>()?;

        Ok(Stop {
            focus,
            threads,
            memory,
        })
    }
}

impl FromStr for SnapshotTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decl: SnapshotDecl = toml::from_str(s)?;
        Self::from_decl(decl)
    }
}

impl Unwinder for SnapshotTarget {
    fn next_frame(&self, pid: Pid, current: Option<&Frame>) -> Result<UnwindStep, Error> {
        self.unwind_calls.set(self.unwind_calls.get() + 1);

        let thread = self.thread(pid)?;
        let idx = current.map(|f| f.num() as usize + 1).unwrap_or_default();
        match thread.frames.get(idx) {
            Some(decl) => Ok(UnwindStep::Frame(RawFrame {
                pc: decl.pc,
                frame_base: decl.cfa,
                return_addr: decl.return_addr,
                inlined: decl.inlined,
            })),
            None => match &thread.unwind_error {
                Some(reason) => Err(Error::Unwind(reason.clone())),
                None => Ok(UnwindStep::End),
            },
        }
    }
}

impl SymbolProvider for SnapshotTarget {
    fn resolve_symbol_context(&self, pc: RelocatedAddress) -> Result<Option<SymbolContext>, Error> {
        let Some(function) = self.find_function(pc) else {
            return Ok(None);
        };

        let place = match (&function.file, function.line_for(pc)) {
            (Some(file), Some(line_number)) => Some(Place {
                file: file.clone(),
                line_number,
            }),
            _ => None,
        };

        Ok(Some(SymbolContext {
            function: Some(function.name.clone()),
            fn_start: Some(function.low_pc),
            place,
        }))
    }

    fn enumerate_variables(
        &self,
        ctx: &SymbolContext,
        _frame_base: RelocatedAddress,
    ) -> Result<Vec<VariableBinding>, Error> {
        let function = self
            .function_by_ctx(ctx)
            .ok_or_else(|| Error::Symbol("function for symbol context not found".to_string()))?;
        Ok(function.variables.clone())
    }

    fn read_variable(
        &self,
        pid: Pid,
        frame: &Frame,
        var: &VariableBinding,
    ) -> Result<Option<String>, Error> {
        let stop = self.current()?;
        let value = match &var.location {
            VariableLocation::Address(addr) => stop.memory.get(addr).cloned(),
            VariableLocation::FrameOffset(offset) => {
                let addr = frame.frame_base().offset(*offset);
                stop.memory.get(&addr).cloned()
            }
            VariableLocation::Register(register) => self
                .thread(pid)?
                .frames
                .get(frame.num() as usize)
                .and_then(|decl| decl.registers.get(register))
                .cloned(),
            VariableLocation::OptimizedOut => None,
        };
        Ok(value)
    }
}

impl ExecutionControl for SnapshotTarget {
    fn current_stop(&self) -> StopEvent {
        match self.current() {
            Ok(stop) => StopEvent {
                stopped: stop.pids(),
                exited: vec![],
                focus: stop.focus,
            },
            Err(_) => StopEvent::default(),
        }
    }

    fn resume(&mut self) -> Result<StopEvent, Error> {
        let Position::Stopped(n) = self.position else {
            return Err(Error::ProcessExit);
        };
        let prev = self.stops[n].pids();

        let Some(next) = self.stops.get(n + 1) else {
            fstk_debug!(target: "snapshot", "resume after the last stop, process exits");
            self.position = Position::Exited;
            return Ok(StopEvent {
                stopped: vec![],
                exited: prev,
                focus: None,
            });
        };

        let stopped = next.pids();
        let exited = prev.into_iter().filter(|pid| !stopped.contains(pid)).collect();
        let focus = next.focus;
        fstk_debug!(target: "snapshot", "resume, move to stop #{}", n + 1);
        self.position = Position::Stopped(n + 1);

        Ok(StopEvent {
            stopped,
            exited,
            focus,
        })
    }
}
