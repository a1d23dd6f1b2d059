use crate::debugger::address::RelocatedAddress;
use crate::debugger::error::Error;
use crate::debugger::frame::Frame;
use nix::unistd::Pid;
use serde::Serialize;
use std::path::PathBuf;

/// Source code position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    pub file: PathBuf,
    pub line_number: u64,
}

/// Resolved mapping from a code address to its enclosing function and source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolContext {
    pub function: Option<String>,
    /// Address of the first instruction in function.
    pub fn_start: Option<RelocatedAddress>,
    pub place: Option<Place>,
}

/// Where a variable value is stored for a concrete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableLocation {
    /// Fixed address (global and static variables).
    Address(RelocatedAddress),
    /// Offset from frame base.
    FrameOffset(isize),
    /// Value held in a register.
    Register(String),
    /// Debug information has no location for a variable at this point.
    OptimizedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: String,
    pub type_name: Option<String>,
    pub location: VariableLocation,
}

/// Symbol and debug information collaborator.
///
/// All methods may block (file or network backed symbol lookup).
pub trait SymbolProvider {
    /// Return symbol context for a program counter or `None` if there is no debug information.
    fn resolve_symbol_context(&self, pc: RelocatedAddress) -> Result<Option<SymbolContext>, Error>;

    /// Return variables visible in the scope of a symbol context, in declaration order.
    ///
    /// # Arguments
    ///
    /// * `ctx`: resolved symbol context of a frame
    /// * `frame_base`: base address of a frame
    fn enumerate_variables(
        &self,
        ctx: &SymbolContext,
        frame_base: RelocatedAddress,
    ) -> Result<Vec<VariableBinding>, Error>;

    /// Read and render variable value. `None` means a value is unavailable.
    fn read_variable(
        &self,
        pid: Pid,
        frame: &Frame,
        var: &VariableBinding,
    ) -> Result<Option<String>, Error>;
}
