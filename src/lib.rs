pub mod debugger;
pub mod log;
pub mod snapshot;
pub mod ui;
