pub mod command;
pub mod command_handler;
pub mod config;
pub mod console;
pub mod print;
pub mod render;
