//! User-facing surfaces: the CLI and the command shell.

pub mod cli;
pub mod shell;
