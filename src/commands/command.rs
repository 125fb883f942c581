//! Command trait definition for CLI commands.
//!
//! Every `segsort` subcommand implements [`Command`]; the subcommand enum in
//! `main.rs` dispatches to it through `enum_dispatch`.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all segsort CLI commands.
#[enum_dispatch]
pub trait Command {
    /// Run the command. `command_line` is the full invocation, for logging.
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
