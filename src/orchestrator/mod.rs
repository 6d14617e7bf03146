//! Application-level orchestration.
//!
//! Controllers for the run detail and workspace run list views, plus the
//! live watch loop that polls a run and executes user commands. UI and CLI
//! layers call into this module and only render what it emits.

mod controller;
mod detail;
#[cfg(test)]
mod fake;
mod list;
mod pending;

pub(crate) use controller::{run_controller, ConsoleEvent, UiCommand};
pub use detail::{LogView, RunDetail, RunDetailController};
pub use list::{RunRow, WorkspaceRunList};
