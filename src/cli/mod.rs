//! CLI command handlers
//!
//! Bridges the clap argument parsing in `main.rs` with the service layer.

pub mod export;
pub mod show;
pub mod sync;

pub use export::{handle_export_command, ExportFormat};
pub use show::handle_show_command;
pub use sync::{handle_plan_command, handle_run_command, SyncArgs};
