//! Display formatting for terminal output

pub mod ledger;

pub use ledger::{format_plan, format_report, format_sheet, format_sheet_list};
