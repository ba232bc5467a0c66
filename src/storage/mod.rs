//! Storage layer for receipt-ledger
//!
//! The ledger is a single JSON document written atomically under an
//! exclusive lock file.

pub mod file_io;
pub mod ledger;
pub mod sheet;

pub use file_io::{read_json_required, write_json_atomic, FileLock};
pub use ledger::{epoch, AppendedBlock, Ledger, SheetCollectionState, DEFAULT_SHEET_NAME};
pub use sheet::{Cell, CellValue, Row, Sheet};
