//! Deciding which remote receipts still need processing
//!
//! A remote file is worth fetching when its name date is strictly after the
//! newest date already in the ledger and its transcription is not already
//! sitting in the staging area.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::models::RemoteFileRef;

/// Extension used for staged transcriptions
pub const TEXT_EXTENSION: &str = "txt";

/// Date encoded in the leading `YYMMDD` of a file name (always 20YY)
pub fn file_date(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..6)?;
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("20{}", prefix), "%Y%m%d").ok()
}

/// Name the transcription of `name` is staged under
pub fn staged_text_name(name: &str) -> String {
    Path::new(name)
        .with_extension(TEXT_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// Compute the minimal set of files to fetch, in listing order
pub fn plan(
    remote_listing: &[RemoteFileRef],
    cutoff: NaiveDateTime,
    locally_present: &HashSet<String>,
) -> Vec<RemoteFileRef> {
    remote_listing
        .iter()
        .filter(|file| match file_date(&file.name) {
            Some(date) => date.and_time(chrono::NaiveTime::MIN) > cutoff,
            None => {
                debug!(name = %file.name, "skipping remote file without a YYMMDD prefix");
                false
            }
        })
        .filter(|file| !locally_present.contains(&staged_text_name(&file.name)))
        .cloned()
        .collect()
}
