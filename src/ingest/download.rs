//! Chunked, resumable download with per-chunk retries

use tracing::{debug, warn};

use super::remote::RemoteStore;
use crate::error::ReceiptResult;
use crate::models::{RawDocument, RemoteFileRef};

/// Download `file` completely
///
/// A failed chunk is requested again from the same offset up to
/// `max_retries` times; bytes already received are kept. The error of the
/// last attempt is returned when retries run out.
pub fn download(
    remote: &dyn RemoteStore,
    file: &RemoteFileRef,
    max_retries: u32,
) -> ReceiptResult<RawDocument> {
    let mut bytes = Vec::new();
    let mut failures = 0;

    loop {
        match remote.fetch_chunk(&file.id, bytes.len() as u64) {
            Ok(chunk) => {
                failures = 0;
                let done = chunk.done || chunk.data.is_empty();
                bytes.extend(chunk.data);
                if done {
                    break;
                }
            }
            Err(e) if failures < max_retries => {
                failures += 1;
                warn!(name = %file.name, offset = bytes.len(), attempt = failures, error = %e, "chunk failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    debug!(name = %file.name, size = bytes.len(), "downloaded");
    Ok(RawDocument {
        id: file.id.clone(),
        name: file.name.clone(),
        bytes,
    })
}
