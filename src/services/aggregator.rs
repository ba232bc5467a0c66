//! Grouping of parsed receipts by month

use crate::models::{ParsedDocument, PeriodBucket};

/// Group receipts under their `MM.YYYY` key
///
/// Every document lands in exactly one period; duplicates are kept; that
/// check already happened when the sync plan was made.
pub fn aggregate(documents: impl IntoIterator<Item = ParsedDocument>) -> PeriodBucket {
    let mut bucket = PeriodBucket::new();
    for document in documents {
        bucket.insert(document);
    }
    bucket
}
