//! Demonstration retrieval policy.
//!
//! A thin layer over [`RecordStore::query`] that clamps the requested
//! demonstration count. The returned order is load-bearing: it becomes
//! conversation order during prompt assembly.

use tracing::warn;

use crate::error::Result;
use crate::traits::store::RecordStore;
use crate::types::record::Record;

/// Retrieve the `k` stored records most similar to `text` within `split`,
/// most-similar first.
///
/// `k <= 0` retrieves nothing; negative values additionally log a warning
/// since they usually indicate a caller bug.
pub async fn retrieve_demonstrations(
    store: &dyn RecordStore,
    text: &str,
    k: i64,
    split: &str,
) -> Result<Vec<Record>> {
    if k < 0 {
        warn!(k, "negative demonstration count; retrieving none");
        return Ok(Vec::new());
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    store.query(text, k as usize, split).await
}
