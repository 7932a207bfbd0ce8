use async_trait::async_trait;

use crate::error::Result;
use crate::normalize::JobRecord;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// Storage seam for persisted job records.
///
/// `insert_jobs` takes one batch and commits it atomically: either every
/// record in the batch lands or none do. Batches are independent of each
/// other; the chunked persister relies on that to keep earlier commits
/// durable when a later batch fails.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_jobs(&self, records: &[JobRecord]) -> Result<()>;

    async fn count_jobs(&self) -> Result<u64>;
}
