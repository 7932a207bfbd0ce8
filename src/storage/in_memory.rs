use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::Storage;
use crate::error::Result;
use crate::normalize::JobRecord;

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    jobs: Arc<Mutex<Vec<JobRecord>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in insertion order.
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_jobs(&self, records: &[JobRecord]) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.extend_from_slice(records);

        debug!("inserted batch of {} job records", records.len());
        Ok(())
    }

    async fn count_jobs(&self) -> Result<u64> {
        Ok(self.jobs.lock().unwrap().len() as u64)
    }
}
