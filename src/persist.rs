use metrics::{counter, histogram};
use tracing::debug;

use crate::error::Result;
use crate::normalize::JobRecord;
use crate::progress::{Progress, ProgressReporter};
use crate::storage::Storage;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Write records to storage in contiguous chunks of at most `chunk_size`,
/// one transaction per chunk, reporting progress after each commit.
///
/// Chunks are processed strictly in order so reported percentages stay
/// monotonic. A chunk failure propagates immediately; chunks already
/// committed stay durable (at-least-once semantics, no rollback or retry
/// here; re-running the invocation re-inserts them).
pub async fn persist_chunked(
    storage: &dyn Storage,
    records: &[JobRecord],
    chunk_size: usize,
    progress: &dyn ProgressReporter,
) -> Result<usize> {
    let chunk_size = chunk_size.max(1);
    let total = records.len();
    let mut processed = 0usize;

    for chunk in records.chunks(chunk_size) {
        let t0 = std::time::Instant::now();
        storage.insert_jobs(chunk).await?;
        histogram!("ingest_chunk_persist_duration_seconds").record(t0.elapsed().as_secs_f64());
        counter!("ingest_chunks_committed_total").increment(1);
        counter!("ingest_records_inserted_total").increment(chunk.len() as u64);

        processed += chunk.len();
        debug!("committed chunk, {}/{} records persisted", processed, total);
        progress.report(Progress::batch(processed, total));
    }

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use std::sync::Mutex;

    struct CollectingProgress(Mutex<Vec<Progress>>);

    impl CollectingProgress {
        fn new() -> Self {
            Self(Mutex::new(Vec::new()))
        }

        fn events(&self) -> Vec<Progress> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for CollectingProgress {
        fn report(&self, progress: Progress) {
            self.0.lock().unwrap().push(progress);
        }
    }

    fn records(n: usize) -> Vec<JobRecord> {
        (0..n)
            .map(|i| JobRecord {
                title: format!("job {i}"),
                salary: i as f64,
                currency: "USD".to_string(),
                country: String::new(),
                seniority: String::new(),
                stack: String::new(),
            })
            .collect()
    }

    async fn run(n: usize, chunk_size: usize) -> (usize, u64, Vec<Progress>) {
        let storage = InMemoryStorage::new();
        let progress = CollectingProgress::new();
        let inserted = persist_chunked(&storage, &records(n), chunk_size, &progress)
            .await
            .unwrap();
        (inserted, storage.count_jobs().await.unwrap(), progress.events())
    }

    #[tokio::test]
    async fn inserted_count_matches_input_for_boundary_sizes() {
        for n in [0usize, 1, 5, 6, 15] {
            let (inserted, stored, _) = run(n, 5).await;
            assert_eq!(inserted, n);
            assert_eq!(stored, n as u64);
        }
        // chunk size 1 still covers everything
        let (inserted, stored, events) = run(4, 1).await;
        assert_eq!(inserted, 4);
        assert_eq!(stored, 4);
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn progress_is_emitted_per_chunk_and_monotonic() {
        let (_, _, events) = run(12, 5).await;
        assert_eq!(
            events,
            vec![
                Progress::batch(5, 12),
                Progress::batch(10, 12),
                Progress::batch(12, 12),
            ]
        );
        let percents: Vec<u32> = events
            .iter()
            .map(|e| match e {
                Progress::Batch { percent, .. } => *percent,
                Progress::Stage { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(percents, vec![41, 83, 100]);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let (inserted, stored, _) = run(3, 0).await;
        assert_eq!(inserted, 3);
        assert_eq!(stored, 3);
    }
}
