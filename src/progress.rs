use serde::Serialize;

/// A progress event for one in-flight ingestion. `Stage` marks a pipeline
/// phase transition; `Batch` follows every committed chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Progress {
    Stage {
        stage: String,
    },
    Batch {
        processed: usize,
        total: usize,
        percent: u32,
    },
}

impl Progress {
    pub fn stage(stage: &str) -> Self {
        Progress::Stage {
            stage: stage.to_string(),
        }
    }

    /// Batch progress with percent = floor(processed * 100 / total), total
    /// guarded against zero.
    pub fn batch(processed: usize, total: usize) -> Self {
        let percent = (processed * 100 / total.max(1)) as u32;
        Progress::Batch {
            processed,
            total,
            percent,
        }
    }
}

/// Capability injected into the pipeline for progress telemetry.
///
/// Reporting is fire-and-forget: implementations must swallow their own
/// failures and never abort the pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Default reporter: drops every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _progress: Progress) {}
}

/// Prints progress to stdout for interactive CLI runs.
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, progress: Progress) {
        match progress {
            Progress::Stage { stage } => println!("   stage: {stage}"),
            Progress::Batch {
                processed,
                total,
                percent,
            } => println!("   {processed}/{total} rows ({percent}%)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_floored() {
        assert_eq!(
            Progress::batch(1, 3),
            Progress::Batch {
                processed: 1,
                total: 3,
                percent: 33
            }
        );
        assert_eq!(
            Progress::batch(2, 3),
            Progress::Batch {
                processed: 2,
                total: 3,
                percent: 66
            }
        );
        assert_eq!(
            Progress::batch(3, 3),
            Progress::Batch {
                processed: 3,
                total: 3,
                percent: 100
            }
        );
    }

    #[test]
    fn zero_total_is_guarded() {
        assert_eq!(
            Progress::batch(0, 0),
            Progress::Batch {
                processed: 0,
                total: 0,
                percent: 0
            }
        );
    }

    #[test]
    fn events_serialize_to_flat_payloads() {
        let stage = serde_json::to_value(Progress::stage("loading")).unwrap();
        assert_eq!(stage, serde_json::json!({"stage": "loading"}));

        let batch = serde_json::to_value(Progress::batch(50, 200)).unwrap();
        assert_eq!(
            batch,
            serde_json::json!({"processed": 50, "total": 200, "percent": 25})
        );
    }
}
