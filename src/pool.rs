use crate::stage::Stages;
use crate::task::Job;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

/// Drains the shared job queue with at most `workers` jobs running at once.
///
/// A job is claimed only when a slot is free, and each claimed job runs on
/// its own runtime task until its handler returns. Resolves once the queue is
/// closed and every claimed job has finished.
pub async fn run(jobs: mpsc::Receiver<Job>, workers: usize, stages: Arc<Stages>) {
    debug!(workers, "worker pool started");

    ReceiverStream::new(jobs)
        .for_each_concurrent(workers, |job| {
            let stages = stages.clone();
            async move {
                let handle = tokio::spawn(async move { stages.execute(job).await });
                if let Err(e) = handle.await {
                    // The job's phase guard was dropped during unwinding.
                    error!("worker task failed: {}", e);
                }
            }
        })
        .await;

    debug!("worker pool drained");
}
