//! Bounded background execution for pipeline runs
//!
//! Callers submit a job and return immediately. A dispatcher pulls jobs off a
//! bounded queue and runs at most `concurrency` of them at once, reporting
//! each finished run to a completion hook.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Settings, MAX_WORKER_CONCURRENCY};
use crate::pipeline::orchestrator::{Pipeline, PipelineJob};
use crate::pipeline::stage::{Stage, StageError};

/// Called once per finished run, success or failure.
pub type CompletionHook = Arc<dyn Fn(&RunOutcome) + Send + Sync>;

/// Terminal result of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    pub job_id: Uuid,
    pub filename: String,
    pub database_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: Result<(), StageError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.result.as_ref().err().map(|e| e.stage)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Hook that only records the outcome in the log.
pub fn logging_hook() -> CompletionHook {
    Arc::new(|outcome: &RunOutcome| match &outcome.result {
        Ok(()) => info!(
            job_id = %outcome.job_id,
            "Finished {} in {} ms",
            outcome.filename,
            outcome.elapsed_ms()
        ),
        Err(e) => warn!(
            job_id = %outcome.job_id,
            stage = %e.stage,
            "Gave up on {} after {} ms",
            outcome.filename,
            outcome.elapsed_ms()
        ),
    })
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum runs in flight
    pub concurrency: usize,
    /// Maximum runs waiting for a free worker
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 32,
        }
    }
}

impl WorkerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            concurrency: settings.worker.concurrency.clamp(1, MAX_WORKER_CONCURRENCY),
            queue_capacity: settings.worker.queue_capacity.max(1),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Pipeline queue is full")]
    QueueFull,

    #[error("Pipeline workers have shut down")]
    Closed,
}

/// Cloneable handle for enqueueing jobs.
#[derive(Clone)]
pub struct JobSubmitter {
    tx: mpsc::Sender<PipelineJob>,
}

impl JobSubmitter {
    /// Enqueue a job without waiting.
    pub fn submit(&self, job: PipelineJob) -> Result<Uuid, SubmitError> {
        let id = job.id;
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;
        Ok(id)
    }
}

pub struct WorkerPool {
    submitter: JobSubmitter,
    shutdown_tx: oneshot::Sender<()>,
    dispatcher: JoinHandle<()>,
}

impl WorkerPool {
    /// Spawn the dispatcher on the current runtime.
    pub fn start(pipeline: Arc<Pipeline>, config: WorkerConfig, hook: CompletionHook) -> Self {
        let concurrency = config.concurrency.clamp(1, MAX_WORKER_CONCURRENCY);
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let dispatcher = tokio::spawn(dispatch(pipeline, rx, shutdown_rx, concurrency, hook));

        Self {
            submitter: JobSubmitter { tx },
            shutdown_tx,
            dispatcher,
        }
    }

    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    pub fn submit(&self, job: PipelineJob) -> Result<Uuid, SubmitError> {
        self.submitter.submit(job)
    }

    /// Stop accepting jobs and wait for queued and running jobs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.dispatcher.await {
            error!("Pipeline dispatcher panicked: {}", e);
        }
    }
}

async fn dispatch(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::Receiver<PipelineJob>,
    mut shutdown_rx: oneshot::Receiver<()>,
    concurrency: usize,
    hook: CompletionHook,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut closing = false;

    loop {
        let job = tokio::select! {
            biased;

            _ = &mut shutdown_rx, if !closing => {
                // Queued jobs are still drained after close
                rx.close();
                closing = true;
                continue;
            }

            job = rx.recv() => job,
        };

        let Some(job) = job else { break };

        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let pipeline = pipeline.clone();
        let hook = hook.clone();
        tokio::spawn(async move {
            let started_at = Utc::now();
            let result = pipeline.run(&job).await;
            let outcome = RunOutcome {
                job_id: job.id,
                filename: job.filename,
                database_id: job.database_id,
                started_at,
                finished_at: Utc::now(),
                result,
            };
            hook(&outcome);
            drop(permit);
        });
    }

    // Wait for in-flight runs
    match u32::try_from(concurrency) {
        Ok(all) => {
            let _ = permits.acquire_many(all).await;
        }
        Err(_) => error!("Cannot wait for {} pipeline permits", concurrency),
    }
}
