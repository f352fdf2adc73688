use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use gridcast_core::{Feature, JobId, SubmissionId};
use gridcast_logging::{gc_debug, gc_info, gc_warn};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::poller::{poll_until_terminal, ChannelEventSink, EventSink, PollSettings};
use crate::{ApiError, ApiSettings, EngineEvent, JobApi, ReqwestJobApi};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub poll: PollSettings,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

enum EngineCommand {
    Start {
        submission: SubmissionId,
        feature: Feature,
        payload: serde_json::Value,
    },
    Poll {
        feature: Feature,
        job_id: JobId,
    },
    StopPolling {
        job_id: JobId,
    },
    Cancel {
        feature: Feature,
        job_id: JobId,
    },
    Shutdown,
}

/// Owns the IO runtime. Commands go in through the handle; results come back
/// as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let api = ReqwestJobApi::new(&config.api)?;
        Self::with_api(Arc::new(api), config.poll)
    }

    pub fn with_api(api: Arc<dyn JobApi>, poll: PollSettings) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("gridcast-engine")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            run_worker(runtime, api, poll, cmd_rx, event_tx);
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn start_job(&self, submission: SubmissionId, feature: Feature, payload: serde_json::Value) {
        self.send(EngineCommand::Start {
            submission,
            feature,
            payload,
        });
    }

    /// Starts polling a job; a job that is already being polled is left alone.
    pub fn poll(&self, feature: Feature, job_id: JobId) {
        self.send(EngineCommand::Poll { feature, job_id });
    }

    pub fn stop_polling(&self, job_id: JobId) {
        self.send(EngineCommand::StopPolling { job_id });
    }

    pub fn cancel(&self, feature: Feature, job_id: JobId) {
        self.send(EngineCommand::Cancel { feature, job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stops every poll loop and waits for them to finish.
    pub fn shutdown(mut self) {
        self.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                gc_warn!("engine worker panicked during shutdown");
            }
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            gc_warn!("engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        }
    }
}

fn run_worker(
    runtime: Runtime,
    api: Arc<dyn JobApi>,
    poll: PollSettings,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
    let root = CancellationToken::new();
    let mut polls: HashMap<JobId, CancellationToken> = HashMap::new();
    let mut poll_tasks: Vec<JoinHandle<()>> = Vec::new();

    while let Ok(command) = cmd_rx.recv() {
        // Finished loops cancel their own token on exit.
        polls.retain(|_, token| !token.is_cancelled());
        poll_tasks.retain(|task| !task.is_finished());

        match command {
            EngineCommand::Start {
                submission,
                feature,
                payload,
            } => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    let event = match api.start(feature, &payload).await {
                        Ok(job_id) => {
                            gc_info!("submission {} started job {} ({})", submission, job_id, feature);
                            EngineEvent::JobStarted { submission, job_id }
                        }
                        Err(error) => {
                            gc_warn!("submission {} ({}) failed: {}", submission, feature, error);
                            EngineEvent::SubmitFailed { submission, error }
                        }
                    };
                    sink.emit(event);
                });
            }
            EngineCommand::Poll { feature, job_id } => {
                if polls.contains_key(&job_id) {
                    gc_debug!("job {} is already being polled", job_id);
                    continue;
                }
                let token = root.child_token();
                polls.insert(job_id.clone(), token.clone());
                let api = api.clone();
                let sink = sink.clone();
                let settings = poll.clone();
                poll_tasks.push(runtime.spawn(async move {
                    let outcome = poll_until_terminal(
                        api.as_ref(),
                        feature,
                        &job_id,
                        &settings,
                        &token,
                        sink.as_ref(),
                    )
                    .await;
                    token.cancel();
                    sink.emit(EngineEvent::PollingEnded { job_id, outcome });
                }));
            }
            EngineCommand::StopPolling { job_id } => {
                if let Some(token) = polls.remove(&job_id) {
                    gc_info!("stopping poll loop for job {}", job_id);
                    token.cancel();
                }
            }
            EngineCommand::Cancel { feature, job_id } => {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    let result = api.cancel(feature, &job_id).await;
                    match &result {
                        Ok(_) => gc_info!("cancel requested for job {}", job_id),
                        Err(err) => gc_warn!("cancel request for job {} failed: {}", job_id, err),
                    }
                    sink.emit(EngineEvent::CancelAnswered { job_id, result });
                });
            }
            EngineCommand::Shutdown => break,
        }
    }

    root.cancel();
    runtime.block_on(futures_util::future::join_all(poll_tasks));
    gc_debug!("engine worker stopped");
}
