use std::time::Duration;

use gridcast_core::{Feature, JobId};
use gridcast_logging::{gc_debug, gc_info, gc_warn};
use tokio_util::sync::CancellationToken;

use crate::retry::{next_delay, RetryPolicy};
use crate::{EngineEvent, JobApi, PollOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls a job's status until it reaches a terminal state, the retry policy
/// gives up, or `cancel` fires.
///
/// Every observation is emitted as [`EngineEvent::Status`]; failed requests
/// are emitted as [`EngineEvent::PollFailed`] and polling continues with
/// backoff. The first request is made one interval after the call.
pub async fn poll_until_terminal(
    api: &dyn JobApi,
    feature: Feature,
    job_id: &JobId,
    settings: &PollSettings,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) -> PollOutcome {
    let mut delay = settings.interval;
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Stopped,
            _ = tokio::time::sleep(delay) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Stopped,
            result = api.status(feature, job_id) => result,
        };

        match result {
            Ok(update) => {
                failures = 0;
                delay = settings.interval;
                let status = update.status;
                gc_debug!(
                    "job {} status={} progress={:?}",
                    job_id,
                    status.label(),
                    update.progress
                );
                sink.emit(EngineEvent::Status {
                    job_id: job_id.clone(),
                    update,
                });
                if status.is_terminal() {
                    gc_info!("job {} reached {}", job_id, status.label());
                    return PollOutcome::Terminal(status);
                }
            }
            Err(error) => {
                failures += 1;
                gc_warn!(
                    "status check {} for job {} failed: {}",
                    failures,
                    job_id,
                    error
                );
                sink.emit(EngineEvent::PollFailed {
                    job_id: job_id.clone(),
                    attempt: failures,
                    error,
                });
                if settings.retry.gives_up_after(failures) {
                    gc_warn!(
                        "giving up on job {} after {} consecutive failures",
                        job_id,
                        failures
                    );
                    return PollOutcome::Abandoned { failures };
                }
                delay = next_delay(delay, &settings.retry);
            }
        }
    }
}
