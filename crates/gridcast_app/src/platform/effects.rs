use std::collections::HashMap;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use gridcast_core::{Effect, Feature, JobId, Msg, SubmissionId, Toast};
use gridcast_engine::{
    EngineEvent, EngineHandle, FeatureUsage, KeyValueStore, PollOutcome, RecentProjectsStore,
};
use gridcast_logging::{gc_info, gc_warn};

/// Output the terminal shows once, outside the notification list.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Toast(Toast),
    Result {
        job_id: JobId,
        feature: Feature,
        result: serde_json::Value,
    },
    ProjectRecorded { name: String, path: String },
}

struct StartedSubmission {
    feature: Feature,
    project_path: Option<String>,
}

/// Executes core effects against the engine and the local store, and turns
/// engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    recent: RecentProjectsStore,
    usage: FeatureUsage,
    project_name: Option<String>,
    submissions: HashMap<SubmissionId, StartedSubmission>,
    project_jobs: HashMap<JobId, String>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        store: Arc<dyn KeyValueStore>,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            engine,
            msg_tx,
            recent: RecentProjectsStore::new(store.clone()),
            usage: FeatureUsage::new(store),
            project_name: None,
            submissions: HashMap::new(),
            project_jobs: HashMap::new(),
        }
    }

    /// Name recorded in the recent list when a project validation completes.
    pub fn set_project_name(&mut self, name: Option<String>) {
        self.project_name = name;
    }

    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartJob {
                    submission,
                    feature,
                    payload,
                } => {
                    let project_path = match feature {
                        Feature::Project => payload
                            .get("projectPath")
                            .and_then(|value| value.as_str())
                            .map(str::to_string),
                        _ => None,
                    };
                    self.submissions.insert(
                        submission,
                        StartedSubmission {
                            feature,
                            project_path,
                        },
                    );
                    self.engine.start_job(submission, feature, payload);
                }
                Effect::BeginPolling { feature, job_id } => self.engine.poll(feature, job_id),
                Effect::StopPolling { job_id } => self.engine.stop_polling(job_id),
                Effect::CancelJob { feature, job_id } => {
                    gc_info!("Requesting cancellation of job {}", job_id);
                    self.engine.cancel(feature, job_id);
                }
                Effect::ScheduleRemoval { job_id, after } => self.schedule_removal(job_id, after),
                Effect::JobCompleted {
                    job_id,
                    feature,
                    result,
                } => {
                    gc_info!("Job {} ({}) completed", job_id, feature);
                    if feature == Feature::Project {
                        if let Some(notice) = self.record_project(&job_id, result.as_ref()) {
                            notices.push(notice);
                        }
                    }
                    if let Some(result) = result {
                        notices.push(Notice::Result {
                            job_id,
                            feature,
                            result,
                        });
                    }
                }
                Effect::JobFailed {
                    job_id,
                    feature,
                    message,
                } => {
                    gc_warn!("Job {} ({}) failed: {}", job_id, feature, message);
                    self.project_jobs.remove(&job_id);
                }
                Effect::Toast(toast) => notices.push(Notice::Toast(toast)),
            }
        }
        notices
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        match &event {
            EngineEvent::JobStarted { submission, job_id } => {
                if let Some(started) = self.submissions.remove(submission) {
                    if let Err(err) = self.usage.record(started.feature) {
                        gc_warn!("Could not record use of {}: {}", started.feature, err);
                    }
                    if let Some(path) = started.project_path {
                        self.project_jobs.insert(job_id.clone(), path);
                    }
                }
            }
            EngineEvent::SubmitFailed { submission, .. } => {
                self.submissions.remove(submission);
            }
            _ => {}
        }
        Some(engine_event_to_msg(event))
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }

    fn schedule_removal(&self, job_id: JobId, after: Duration) {
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            thread::sleep(after);
            let _ = msg_tx.send(Msg::RemovalDue { job_id });
        });
    }

    fn record_project(
        &mut self,
        job_id: &JobId,
        result: Option<&serde_json::Value>,
    ) -> Option<Notice> {
        let path = self.project_jobs.remove(job_id)?;
        let name = self
            .project_name
            .clone()
            .or_else(|| {
                result
                    .and_then(|value| value.get("name"))
                    .and_then(|name| name.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| default_project_name(&path));
        match self.recent.add(&name, &path) {
            Ok(_) => Some(Notice::ProjectRecorded { name, path }),
            Err(err) => {
                gc_warn!("Could not record recent project {}: {}", path, err);
                None
            }
        }
    }
}

fn default_project_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

pub fn engine_event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobStarted { submission, job_id } => Msg::JobStarted { submission, job_id },
        EngineEvent::SubmitFailed { submission, error } => Msg::SubmitFailed {
            submission,
            error: error.to_string(),
        },
        EngineEvent::Status { job_id, update } => Msg::StatusReceived { job_id, update },
        EngineEvent::PollFailed {
            job_id,
            attempt,
            error,
        } => Msg::PollFailed {
            job_id,
            attempt,
            error: error.to_string(),
        },
        EngineEvent::PollingEnded { job_id, outcome } => match outcome {
            PollOutcome::Abandoned { failures } => Msg::PollAbandoned { job_id, failures },
            // The terminal status itself arrived as a Status event.
            PollOutcome::Terminal(_) | PollOutcome::Stopped => Msg::NoOp,
        },
        EngineEvent::CancelAnswered { job_id, result } => Msg::CancelAnswered {
            job_id,
            result: result.map(|_| ()).map_err(|err| err.to_string()),
        },
    }
}
