use crate::state::PendingSubmission;
use crate::{
    AppState, Effect, JobId, JobRequest, JobStatus, Msg, Toast, ToastLevel, UpdateOutcome,
    ValidationError,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(request) => submit(&mut state, request),
        Msg::JobStarted { submission, job_id } => {
            let Some(pending) = state.finish_submission(submission) else {
                return (state, Vec::new());
            };
            state.notifications_mut().add(
                job_id.clone(),
                pending.feature,
                pending.name,
                pending.cancellable,
            );
            vec![Effect::BeginPolling {
                feature: pending.feature,
                job_id,
            }]
        }
        Msg::SubmitFailed { submission, error } => {
            let Some(pending) = state.finish_submission(submission) else {
                return (state, Vec::new());
            };
            // Server and transport errors are shown verbatim; no job is created.
            state.set_submit_error(Some(error.clone()));
            vec![Effect::Toast(Toast::new(
                ToastLevel::Error,
                format!("{} could not be started: {error}", pending.name),
            ))]
        }
        Msg::StatusReceived { job_id, update } => {
            let outcome = state.notifications_mut().update_status(&job_id, &update);
            settle(&mut state, &job_id, outcome, update.result)
        }
        Msg::PollFailed { job_id, error, .. } => {
            if state.notifications_mut().note_connection_issue(&job_id, error) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PollAbandoned { job_id, failures } => {
            let outcome = state.notifications_mut().fail_locally(
                &job_id,
                format!("Lost contact with the server after {failures} failed status checks"),
            );
            settle(&mut state, &job_id, outcome, None)
        }
        Msg::CancelClicked { job_id } => {
            let feature = match state.notifications().get(&job_id) {
                Some(item) if item.shows_cancel() => item.feature,
                _ => return (state, Vec::new()),
            };
            state.notifications_mut().set_cancel_requested(&job_id, true);
            state.mark_dirty();
            // Cooperative: the job stays running until a poll reports `cancelled`.
            vec![Effect::CancelJob { feature, job_id }]
        }
        Msg::CancelAnswered { job_id, result } => match result {
            Ok(()) => Vec::new(),
            Err(error) => {
                let still_running = state
                    .notifications()
                    .get(&job_id)
                    .is_some_and(|item| !item.status.is_terminal());
                if !still_running {
                    return (state, Vec::new());
                }
                state.notifications_mut().set_cancel_requested(&job_id, false);
                state.mark_dirty();
                vec![Effect::Toast(Toast::new(
                    ToastLevel::Error,
                    format!("Cancel failed: {error}"),
                ))]
            }
        },
        Msg::DismissClicked { job_id } => {
            let Some(removed) = state.notifications_mut().remove(&job_id) else {
                return (state, Vec::new());
            };
            state.mark_dirty();
            if removed.status.is_terminal() {
                Vec::new()
            } else {
                vec![Effect::StopPolling { job_id }]
            }
        }
        Msg::RemovalDue { job_id } => {
            let terminal = state
                .notifications()
                .get(&job_id)
                .is_some_and(|item| item.status.is_terminal());
            if terminal {
                state.notifications_mut().remove(&job_id);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, request: JobRequest) -> Vec<Effect> {
    if let Err(ValidationError(errors)) = request.validate() {
        state.set_field_errors(errors);
        return Vec::new();
    }
    state.set_field_errors(Vec::new());

    let guard = request.run_guard();
    if state.is_guard_running(&guard) {
        return vec![Effect::Toast(Toast::new(
            ToastLevel::Warning,
            format!(
                "{} is already running; wait for it to finish or cancel it",
                guard.text()
            ),
        ))];
    }

    let payload = match request.payload() {
        Ok(payload) => payload,
        Err(err) => {
            state.set_submit_error(Some(err.to_string()));
            return vec![Effect::Toast(Toast::new(
                ToastLevel::Error,
                format!("Could not encode request: {err}"),
            ))];
        }
    };

    let feature = request.feature();
    let submission = state.begin_submission(PendingSubmission {
        feature,
        name: request.display_name(),
        cancellable: request.cancellable(),
    });
    vec![Effect::StartJob {
        submission,
        feature,
        payload,
    }]
}

/// Turns a registry outcome into handler effects. Only the first terminal
/// observation produces effects, so each job gets exactly one handler.
fn settle(
    state: &mut AppState,
    job_id: &JobId,
    outcome: UpdateOutcome,
    result: Option<serde_json::Value>,
) -> Vec<Effect> {
    let status = match outcome {
        UpdateOutcome::Unknown | UpdateOutcome::AlreadyTerminal => return Vec::new(),
        UpdateOutcome::Updated => {
            state.mark_dirty();
            return Vec::new();
        }
        UpdateOutcome::BecameTerminal(status) => status,
    };
    state.mark_dirty();

    let Some(item) = state.notifications().get(job_id) else {
        return Vec::new();
    };
    let feature = item.feature;
    let name = item.name.clone();
    let message = item.message.clone();

    let mut effects = match status {
        JobStatus::Completed => vec![
            Effect::JobCompleted {
                job_id: job_id.clone(),
                feature,
                result,
            },
            Effect::Toast(Toast::new(
                ToastLevel::Success,
                format!("{name} completed"),
            )),
        ],
        JobStatus::Failed => {
            let message = if message.is_empty() {
                "job failed".to_string()
            } else {
                message
            };
            vec![
                Effect::JobFailed {
                    job_id: job_id.clone(),
                    feature,
                    message: message.clone(),
                },
                Effect::Toast(Toast::new(
                    ToastLevel::Error,
                    format!("{name} failed: {message}"),
                )),
            ]
        }
        JobStatus::Cancelled => vec![Effect::Toast(Toast::new(
            ToastLevel::Info,
            format!("{name} was cancelled"),
        ))],
        JobStatus::Queued | JobStatus::Running => Vec::new(),
    };
    effects.push(Effect::ScheduleRemoval {
        job_id: job_id.clone(),
        after: state.settings().notification_ttl,
    });
    effects
}
