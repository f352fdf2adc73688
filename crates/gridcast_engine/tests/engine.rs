mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use gridcast_core::{Feature, JobId, JobStatus, StatusUpdate};
use gridcast_engine::{
    ApiError, EngineEvent, EngineHandle, PollOutcome, PollSettings, RetryPolicy,
};
use support::ScriptedApi;

fn settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(10),
        retry: RetryPolicy {
            max_delay: Duration::from_millis(40),
            multiplier: 2.0,
            max_consecutive_failures: Some(3),
        },
    }
}

/// Collects events until `done` matches one, or two seconds pass.
fn collect_until(engine: &EngineHandle, done: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(20)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                break;
            }
        }
    }
    events
}

#[test]
fn start_then_poll_reports_each_status_and_ends_once() {
    let api = ScriptedApi::new(vec![
        Ok(StatusUpdate::new(JobStatus::Running).with_progress(10.0)),
        Ok(StatusUpdate::new(JobStatus::Completed)),
    ]);
    let engine = EngineHandle::with_api(api.clone(), settings()).unwrap();

    engine.start_job(1, Feature::LoadProfile, serde_json::json!({"profileName": "Peak"}));
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::JobStarted { .. }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::JobStarted {
            submission: 1,
            job_id: JobId::new("job-1"),
        })
    );

    engine.poll(Feature::LoadProfile, JobId::new("job-1"));
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::PollingEnded { .. }));
    let ended: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::PollingEnded { .. }))
        .collect();
    assert_eq!(
        ended,
        vec![&EngineEvent::PollingEnded {
            job_id: JobId::new("job-1"),
            outcome: PollOutcome::Terminal(JobStatus::Completed),
        }]
    );
    assert_eq!(api.status_calls(), 2);

    std::thread::sleep(Duration::from_millis(50));
    assert!(engine.try_recv().is_none());
    assert_eq!(api.status_calls(), 2);
    engine.shutdown();
}

#[test]
fn failed_start_is_reported_with_error() {
    let mut scripted = ScriptedApi::build(Vec::new());
    scripted.start_result = Err(ApiError::Server("Invalid sector configuration".to_string()));
    let engine = EngineHandle::with_api(Arc::new(scripted), settings()).unwrap();

    engine.start_job(7, Feature::DemandProjection, serde_json::json!({}));
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::SubmitFailed { .. }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::SubmitFailed {
            submission: 7,
            error: ApiError::Server("Invalid sector configuration".to_string()),
        })
    );
    engine.shutdown();
}

#[test]
fn duplicate_poll_commands_share_one_loop() {
    let api = ScriptedApi::new(vec![
        Ok(StatusUpdate::new(JobStatus::Running)),
        Ok(StatusUpdate::new(JobStatus::Running)),
        Ok(StatusUpdate::new(JobStatus::Failed).with_message("solver error")),
    ]);
    let engine = EngineHandle::with_api(api.clone(), settings()).unwrap();

    engine.poll(Feature::DemandProjection, JobId::new("fc-1"));
    engine.poll(Feature::DemandProjection, JobId::new("fc-1"));
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::PollingEnded { .. }));

    let statuses = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Status { .. }))
        .count();
    assert_eq!(statuses, 3);
    assert_eq!(api.status_calls(), 3);
    engine.shutdown();
}

#[test]
fn stop_polling_ends_loop_as_stopped() {
    let api = ScriptedApi::new(vec![Ok(StatusUpdate::new(JobStatus::Running))]);
    let engine = EngineHandle::with_api(api.clone(), settings()).unwrap();
    let job_id = JobId::new("lp-7");

    engine.poll(Feature::LoadProfile, job_id.clone());
    collect_until(&engine, |e| matches!(e, EngineEvent::Status { .. }));
    engine.stop_polling(job_id.clone());
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::PollingEnded { .. }));

    assert_eq!(
        events.last(),
        Some(&EngineEvent::PollingEnded {
            job_id,
            outcome: PollOutcome::Stopped,
        })
    );
    let calls = api.status_calls();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(api.status_calls(), calls);
    engine.shutdown();
}

#[test]
fn cancel_is_forwarded_without_ending_the_poll() {
    let api = ScriptedApi::new(vec![
        Ok(StatusUpdate::new(JobStatus::Running)),
        Ok(StatusUpdate::new(JobStatus::Running)),
        Ok(StatusUpdate::new(JobStatus::Running)),
        Ok(StatusUpdate::new(JobStatus::Cancelled)),
    ]);
    let engine = EngineHandle::with_api(api.clone(), settings()).unwrap();
    let job_id = JobId::new("lp-8");

    engine.poll(Feature::LoadProfile, job_id.clone());
    engine.cancel(Feature::LoadProfile, job_id.clone());
    let events = collect_until(&engine, |e| matches!(e, EngineEvent::PollingEnded { .. }));

    assert!(events.contains(&EngineEvent::CancelAnswered {
        job_id: job_id.clone(),
        result: Ok("Cancellation requested".to_string()),
    }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::PollingEnded {
            job_id,
            outcome: PollOutcome::Terminal(JobStatus::Cancelled),
        })
    );
    assert_eq!(api.cancel_calls(), 1);
    engine.shutdown();
}

#[test]
fn shutdown_stops_running_loops() {
    let api = ScriptedApi::new(vec![Ok(StatusUpdate::new(JobStatus::Running))]);
    let engine = EngineHandle::with_api(api.clone(), settings()).unwrap();

    engine.poll(Feature::LoadProfile, JobId::new("a"));
    engine.poll(Feature::DemandProjection, JobId::new("b"));
    std::thread::sleep(Duration::from_millis(40));
    engine.shutdown();

    let calls = api.status_calls();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(api.status_calls(), calls);
}
