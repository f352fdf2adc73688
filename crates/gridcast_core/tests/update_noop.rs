use gridcast_core::{update, AppState, JobId, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn messages_for_unknown_jobs_are_ignored() {
    let state = AppState::new();
    let job_id = JobId::new("ghost");

    let (next, effects) = update(state.clone(), Msg::CancelClicked { job_id: job_id.clone() });
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(next, Msg::RemovalDue { job_id: job_id.clone() });
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(next, Msg::JobStarted { submission: 42, job_id });
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
