#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a job form.
    SubmitRequested(crate::JobRequest),
    /// Start endpoint accepted a submission and returned a job id.
    JobStarted {
        submission: crate::SubmissionId,
        job_id: crate::JobId,
    },
    /// Start endpoint failed (transport error or server-reported error).
    SubmitFailed {
        submission: crate::SubmissionId,
        error: String,
    },
    /// Poller observed a status for a job.
    StatusReceived {
        job_id: crate::JobId,
        update: crate::StatusUpdate,
    },
    /// A single poll failed; polling continues.
    PollFailed {
        job_id: crate::JobId,
        attempt: u32,
        error: String,
    },
    /// Poller gave up after too many consecutive failures.
    PollAbandoned { job_id: crate::JobId, failures: u32 },
    /// User clicked Cancel on a notification.
    CancelClicked { job_id: crate::JobId },
    /// Server answered the cancel request. Success only means "requested".
    CancelAnswered {
        job_id: crate::JobId,
        result: Result<(), String>,
    },
    /// User dismissed a notification.
    DismissClicked { job_id: crate::JobId },
    /// Auto-removal timer fired.
    RemovalDue { job_id: crate::JobId },
    /// A poll loop ended and the state already reflects why.
    NoOp,
}
