use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gridcast_core::{Feature, JobId, JobStatus};
use gridcast_engine::{
    poll_until_terminal, ApiError, ApiSettings, EngineEvent, EventSink, JobApi, MemoryStore,
    PollOutcome, PollSettings, RecentProjectsError, RecentProjectsStore,
    ReqwestJobApi, RetryPolicy,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Serves the given bodies in order, repeating the last one.
struct Sequence {
    bodies: Vec<serde_json::Value>,
    calls: Arc<AtomicUsize>,
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .get(index)
            .or_else(|| self.bodies.last())
            .cloned()
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(body)
    }
}

fn client(server: &MockServer) -> ReqwestJobApi {
    ReqwestJobApi::new(&ApiSettings {
        base_url: format!("{}/api", server.uri()),
        request_timeout: Duration::from_millis(500),
        ..ApiSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn start_posts_payload_and_returns_job_id() {
    let server = MockServer::start().await;
    let payload = json!({"scenarioName": "Baseline", "targetYear": 2037});
    Mock::given(method("POST"))
        .and(path("/api/demand_projection/run_forecast"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"job_id": "fc-17"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = client(&server)
        .start(Feature::DemandProjection, &payload)
        .await
        .expect("start ok");
    assert_eq!(job_id, JobId::new("fc-17"));
}

#[tokio::test]
async fn start_surfaces_server_error_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/load_profile/generate_profile"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Profile 'Peak' already exists"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .start(Feature::LoadProfile, &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Server("Profile 'Peak' already exists".to_string()));
}

#[tokio::test]
async fn start_without_job_id_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .start(Feature::Project, &json!({"projectPath": "/p"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn plain_http_errors_keep_status_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/load_profile/status/lp-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server)
        .status(Feature::LoadProfile, &JobId::new("lp-1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::HttpStatus {
            status: 503,
            body: "maintenance".to_string()
        }
    );
}

#[tokio::test]
async fn slow_status_request_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/load_profile/status/lp-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"status": "success", "data": {"status": "running"}})),
        )
        .mount(&server)
        .await;

    let api = ReqwestJobApi::new(&ApiSettings {
        base_url: format!("{}/api", server.uri()),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    })
    .unwrap();
    let err = api
        .status(Feature::LoadProfile, &JobId::new("lp-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
}

#[tokio::test]
async fn cancel_returns_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/demand_projection/cancel/fc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Cancellation requested"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = client(&server)
        .cancel(Feature::DemandProjection, &JobId::new("fc-1"))
        .await
        .expect("cancel ok");
    assert_eq!(message, "Cancellation requested");
}

#[tokio::test]
async fn polling_against_server_reports_progress_until_completion() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/api/load_profile/status/lp-9"))
        .respond_with(Sequence {
            bodies: vec![
                json!({"status": "success", "data": {"status": "running", "progress": 10, "message": "Loading demand"}}),
                json!({"status": "success", "data": {"status": "processing_scaling", "progress": 55}}),
                json!({"status": "success", "data": {"status": "completed", "progress": 100, "result": {"file": "peak.csv"}}}),
            ],
            calls: calls.clone(),
        })
        .mount(&server)
        .await;

    let api = client(&server);
    let sink = TestSink::default();
    let settings = PollSettings {
        interval: Duration::from_millis(10),
        retry: RetryPolicy::default(),
    };
    let outcome = poll_until_terminal(
        &api,
        Feature::LoadProfile,
        &JobId::new("lp-9"),
        &settings,
        &CancellationToken::new(),
        &sink,
    )
    .await;

    assert_eq!(outcome, PollOutcome::Terminal(JobStatus::Completed));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let updates: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Status { update, .. } => Some(update),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].message.as_deref(), Some("Loading demand"));
    assert_eq!(updates[1].stage.as_deref(), Some("scaling"));
    assert_eq!(updates[2].result, Some(json!({"file": "peak.csv"})));
}

#[tokio::test]
async fn forgetting_recent_project_calls_server_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/recent/delete"))
        .and(body_json(json!({"path": "/p/alpha"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/project/recent/delete"))
        .and(body_json(json!({"path": "/p/beta"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Project is open in another session"
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let store = RecentProjectsStore::with_clock(
        Arc::new(MemoryStore::new()),
        Arc::new(|| "2026-10-15T08:00:00.000Z".to_string()),
    );
    store.add("Alpha", "/p/alpha").unwrap();
    store.add("Beta", "/p/beta").unwrap();

    let remaining = store.remove(&api, "/p/alpha").await.expect("removed");
    assert_eq!(remaining.len(), 1);

    let err = store.remove(&api, "/p/beta").await.unwrap_err();
    assert!(matches!(
        err,
        RecentProjectsError::Api(ApiError::Server(ref message)) if message == "Project is open in another session"
    ));
    assert_eq!(store.list().unwrap().entries()[0].path, "/p/beta");
}
