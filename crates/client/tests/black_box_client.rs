use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use auditdesk_client::{
    ApiClient, ApiError, AuditApi, AuditQuery, ClientConfig, DirectoryApi, GENERIC_FAILURE,
    HistoryNote,
};
use auditdesk_core::{AuditId, AuditStatus, CompanyId};
use auditdesk_directory::Credentials;

const TOKEN: &str = "tok-1";

#[derive(Clone, Default)]
struct Seen {
    request_ids: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

struct StubBackend {
    base_url: String,
    seen: Seen,
    handle: tokio::task::JoinHandle<()>,
}

impl StubBackend {
    async fn spawn() -> Self {
        let seen = Seen::default();
        let app = Router::new()
            .route("/api/csrf/", get(csrf))
            .route("/api/users/login/", post(login))
            .route("/api/users/", get(users))
            .route("/api/companies/", get(broken_companies))
            .route("/api/companies/:id/", get(missing_company))
            .route("/api/audits/", get(audits))
            .route("/api/audits/:id/", get(slow_audit))
            .route("/api/audits/:id/start/", post(start))
            .route("/api/audits/:id/submit/", post(submit))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, seen, handle }
    }

    fn client(&self) -> ApiClient {
        self.client_with_timeout(Duration::from_secs(5))
    }

    fn client_with_timeout(&self, timeout: Duration) -> ApiClient {
        ApiClient::new(ClientConfig {
            base_url: self.base_url.clone(),
            timeout,
        })
        .unwrap()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(seen: &Seen, headers: &HeaderMap) {
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        seen.request_ids.lock().unwrap().push(id.to_string());
    }
}

fn csrf_ok(headers: &HeaderMap) -> bool {
    headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) == Some(TOKEN)
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("sessionid=s-42"))
}

fn audit_json(id: u64, status: &str, history: Value) -> Value {
    json!({
        "id": id, "name": "Annual IT audit", "company": 4, "company_name": "Acme",
        "expert": 2, "participant": 3, "status": status, "completion": 40,
        "questions": [], "history": history
    })
}

async fn csrf() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, format!("csrftoken={TOKEN}; Path=/"))],
        Json(json!({ "csrfToken": TOKEN })),
    )
}

async fn login(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, &headers);
    if !csrf_ok(&headers) {
        return (
            StatusCode::FORBIDDEN,
            [(header::SET_COOKIE, "noop=1; Path=/".to_string())],
            Json(json!({"detail": "CSRF Failed: CSRF token missing."})),
        );
    }
    if body["username"] == "pat" && body["password"] == "secret" {
        return (
            StatusCode::OK,
            [(header::SET_COOKIE, "sessionid=s-42; Path=/".to_string())],
            Json(json!({
                "id": 3, "username": "pat", "email": "pat@acme.test",
                "role": "participant", "organization": 4
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        [(header::SET_COOKIE, "noop=1; Path=/".to_string())],
        Json(json!({"detail": "Invalid credentials."})),
    )
}

async fn users(headers: HeaderMap) -> impl IntoResponse {
    if !has_session(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        );
    }
    (
        StatusCode::OK,
        Json(json!([{ "id": 3, "username": "pat", "role": "participant", "organization": 4 }])),
    )
}

async fn broken_companies() -> impl IntoResponse {
    (StatusCode::OK, "<html>maintenance</html>")
}

async fn missing_company(Path(_id): Path<u64>) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "definitely not json")
}

async fn audits(
    State(seen): State<Seen>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let rendered = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    seen.queries.lock().unwrap().push(rendered);
    Json(json!([audit_json(1, "In Progress", json!([]))]))
}

async fn slow_audit(Path(id): Path<u64>) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(audit_json(id, "Planned", json!([])))
}

async fn start(Path(id): Path<u64>, headers: HeaderMap) -> impl IntoResponse {
    if !csrf_ok(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({"detail": "CSRF Failed: CSRF token missing."})));
    }
    (StatusCode::OK, Json(audit_json(id, "In Progress", json!([]))))
}

async fn submit(Path(id): Path<u64>, Json(note): Json<Value>) -> impl IntoResponse {
    let entry = json!({
        "id": 10, "date": "2024-03-01T10:00:00Z", "type": "submission",
        "content": note["content"], "files": note["files"], "author": 3
    });
    Json(audit_json(id, "In Progress", json!([entry])))
}

#[tokio::test]
async fn login_fetches_csrf_and_keeps_session_cookie() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    let err = client.list_users().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);

    let user = client
        .login(&Credentials {
            username: "pat".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.username, "pat");
    assert_eq!(user.organization, Some(CompanyId::new(4)));

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 1);

    let cookies = client.export_cookies().unwrap();
    assert!(cookies.contains("sessionid=s-42"));
    assert!(cookies.contains("csrftoken=tok-1"));
}

#[tokio::test]
async fn every_request_carries_a_request_id() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    for _ in 0..2 {
        let _ = client
            .login(&Credentials {
                username: "pat".to_string(),
                password: "wrong".to_string(),
            })
            .await;
    }

    let ids = srv.seen.request_ids.lock().unwrap().clone();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn request_errors_use_the_detail_field() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    let err = client
        .login(&Credentials {
            username: "pat".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Request {
            status: 400,
            message: "Invalid credentials.".to_string()
        }
    );
    assert_eq!(err.user_message(), "Invalid credentials.");
}

#[tokio::test]
async fn malformed_bodies_degrade_to_generic_errors() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    let err = client.list_companies().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));

    let err = client.get_company(CompanyId::new(9)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), GENERIC_FAILURE);
}

#[tokio::test]
async fn audit_filters_are_sent_as_query_parameters() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    let audits = client
        .list_audits(&AuditQuery {
            status: Some(AuditStatus::InProgress),
            company: Some(CompanyId::new(4)),
            ..AuditQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(audits[0].status, AuditStatus::InProgress);
    let queries = srv.seen.queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["status=In Progress&company=4".to_string()]);
}

#[tokio::test]
async fn lifecycle_calls_return_the_updated_audit() {
    let srv = StubBackend::spawn().await;
    let client = srv.client();

    let started = client.start_audit(AuditId::new(1)).await.unwrap();
    assert_eq!(started.status, AuditStatus::InProgress);

    let submitted = client
        .submit_for_review(
            AuditId::new(1),
            &HistoryNote {
                content: "Section 1 done".to_string(),
                files: vec!["policy.pdf".to_string()],
            },
        )
        .await
        .unwrap();
    assert_eq!(submitted.history.len(), 1);
    assert_eq!(submitted.history[0].content, "Section 1 done");
    assert_eq!(submitted.history[0].files, vec!["policy.pdf".to_string()]);
}

#[tokio::test]
async fn slow_responses_time_out() {
    let srv = StubBackend::spawn().await;
    let client = srv.client_with_timeout(Duration::from_millis(300));

    let err = client.get_audit(AuditId::new(2)).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = ApiClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
}
