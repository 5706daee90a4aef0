use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use campus_api::app::services::AppServices;
use campus_api::config::ApiConfig;
use campus_auth::{JwtClaims, Role, UserRecord};
use campus_core::{AuditEventId, SystemClock, TenantId, UserId};
use campus_infra::directory::InMemoryUserDirectory;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    directory: Arc<InMemoryUserDirectory>,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory services, bound to an ephemeral port.
        let config = ApiConfig::in_memory(JWT_SECRET);
        let directory = Arc::new(InMemoryUserDirectory::new());
        let services = Arc::new(AppServices::in_memory(directory.clone(), Arc::new(SystemClock)));
        let app = campus_api::app::build_app_with(&config, services.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            directory,
            services,
            handle,
        }
    }

    fn user(&self, role: Role, tenant_id: Option<TenantId>) -> UserRecord {
        let id = UserId::new();
        let record = UserRecord::new(id, tenant_id, role, format!("{id}@campus.test"));
        self.directory.insert(record.clone()).unwrap();
        record
    }

    async fn record(&self, actor: &UserRecord, action: &str) -> serde_json::Value {
        let event = self
            .services
            .recorder
            .record(actor.id, action, None)
            .await
            .unwrap();
        serde_json::to_value(event).unwrap()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user: &UserRecord) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user.id,
        role: user.role,
        tenant_id: user.tenant_id,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn get_json(
    client: &reqwest::Client,
    url: String,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/audit-logs", "/audit-logs/statistics", "/policy/rules"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let teacher = srv.user(Role::Teacher, Some(tenant));

    let (status, body) =
        get_json(&reqwest::Client::new(), srv.url("/whoami"), &mint_jwt(&teacher)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal_id"], teacher.id.to_string());
    assert_eq!(body["role"], "TEACHER");
    assert_eq!(body["tenant_id"], tenant.to_string());
}

#[tokio::test]
async fn school_admin_listing_is_tenant_isolated_and_paged() {
    let srv = TestServer::spawn().await;
    let (t1, t2) = (TenantId::new(), TenantId::new());
    let admin = srv.user(Role::SchoolAdmin, Some(t1));
    let teacher_t1 = srv.user(Role::Teacher, Some(t1));
    let teacher_t2 = srv.user(Role::Teacher, Some(t2));

    for _ in 0..3 {
        srv.record(&teacher_t1, "CREATE_HOMEWORK").await;
        srv.record(&teacher_t2, "CREATE_HOMEWORK").await;
    }

    let client = reqwest::Client::new();
    let token = mint_jwt(&admin);
    let (status, body) = get_json(&client, srv.url("/audit-logs?page=1&limit=2"), &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["meta"],
        json!({ "page": 1, "limit": 2, "total": 3, "totalPages": 2 })
    );
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|e| e["actorId"] == teacher_t1.id.to_string()));

    let capped = srv.url("/audit-logs?action=create&limit=500");
    let (_, body) = get_json(&client, capped, &token).await;
    assert_eq!(body["meta"]["limit"], 100);
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn users_outside_the_tenant_cannot_be_filtered_for() {
    let srv = TestServer::spawn().await;
    let admin = srv.user(Role::SchoolAdmin, Some(TenantId::new()));
    let foreign = srv.user(Role::Teacher, Some(TenantId::new()));

    let (status, body) = get_json(
        &reqwest::Client::new(),
        srv.url(&format!("/audit-logs?userId={}", foreign.id)),
        &mint_jwt(&admin),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access_denied");
    assert_eq!(body["reason"], "tenant_mismatch");
}

#[tokio::test]
async fn denied_reads_are_recorded() {
    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let teacher = srv.user(Role::Teacher, Some(tenant));
    let root = srv.user(Role::SuperAdmin, None);
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, srv.url("/audit-logs"), &mint_jwt(&teacher)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "role_not_permitted");

    let denied = srv.url("/audit-logs?action=denied");
    let (status, body) = get_json(&client, denied, &mint_jwt(&root)).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["action"], "DENIED_READ_AUDIT_LOG");
    assert_eq!(data[0]["actorId"], teacher.id.to_string());
    assert_eq!(data[0]["metadata"]["reason"], "role_not_permitted");
}

#[tokio::test]
async fn malformed_filters_are_validation_errors() {
    let srv = TestServer::spawn().await;
    let root = srv.user(Role::SuperAdmin, None);
    let client = reqwest::Client::new();
    let token = mint_jwt(&root);

    let bad_date = srv.url("/audit-logs?startDate=yesterday");
    let (status, body) = get_json(&client, bad_date, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "startDate");

    let (status, body) = get_json(
        &client,
        srv.url("/audit-logs/statistics?startDate=2024-02-01&endDate=2024-01-01"),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["rule"], "before_or_equal:endDate");

    let (status, _) = get_json(&client, srv.url("/audit-logs?page=0"), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn single_event_lookup_separates_missing_from_forbidden() {
    let srv = TestServer::spawn().await;
    let t1 = TenantId::new();
    let admin = srv.user(Role::SchoolAdmin, Some(t1));
    let own = srv.user(Role::Teacher, Some(t1));
    let foreign = srv.user(Role::Teacher, Some(TenantId::new()));

    let own_event = srv.record(&own, "UPDATE_HOMEWORK").await;
    let foreign_event = srv.record(&foreign, "UPDATE_HOMEWORK").await;
    let client = reqwest::Client::new();
    let token = mint_jwt(&admin);

    let (status, body) = get_json(
        &client,
        srv.url(&format!("/audit-logs/{}", own_event["id"].as_str().unwrap())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, own_event);

    let (status, _) = get_json(
        &client,
        srv.url(&format!("/audit-logs/{}", foreign_event["id"].as_str().unwrap())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get_json(
        &client,
        srv.url(&format!("/audit-logs/{}", AuditEventId::new())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = get_json(&client, srv.url("/audit-logs/not-an-id"), &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_summary_and_statistics_shapes() {
    let srv = TestServer::spawn().await;
    let t1 = TenantId::new();
    let admin = srv.user(Role::SchoolAdmin, Some(t1));
    let teacher = srv.user(Role::Teacher, Some(t1));
    srv.record(&teacher, "USER_LOGIN").await;
    srv.record(&teacher, "USER_LOGOUT").await;
    srv.record(&admin, "CREATE_SUBJECT").await;

    let client = reqwest::Client::new();
    let token = mint_jwt(&admin);

    let (status, summary) = get_json(
        &client,
        srv.url(&format!("/audit-logs/users/{}/summary", teacher.id)),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["userId"], teacher.id.to_string());
    assert_eq!(summary["totalActions"], 2);
    assert_eq!(summary["actionBreakdown"], json!({ "USER": 2 }));
    assert_eq!(summary["recentActivity"], 2);

    let (status, stats) = get_json(&client, srv.url("/audit-logs/statistics"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalActions"], 3);
    assert_eq!(stats["uniqueUsers"], 2);
    assert_eq!(stats["breakdowns"]["byAction"], json!({ "CREATE": 1, "USER": 2 }));
    assert_eq!(stats["breakdowns"]["byRole"], json!({ "SCHOOL_ADMIN": 1, "TEACHER": 2 }));
    assert_eq!(stats["topActiveUsers"][0]["actorId"], teacher.id.to_string());
    assert_eq!(stats["topActiveUsers"][0]["count"], 2);

    let (status, _) = get_json(
        &client,
        srv.url(&format!("/audit-logs/users/{}/summary", UserId::new())),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn policy_rules_and_explain() {
    let srv = TestServer::spawn().await;
    let tenant = TenantId::new();
    let admin = srv.user(Role::SchoolAdmin, Some(tenant));
    let client = reqwest::Client::new();
    let token = mint_jwt(&admin);

    let (status, body) = get_json(&client, srv.url("/policy/rules"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"].as_array().unwrap().len(), 4);

    let res = client
        .post(srv.url("/policy/explain"))
        .bearer_auth(&token)
        .json(&json!({
            "action": "DEACTIVATE_USER",
            "resource": {
                "resource_type": "user",
                "tenant_id": tenant.to_string(),
                "owner_id": admin.id.to_string(),
                "target_role": "SCHOOL_ADMIN"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["decision"]["decision"], "deny");
    assert_eq!(body["decision"]["reason"], "self_action_forbidden");
}
