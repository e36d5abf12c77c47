use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use casedesk::api::{create_app_state, router};
use casedesk::clients::workflow::{
    LocalWorkflowTrigger, TrackingToken, TriggerError, WorkflowTrigger,
};
use casedesk::config::{Config, ExtractionBackend};
use casedesk::models::query::Query;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use casedesk::state::SharedState;

/// Default settings on a fresh temporary database.
fn default_config() -> Config {
    let path = std::env::temp_dir().join(format!("casedesk-api-{}.db", Uuid::new_v4()));
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", path.display());
    config
}

fn test_config() -> Config {
    let mut config = default_config();
    config.extraction.backend = ExtractionBackend::Static;
    config
}

async fn spawn_app_from(config: Config, trigger: Arc<dyn WorkflowTrigger>) -> Router {
    let shared = SharedState::with_trigger(config, trigger)
        .await
        .expect("shared state");
    router(create_app_state(Arc::new(shared), None)).await
}

async fn spawn_app_with(trigger: Arc<dyn WorkflowTrigger>) -> Router {
    spawn_app_from(test_config(), trigger).await
}

async fn spawn_app() -> Router {
    spawn_app_with(Arc::new(LocalWorkflowTrigger)).await
}

async fn spawn_pdf_app(allow_private_hosts: bool) -> Router {
    let mut config = default_config();
    config.extraction.allow_private_hosts = allow_private_hosts;
    spawn_app_from(config, Arc::new(LocalWorkflowTrigger)).await
}

struct FailingTrigger;

#[async_trait]
impl WorkflowTrigger for FailingTrigger {
    async fn trigger(&self, _query: &Query) -> Result<TrackingToken, TriggerError> {
        Err(TriggerError::EmptyToken)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Minimal client that carries the session cookie between requests.
struct Client {
    app: Router,
    cookie: Option<String>,
    last_set_cookie: Option<String>,
}

impl Client {
    fn new(app: Router) -> Self {
        Self {
            app,
            cookie: None,
            last_set_cookie: None,
        }
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let value = set_cookie.to_str().unwrap();
            self.cookie = Some(value.split(';').next().unwrap().to_string());
            self.last_set_cookie = Some(value.to_string());
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn put(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }
}

async fn submit_query(client: &mut Client, county: &str, business: &str) -> String {
    client.put("/api/draft/county", json!({ "county": county })).await;
    client
        .post(
            "/api/draft/searches",
            json!({ "business": business, "startDate": "2024-01-01", "endDate": "2024-01-31" }),
        )
        .await;
    let (status, body) = client.post("/api/draft/submit", json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

fn case_json(id: &str, business: &str, status: &str) -> Value {
    json!({
        "caseId": id,
        "business": business,
        "filingDate": "2024-01-15",
        "defendant": "Wile E. Coyote",
        "caseStatus": status,
        "addresses": ["123 Main St"],
        "courtroom": "4B"
    })
}

#[tokio::test]
async fn test_health_check() {
    let mut client = Client::new(spawn_app().await);
    let (status, body) = client.get("/api/system/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_unknown_api_path_is_json_404() {
    let mut client = Client::new(spawn_app().await);
    let (status, body) = client.get("/api/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_submit_flow_persists_query_and_clears_draft() {
    let mut client = Client::new(spawn_app().await);

    let (status, body) = client.put("/api/draft/county", json!({ "county": "Travis" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["canSubmit"], false);

    for business in ["Acme", "Globex"] {
        let (status, _) = client
            .post(
                "/api/draft/searches",
                json!({ "business": business, "startDate": "2024-01-01", "endDate": "2024-01-31" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = client.post("/api/draft/searches/1/edit", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["editingSearch"]["business"], "Globex");

    let (_, body) = client
        .post(
            "/api/draft/searches",
            json!({ "business": "Globex Corp", "startDate": "2024-02-01", "endDate": "2024-02-28" }),
        )
        .await;
    assert_eq!(body["data"]["searches"][1]["business"], "Globex Corp");
    assert_eq!(body["data"]["editing"], Value::Null);
    assert_eq!(body["data"]["canSubmit"], true);

    let (status, body) = client.post("/api/draft/submit", json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let query = &body["data"];
    let id = query["id"].as_str().unwrap();
    assert_eq!(query["county"], "Travis");
    assert_eq!(query["status"], "submitted");
    assert_eq!(
        query["trackingToken"],
        format!("local:case-processing:{id}")
    );
    assert_eq!(query["searches"].as_array().unwrap().len(), 2);

    let (_, draft) = client.get("/api/draft").await;
    assert_eq!(draft["data"]["county"], "");
    assert!(draft["data"]["searches"].as_array().unwrap().is_empty());

    let (status, stored) = client.get(&format!("/api/queries/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["data"]["searches"][1]["startDate"], "2024-02-01");

    let (_, active) = client.get("/api/queries/active").await;
    assert_eq!(active["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_trigger_persists_nothing_and_keeps_draft() {
    let mut client = Client::new(spawn_app_with(Arc::new(FailingTrigger)).await);

    client.put("/api/draft/county", json!({ "county": "Travis" })).await;
    client
        .post(
            "/api/draft/searches",
            json!({ "business": "Acme", "startDate": "2024-01-01", "endDate": "2024-01-31" }),
        )
        .await;

    let (status, body) = client.post("/api/draft/submit", json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let (_, queries) = client.get("/api/queries").await;
    assert!(queries["data"].as_array().unwrap().is_empty());

    let (_, draft) = client.get("/api/draft").await;
    assert_eq!(draft["data"]["county"], "Travis");
    assert_eq!(draft["data"]["searches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_submit_without_county_is_rejected() {
    let mut client = Client::new(spawn_app().await);
    client
        .post(
            "/api/draft/searches",
            json!({ "business": "Acme", "startDate": "2024-01-01", "endDate": "2024-01-31" }),
        )
        .await;

    let (status, _) = client.post("/api/draft/submit", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, queries) = client.get("/api/queries").await;
    assert!(queries["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_search_dates_are_rejected() {
    let mut client = Client::new(spawn_app().await);

    let (status, _) = client
        .post(
            "/api/draft/searches",
            json!({ "business": "Acme", "startDate": "01/02/2024", "endDate": "2024-01-31" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post(
            "/api/draft/searches",
            json!({ "business": "Acme", "startDate": "2024-03-01", "endDate": "2024-01-31" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.post("/api/draft/searches/5/edit", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_filter_and_bulk_update() {
    let mut client = Client::new(spawn_app().await);
    let travis = submit_query(&mut client, "Travis", "Acme").await;
    let harris = submit_query(&mut client, "Harris", "Globex").await;

    let (status, body) = client
        .post(
            &format!("/api/queries/{travis}/cases"),
            json!([case_json("C1", "Acme", "Active"), case_json("C2", "Acme", "Closed")]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["created"], 2);

    client
        .post(
            &format!("/api/queries/{harris}/cases"),
            json!([case_json("C3", "Globex", "Active")]),
        )
        .await;

    let (_, body) = client.get("/api/cases?county=Harris").await;
    let cases = body["data"].as_array().unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0]["caseId"], "C3");
    assert_eq!(cases[0]["county"], "Harris");

    let (_, body) = client.get("/api/cases?business=Acme&caseStatus=All").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // An unknown id fails the whole batch.
    let (status, _) = client
        .post(
            "/api/cases/user-status",
            json!({ "caseIds": ["C1", "ghost"], "status": "sent" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = client.get("/api/cases?userStatus=none").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = client
        .post(
            "/api/cases/user-status",
            json!({ "caseIds": ["C1", "C3"], "status": "sent" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 2);

    let (_, body) = client.get("/api/cases?userStatus=none").await;
    let untagged = body["data"].as_array().unwrap();
    assert_eq!(untagged.len(), 1);
    assert_eq!(untagged[0]["caseId"], "C2");

    let (status, _) = client
        .post(
            "/api/cases/user-status",
            json!({ "caseIds": ["C2"], "status": "archived" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Re-delivery updates the record but keeps the user's tag.
    let (_, body) = client
        .post(
            &format!("/api/queries/{travis}/cases"),
            json!([case_json("C1", "Acme", "Disposed")]),
        )
        .await;
    assert_eq!(body["data"]["created"], 0);
    assert_eq!(body["data"]["updated"], 1);

    let (status, body) = client.get("/api/cases/C1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["caseStatus"], "Disposed");
    assert_eq!(body["data"]["userStatus"], "sent");
    assert_eq!(body["data"]["other"]["courtroom"], "4B");

    let (_, body) = client.get("/api/cases/filters").await;
    assert_eq!(body["data"]["businesses"], json!(["Acme", "Globex"]));
    assert_eq!(body["data"]["counties"], json!(["Harris", "Travis"]));
}

#[tokio::test]
async fn test_reload_submits_one_query_per_county() {
    let mut client = Client::new(spawn_app().await);
    let travis = submit_query(&mut client, "Travis", "Acme").await;
    client
        .post(
            &format!("/api/queries/{travis}/cases"),
            json!([case_json("C1", "Acme", "Active"), case_json("C2", "Initech", "Active")]),
        )
        .await;

    let (status, body) = client
        .post("/api/cases/reload", json!({ "caseIds": ["C1", "C2"] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let queries = body["data"].as_array().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["county"], "Travis");
    assert_eq!(queries[0]["searches"].as_array().unwrap().len(), 2);

    let (status, _) = client
        .post("/api/cases/reload", json!({ "caseIds": ["ghost"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_for_unknown_query_is_not_found() {
    let mut client = Client::new(spawn_app().await);
    let (status, _) = client
        .post(
            "/api/queries/does-not-exist/cases",
            json!([case_json("C1", "Acme", "Active")]),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = client.get("/api/cases").await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_status_advances_forward_only() {
    let mut client = Client::new(spawn_app().await);
    let id = submit_query(&mut client, "Travis", "Acme").await;
    let uri = format!("/api/queries/{id}/status");

    let (status, body) = client.post(&uri, json!({ "status": "processing" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "processing");

    let (status, _) = client.post(&uri, json!({ "status": "submitted" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client.post(&uri, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, active) = client.get("/api/queries/active").await;
    assert!(active["data"].as_array().unwrap().is_empty());

    let (status, _) = client.post(&uri, json!({ "status": "bogus" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post("/api/queries/missing/status", json!({ "status": "processing" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extract_requires_input() {
    let mut client = Client::new(spawn_app().await);
    let (status, body) = client.post("/api/extract", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No PDF URL or content provided");
}

#[tokio::test]
async fn test_extract_returns_text_and_metadata() {
    let mut client = Client::new(spawn_app().await);
    let (status, body) = client
        .post("/api/extract", json!({ "pdf_content": "JVBERi0xLjQK" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Sample extracted text from PDF");
    assert_eq!(body["data"]["metadata"]["pages"], 1);
    assert_eq!(body["data"]["metadata"]["title"], "Sample Document");
}

#[tokio::test]
async fn test_draft_session_survives_on_default_config() {
    let app = spawn_app_from(default_config(), Arc::new(LocalWorkflowTrigger)).await;
    let mut client = Client::new(app);

    let (status, _) = client.put("/api/draft/county", json!({ "county": "Travis" })).await;
    assert_eq!(status, StatusCode::OK);

    let set_cookie = client.last_set_cookie.clone().expect("session cookie");
    assert!(
        !set_cookie
            .split(';')
            .any(|attr| attr.trim().eq_ignore_ascii_case("secure")),
        "cookie must work over plain HTTP: {set_cookie}"
    );

    let (_, draft) = client.get("/api/draft").await;
    assert_eq!(draft["data"]["county"], "Travis");
}

#[tokio::test]
async fn test_extract_over_body_limit_is_json_400() {
    let mut config = test_config();
    config.extraction.max_pdf_bytes = 1000;
    let app = spawn_app_from(config, Arc::new(LocalWorkflowTrigger)).await;
    let mut client = Client::new(app);

    let (status, body) = client
        .post("/api/extract", json!({ "pdf_content": "A".repeat(2_000) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "PDF is too large (1500 bytes, limit 1000)");

    let (status, body) = client
        .post("/api/extract", json!({ "pdf_content": "A".repeat(200_000) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "PDF is too large (limit 1000 bytes)");
}

fn one_page_pdf(title: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 18.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal("Notice of Hearing")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    let info_id = doc.add_object(dictionary! { "Title" => Object::string_literal(title) });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

async fn serve_bytes(bytes: Vec<u8>) -> String {
    let app = Router::new().route(
        "/notice.pdf",
        axum::routing::get(move || {
            let bytes = bytes.clone();
            async move { bytes }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/notice.pdf")
}

#[tokio::test]
async fn test_extract_parses_real_pdf_content() {
    let mut client = Client::new(spawn_pdf_app(false).await);
    let content = STANDARD.encode(one_page_pdf("Hearing 7"));

    let (status, body) = client
        .post("/api/extract", json!({ "pdf_content": content }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["text"].as_str().unwrap().contains("Notice of Hearing"));
    assert_eq!(body["data"]["metadata"]["pages"], 1);
    assert_eq!(body["data"]["metadata"]["title"], "Hearing 7");
}

#[tokio::test]
async fn test_extract_unparseable_document_is_500_envelope() {
    let mut client = Client::new(spawn_pdf_app(false).await);
    let content = STANDARD.encode(b"plain text, not a pdf");

    let (status, body) = client
        .post("/api/extract", json!({ "pdf_content": content }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(
        body["error"].as_str().unwrap().starts_with("Failed to parse PDF: "),
        "{body}"
    );
}

#[tokio::test]
async fn test_extract_fetches_pdf_url() {
    let url = serve_bytes(one_page_pdf("Fetched notice")).await;
    let mut client = Client::new(spawn_pdf_app(true).await);

    let (status, body) = client.post("/api/extract", json!({ "pdf_url": url })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["metadata"]["title"], "Fetched notice");
}

#[tokio::test]
async fn test_extract_refuses_internal_urls_by_default() {
    let url = serve_bytes(one_page_pdf("Internal")).await;
    let mut client = Client::new(spawn_pdf_app(false).await);

    let (status, body) = client.post("/api/extract", json!({ "pdf_url": url })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
