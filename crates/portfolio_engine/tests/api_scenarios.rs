use expect_test::expect;
use serde_json::Value;

use portfolio_base::pal::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpStatusCode,
};
use portfolio_base::{MockPal, Pal};
use portfolio_engine::{ApiService, ApiSettings, Config, InMemoryStore, StoreHandle};

const HOST: &str = "testserver";

struct TestServer {
    pal: MockPal,
    handle: HttpServerHandle,
    store: StoreHandle,
}

impl TestServer {
    fn start(store: InMemoryStore) -> Self {
        let pal = MockPal::new();
        let store = StoreHandle::new(store);
        let handle = pal
            .start_http_server(
                Box::new(ApiService::new(store.clone())),
                HttpServerConfig::default(),
            )
            .unwrap();
        Self { pal, handle, store }
    }

    fn with_samples() -> Self {
        Self::start(InMemoryStore::with_samples())
    }

    fn send(&self, request: HttpRequest) -> HttpResponse {
        self.pal
            .simulate_request(self.handle.port(), request.with_header("Host", HOST))
            .unwrap()
    }

    fn get(&self, path: &str) -> HttpResponse {
        self.send(HttpRequest::new(HttpMethod::Get, path))
    }

    fn send_json(&self, method: HttpMethod, path: &str, body: &str) -> HttpResponse {
        self.send(HttpRequest::new(method, path).with_json(body))
    }
}

fn json(response: &HttpResponse) -> Value {
    serde_json::from_slice(response.body().as_bytes()).unwrap()
}

fn link_summary(representation: &Value) -> Vec<(String, String, String)> {
    representation["_links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| {
            (
                link["rel"].as_str().unwrap().to_string(),
                link["method"].as_str().unwrap().to_string(),
                link["href"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[test]
fn get_sample_project_exact_body() {
    let server = TestServer::with_samples();
    let response = server.get("/projects/2");

    assert_eq!(response.status(), HttpStatusCode::Ok);
    assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
    assert_eq!(
        response.headers().get("Cache-Control"),
        Some("public, max-age=300")
    );
    expect![[r#"{"title":"Data Analysis Tool","description":"Tool for analyzing sales data.","technologies":["Python","Pandas","FastAPI"],"url":"https://github.com/example/data-tool","id":2,"_links":[{"rel":"self","href":"http://testserver/projects/2","method":"GET"},{"rel":"edit","href":"http://testserver/projects/2","method":"PUT"},{"rel":"partial_edit","href":"http://testserver/projects/2","method":"PATCH"},{"rel":"delete","href":"http://testserver/projects/2","method":"DELETE"},{"rel":"collection","href":"http://testserver/projects","method":"GET"}]}"#]]
    .assert_eq(&response.body().as_string().unwrap());
}

#[test]
fn list_projects_in_insertion_order_with_collection_links() {
    let server = TestServer::with_samples();
    let response = server.get("/projects");

    assert_eq!(response.status(), HttpStatusCode::Ok);
    assert!(response.headers().contains("Cache-Control"));
    let body = json(&response);
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Personal Website", "Data Analysis Tool"]);
    assert_eq!(
        link_summary(&body),
        [
            (
                "self".to_string(),
                "GET".to_string(),
                "http://testserver/projects".to_string()
            ),
            (
                "create".to_string(),
                "POST".to_string(),
                "http://testserver/projects".to_string()
            ),
        ]
    );
}

#[test]
fn list_empty_collection() {
    let server = TestServer::start(InMemoryStore::new());
    let body = json(&server.get("/projects"));
    assert_eq!(body["items"], Value::Array(vec![]));
}

#[test]
fn create_returns_created_with_location_and_links() {
    let server = TestServer::with_samples();
    let response = server.send_json(
        HttpMethod::Post,
        "/projects",
        r#"{"title":"New API Client","description":"Testing the API","technologies":["curl","HTTP"],"url":null}"#,
    );

    assert_eq!(response.status(), HttpStatusCode::Created);
    assert_eq!(
        response.headers().get("Location"),
        Some("http://testserver/projects/3")
    );
    assert!(!response.headers().contains("Cache-Control"));

    let body = json(&response);
    assert_eq!(body["id"], 3);
    assert_eq!(body["title"], "New API Client");
    assert_eq!(body["url"], Value::Null);
    let links = link_summary(&body);
    assert_eq!(links.len(), 5);
    assert!(
        links[..4]
            .iter()
            .all(|(_, _, href)| href == "http://testserver/projects/3")
    );

    let fetched = json(&server.get("/projects/3"));
    assert_eq!(fetched, body);
}

#[test]
fn create_with_missing_fields_is_unprocessable() {
    let server = TestServer::with_samples();
    let response = server.send_json(HttpMethod::Post, "/projects", r#"{"title":"Only a title"}"#);

    assert_eq!(response.status(), HttpStatusCode::UnprocessableEntity);
    expect![[r#"{"detail":[{"field":"description","message":"field required"},{"field":"technologies","message":"field required"}]}"#]]
    .assert_eq(&response.body().as_string().unwrap());
    assert_eq!(server.store.len().unwrap(), 2);
}

#[test]
fn create_with_malformed_json_is_bad_request() {
    let server = TestServer::with_samples();
    let response = server.send_json(HttpMethod::Post, "/projects", "{not json");
    assert_eq!(response.status(), HttpStatusCode::BadRequest);

    let response = server.send(
        HttpRequest::new(HttpMethod::Post, "/projects")
            .with_header("Content-Type", "text/plain")
            .with_body(r#"{"title":"T","description":"D","technologies":[]}"#),
    );
    assert_eq!(response.status(), HttpStatusCode::BadRequest);
    assert_eq!(server.store.len().unwrap(), 2);
}

#[test]
fn create_with_wrongly_typed_field_names_it() {
    let server = TestServer::with_samples();
    let response = server.send_json(
        HttpMethod::Post,
        "/projects",
        r#"{"title":5,"description":"d","technologies":["x"]}"#,
    );

    assert_eq!(response.status(), HttpStatusCode::UnprocessableEntity);
    expect![[r#"{"detail":[{"field":"title","message":"invalid type: integer `5`, expected a string"}]}"#]]
    .assert_eq(&response.body().as_string().unwrap());
    assert_eq!(server.store.len().unwrap(), 2);
}

#[test]
fn links_without_host_header_use_the_bound_port() {
    let pal = MockPal::new();
    let config = Config::parse("[server]\nport = 0\n").unwrap();
    let service = ApiService::with_settings(
        StoreHandle::new(InMemoryStore::with_samples()),
        ApiSettings::from_config(&config),
    );
    let bound_port = service.bound_port();
    let handle = pal
        .start_http_server(Box::new(service), HttpServerConfig::default())
        .unwrap();
    bound_port.set(handle.port());

    let response = pal
        .simulate_request(
            handle.port(),
            HttpRequest::new(HttpMethod::Post, "/projects")
                .with_json(r#"{"title":"T","description":"D","technologies":[]}"#),
        )
        .unwrap();
    assert_eq!(
        response.headers().get("Location"),
        Some(format!("http://127.0.0.1:{}/projects/3", handle.port()).as_str())
    );
}

#[test]
fn replace_overwrites_every_field() {
    let server = TestServer::with_samples();
    let response = server.send_json(
        HttpMethod::Put,
        "/projects/1",
        r#"{"title":"Rewritten","description":"","technologies":["Rust"]}"#,
    );

    assert_eq!(response.status(), HttpStatusCode::Ok);
    let body = json(&server.get("/projects/1"));
    assert_eq!(body["title"], "Rewritten");
    assert_eq!(body["description"], "");
    assert_eq!(body["technologies"], serde_json::json!(["Rust"]));
    assert_eq!(body["url"], Value::Null);
}

#[test]
fn replace_missing_required_field_leaves_record_unchanged() {
    let server = TestServer::with_samples();
    let before = json(&server.get("/projects/1"));

    let response = server.send_json(
        HttpMethod::Put,
        "/projects/1",
        r#"{"title":"Rewritten","description":"no technologies"}"#,
    );
    assert_eq!(response.status(), HttpStatusCode::UnprocessableEntity);
    assert_eq!(json(&response)["detail"][0]["field"], "technologies");
    assert_eq!(json(&server.get("/projects/1")), before);
}

#[test]
fn patch_description_keeps_technologies() {
    let server = TestServer::with_samples();
    let response = server.send_json(
        HttpMethod::Patch,
        "/projects/2",
        r#"{"description":"A new partial description"}"#,
    );

    assert_eq!(response.status(), HttpStatusCode::Ok);
    let body = json(&response);
    assert_eq!(body["description"], "A new partial description");
    assert_eq!(body["title"], "Data Analysis Tool");
    assert_eq!(
        body["technologies"],
        serde_json::json!(["Python", "Pandas", "FastAPI"])
    );
    assert_eq!(body["url"], "https://github.com/example/data-tool");
}

#[test]
fn patch_null_url_clears_it() {
    let server = TestServer::with_samples();
    let response = server.send_json(HttpMethod::Patch, "/projects/1", r#"{"url":null}"#);

    assert_eq!(response.status(), HttpStatusCode::Ok);
    assert_eq!(json(&server.get("/projects/1"))["url"], Value::Null);
    assert_eq!(json(&server.get("/projects/1"))["title"], "Personal Website");
}

#[test]
fn patch_null_title_is_rejected() {
    let server = TestServer::with_samples();
    let response = server.send_json(HttpMethod::Patch, "/projects/1", r#"{"title":null}"#);
    assert_eq!(response.status(), HttpStatusCode::UnprocessableEntity);
    assert_eq!(json(&server.get("/projects/1"))["title"], "Personal Website");
}

#[test]
fn patch_with_wrongly_typed_field_leaves_record_unchanged() {
    let server = TestServer::with_samples();
    let before = json(&server.get("/projects/2"));

    let response = server.send_json(HttpMethod::Patch, "/projects/2", r#"{"technologies":"Rust"}"#);
    assert_eq!(response.status(), HttpStatusCode::UnprocessableEntity);
    let body = json(&response);
    assert_eq!(body["detail"].as_array().unwrap().len(), 1);
    assert_eq!(body["detail"][0]["field"], "technologies");
    assert_eq!(json(&server.get("/projects/2")), before);
}

#[test]
fn patch_unknown_project_is_not_found() {
    let server = TestServer::with_samples();
    let response = server.send_json(HttpMethod::Patch, "/projects/42", r#"{"title":"x"}"#);
    assert_eq!(response.status(), HttpStatusCode::NotFound);
    assert_eq!(json(&response)["detail"], "Project 42 not found");
}

#[test]
fn delete_twice_is_not_found() {
    let server = TestServer::with_samples();

    let first = server.send(HttpRequest::new(HttpMethod::Delete, "/projects/1"));
    assert_eq!(first.status(), HttpStatusCode::NoContent);
    assert!(first.body().is_empty());

    let second = server.send(HttpRequest::new(HttpMethod::Delete, "/projects/1"));
    assert_eq!(second.status(), HttpStatusCode::NotFound);

    assert_eq!(server.get("/projects/1").status(), HttpStatusCode::NotFound);
    let remaining = json(&server.get("/projects"));
    assert_eq!(remaining["items"].as_array().unwrap().len(), 1);
}

#[test]
fn deleted_ids_are_not_reused() {
    let server = TestServer::with_samples();
    let draft = r#"{"title":"T","description":"D","technologies":[]}"#;

    let created = json(&server.send_json(HttpMethod::Post, "/projects", draft));
    let id = created["id"].as_u64().unwrap();
    server.send(HttpRequest::new(
        HttpMethod::Delete,
        format!("/projects/{}", id),
    ));

    let next = json(&server.send_json(HttpMethod::Post, "/projects", draft));
    assert_eq!(next["id"].as_u64().unwrap(), id + 1);
}

#[test]
fn server_stops_answering_after_shutdown() {
    let server = TestServer::with_samples();
    server.handle.shutdown();
    let result = server.pal.simulate_request(
        server.handle.port(),
        HttpRequest::new(HttpMethod::Get, "/projects"),
    );
    assert!(result.is_err());
}
