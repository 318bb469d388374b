//! The default reqwest transport against a mock HTTP server.

mod integration;

use integration::mock_server::MockServerFixture;
use lib_http::{
    CallArgs, ClientError, EndpointDefinition, ErrorKind, HttpClient, HttpTransport, ParamBinding,
    ParamKind,
};
use mockito::Matcher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct NewUser {
    name: String,
}

#[tokio::test]
async fn test_get_with_path_query_and_headers() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/v1/users/7")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("fields".into(), "name".into()),
            Matcher::UrlEncoded("q".into(), "ada lovelace".into()),
        ]))
        .match_header("x-api-key", "k-123")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"name":"ada"}"#)
        .create_async()
        .await;

    let client = fixture
        .builder()
        .json::<User>()
        .default_header("Accept", "application/json")
        .endpoint(
            EndpointDefinition::get("user", "/users/{id}")
                .param(ParamBinding::path("id").kind(ParamKind::Integer))
                .param(ParamBinding::query("fields"))
                .returns::<User>(),
        )
        .build()
        .unwrap();

    let result = client
        .execute::<User>(
            "user",
            CallArgs::new()
                .path("id", 7)
                .query("fields", "name")
                .query("q", "ada lovelace")
                .header("X-Api-Key", "k-123"),
        )
        .await
        .unwrap();

    assert_eq!(result.value, User { id: 7, name: "ada".into() });
    assert_eq!(result.headers.get("Content-Type"), Some("application/json"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_json_body() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/v1/users")
        .match_header("content-type", "application/json; charset=utf-8")
        .match_body(Matcher::Json(json!({"name": "grace"})))
        .with_status(201)
        .with_body(r#"{"id":2,"name":"grace"}"#)
        .create_async()
        .await;

    let client = fixture
        .builder()
        .json::<User>()
        .json::<NewUser>()
        .endpoint(
            EndpointDefinition::post("create", "/users")
                .body::<NewUser>()
                .returns::<User>(),
        )
        .build()
        .unwrap();

    let created = client
        .execute::<User>("create", CallArgs::new().body(NewUser { name: "grace".into() }))
        .await
        .unwrap();
    assert_eq!(created.status, 201);
    assert_eq!(created.value.id, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_maps_to_http_error() {
    let mut fixture = MockServerFixture::new().await;
    let _missing = fixture
        .server
        .mock("GET", "/v1/things/x")
        .with_status(404)
        .with_body(r#"{"error":"not found"}"#)
        .create_async()
        .await;
    let _empty = fixture
        .server
        .mock("GET", "/v1/things/y")
        .with_status(503)
        .create_async()
        .await;

    let client = fixture
        .client(vec![EndpointDefinition::get("thing", "/things/{id}").path_params_from_template()])
        .unwrap();

    let err = client
        .execute::<Value>("thing", CallArgs::new().path("id", "x"))
        .await
        .unwrap_err();
    match &err {
        ClientError::Http { status, body, .. } => {
            assert_eq!(*status, 404);
            assert_eq!(body.downcast_ref::<Value>(), Some(&json!({"error": "not found"})));
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    assert!(!err.is_retryable());

    let err = client
        .execute::<Value>("thing", CallArgs::new().path("id", "y"))
        .await
        .unwrap_err();
    match &err {
        ClientError::Http { status, body, .. } => {
            assert_eq!(*status, 503);
            assert!(body.is_empty());
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = HttpClient::builder()
        .base_url("http://127.0.0.1:1/")
        .endpoint(EndpointDefinition::get("ping", "/ping"))
        .transport(HttpTransport::new().unwrap())
        .build()
        .unwrap();

    let err = client
        .execute::<Value>("ping", CallArgs::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_repeated_response_headers_are_kept() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("GET", "/v1/session")
        .with_status(200)
        .with_header("set-cookie", "a=1")
        .with_header("set-cookie", "b=2")
        .with_body("{}")
        .create_async()
        .await;

    let client = fixture
        .client(vec![EndpointDefinition::get("session", "/session")])
        .unwrap();
    let result = client
        .execute::<Value>("session", CallArgs::new())
        .await
        .unwrap();

    let cookies: Vec<&str> = result.headers.get_all("Set-Cookie").collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
}
