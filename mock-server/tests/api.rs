use axum::{
    http::{self, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, ACCESS_TOKEN, PARSER_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

const SIGNED: &str = "OAuth oauth_consumer_key=\"k\", oauth_signature=\"sig\"";

fn reader_auth() -> String {
    format!("OAuth oauth_consumer_key=\"k\", oauth_token=\"{ACCESS_TOKEN}\", oauth_signature=\"sig\"")
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

fn reader_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, reader_auth())
        .body(String::new())
        .unwrap()
}

fn reader_form(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, reader_auth())
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, request: Request<String>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- xauth ---

#[tokio::test]
async fn xauth_returns_form_encoded_tokens() {
    let resp = send(
        &app(),
        Request::builder()
            .uri("/api/rest/v1/oauth/access_token/?x_auth_username=jdoe&x_auth_password=secret&x_auth_mode=client_auth")
            .header(http::header::AUTHORIZATION, SIGNED)
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(&format!("oauth_token={ACCESS_TOKEN}")));
    assert!(body.contains("oauth_callback_confirmed=true"));
}

#[tokio::test]
async fn xauth_rejects_bad_password() {
    let resp = send(
        &app(),
        Request::builder()
            .uri("/api/rest/v1/oauth/access_token/?x_auth_username=jdoe&x_auth_password=nope&x_auth_mode=client_auth")
            .header(http::header::AUTHORIZATION, SIGNED)
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Invalid user credentials.");
}

#[tokio::test]
async fn xauth_requires_signature() {
    let resp = send(
        &app(),
        Request::builder()
            .uri("/api/rest/v1/oauth/access_token/?x_auth_username=jdoe&x_auth_password=secret&x_auth_mode=client_auth")
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- reader ---

#[tokio::test]
async fn reader_routes_require_access_token() {
    let resp = send(
        &app(),
        Request::builder()
            .uri("/api/rest/v1/users/_current")
            .header(http::header::AUTHORIZATION, SIGNED)
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Failed to authenticate.");
}

#[tokio::test]
async fn current_user() {
    let resp = send(&app(), reader_request("GET", "/api/rest/v1/users/_current")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["username"], "jdoe");
}

#[tokio::test]
async fn missing_bookmark_is_404() {
    let resp = send(&app(), reader_request("GET", "/api/rest/v1/bookmarks/12345")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "Not found.");
}

#[tokio::test]
async fn bookmark_lifecycle() {
    let app = app();

    // create
    let resp = send(
        &app,
        reader_form("POST", "/api/rest/v1/bookmarks", "url=http%3A%2F%2Fexample.com%2Fa"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let location = resp.headers()[http::header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/api/rest/v1/bookmarks/1");

    // duplicate points at the same bookmark
    let resp = send(
        &app,
        reader_form("POST", "/api/rest/v1/bookmarks", "url=http%3A%2F%2Fexample.com%2Fa"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(resp.headers()[http::header::LOCATION], location.as_str());

    // list carries conditions
    let resp = send(&app, reader_request("GET", "/api/rest/v1/bookmarks")).await;
    let list = body_json(resp).await;
    assert_eq!(list["meta"]["item_count_total"], 1);
    assert_eq!(list["bookmarks"][0]["id"], 1);
    assert!(list.get("conditions").is_some());

    // archive
    let resp = send(&app, reader_form("POST", "/api/rest/v1/bookmarks/1", "archive=1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["archive"], true);

    // filter on archive
    let resp = send(&app, reader_request("GET", "/api/rest/v1/bookmarks?archive=0")).await;
    assert_eq!(body_json(resp).await["meta"]["item_count_total"], 0);

    // tags
    let resp = send(
        &app,
        reader_form("POST", "/api/rest/v1/bookmarks/1/tags", "tags=one%2Ctwo"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let tags = body_json(resp).await;
    assert_eq!(tags["tags"].as_array().unwrap().len(), 2);
    let tag_id = tags["tags"][0]["id"].as_u64().unwrap();

    let resp = send(
        &app,
        reader_request("DELETE", &format!("/api/rest/v1/bookmarks/1/tags/{tag_id}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, reader_request("GET", "/api/rest/v1/bookmarks/1/tags")).await;
    assert_eq!(body_json(resp).await["tags"].as_array().unwrap().len(), 1);

    // article
    let resp = send(&app, reader_request("GET", "/api/rest/v1/bookmarks/1")).await;
    let article_id = body_json(resp).await["article"]["id"].as_str().unwrap().to_string();
    let resp = send(
        &app,
        reader_request("GET", &format!("/api/rest/v1/articles/{article_id}")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["url"], "http://example.com/a");

    // delete
    let resp = send(&app, reader_request("DELETE", "/api/rest/v1/bookmarks/1")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, reader_request("GET", "/api/rest/v1/bookmarks/1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tag_limit_is_enforced() {
    let app = app();
    send(&app, reader_form("POST", "/api/rest/v1/bookmarks", "url=http%3A%2F%2Fx.y")).await;

    let resp = send(
        &app,
        reader_form("POST", "/api/rest/v1/bookmarks/1/tags", "tags=a%2Cb%2Cc%2Cd%2Ce%2Cf"),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(resp).await,
        "No more Tags can be added to this Bookmark."
    );
}

// --- parser ---

#[tokio::test]
async fn parser_requires_token() {
    let resp = send(
        &app(),
        Request::builder()
            .uri("/api/content/v1/parser?url=http%3A%2F%2Fx.y%2Fa")
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn parser_and_confidence() {
    let app = app();
    let resp = send(
        &app,
        Request::builder()
            .uri(format!("/api/content/v1/parser?url=http%3A%2F%2Fx.y%2Fa&token={PARSER_TOKEN}"))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["author"], "Rafi Kohan");

    let resp = send(
        &app,
        Request::builder()
            .uri(format!("/api/content/v1/confidence?url=http%3A%2F%2Fx.y%2Fa&token={PARSER_TOKEN}"))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(body_json(resp).await["confidence"], 0.7);

    let resp = send(
        &app,
        Request::builder()
            .uri(format!(
                "/api/content/v1/parser?url=http%3A%2F%2Fx.y%2Fcannot_be_parsed&token={PARSER_TOKEN}"
            ))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- shortener ---

#[tokio::test]
async fn shorten_then_lookup() {
    let app = app();
    let resp = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/shortener/v1/urls")
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("url=http%3A%2F%2Fexample.com".to_string())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let created = body_json(resp).await;
    let id = created["meta"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["meta"]["rdd_url"], format!("http://rdd.me/{id}"));

    let resp = send(
        &app,
        Request::builder()
            .uri(format!("/api/shortener/v1/urls/{id}"))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["meta"]["full_url"], "http://example.com");
}

#[tokio::test]
async fn short_url_redirects_to_full_url() {
    let app = app();
    let resp = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/shortener/v1/urls")
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("url=http%3A%2F%2Fexample.com%2Flong".to_string())
            .unwrap(),
    )
    .await;
    let id = body_json(resp).await["meta"]["id"].as_str().unwrap().to_string();

    let resp = send(
        &app,
        Request::builder()
            .uri(format!("/api/shortener/v1/r/{id}"))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "http://example.com/long");
}

#[tokio::test]
async fn shorten_without_url_reports_messages() {
    let resp = send(
        &app(),
        Request::builder()
            .method("POST")
            .uri("/api/shortener/v1/urls")
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["messages"][0], "A url is required.");
}
