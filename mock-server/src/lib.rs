use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const USERNAME: &str = "jdoe";
pub const PASSWORD: &str = "secret";
pub const ACCESS_TOKEN: &str = "mock_access_token";
pub const ACCESS_TOKEN_SECRET: &str = "mock_access_token_secret";
pub const PARSER_TOKEN: &str = "mock_parser_token";
pub const MAX_TAGS_PER_BOOKMARK: usize = 5;

#[derive(Clone, Debug)]
pub struct StoredBookmark {
    pub id: u64,
    pub url: String,
    pub article_id: String,
    pub archive: bool,
    pub favorite: bool,
    pub read_percent: f64,
    pub tag_ids: Vec<u64>,
}

#[derive(Default, Debug)]
pub struct Store {
    pub bookmarks: BTreeMap<u64, StoredBookmark>,
    pub tags: BTreeMap<u64, String>,
    pub short_urls: BTreeMap<String, String>,
    next_bookmark_id: u64,
    next_tag_id: u64,
}

impl Store {
    fn tag_id(&mut self, text: &str) -> u64 {
        if let Some((id, _)) = self.tags.iter().find(|(_, t)| t.as_str() == text) {
            return *id;
        }
        self.next_tag_id += 1;
        self.tags.insert(self.next_tag_id, text.to_string());
        self.next_tag_id
    }

    fn tag_json(&self, id: u64) -> Value {
        let applied_count = self
            .bookmarks
            .values()
            .filter(|b| b.tag_ids.contains(&id))
            .count();
        json!({
            "id": id,
            "text": self.tags.get(&id).cloned().unwrap_or_default(),
            "applied_count": applied_count,
        })
    }

    fn bookmark_json(&self, bookmark: &StoredBookmark) -> Value {
        json!({
            "id": bookmark.id,
            "user_id": 1,
            "read_percent": format!("{:.2}", bookmark.read_percent),
            "favorite": bookmark.favorite,
            "archive": bookmark.archive,
            "article_href": format!("/api/rest/v1/articles/{}", bookmark.article_id),
            "article": article_json(&bookmark.article_id, &bookmark.url),
            "tags": bookmark.tag_ids.iter().map(|id| self.tag_json(*id)).collect::<Vec<_>>(),
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));

    let reader = Router::new()
        .route("/users/_current", get(current_user))
        .route("/bookmarks", get(list_bookmarks).post(add_bookmark))
        .route(
            "/bookmarks/{id}",
            get(get_bookmark).post(update_bookmark).delete(remove_bookmark),
        )
        .route("/bookmarks/{id}/tags", get(bookmark_tags).post(add_tags))
        .route("/bookmarks/{id}/tags/{tag_id}", delete(remove_tag))
        .route("/tags", get(user_tags))
        .route("/articles/{id}", get(get_article))
        .route_layer(middleware::from_fn(require_access_token));

    let xauth = Router::new()
        .route("/oauth/access_token/", get(access_token))
        .route_layer(middleware::from_fn(require_oauth_signature));

    let content = Router::new()
        .route("/parser", get(parse))
        .route("/confidence", get(confidence));

    let shortener = Router::new()
        .route("/urls", post(shorten))
        .route("/urls/{id}", get(short_url))
        .route("/r/{id}", get(follow_short_url));

    Router::new()
        .nest("/api/rest/v1", xauth.merge(reader))
        .nest("/api/content/v1", content)
        .nest("/api/shortener/v1", shortener)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn text(status: StatusCode, body: &str) -> Response {
    (status, body.to_string()).into_response()
}

fn not_found() -> Response {
    text(StatusCode::NOT_FOUND, "Not found.")
}

fn article_json(id: &str, url: &str) -> Value {
    json!({
        "id": id,
        "title": "An article",
        "url": url,
        "domain": url.split('/').nth(2).unwrap_or_default(),
        "author": "Rafi Kohan",
        "content": "<div class=\"article-text\">\n<p>I'm idling outside Diamante's, [snip] ...</p></div>",
        "excerpt": "I'm idling outside Diamante's",
        "word_count": 2892,
        "total_pages": 1,
        "direction": "ltr",
    })
}

fn authorization(request: &Request) -> &str {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn require_oauth_signature(request: Request, next: Next) -> Response {
    let auth = authorization(&request);
    if !auth.starts_with("OAuth ") || !auth.contains("oauth_signature=") {
        return text(StatusCode::UNAUTHORIZED, "Missing OAuth signature.");
    }
    next.run(request).await
}

async fn require_access_token(request: Request, next: Next) -> Response {
    let expected = format!("oauth_token=\"{ACCESS_TOKEN}\"");
    let auth = authorization(&request);
    if !auth.starts_with("OAuth ") || !auth.contains(&expected) {
        return text(StatusCode::UNAUTHORIZED, "Failed to authenticate.");
    }
    next.run(request).await
}

#[derive(Deserialize)]
pub struct XAuthQuery {
    pub x_auth_username: Option<String>,
    pub x_auth_password: Option<String>,
    pub x_auth_mode: Option<String>,
}

async fn access_token(Query(query): Query<XAuthQuery>) -> Response {
    let valid = query.x_auth_mode.as_deref() == Some("client_auth")
        && query.x_auth_username.as_deref() == Some(USERNAME)
        && query.x_auth_password.as_deref() == Some(PASSWORD);
    if !valid {
        return text(StatusCode::UNAUTHORIZED, "Invalid user credentials.");
    }
    let body = format!(
        "oauth_token={ACCESS_TOKEN}&oauth_token_secret={ACCESS_TOKEN_SECRET}&oauth_callback_confirmed=true"
    );
    text(StatusCode::OK, &body)
}

async fn current_user() -> Json<Value> {
    Json(json!({
        "username": USERNAME,
        "first_name": "Jane",
        "last_name": "Doe",
        "date_joined": "2010-10-29 20:34:11",
        "has_active_subscription": false,
        "email_into_address": "jdoe@inbox.readability.com",
        "kindle_email_address": null,
    }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub archive: Option<u8>,
    pub favorite: Option<u8>,
}

async fn list_bookmarks(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Value> {
    let store = db.read().await;
    let matching: Vec<&StoredBookmark> = store
        .bookmarks
        .values()
        .filter(|b| query.archive.map_or(true, |a| b.archive == (a == 1)))
        .filter(|b| query.favorite.map_or(true, |f| b.favorite == (f == 1)))
        .collect();

    let per_page = query.per_page.unwrap_or(20).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let items: Vec<Value> = matching
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|b| store.bookmark_json(b))
        .collect();

    Json(json!({
        "meta": {
            "num_pages": matching.len().div_ceil(per_page),
            "page": page,
            "item_count_total": matching.len(),
            "item_count": items.len(),
        },
        "bookmarks": items,
        "conditions": {
            "user": USERNAME,
            "page": page,
            "per_page": per_page,
        },
    }))
}

#[derive(Deserialize)]
pub struct UrlForm {
    pub url: Option<String>,
}

async fn add_bookmark(State(db): State<Db>, Form(form): Form<UrlForm>) -> Response {
    let Some(url) = form.url.filter(|u| !u.is_empty()) else {
        return text(StatusCode::BAD_REQUEST, "A url is required.");
    };

    let mut store = db.write().await;
    let existing = store.bookmarks.values().find(|b| b.url == url).map(|b| b.id);
    let (status, id) = match existing {
        Some(id) => (StatusCode::CONFLICT, id),
        None => {
            store.next_bookmark_id += 1;
            let id = store.next_bookmark_id;
            let article_id = Uuid::new_v4().simple().to_string()[..8].to_string();
            store.bookmarks.insert(
                id,
                StoredBookmark {
                    id,
                    url,
                    article_id,
                    archive: false,
                    favorite: false,
                    read_percent: 0.0,
                    tag_ids: Vec::new(),
                },
            );
            (StatusCode::ACCEPTED, id)
        }
    };

    let location = format!("/api/rest/v1/bookmarks/{id}");
    (status, [(header::LOCATION, location)]).into_response()
}

async fn get_bookmark(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let store = db.read().await;
    match store.bookmarks.get(&id) {
        Some(bookmark) => Json(store.bookmark_json(bookmark)).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
pub struct UpdateForm {
    pub archive: Option<u8>,
    pub favorite: Option<u8>,
    pub read_percent: Option<f64>,
}

async fn update_bookmark(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Form(form): Form<UpdateForm>,
) -> Response {
    let mut store = db.write().await;
    let Some(bookmark) = store.bookmarks.get_mut(&id) else {
        return not_found();
    };
    if let Some(archive) = form.archive {
        bookmark.archive = archive == 1;
    }
    if let Some(favorite) = form.favorite {
        bookmark.favorite = favorite == 1;
    }
    if let Some(read_percent) = form.read_percent {
        bookmark.read_percent = read_percent;
    }
    let bookmark = bookmark.clone();
    Json(store.bookmark_json(&bookmark)).into_response()
}

async fn remove_bookmark(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let mut store = db.write().await;
    match store.bookmarks.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

async fn bookmark_tags(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let store = db.read().await;
    let Some(bookmark) = store.bookmarks.get(&id) else {
        return not_found();
    };
    let tags: Vec<Value> = bookmark.tag_ids.iter().map(|t| store.tag_json(*t)).collect();
    Json(json!({ "tags": tags })).into_response()
}

#[derive(Deserialize)]
pub struct TagsForm {
    pub tags: String,
}

async fn add_tags(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Form(form): Form<TagsForm>,
) -> Response {
    let mut store = db.write().await;
    let Some(current) = store.bookmarks.get(&id).map(|b| b.tag_ids.clone()) else {
        return not_found();
    };

    let mut tag_ids = current;
    for name in form.tags.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let tag_id = store.tag_id(name);
        if tag_ids.contains(&tag_id) {
            continue;
        }
        if tag_ids.len() >= MAX_TAGS_PER_BOOKMARK {
            return text(
                StatusCode::FORBIDDEN,
                "No more Tags can be added to this Bookmark.",
            );
        }
        tag_ids.push(tag_id);
    }

    if let Some(bookmark) = store.bookmarks.get_mut(&id) {
        bookmark.tag_ids = tag_ids.clone();
    }
    let tags: Vec<Value> = tag_ids.iter().map(|t| store.tag_json(*t)).collect();
    (StatusCode::ACCEPTED, Json(json!({ "tags": tags }))).into_response()
}

async fn remove_tag(State(db): State<Db>, Path((id, tag_id)): Path<(u64, u64)>) -> Response {
    let mut store = db.write().await;
    let Some(bookmark) = store.bookmarks.get_mut(&id) else {
        return not_found();
    };
    let before = bookmark.tag_ids.len();
    bookmark.tag_ids.retain(|t| *t != tag_id);
    if bookmark.tag_ids.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn user_tags(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let tags: Vec<Value> = store.tags.keys().map(|t| store.tag_json(*t)).collect();
    Json(json!({ "tags": tags }))
}

async fn get_article(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.bookmarks.values().find(|b| b.article_id == id) {
        Some(bookmark) => Json(article_json(&bookmark.article_id, &bookmark.url)).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
pub struct ContentQuery {
    pub url: Option<String>,
    pub token: Option<String>,
}

fn check_parser_token(query: &ContentQuery) -> Result<String, Response> {
    if query.token.as_deref() != Some(PARSER_TOKEN) {
        return Err(text(StatusCode::UNAUTHORIZED, "Failed to authenticate."));
    }
    query
        .url
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| text(StatusCode::BAD_REQUEST, "A url is required."))
}

async fn parse(Query(query): Query<ContentQuery>) -> Response {
    let url = match check_parser_token(&query) {
        Ok(url) => url,
        Err(response) => return response,
    };
    if url.contains("cannot_be_parsed") {
        return text(
            StatusCode::BAD_REQUEST,
            "Could not parse the content for this article.",
        );
    }
    Json(article_json("parsed", &url)).into_response()
}

async fn confidence(Query(query): Query<ContentQuery>) -> Response {
    let url = match check_parser_token(&query) {
        Ok(url) => url,
        Err(response) => return response,
    };
    let confidence = if url.contains("cannot_be_parsed") { 0.1 } else { 0.7 };
    Json(json!({ "url": url, "confidence": confidence })).into_response()
}

fn short_url_meta(id: &str, url: &str) -> Value {
    json!({
        "id": id,
        "url": format!("/api/shortener/v1/urls/{id}"),
        "rdd_url": format!("http://rdd.me/{id}"),
        "full_url": url,
    })
}

async fn shorten(State(db): State<Db>, Form(form): Form<UrlForm>) -> Response {
    let Some(url) = form.url.filter(|u| !u.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "messages": ["A url is required."] })),
        )
            .into_response();
    };

    let id = Uuid::new_v4().simple().to_string()[..8].to_string();
    db.write().await.short_urls.insert(id.clone(), url.clone());

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "meta": short_url_meta(&id, &url),
            "messages": [],
            "success": true,
        })),
    )
        .into_response()
}

async fn short_url(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.short_urls.get(&id) {
        Some(url) => Json(json!({
            "meta": short_url_meta(&id, url),
            "messages": [],
            "success": true,
        }))
        .into_response(),
        None => not_found(),
    }
}

async fn follow_short_url(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.short_urls.get(&id) {
        Some(url) => (StatusCode::FOUND, [(header::LOCATION, url.clone())]).into_response(),
        None => not_found(),
    }
}
