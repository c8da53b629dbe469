//! Client for the Reader API: bookmarks, tags, articles and the current user.
//!
//! # Design
//! A `ReaderClient` owns one `Session` and checks it once, at construction.
//! Every call re-reads the shared configuration, fails with `ApiError::Config`
//! if the consumer key or secret is missing, and otherwise signs with the
//! consumer pair plus the session's token pair.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::config::ProcessConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::oauth::OAuthCredentials;
use crate::pipeline::{PipelineResponse, RequestOptions, RequestPipeline, ResponseBody};
use crate::session::Session;
use crate::types::{Article, Bookmark, BookmarkList, BookmarkQuery, BookmarkUpdate, Tag, User};

pub const READER_BASE_PATH: &str = "/rest/v1";

static BOOKMARK_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"bookmarks/(\d+)$").expect("BOOKMARK_LOCATION should compile - this is a bug")
});

/// Per-user client for the Reader API.
#[derive(Debug, Clone)]
pub struct ReaderClient {
    config: ProcessConfig,
    pipeline: RequestPipeline,
    session: Session,
}

impl ReaderClient {
    /// Fails with `ApiError::Validation` if the token or secret is empty.
    pub fn new(
        config: ProcessConfig,
        pipeline: RequestPipeline,
        session: Session,
    ) -> Result<Self, ApiError> {
        if !session.is_complete() {
            return Err(ApiError::Validation(
                "Reader clients must be initialized with an OAuth token and token secret"
                    .to_string(),
            ));
        }
        Ok(Self {
            config,
            pipeline,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<PipelineResponse, ApiError> {
        let config = self.config.current();
        let Some((consumer_key, consumer_secret)) = config.reader_credentials() else {
            warn!(path, "reader request attempted without reader credentials");
            return Err(ApiError::reader_credentials_missing());
        };

        let credentials = OAuthCredentials::consumer(consumer_key, consumer_secret).with_token(
            self.session.access_token(),
            self.session.access_token_secret(),
        );

        self.pipeline
            .request(
                method,
                &format!("{READER_BASE_PATH}{path}"),
                options.oauth(credentials),
            )
            .await
    }

    pub async fn user(&self) -> Result<User, ApiError> {
        self.request(HttpMethod::Get, "/users/_current", RequestOptions::new())
            .await?
            .decode()
    }

    /// List bookmarks. The Provider's `conditions` echo is dropped.
    pub async fn bookmarks(&self, query: &BookmarkQuery) -> Result<BookmarkList, ApiError> {
        let options = RequestOptions::new().query_pairs(query.to_pairs());
        let mut response = self
            .request(HttpMethod::Get, "/bookmarks", options)
            .await?;
        response.body = match response.body {
            ResponseBody::Json(value) => ResponseBody::Json(without_conditions(value)),
            other => other,
        };
        response.decode()
    }

    pub async fn bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.request(
            HttpMethod::Get,
            &format!("/bookmarks/{id}"),
            RequestOptions::new(),
        )
        .await?
        .decode()
    }

    /// Bookmark a URL and fetch the resulting bookmark.
    ///
    /// The Provider answers 202 for a new bookmark and 409 for one that
    /// already exists; both carry the bookmark's `Location`.
    pub async fn add_bookmark(&self, url: &str) -> Result<Bookmark, ApiError> {
        let options = RequestOptions::new().form(vec![("url".to_string(), url.to_string())]);
        let response = self
            .request(HttpMethod::Post, "/bookmarks", options)
            .await?;

        let id = bookmark_id_from_location(response.header("location"))?;
        self.bookmark(&id).await
    }

    pub async fn update_bookmark(
        &self,
        id: &str,
        update: &BookmarkUpdate,
    ) -> Result<Bookmark, ApiError> {
        let options = RequestOptions::new().form(update.to_form());
        self.request(HttpMethod::Post, &format!("/bookmarks/{id}"), options)
            .await?
            .decode()
    }

    pub async fn remove_bookmark(&self, id: &str) -> Result<bool, ApiError> {
        self.request(
            HttpMethod::Delete,
            &format!("/bookmarks/{id}"),
            RequestOptions::new(),
        )
        .await?;
        Ok(true)
    }

    pub async fn archive_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.update_bookmark(id, &BookmarkUpdate::archive(true)).await
    }

    pub async fn unarchive_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.update_bookmark(id, &BookmarkUpdate::archive(false)).await
    }

    pub async fn favourite_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.update_bookmark(id, &BookmarkUpdate::favorite(true)).await
    }

    pub async fn unfavourite_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.update_bookmark(id, &BookmarkUpdate::favorite(false)).await
    }

    /// Same as [`ReaderClient::favourite_bookmark`].
    pub async fn favorite_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.favourite_bookmark(id).await
    }

    /// Same as [`ReaderClient::unfavourite_bookmark`].
    pub async fn unfavorite_bookmark(&self, id: &str) -> Result<Bookmark, ApiError> {
        self.unfavourite_bookmark(id).await
    }

    /// All tags of the current user; `None` when the reply has no body.
    pub async fn user_tags(&self) -> Result<Option<Vec<Tag>>, ApiError> {
        let response = self
            .request(HttpMethod::Get, "/tags", RequestOptions::new())
            .await?;
        tag_list(response)
    }

    pub async fn tags(&self, bookmark_id: &str) -> Result<Option<Vec<Tag>>, ApiError> {
        let response = self
            .request(
                HttpMethod::Get,
                &format!("/bookmarks/{bookmark_id}/tags"),
                RequestOptions::new(),
            )
            .await?;
        tag_list(response)
    }

    /// Add tags to a bookmark and return the bookmark's resulting tags.
    pub async fn add_tags<S: AsRef<str>>(
        &self,
        bookmark_id: &str,
        tag_names: &[S],
    ) -> Result<Option<Vec<Tag>>, ApiError> {
        let joined = tag_names
            .iter()
            .map(|name| name.as_ref())
            .collect::<Vec<&str>>()
            .join(",");
        let options = RequestOptions::new().form(vec![("tags".to_string(), joined)]);
        let response = self
            .request(
                HttpMethod::Post,
                &format!("/bookmarks/{bookmark_id}/tags"),
                options,
            )
            .await?;
        tag_list(response)
    }

    pub async fn remove_tag(&self, bookmark_id: &str, tag_id: &str) -> Result<bool, ApiError> {
        self.request(
            HttpMethod::Delete,
            &format!("/bookmarks/{bookmark_id}/tags/{tag_id}"),
            RequestOptions::new(),
        )
        .await?;
        Ok(true)
    }

    pub async fn article(&self, id: &str) -> Result<Article, ApiError> {
        self.request(
            HttpMethod::Get,
            &format!("/articles/{id}"),
            RequestOptions::new(),
        )
        .await?
        .decode()
    }
}

fn without_conditions(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.remove("conditions");
            Value::Object(object)
        }
        other => other,
    }
}

fn bookmark_id_from_location(location: Option<&str>) -> Result<String, ApiError> {
    let location = location.ok_or_else(|| {
        ApiError::ResponseShape("bookmark creation response has no Location header".to_string())
    })?;
    BOOKMARK_LOCATION
        .captures(location)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| {
            ApiError::ResponseShape(format!(
                "cannot find a bookmark id in Location header {location:?}"
            ))
        })
}

fn tag_list(response: PipelineResponse) -> Result<Option<Vec<Tag>>, ApiError> {
    match response.body.into_json() {
        Some(Value::Object(mut envelope)) => match envelope.remove("tags") {
            Some(Value::Null) | None => Ok(None),
            Some(tags) => Ok(Some(serde_json::from_value(tags)?)),
        },
        _ => Ok(None),
    }
}
