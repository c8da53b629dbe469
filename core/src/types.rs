//! Response and request shapes for the Readability API.
//!
//! # Design
//! Each response type names the fields the Provider documents and keeps
//! everything else in a flattened `extra` map, so documents survive a
//! decode/encode cycle unchanged apart from the removals the clients apply
//! on purpose. Identifiers arrive as either JSON numbers or strings and are
//! normalized to `String`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The authenticated Reader user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_joined: Option<String>,
    pub has_active_subscription: Option<bool>,
    pub email_into_address: Option<String>,
    pub kindle_email_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A saved bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_string_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_id")]
    pub read_percent: Option<String>,
    pub favorite: Option<bool>,
    pub archive: Option<bool>,
    pub date_added: Option<String>,
    pub date_updated: Option<String>,
    pub date_archived: Option<String>,
    pub date_favorited: Option<String>,
    pub date_opened: Option<String>,
    pub article_href: Option<String>,
    pub article: Option<Article>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Paging information attached to a bookmark listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookmarkListMeta {
    pub num_pages: Option<u64>,
    pub page: Option<u64>,
    pub item_count_total: Option<u64>,
    pub item_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of bookmarks. The Provider's `conditions` echo is never kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkList {
    #[serde(default)]
    pub meta: BookmarkListMeta,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub text: Option<String>,
    pub applied_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Article content, as returned by the Reader `/articles/{id}` endpoint and
/// the Parser `/parser` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    #[serde(default, deserialize_with = "optional_string_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub dek: Option<String>,
    pub date_published: Option<String>,
    pub lead_image_url: Option<String>,
    pub next_page_id: Option<String>,
    pub short_url: Option<String>,
    pub direction: Option<String>,
    pub word_count: Option<u64>,
    pub total_pages: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata for a short URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortUrlMeta {
    #[serde(default, deserialize_with = "optional_string_id")]
    pub id: Option<String>,
    pub url: Option<String>,
    pub rdd_url: Option<String>,
    pub full_url: Option<String>,
    pub article: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw envelope returned when creating a short URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortenResponse {
    pub meta: Option<ShortUrlMeta>,
    pub success: Option<bool>,
    pub messages: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for listing bookmarks. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkQuery {
    pub archive: Option<bool>,
    pub favorite: Option<bool>,
    pub domain: Option<String>,
    pub added_since: Option<String>,
    pub added_until: Option<String>,
    pub opened_since: Option<String>,
    pub opened_until: Option<String>,
    pub archived_since: Option<String>,
    pub archived_until: Option<String>,
    pub favorited_since: Option<String>,
    pub favorited_until: Option<String>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub tags: Vec<String>,
    /// Parameters not modelled above, sent as given.
    pub extra: Vec<(String, String)>,
}

impl BookmarkQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        };

        push("archive", self.archive.map(flag));
        push("favorite", self.favorite.map(flag));
        push("domain", self.domain.clone());
        push("added_since", self.added_since.clone());
        push("added_until", self.added_until.clone());
        push("opened_since", self.opened_since.clone());
        push("opened_until", self.opened_until.clone());
        push("archived_since", self.archived_since.clone());
        push("archived_until", self.archived_until.clone());
        push("favorited_since", self.favorited_since.clone());
        push("favorited_until", self.favorited_until.clone());
        push("updated_since", self.updated_since.clone());
        push("updated_until", self.updated_until.clone());
        push("order", self.order.clone());
        push("page", self.page.map(|p| p.to_string()));
        push("per_page", self.per_page.map(|p| p.to_string()));
        if !self.tags.is_empty() {
            push("tags", Some(self.tags.join(",")));
        }

        pairs.extend(self.extra.iter().cloned());
        pairs
    }
}

/// Partial bookmark update. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkUpdate {
    pub archive: Option<bool>,
    pub favorite: Option<bool>,
    pub read_percent: Option<f64>,
}

impl BookmarkUpdate {
    pub fn archive(archive: bool) -> Self {
        Self {
            archive: Some(archive),
            ..Self::default()
        }
    }

    pub fn favorite(favorite: bool) -> Self {
        Self {
            favorite: Some(favorite),
            ..Self::default()
        }
    }

    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = Vec::new();
        if let Some(archive) = self.archive {
            form.push(("archive".to_string(), flag(archive)));
        }
        if let Some(favorite) = self.favorite {
            form.push(("favorite".to_string(), flag(favorite)));
        }
        if let Some(read_percent) = self.read_percent {
            form.push(("read_percent".to_string(), read_percent.to_string()));
        }
        form
    }
}

fn flag(value: bool) -> String {
    let flag = if value { "1" } else { "0" };
    flag.to_string()
}

fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    optional_string_id(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or numeric id, found null"))
}

fn optional_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, found {other}"
        ))),
    }
}
