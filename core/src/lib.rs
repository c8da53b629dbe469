//! Asynchronous client for the Readability API.
//!
//! # Overview
//! Four sub-APIs share one request path: XAuth (`auth`), the Reader API
//! (`reader`), the Parser API (`parser`) and the URL Shortener (`shortener`).
//! Each sub-client builds a path and parameters, checks the credentials it
//! needs in the shared `ProcessConfig`, and hands the call to the
//! `RequestPipeline`, which signs, sends, decodes and maps errors.
//!
//! # Design
//! - The pipeline describes requests as plain data and executes them through
//!   a `Transport` (host-does-IO pattern), so tests can swap in a scripted
//!   transport and production uses `ReqwestTransport`.
//! - Configuration is an explicit handle passed to every client, never a
//!   hidden global.
//! - No retries, caching or rate limiting: each failure reaches the caller
//!   on first occurrence.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod session;
pub mod shortener;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{xauth, XAuthTokens};
pub use client::Readability;
pub use config::{Config, ConfigOptions, ProcessConfig};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use oauth::OAuthCredentials;
pub use parser::ParserClient;
pub use pipeline::{PipelineResponse, RequestOptions, RequestPipeline, ResponseBody};
pub use reader::ReaderClient;
pub use session::Session;
pub use shortener::{Shortened, ShortenerClient};
pub use types::{
    Article, Bookmark, BookmarkList, BookmarkListMeta, BookmarkQuery, BookmarkUpdate,
    ShortUrlMeta, ShortenResponse, Tag, User,
};
