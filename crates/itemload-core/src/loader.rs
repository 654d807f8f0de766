//! The content loader: fetch → classify → decode → validate → split.
//!
//! Every stage is a free function over its inputs. [`ContentLoader`] holds
//! only immutable settings, so one instance can serve concurrent callers.

use crate::config::LoaderConfig;
use crate::content_type::{classify, ContentKind};
use crate::error::{LoadError, LoadResult};
use crate::fetch::{self, FetchOptions};
use crate::items;
use crate::sheet;

/// Anything that turns a URL into a validated, ordered list of items.
pub trait ItemSource {
    fn get_content(&self, url: &str) -> LoadResult<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct ContentLoader {
    item_limit: usize,
    fetch: FetchOptions,
}

impl ContentLoader {
    pub fn new(item_limit: usize) -> Self {
        Self {
            item_limit,
            fetch: FetchOptions::default(),
        }
    }

    pub fn from_config(cfg: &LoaderConfig) -> Self {
        Self {
            item_limit: cfg.item_limit,
            fetch: cfg.fetch_options(),
        }
    }

    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn item_limit(&self) -> usize {
        self.item_limit
    }

    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch
    }
}

impl ItemSource for ContentLoader {
    fn get_content(&self, url: &str) -> LoadResult<Vec<String>> {
        let response = fetch::fetch(url, &self.fetch)?;
        let content_type = response.content_type.unwrap_or_default();
        let items = items_from_body(&content_type, &response.body, self.item_limit)?;
        tracing::debug!(url, count = items.len(), limit = self.item_limit, "content loaded");
        Ok(items)
    }
}

/// Turns a response body into the comma-joined content string according to
/// its `Content-Type`.
///
/// CSV bodies are used as-is; bytes that are not UTF-8 become U+FFFD.
pub fn decode_content(content_type: &str, body: &[u8]) -> LoadResult<String> {
    let kind = classify(content_type);
    tracing::debug!(%content_type, ?kind, bytes = body.len(), "decoding body");
    match kind {
        ContentKind::Csv => Ok(String::from_utf8_lossy(body).into_owned()),
        ContentKind::Spreadsheet => sheet::extract_text(body),
        ContentKind::Unsupported => Err(LoadError::UnsupportedType {
            content_type: content_type.to_string(),
        }),
    }
}

/// Decodes, validates and splits an already-fetched body; the offline half
/// of [`ContentLoader::get_content`].
pub fn items_from_body(
    content_type: &str,
    body: &[u8],
    item_limit: usize,
) -> LoadResult<Vec<String>> {
    let content = decode_content(content_type, body)?;
    items::validate(&content, item_limit)?;
    Ok(items::split_items(&content))
}
