//! Item counting, bounds validation and splitting of a content string.

use crate::error::{LoadError, LoadResult};

/// Number of comma-delimited items in `content`.
///
/// Whitespace-only content counts as zero items; any non-whitespace text
/// without a comma counts as one; otherwise commas + 1.
pub fn count_items(content: &str) -> usize {
    let commas = content.matches(',').count();
    if commas > 0 {
        return commas + 1;
    }
    if content.trim().is_empty() {
        0
    } else {
        1
    }
}

/// Checks `content` against the item bounds and returns its item count.
///
/// A successful result is always in `2..=limit`.
pub fn validate(content: &str, limit: usize) -> LoadResult<usize> {
    if content.is_empty() {
        return Err(LoadError::EmptyContent);
    }
    let count = count_items(content);
    if count > limit {
        return Err(LoadError::TooManyItems { count, limit });
    }
    if count <= 1 {
        return Err(LoadError::TooFewItems { count });
    }
    Ok(count)
}

/// Splits on every comma. Items are not trimmed and commas cannot be escaped.
pub fn split_items(content: &str) -> Vec<String> {
    content.split(',').map(str::to_string).collect()
}
