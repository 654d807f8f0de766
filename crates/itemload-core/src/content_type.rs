//! Classify a `Content-Type` header value into the kind of body we can decode.

/// Header substrings treated as plain comma-separated text.
pub const CSV_TYPES: &[&str] = &["text/csv", "text/plain", "encoding/csv"];

/// Header substrings treated as a binary workbook.
pub const SPREADSHEET_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Csv,
    Spreadsheet,
    Unsupported,
}

/// Classifies a raw `Content-Type` value.
///
/// Matching is by case-sensitive substring, so parameters such as
/// `; charset=utf-8` are ignored. CSV patterns take precedence.
pub fn classify(content_type: &str) -> ContentKind {
    if CSV_TYPES.iter().any(|t| content_type.contains(t)) {
        ContentKind::Csv
    } else if SPREADSHEET_TYPES.iter().any(|t| content_type.contains(t)) {
        ContentKind::Spreadsheet
    } else {
        ContentKind::Unsupported
    }
}
