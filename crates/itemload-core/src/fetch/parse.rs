//! Reduce raw response header lines to the final response's status and type.

/// Status and `Content-Type` of the last response seen on a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the most recent status line, if any arrived.
    pub status: Option<u32>,
    /// `Content-Type` of that same response.
    pub content_type: Option<String>,
}

impl ResponseHead {
    /// Feeds one header line. A status line starts a new response, so headers
    /// from redirect hops never leak into the final one; returns true then.
    pub(crate) fn push_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        if let Some(status) = parse_status_line(line) {
            *self = ResponseHead {
                status: Some(status),
                content_type: None,
            };
            return true;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.trim().to_string());
            }
        }
        false
    }
}

/// Parses lines such as `HTTP/1.1 200 OK` or `HTTP/2 404`.
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
