//! HTTP response framing.
//!
//! The transfer utility returns status line, headers, and body as one
//! text blob (`curl -i`). This module splits that blob back apart. The
//! header/body boundary is whichever of `\r\n\r\n` or `\n\n` occurs
//! earliest, matching the mixed line endings curl emits across protocol
//! versions.

use std::collections::HashMap;

// ============================================================================
// Raw Response
// ============================================================================

/// A framed HTTP response: status line, headers, body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// The HTTP status line, e.g. `HTTP/2 200`.
    pub status_line: String,
    /// Headers with lowercased keys.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: String,
}

impl RawResponse {
    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Returns true if the status line signals an auth failure (401/403).
    pub fn is_auth_error(&self) -> bool {
        self.status_line.contains("401") || self.status_line.contains("403")
    }
}

/// Splits a raw response blob into status line, header map, and body.
///
/// Returns `None` when the text is empty or no header/body boundary
/// exists; malformed input never panics.
pub fn parse_response(raw: &str) -> Option<RawResponse> {
    let crlf_pos = raw.find("\r\n\r\n");
    let lf_pos = raw.find("\n\n");

    // Whichever separator appears first in the text wins.
    let (boundary, separator_len) = match (crlf_pos, lf_pos) {
        (Some(crlf), Some(lf)) if crlf < lf => (crlf, 4),
        (Some(crlf), None) => (crlf, 4),
        (_, Some(lf)) => (lf, 2),
        (None, None) => return None,
    };

    let head = &raw[..boundary];
    let body = raw[boundary + separator_len..].to_string();

    let mut lines = head.lines();
    let status_line = lines.next()?.to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Some(RawResponse {
        status_line,
        headers,
        body,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crlf_response() {
        let raw = "HTTP/2 200\r\nContent-Type: application/json\r\nLink: </next>; rel=\"next\"\r\n\r\n{\"tags\":[]}";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status_line, "HTTP/2 200");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("Link"), Some("</next>; rel=\"next\""));
        assert_eq!(response.body, "{\"tags\":[]}");
    }

    #[test]
    fn test_parse_lf_response() {
        let raw = "HTTP/1.1 200 OK\nContent-Length: 2\n\n{}";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status_line, "HTTP/1.1 200 OK");
        assert_eq!(response.header("content-length"), Some("2"));
        assert_eq!(response.body, "{}");
    }

    #[test]
    fn test_earliest_boundary_wins() {
        // An LF boundary inside the body must not trump the earlier CRLF
        // header boundary, and vice versa.
        let raw = "HTTP/2 200\r\nA: 1\r\n\r\nline1\n\nline2";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.body, "line1\n\nline2");

        let raw = "HTTP/1.1 200\nA: 1\n\nbody\r\n\r\ntrailer";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.body, "body\r\n\r\ntrailer");
    }

    #[test]
    fn test_header_keys_are_lowercased() {
        let raw = "HTTP/2 200\r\nLINK: </n>; rel=\"next\"\r\n\r\nx";
        let response = parse_response(raw).unwrap();
        assert!(response.headers.contains_key("link"));
        assert_eq!(response.header("LiNk"), Some("</n>; rel=\"next\""));
    }

    #[test]
    fn test_no_boundary_is_none() {
        assert!(parse_response("").is_none());
        assert!(parse_response("HTTP/2 200\r\nA: 1\r\n").is_none());
        assert!(parse_response("plain text with no separator").is_none());
    }

    #[test]
    fn test_lines_without_colon_are_skipped() {
        let raw = "HTTP/2 200\r\ngarbage line\r\nOk: yes\r\n\r\nb";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.header("ok"), Some("yes"));
    }

    #[test]
    fn test_auth_error_detection() {
        let raw = "HTTP/2 401\r\n\r\n";
        assert!(parse_response(raw).unwrap().is_auth_error());
        let raw = "HTTP/2 403\r\n\r\n";
        assert!(parse_response(raw).unwrap().is_auth_error());
        let raw = "HTTP/2 200\r\n\r\n";
        assert!(!parse_response(raw).unwrap().is_auth_error());
    }

    #[test]
    fn test_empty_body_after_boundary() {
        let response = parse_response("HTTP/2 204\r\n\r\n").unwrap();
        assert_eq!(response.body, "");
        assert!(response.headers.is_empty());
    }
}
