//! Decides whether an HTTP reply is usable tracking JSON.
//!
//! The proxy and the client run the same rules, differing only in which
//! JSON fields they read an error message from.

use serde_json::Value;

use crate::error::{TrackingError, UpstreamDetail};
use crate::transport::RawResponse;

/// Markers found in Cloudflare interstitial pages
pub const CHALLENGE_MARKERS: [&str; 3] = [
    "Just a moment",
    "cf-browser-verification",
    "challenge-platform",
];

/// Maximum number of characters of a body copied into an error
pub const SNIPPET_LEN: usize = 200;

/// Error message fields read from upstream JSON error bodies
pub const UPSTREAM_DETAIL_FIELDS: &[&str] = &["message"];

/// Error message fields read from the proxy's own error envelope
pub const PROXY_DETAIL_FIELDS: &[&str] = &["detail", "message"];

pub fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/json"))
}

pub fn is_challenge_page(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// First `SNIPPET_LEN` characters of `body`, cut on a char boundary
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_LEN).collect()
}

/// Classify a reply, returning the parsed JSON body on success.
pub fn classify(response: &RawResponse, detail_fields: &[&str]) -> Result<Value, TrackingError> {
    let json = is_json(response.content_type.as_deref());

    if !response.is_success() {
        let detail = if json {
            serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|body| message_field(&body, detail_fields))
                .map(UpstreamDetail::Message)
                .unwrap_or_else(|| UpstreamDetail::StatusText(response.reason.clone()))
        } else {
            if is_challenge_page(&response.body) {
                return Err(TrackingError::BotProtection);
            }
            UpstreamDetail::NonJson(snippet(&response.body))
        };

        return Err(TrackingError::Upstream {
            status: response.status,
            detail,
        });
    }

    if !json {
        if is_challenge_page(&response.body) {
            return Err(TrackingError::BotProtection);
        }
        return Err(TrackingError::InvalidResponse {
            detail: format!("Expected JSON but received: {}", snippet(&response.body)),
        });
    }

    serde_json::from_str(&response.body).map_err(|e| TrackingError::InvalidResponse {
        detail: format!("Malformed JSON body: {e}"),
    })
}

fn message_field(body: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status,
            reason: match status {
                200 => "OK",
                403 => "Forbidden",
                404 => "Not Found",
                _ => "Internal Server Error",
            }
            .to_string(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn json_detection_uses_substring_match() {
        assert!(is_json(Some("application/json; charset=utf-8")));
        assert!(!is_json(Some("text/html")));
        assert!(!is_json(None));
    }

    #[test]
    fn success_json_is_returned_unchanged() {
        let body = json!({"data": {"status": "Delivered"}});
        let resp = response(200, Some("application/json"), &body.to_string());
        assert_eq!(classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap(), body);
    }

    #[test]
    fn error_json_uses_message_field() {
        let resp = response(404, Some("application/json"), r#"{"message":"not found"}"#);
        let err = classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap_err();
        assert_eq!(
            err,
            TrackingError::Upstream {
                status: 404,
                detail: UpstreamDetail::Message("not found".to_string()),
            }
        );
    }

    #[test]
    fn proxy_fields_prefer_detail_over_message() {
        let resp = response(
            404,
            Some("application/json"),
            r#"{"error":"Failed to fetch tracking data","detail":"resi not found","message":"x"}"#,
        );
        let err = classify(&resp, PROXY_DETAIL_FIELDS).unwrap_err();
        assert_eq!(err.to_string(), "resi not found");
    }

    #[test]
    fn unparseable_error_json_falls_back_to_status_text() {
        let resp = response(500, Some("application/json"), "{oops");
        let err = classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap_err();
        assert_eq!(
            err,
            TrackingError::Upstream {
                status: 500,
                detail: UpstreamDetail::StatusText("Internal Server Error".to_string()),
            }
        );
    }

    #[test]
    fn challenge_page_is_detected_on_any_status() {
        let page = "<html><title>Just a moment...</title></html>";
        for status in [200, 403, 503] {
            let resp = response(status, Some("text/html"), page);
            assert_eq!(
                classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap_err(),
                TrackingError::BotProtection
            );
        }
    }

    #[test]
    fn non_json_error_body_is_truncated() {
        let body = "x".repeat(500);
        let resp = response(502, Some("text/plain"), &body);
        match classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap_err() {
            TrackingError::Upstream {
                status: 502,
                detail: UpstreamDetail::NonJson(snippet),
            } => assert_eq!(snippet.len(), SNIPPET_LEN),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn success_without_json_is_invalid_response() {
        let resp = response(200, Some("text/html"), "<p>maintenance</p>");
        let err = classify(&resp, UPSTREAM_DETAIL_FIELDS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response format. Expected JSON but received: <p>maintenance</p>"
        );
    }

    #[test]
    fn malformed_success_json_is_invalid_response() {
        let resp = response(200, Some("application/json"), "not json");
        assert!(matches!(
            classify(&resp, UPSTREAM_DETAIL_FIELDS),
            Err(TrackingError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "é".repeat(300);
        let cut = snippet(&body);
        assert_eq!(cut.chars().count(), SNIPPET_LEN);
    }
}
