//! Callsign lookup
//!
//! `GET /lookup?callsign=<call>&format=<html|json>&jsonp=<fn>`
//!
//! One point read per request, no mutation. JSON callers can ask for a
//! JSONP wrapper with `jsonp` (or its alias `callback`).

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use callsign_common::{normalize_callsign, Member};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::render;
use crate::AppState;

/// Set on JSON responses; the body alone cannot tell a miss from an empty record
pub const MEMBER_FOUND_HEADER: HeaderName = HeaderName::from_static("x-member-found");

/// Query parameters for lookup
#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub callsign: String,
    /// `json` selects JSON/JSONP; anything else renders HTML
    #[serde(default)]
    pub format: String,
    pub jsonp: Option<String>,
    pub callback: Option<String>,
}

impl LookupQuery {
    fn wants_json(&self) -> bool {
        self.format.trim().eq_ignore_ascii_case("json")
    }

    /// JSONP function name, if one was requested
    fn jsonp_function(&self) -> Option<&str> {
        self.jsonp
            .as_deref()
            .or(self.callback.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// GET /lookup
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Response> {
    let callsign = normalize_callsign(&query.callsign);
    let found = state.store.get(&callsign).await?;
    debug!(callsign = %callsign, found = found.is_some(), "Lookup");

    if !query.wants_json() {
        return Ok(match found {
            Some(member) => Html(render::lookup_page(&member)).into_response(),
            None => (StatusCode::NOT_FOUND, Html(render::NOT_FOUND_PAGE)).into_response(),
        });
    }

    let is_found = found.is_some();
    // A miss still answers with a zero-valued record
    let member = found.unwrap_or_default();
    json_response(&member, is_found, query.jsonp_function())
}

fn json_response(member: &Member, found: bool, jsonp: Option<&str>) -> ApiResult<Response> {
    let body = serde_json::to_string(member)
        .map_err(|e| ApiError::Internal(format!("Failed to encode member: {}", e)))?;
    let found_header = HeaderValue::from_static(if found { "true" } else { "false" });

    match jsonp {
        Some(function) => {
            if !is_valid_jsonp_function(function) {
                return Err(ApiError::BadRequest(format!(
                    "Invalid JSONP function name: {}",
                    function
                )));
            }
            Ok((
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("application/javascript")),
                    (MEMBER_FOUND_HEADER, found_header),
                ],
                format!("{}({});", function, body),
            )
                .into_response())
        }
        None => Ok((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (MEMBER_FOUND_HEADER, found_header),
            ],
            body,
        )
            .into_response()),
    }
}

/// Dotted JavaScript identifier path, e.g. `cb` or `app.handlers.member`
fn is_valid_jsonp_function(name: &str) -> bool {
    name.len() <= 128
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => chars
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
                _ => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonp_function_validation() {
        assert!(is_valid_jsonp_function("cb"));
        assert!(is_valid_jsonp_function("jQuery123_456"));
        assert!(is_valid_jsonp_function("app.handlers.$member"));

        assert!(!is_valid_jsonp_function(""));
        assert!(!is_valid_jsonp_function("1cb"));
        assert!(!is_valid_jsonp_function("alert(1);cb"));
        assert!(!is_valid_jsonp_function("a..b"));
        assert!(!is_valid_jsonp_function(&"a".repeat(200)));
    }

    #[test]
    fn test_format_and_jsonp_selection() {
        let query = LookupQuery {
            format: " JSON ".to_string(),
            callback: Some("cb".to_string()),
            ..Default::default()
        };
        assert!(query.wants_json());
        assert_eq!(query.jsonp_function(), Some("cb"));

        let query = LookupQuery {
            format: "html".to_string(),
            jsonp: Some("first".to_string()),
            callback: Some("second".to_string()),
            ..Default::default()
        };
        assert!(!query.wants_json());
        assert_eq!(query.jsonp_function(), Some("first"));
    }
}
