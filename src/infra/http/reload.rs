use axum::{
    Json,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{
    application::{error::ErrorReport, reload::ReloadSummary},
    config::{ReloadEnvironment, ReloadSettings},
};

use super::HttpState;

pub const RELOAD_TOKEN_HEADER: &str = "x-reload-token";

/// Decides whether a presented token may trigger a reload.
#[derive(Clone)]
pub struct ReloadAuthorizer {
    environment: ReloadEnvironment,
    token_digest: Option<Vec<u8>>,
}

impl ReloadAuthorizer {
    pub fn new(environment: ReloadEnvironment, token: Option<&str>) -> Self {
        Self {
            environment,
            token_digest: token.map(hash_token),
        }
    }

    pub fn from_settings(settings: &ReloadSettings) -> Self {
        Self::new(settings.environment, settings.token.as_deref())
    }

    /// `dev` always allows. Otherwise the presented token must match the
    /// configured one, and no configured token refuses everything.
    pub fn is_authorized(&self, presented: Option<&str>) -> bool {
        if self.environment == ReloadEnvironment::Dev {
            return true;
        }
        let (Some(expected), Some(presented)) = (self.token_digest.as_ref(), presented) else {
            return false;
        };
        expected.ct_eq(&hash_token(presented)).unwrap_u8() == 1
    }
}

fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// First `token` value in the query string. Repeated keys never reject
/// the request.
fn query_token(raw: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(raw?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    status: &'static str,
    reloaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ReloadResponse {
    fn ok(summary: ReloadSummary) -> Self {
        Self {
            status: "ok",
            reloaded: summary.loaded,
            failed: Some(summary.failed),
            message: None,
        }
    }

    fn forbidden() -> Self {
        Self {
            status: "forbidden",
            reloaded: 0,
            failed: None,
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error",
            reloaded: 0,
            failed: None,
            message: Some(message),
        }
    }
}

pub(super) async fn reload_content(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let presented = headers
        .get(RELOAD_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| query_token(query.as_deref()));

    if !state.authorizer.is_authorized(presented.as_deref()) {
        let status = StatusCode::FORBIDDEN;
        let mut response = (status, Json(ReloadResponse::forbidden())).into_response();
        ErrorReport::from_message(
            "infra::http::reload_content",
            status,
            "reload token missing or rejected",
        )
        .attach(&mut response);
        return response;
    }

    match state.reload.reload().await {
        Ok(summary) => (StatusCode::OK, Json(ReloadResponse::ok(summary))).into_response(),
        Err(err) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let mut response =
                (status, Json(ReloadResponse::error(err.to_string()))).into_response();
            ErrorReport::from_error("infra::http::reload_content", status, &err)
                .attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_environment_always_allows() {
        let authorizer = ReloadAuthorizer::new(ReloadEnvironment::Dev, None);
        assert!(authorizer.is_authorized(None));
        assert!(authorizer.is_authorized(Some("anything")));
    }

    #[test]
    fn prod_requires_matching_token() {
        let authorizer = ReloadAuthorizer::new(ReloadEnvironment::Prod, Some("s3cret"));
        assert!(authorizer.is_authorized(Some("s3cret")));
        assert!(!authorizer.is_authorized(Some("s3cret ")));
        assert!(!authorizer.is_authorized(Some("")));
        assert!(!authorizer.is_authorized(None));
    }

    #[test]
    fn prod_without_configured_token_refuses() {
        let authorizer = ReloadAuthorizer::new(ReloadEnvironment::Prod, None);
        assert!(!authorizer.is_authorized(Some("")));
        assert!(!authorizer.is_authorized(None));
    }

    #[test]
    fn query_token_takes_first_value() {
        assert_eq!(query_token(Some("token=a&token=b")).as_deref(), Some("a"));
        assert_eq!(query_token(Some("x=1&token=s%203")).as_deref(), Some("s 3"));
        assert_eq!(query_token(Some("x=1")), None);
        assert_eq!(query_token(None), None);
    }

    #[test]
    fn response_bodies_have_expected_shape() {
        let ok = serde_json::to_value(ReloadResponse::ok(ReloadSummary {
            loaded: 3,
            failed: 1,
        }))
        .unwrap();
        assert_eq!(ok, serde_json::json!({"status": "ok", "reloaded": 3, "failed": 1}));

        let forbidden = serde_json::to_value(ReloadResponse::forbidden()).unwrap();
        assert_eq!(forbidden, serde_json::json!({"status": "forbidden", "reloaded": 0}));
    }
}
