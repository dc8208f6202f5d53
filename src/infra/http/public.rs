use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    application::{error::ErrorReport, reload::ReloadService},
    infra::db::SqliteRepositories,
};

use super::{
    middleware::{log_responses, set_request_context},
    reload::{ReloadAuthorizer, reload_content},
};

const CSS_CONTENT_TYPE: &str = "text/css; charset=utf-8";

#[derive(Clone)]
pub struct HttpState {
    pub reload: Arc<ReloadService>,
    pub authorizer: Arc<ReloadAuthorizer>,
    pub db: Arc<SqliteRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/admin/reload", post(reload_content))
        .route("/static/code.css", get(code_stylesheet))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn code_stylesheet(State(state): State<HttpState>) -> Response {
    let css = state.reload.loader().stylesheet().to_string();
    ([(CONTENT_TYPE, CSS_CONTENT_TYPE)], css).into_response()
}

async fn health(State(state): State<HttpState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = (status, Json(json!({ "status": "unavailable" }))).into_response();
            ErrorReport::from_error("infra::http::health", status, &err).attach(&mut response);
            response
        }
    }
}
