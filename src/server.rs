use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::completion::CompletionClient;
use crate::db::{SubscriptionStore, UserStore};
use crate::envelope::{HandlerRequest, HandlerResponse};
use crate::services::{AuthServiceImpl, CodeGenServiceImpl, Handler, SubscriptionServiceImpl};

/// The three endpoints, each behind its own path.
#[derive(Clone)]
pub struct AppHandlers {
    pub auth: Arc<dyn Handler>,
    pub codegen: Arc<dyn Handler>,
    pub subscriptions: Arc<dyn Handler>,
}

impl AppHandlers {
    pub fn new(
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        completion: Option<Arc<dyn CompletionClient>>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthServiceImpl::new(users)),
            codegen: Arc::new(CodeGenServiceImpl::new(completion)),
            subscriptions: Arc::new(SubscriptionServiceImpl::new(subscriptions)),
        }
    }
}

pub fn router(handlers: AppHandlers) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth", any(dispatch).with_state(handlers.auth))
        .route("/generate-code", any(dispatch).with_state(handlers.codegen))
        .route("/subscriptions", any(dispatch).with_state(handlers.subscriptions))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

async fn dispatch(
    State(handler): State<Arc<dyn Handler>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("dispatch", %request_id, %method);

    async move {
        let request = to_handler_request(&method, &headers, body);
        let response = handler.handle(request).await;
        tracing::debug!(status = response.status_code, "Handler finished");
        into_http_response(response)
    }
    .instrument(span)
    .await
}

/// Non-UTF-8 bodies are passed on base64-encoded.
fn to_handler_request(method: &Method, headers: &HeaderMap, body: Bytes) -> HandlerRequest {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let (body, is_base64_encoded) = if body.is_empty() {
        (None, false)
    } else {
        match String::from_utf8(body.to_vec()) {
            Ok(text) => (Some(text), false),
            Err(_) => (Some(BASE64.encode(&body)), true),
        }
    };

    HandlerRequest {
        http_method: method.as_str().to_string(),
        headers,
        body,
        is_base64_encoded,
    }
}

fn into_http_response(response: HandlerResponse) -> Response {
    let body = if response.is_base64_encoded {
        match BASE64.decode(&response.body) {
            Ok(bytes) => Body::from(bytes),
            Err(e) => {
                tracing::error!("Handler returned invalid base64 body: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    } else {
        Body::from(response.body)
    };

    let mut http_response = Response::new(body);
    *http_response.status_mut() =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    http_response
}
