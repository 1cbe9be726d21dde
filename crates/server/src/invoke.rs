use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use readygate_agent::ReadinessRuntime;
use readygate_core::errors::InterfaceError;
use readygate_core::EvaluationRequest;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct InvokeState {
    runtime: Arc<ReadinessRuntime>,
    bearer_token: Option<Arc<SecretString>>,
    shutdown: CancellationToken,
}

impl InvokeState {
    pub fn new(
        runtime: Arc<ReadinessRuntime>,
        bearer_token: Option<SecretString>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { runtime, bearer_token: bearer_token.map(Arc::new), shutdown }
    }

    fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.bearer_token else {
            return true;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|presented| presented.trim() == expected.expose_secret())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
    detail: String,
    correlation_id: String,
}

pub fn router(state: InvokeState) -> Router {
    Router::new().route("/invocations", post(invoke)).with_state(state)
}

pub async fn invoke(
    State(state): State<InvokeState>,
    headers: HeaderMap,
    body: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if !state.authorize(&headers) {
        return error_response(InterfaceError::unauthorized(
            "missing or invalid bearer token",
            correlation_id,
        ));
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(InterfaceError::BadRequest {
                message: rejection.body_text(),
                correlation_id,
            });
        }
    };

    let cancel = state.shutdown.child_token();
    match state.runtime.evaluate(&request, &correlation_id, &cancel).await {
        Ok(recommendation) => {
            info!(
                event_name = "server.invocation.completed",
                correlation_id = %correlation_id,
                target = %request.target,
                verdict = %recommendation.verdict(),
                "invocation completed"
            );
            let response = (StatusCode::OK, Json(recommendation)).into_response();
            with_correlation(response, &correlation_id)
        }
        Err(error) => error_response(error.into_interface(correlation_id)),
    }
}

fn error_response(error: InterfaceError) -> Response {
    let (status, kind) = match &error {
        InterfaceError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
        InterfaceError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
        }
        InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };

    warn!(
        event_name = "server.invocation.failed",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "invocation failed"
    );

    let correlation_id = error.correlation_id().to_string();
    let body = ErrorBody {
        error: kind,
        message: error.user_message(),
        detail: error.to_string(),
        correlation_id: correlation_id.clone(),
    };
    with_correlation((status, Json(body)).into_response(), &correlation_id)
}

fn with_correlation(mut response: Response, correlation_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
