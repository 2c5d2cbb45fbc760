//! API Handlers
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pwgate_core::{
    PolicyError, PolicyRecord, ValidationCode, ValidationOutcome, ValidationRequest,
    PWGATE_VERSION,
};
use pwgate_handlers::ChainBuilder;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// Header naming who performed a policy update
pub const ACTOR_HEADER: &str = "x-actor";

const DEFAULT_ACTOR: &str = "system";

/// Policy failure rendered as `{code, message}`
pub struct ApiError(pub PolicyError);

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PolicyError::InvalidPatchOperation(_) | PolicyError::StructuralViolation(_) => {
                StatusCode::BAD_REQUEST
            }
            PolicyError::PolicyNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        });
        if let PolicyError::StructuralViolation(v) = &self.0 {
            body["policy"] = json!(v.key);
            body["rule"] = json!(v.rule);
        }
        if status.is_server_error() {
            error!(error = %self.0, "policy request failed");
        }
        (status, Json(body)).into_response()
    }
}

pub async fn validate_password(
    State(state): State<AppState>,
    Json(request): Json<ValidationRequest>,
) -> (StatusCode, Json<ValidationOutcome>) {
    let shared = state.clone();

    // The chain blocks on the breach lookup, so it runs off the async workers
    let task = tokio::task::spawn_blocking(move || {
        let records = match shared.policies().list() {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "cannot load policies for validation");
                return ValidationOutcome::deny(ValidationCode::InternalValidationError);
            }
        };

        let mut builder = ChainBuilder::new(shared.config.as_ref().clone()).with_policies(&records);
        if shared.config.breach_check_enabled {
            match shared.breach_checker() {
                Ok(checker) => builder = builder.with_breach_checker(checker.clone()),
                Err(e) => {
                    error!(error = %e, "cannot build breach client");
                    return ValidationOutcome::deny(ValidationCode::InternalValidationError);
                }
            }
        }

        match builder.build() {
            Ok(chain) => chain.run(request),
            Err(e) => {
                error!(error = %e, "cannot build validation chain");
                ValidationOutcome::deny(ValidationCode::InternalValidationError)
            }
        }
    });

    let outcome = match tokio::time::timeout(state.validation_timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!(error = %e, "validation task failed");
            ValidationOutcome::deny(ValidationCode::InternalValidationError)
        }
        Err(_) => {
            warn!(
                timeout_ms = state.validation_timeout.as_millis() as u64,
                "validation timed out"
            );
            ValidationOutcome::deny(ValidationCode::ValidationTimeout)
        }
    };

    if outcome.allowed {
        state.metrics.record_validation("allowed");
        (StatusCode::OK, Json(outcome))
    } else {
        warn!(code = outcome.error_code(), "password rejected");
        state.metrics.record_validation(outcome.error_code());
        (StatusCode::BAD_REQUEST, Json(outcome))
    }
}

pub async fn list_policies(
    State(state): State<AppState>,
) -> Result<Json<Vec<PolicyRecord>>, ApiError> {
    Ok(Json(state.policies().list()?))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<PolicyRecord>, ApiError> {
    Ok(Json(state.policies().get(&key)?))
}

pub async fn patch_policies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Result<Json<Vec<PolicyRecord>>, ApiError> {
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string();

    match state.engine.apply_document(&document, &actor) {
        Ok(updated) => {
            info!(actor = %actor, policies = updated.len(), "policy patch applied");
            state.metrics.record_patch("applied");
            Ok(Json(updated))
        }
        Err(e) => {
            warn!(actor = %actor, code = e.code(), error = %e, "policy patch rejected");
            state.metrics.record_patch(e.code());
            Err(e.into())
        }
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": PWGATE_VERSION })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "cannot encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
