// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for rotation jobs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keywarden_core::KeywardenError;
use keywarden_rotation::{JobId, JobState, RotationRequest};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Request body for POST /v1/rotations.
#[derive(Deserialize)]
pub struct StartRotationBody {
    pub old_passphrase: SecretString,
    pub new_passphrase: SecretString,
    #[serde(default)]
    pub retry_of: Option<JobId>,
}

/// Response body for job-level operations.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: JobId,
    #[serde(flatten)]
    pub state: Option<JobState>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub rotation_running: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`KeywardenError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub KeywardenError);

impl From<KeywardenError> for ApiError {
    fn from(e: KeywardenError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            KeywardenError::InvalidPassphrase => StatusCode::FORBIDDEN,
            KeywardenError::RotationInProgress => StatusCode::CONFLICT,
            KeywardenError::RotationSetup(_) => StatusCode::UNPROCESSABLE_ENTITY,
            KeywardenError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub(crate) fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError(KeywardenError::NotFound {
            kind: "rotation job",
            id: raw.to_string(),
        })
    })
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        rotation_running: state.manager.is_busy(),
    })
}

/// POST /v1/rotations
pub async fn post_rotation(
    State(state): State<GatewayState>,
    Json(body): Json<StartRotationBody>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job_id = state
        .manager
        .start_rotation(RotationRequest {
            old_passphrase: body.old_passphrase,
            new_passphrase: body.new_passphrase,
            retry_of: body.retry_of,
        })
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobResponse {
            job_id,
            state: None,
        }),
    ))
}

/// GET /v1/rotations/{id}
pub async fn get_rotation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job_id = parse_job_id(&id)?;
    let status = state.manager.status(job_id).await?;
    Ok(Json(status).into_response())
}

/// DELETE /v1/rotations/{id}
pub async fn delete_rotation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job_id = parse_job_id(&id)?;
    let state = state.manager.cancel(job_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobResponse {
            job_id,
            state: Some(state),
        }),
    ))
}
