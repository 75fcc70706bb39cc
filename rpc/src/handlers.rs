//! Request handlers and wire types.
//!
//! Wire field names are camelCase and timestamps are RFC 3339 strings, the
//! format the admin console and the NFT-creation screen consume.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use venue_codes::{IssueRequest, SweepReport, VerifyOutcome};
use venue_types::{Timestamp, VenueCode, VenueCodeId};

use crate::error::RpcError;
use crate::server::RpcState;

// ── Envelope ─────────────────────────────────────────────────────────────

/// Uniform response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set on failures the caller may retry unchanged.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            retryable: false,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn error(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            retryable,
        }
    }
}

// ── Venue codes ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodeRequest {
    pub code: Option<String>,
    pub venue_name: Option<String>,
    pub created_by: Option<String>,
}

impl From<CreateCodeRequest> for IssueRequest {
    fn from(req: CreateCodeRequest) -> Self {
        IssueRequest {
            code: req.code,
            venue_name: req.venue_name,
            created_by: req.created_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueCodeDto {
    pub id: String,
    pub code: String,
    pub venue_name: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub expires_at: String,
}

impl From<VenueCode> for VenueCodeDto {
    fn from(c: VenueCode) -> Self {
        Self {
            id: c.id.to_string(),
            code: c.code,
            venue_name: c.venue_name,
            created_by: c.created_by,
            created_at: rfc3339(c.created_at),
            expires_at: rfc3339(c.expires_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCodeResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub expired_found: usize,
    pub deleted: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(r: SweepReport) -> Self {
        Self {
            expired_found: r.expired_found,
            deleted: r.deleted,
            batches: r.batches,
            failed_batches: r.failed_batches,
        }
    }
}

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<VerifyOutcome> for VerifyResponse {
    fn from(o: VerifyOutcome) -> Self {
        Self {
            matched: o.matched,
            venue_name: o.venue_name,
            reason: o.reason.map(|r| r.as_str().to_string()),
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn create_code(
    State(state): State<Arc<RpcState>>,
    body: Result<Json<CreateCodeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VenueCodeDto>>, RpcError> {
    let Json(req) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let stored = state.service.create_or_regenerate_code(&req.into())?;
    if let Some(metrics) = &state.metrics {
        metrics.code_issued();
    }
    Ok(Json(ApiResponse::ok_with_message(
        stored.into(),
        "venue code saved",
    )))
}

pub async fn list_codes(
    State(state): State<Arc<RpcState>>,
) -> Result<Json<ApiResponse<Vec<VenueCodeDto>>>, RpcError> {
    let codes = state.service.list_active_codes()?;
    if let Some(metrics) = &state.metrics {
        metrics.active_codes(codes.len());
    }
    Ok(Json(ApiResponse::ok(
        codes.into_iter().map(VenueCodeDto::from).collect(),
    )))
}

pub async fn delete_code(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteCodeResponse>>, RpcError> {
    let parsed: VenueCodeId = id
        .parse()
        .map_err(|e: venue_types::TypesError| RpcError::InvalidRequest(e.to_string()))?;
    // Deleting an id that is already gone is not an error.
    let deleted = state.service.delete_code(&parsed)?;
    let message = if deleted {
        "venue code deleted"
    } else {
        "venue code already absent"
    };
    Ok(Json(ApiResponse::ok_with_message(
        DeleteCodeResponse {
            id: parsed.to_string(),
            deleted,
        },
        message,
    )))
}

pub async fn sweep(
    State(state): State<Arc<RpcState>>,
) -> Result<Json<ApiResponse<SweepResponse>>, RpcError> {
    let report = state.service.sweep()?;
    if let Some(metrics) = &state.metrics {
        metrics.sweep_completed(report.deleted);
    }
    Ok(Json(ApiResponse::ok(report.into())))
}

/// Always answers 200: malformed bodies and faults are non-matches.
pub async fn verify(
    State(state): State<Arc<RpcState>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Json<ApiResponse<VerifyResponse>> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable verify body");
            VerifyRequest::default()
        }
    };
    let outcome = state.service.verify(req.code.as_deref().unwrap_or(""));
    if let Some(metrics) = &state.metrics {
        let label = match outcome.reason {
            None => "matched",
            Some(reason) => reason.as_str(),
        };
        metrics.verification(label);
    }
    Json(ApiResponse::ok(outcome.into()))
}

pub async fn health(State(state): State<Arc<RpcState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn metrics(State(state): State<Arc<RpcState>>) -> impl IntoResponse {
    let Some(registry) = &state.metrics_registry else {
        return (StatusCode::NOT_FOUND, "metrics disabled".to_string()).into_response();
    };
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        return RpcError::Server(e.to_string()).into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

fn rfc3339(ts: Timestamp) -> String {
    let millis = i64::try_from(ts.as_millis()).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
