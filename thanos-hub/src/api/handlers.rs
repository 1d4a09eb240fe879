//! HTTP request handlers

use crate::api::server::AppContext;
use crate::controller::CommandAction;
use crate::error::{Error, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use thanos_common::api::{
    ActionResponse, ClapTestRequest, ControlCommand, ControlRequest, StatusResponse,
};
use thanos_common::events::ClapSource;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "thanos-hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/status
pub async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    Json(ctx.controller.get_snapshot().await.into())
}

/// POST /api/control
///
/// Body rejections are answered as 400 with the usual `{status}` shape
/// rather than axum's plain-text 422.
pub async fn control(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<ControlRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>> {
    let Json(req) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    let action = control_action(&req)?;

    info!("API control: {}", action);
    ctx.controller.issue_command(action).await;

    Ok(Json(ActionResponse::success()))
}

/// POST /api/clap_test
pub async fn clap_test(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<ClapTestRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>> {
    let Json(req) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;

    ctx.controller.submit_clap(req.pattern, ClapSource::Api).await?;

    Ok(Json(ActionResponse {
        status: format!("Simulated clap pattern {}", req.pattern),
    }))
}

fn control_action(req: &ControlRequest) -> Result<CommandAction> {
    match req.command {
        ControlCommand::On => Ok(CommandAction::On),
        ControlCommand::Off => Ok(CommandAction::Off),
        ControlCommand::Brightness => {
            let value = req
                .brightness
                .ok_or_else(|| Error::BadRequest("brightness value required".to_string()))?;
            Ok(CommandAction::brightness(value.round() as i64))
        }
    }
}
