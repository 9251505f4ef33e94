//! Charge Point API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{ChangeStateRequest, ChargePointDto, RegisterChargePointRequest};
use crate::application::{RegistryService, ReservationService};
use crate::interfaces::http::common::{
    domain_error, parse_connector, ApiResponse, ApiResult, CreatedResult, ValidatedJson,
};

/// Charge-point handler state
#[derive(Clone)]
pub struct ChargePointState {
    pub registry: Arc<RegistryService>,
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/chargepoints/{chargepoint_id}",
    tag = "Charge Points",
    params(("chargepoint_id" = String, Path, description = "Chargepoint ID, at most 20 characters")),
    request_body = RegisterChargePointRequest,
    responses(
        (status = 201, description = "Chargepoint registered", body = ApiResponse<ChargePointDto>),
        (status = 400, description = "ID too long or connector count not positive"),
        (status = 409, description = "Already exists"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register_charge_point(
    State(state): State<ChargePointState>,
    Path(chargepoint_id): Path<String>,
    ValidatedJson(body): ValidatedJson<RegisterChargePointRequest>,
) -> CreatedResult<ChargePointDto> {
    let cp = state
        .registry
        .register_charge_point(&chargepoint_id, body.connectors)
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(cp.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/chargepoints/{chargepoint_id}",
    tag = "Charge Points",
    params(("chargepoint_id" = String, Path, description = "Chargepoint ID")),
    responses(
        (status = 200, description = "Chargepoint details", body = ApiResponse<ChargePointDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_charge_point(
    State(state): State<ChargePointState>,
    Path(chargepoint_id): Path<String>,
) -> ApiResult<ChargePointDto> {
    let cp = state
        .registry
        .get_charge_point(&chargepoint_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(cp.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/chargepoints",
    tag = "Charge Points",
    responses(
        (status = 200, description = "All chargepoints", body = ApiResponse<Vec<ChargePointDto>>)
    )
)]
pub async fn list_charge_points(
    State(state): State<ChargePointState>,
) -> ApiResult<Vec<ChargePointDto>> {
    let cps = state
        .registry
        .list_charge_points()
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        cps.into_iter().map(ChargePointDto::from).collect(),
    )))
}

/// Operator override. Never touches reservations, so using it on a
/// connector with an open reservation desynchronizes the two.
#[utoipa::path(
    post,
    path = "/api/v1/changestate/{chargepoint_id}/{connector_id}",
    tag = "Charge Points",
    params(
        ("chargepoint_id" = String, Path, description = "Chargepoint ID"),
        ("connector_id" = i64, Path, description = "1-based connector index")
    ),
    request_body = ChangeStateRequest,
    responses(
        (status = 200, description = "State changed", body = ApiResponse<ChargePointDto>),
        (status = 400, description = "Connector out of range or unknown state label"),
        (status = 404, description = "Chargepoint not found")
    )
)]
pub async fn change_connector_state(
    State(state): State<ChargePointState>,
    Path((chargepoint_id, connector_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<ChangeStateRequest>,
) -> ApiResult<ChargePointDto> {
    let connector = parse_connector(&connector_id)?;
    let cp = state
        .reservations
        .force_connector_state(&chargepoint_id, connector, &body.state)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(cp.into())))
}
