//! Reservation lifecycle API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{CreateReservationRequest, ReservationDto, StartChargingRequest};
use crate::application::{RegistryService, ReservationService};
use crate::interfaces::http::common::{
    domain_error, parse_connector, ApiResponse, ApiResult, CreatedResult, ValidatedJson,
};

/// Reservation handler state
#[derive(Clone)]
pub struct ReservationState {
    pub registry: Arc<RegistryService>,
    pub reservations: Arc<ReservationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{chargepoint_id}/{connector_id}",
    tag = "Reservations",
    params(
        ("chargepoint_id" = String, Path, description = "Chargepoint ID"),
        ("connector_id" = i64, Path, description = "1-based connector index")
    ),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Connector reserved; charging must start within 10 minutes", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Connector out of range, not available, or duration out of bounds"),
        (status = 404, description = "Chargepoint or user not found"),
        (status = 500, description = "Storage failure; reservation may need manual reconciliation")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationState>,
    Path((chargepoint_id, connector_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<CreateReservationRequest>,
) -> CreatedResult<ReservationDto> {
    let connector = parse_connector(&connector_id)?;
    let reservation = state
        .reservations
        .create_reservation(&chargepoint_id, connector, &body.user_id, body.minutes)
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(reservation.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    responses(
        (status = 200, description = "All reservations, newest first", body = ApiResponse<Vec<ReservationDto>>)
    )
)]
pub async fn list_reservations(
    State(state): State<ReservationState>,
) -> ApiResult<Vec<ReservationDto>> {
    let reservations = state
        .registry
        .list_reservations()
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        reservations.into_iter().map(ReservationDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/charge/{chargepoint_id}/{connector_id}",
    tag = "Reservations",
    params(
        ("chargepoint_id" = String, Path, description = "Chargepoint ID"),
        ("connector_id" = i64, Path, description = "1-based connector index")
    ),
    request_body = StartChargingRequest,
    responses(
        (status = 200, description = "Charging started", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Connector out of range or no active reservation"),
        (status = 404, description = "User or chargepoint not found")
    )
)]
pub async fn start_charging(
    State(state): State<ReservationState>,
    Path((chargepoint_id, connector_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<StartChargingRequest>,
) -> ApiResult<ReservationDto> {
    let connector = parse_connector(&connector_id)?;
    let reservation = state
        .reservations
        .start_charging(&chargepoint_id, connector, &body.user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(reservation.into())))
}
