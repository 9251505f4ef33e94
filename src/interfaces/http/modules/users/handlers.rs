//! User API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{RegisterUserRequest, UserDto};
use crate::application::RegistryService;
use crate::interfaces::http::common::{
    domain_error, ApiResponse, ApiResult, CreatedResult, ValidatedJson,
};

/// User handler state
#[derive(Clone)]
pub struct UserState {
    pub registry: Arc<RegistryService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "Externally supplied user ID")),
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserDto>),
        (status = 400, description = "Blank ID or name"),
        (status = 409, description = "User already exists"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register_user(
    State(state): State<UserState>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<RegisterUserRequest>,
) -> CreatedResult<UserDto> {
    let user = state
        .registry
        .register_user(&user_id, &body.name)
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserDto> {
    let user = state.registry.get_user(&user_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "All registered users", body = ApiResponse<Vec<UserDto>>)
    )
)]
pub async fn list_users(State(state): State<UserState>) -> ApiResult<Vec<UserDto>> {
    let users = state.registry.list_users().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}
