//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::charge_points::{self, ChargePointState};
use super::modules::health::{self, HealthState};
use super::modules::reservations::{self, ReservationState};
use super::modules::users::{self, UserState};
use crate::application::{RegistryService, ReservationService};

/// Unified state for every API route.
/// Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<RegistryService>,
    pub reservations: Arc<ReservationService>,
    pub health: HealthState,
}

impl FromRef<ApiState> for UserState {
    fn from_ref(s: &ApiState) -> Self {
        UserState {
            registry: Arc::clone(&s.registry),
        }
    }
}

impl FromRef<ApiState> for ChargePointState {
    fn from_ref(s: &ApiState) -> Self {
        ChargePointState {
            registry: Arc::clone(&s.registry),
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for ReservationState {
    fn from_ref(s: &ApiState) -> Self {
        ReservationState {
            registry: Arc::clone(&s.registry),
            reservations: Arc::clone(&s.reservations),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        s.health.clone()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register_user,
        users::get_user,
        users::list_users,
        charge_points::register_charge_point,
        charge_points::get_charge_point,
        charge_points::list_charge_points,
        charge_points::change_connector_state,
        reservations::create_reservation,
        reservations::list_reservations,
        reservations::start_charging,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            users::UserDto,
            users::RegisterUserRequest,
            charge_points::ChargePointDto,
            charge_points::ConnectorDto,
            charge_points::RegisterChargePointRequest,
            charge_points::ChangeStateRequest,
            reservations::ReservationDto,
            reservations::CreateReservationRequest,
            reservations::StartChargingRequest,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage ping"),
        (name = "Users", description = "Driver registration and lookup"),
        (name = "Charge Points", description = "Chargepoint registration, lookup and operator state override"),
        (name = "Reservations", description = "Connector reservations and charging start"),
    ),
    info(
        title = "EV Charging Reservations API",
        version = "1.0.0",
        description = "Reserve chargepoint connectors, start charging within the grace window, and inspect reservation history",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        // Users
        .route("/users", get(users::list_users))
        .route(
            "/users/{user_id}",
            get(users::get_user).post(users::register_user),
        )
        // Charge Points
        .route("/chargepoints", get(charge_points::list_charge_points))
        .route(
            "/chargepoints/{chargepoint_id}",
            get(charge_points::get_charge_point).post(charge_points::register_charge_point),
        )
        .route(
            "/changestate/{chargepoint_id}/{connector_id}",
            post(charge_points::change_connector_state),
        )
        // Reservations
        .route("/reservations", get(reservations::list_reservations))
        .route(
            "/reservations/{chargepoint_id}/{connector_id}",
            post(reservations::create_reservation),
        )
        .route(
            "/charge/{chargepoint_id}/{connector_id}",
            post(reservations::start_charging),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::application::ChargePointLocks;
    use crate::domain::RepositoryProvider;
    use crate::infrastructure::InMemoryRepositoryProvider;

    fn app() -> Router {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        create_api_router(ApiState {
            registry: Arc::new(RegistryService::new(repos.clone())),
            reservations: Arc::new(ReservationService::new(repos, ChargePointLocks::new())),
            health: HealthState {
                db: None,
                started_at: Arc::new(Instant::now()),
            },
        })
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn seed(app: &Router) {
        let body = json!({"connectors": 2});
        let (s, _) = call(app, "POST", "/api/v1/chargepoints/cp1", Some(body)).await;
        assert_eq!(s, StatusCode::CREATED);
        for (id, name) in [("u1", "Alice"), ("u2", "Bob")] {
            let uri = format!("/api/v1/users/{id}");
            let (s, _) = call(app, "POST", &uri, Some(json!({"name": name}))).await;
            assert_eq!(s, StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn reserve_and_charge_over_http() {
        let app = app();
        seed(&app).await;

        let (s, body) = call(
            &app,
            "POST",
            "/api/v1/reservations/cp1/1",
            Some(json!({"userId": "u1", "minutes": 45})),
        )
        .await;
        assert_eq!(s, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["connectorId"], 1);
        assert_eq!(body["data"]["hasStartedCharging"], false);

        let wrong_user = Some(json!({"userId": "u2"}));
        let (s, body) = call(&app, "POST", "/api/v1/charge/cp1/1", wrong_user).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert!(body["error"].as_str().unwrap().contains("active reservation"));

        let holder = Some(json!({"userId": "u1"}));
        let (s, body) = call(&app, "POST", "/api/v1/charge/cp1/1", holder).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["data"]["hasStartedCharging"], true);

        let (_, body) = call(&app, "GET", "/api/v1/chargepoints/cp1", None).await;
        assert_eq!(body["data"]["connectors"][0]["state"], "Charging");
        assert_eq!(body["data"]["connectors"][1]["state"], "Available");

        let (_, body) = call(&app, "GET", "/api/v1/reservations", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejections_map_to_statuses() {
        let app = app();
        seed(&app).await;

        let reserve = |user: &str, minutes: i64| json!({"userId": user, "minutes": minutes});
        let cases = [
            (
                "/api/v1/chargepoints/abcdefghijklmnopqrstu",
                json!({"connectors": 1}),
                StatusCode::BAD_REQUEST,
            ),
            ("/api/v1/chargepoints/cp2", json!({"connectors": 0}), StatusCode::BAD_REQUEST),
            ("/api/v1/chargepoints/cp1", json!({"connectors": 1}), StatusCode::CONFLICT),
            ("/api/v1/users/u3", json!({"name": ""}), StatusCode::UNPROCESSABLE_ENTITY),
            ("/api/v1/reservations/nope/1", reserve("u1", 45), StatusCode::NOT_FOUND),
            ("/api/v1/reservations/cp1/3", reserve("u1", 45), StatusCode::BAD_REQUEST),
            ("/api/v1/reservations/cp1/x", reserve("u1", 45), StatusCode::BAD_REQUEST),
            ("/api/v1/reservations/cp1/1", reserve("ghost", 45), StatusCode::NOT_FOUND),
            ("/api/v1/reservations/cp1/1", reserve("u1", 181), StatusCode::BAD_REQUEST),
            ("/api/v1/changestate/cp1/1", json!({"state": "Broken"}), StatusCode::BAD_REQUEST),
            ("/api/v1/charge/cp1/1", json!({"userId": "ghost"}), StatusCode::NOT_FOUND),
        ];
        for (uri, body, expected) in cases {
            let (s, resp) = call(&app, "POST", uri, Some(body)).await;
            assert_eq!(s, expected, "{uri}: {resp}");
            assert_eq!(resp["success"], false, "{uri}");
        }

        let (s, _) = call(&app, "GET", "/api/v1/users/ghost", None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/users/u9")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", "/api/v1/chargepoints", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn long_user_ids_reach_the_domain_checks() {
        let app = app();
        seed(&app).await;
        let long_id = "u".repeat(65);

        let body = json!({"userId": long_id, "minutes": 45});
        let (s, resp) = call(&app, "POST", "/api/v1/reservations/nope/1", Some(body)).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
        assert!(resp["error"].as_str().unwrap().contains("nope"), "{resp}");

        let body = json!({"userId": long_id, "minutes": 45});
        let (s, resp) = call(&app, "POST", "/api/v1/reservations/cp1/1", Some(body)).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
        assert!(resp["error"].as_str().unwrap().contains(&long_id), "{resp}");

        let body = json!({"userId": long_id});
        let (s, _) = call(&app, "POST", "/api/v1/charge/nope/1", Some(body)).await;
        assert_eq!(s, StatusCode::NOT_FOUND);

        let long_state = Some(json!({"state": "x".repeat(40)}));
        let (s, _) = call(&app, "POST", "/api/v1/changestate/cp1/1", long_state).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn operator_override_changes_state() {
        let app = app();
        seed(&app).await;

        let unavailable = Some(json!({"state": "Unavailable"}));
        let (s, body) = call(&app, "POST", "/api/v1/changestate/cp1/2", unavailable).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["data"]["connectors"][1]["state"], "Unavailable");

        let (s, body) = call(
            &app,
            "POST",
            "/api/v1/reservations/cp1/2",
            Some(json!({"userId": "u1", "minutes": 60})),
        )
        .await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("must be available"));
    }

    #[tokio::test]
    async fn health_and_docs_are_served() {
        let app = app();
        let (s, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["status"], "memory");

        let (s, body) = call(&app, "GET", "/api-doc/openapi.json", None).await;
        assert_eq!(s, StatusCode::OK);
        assert!(body["paths"]["/api/v1/reservations/{chargepoint_id}/{connector_id}"].is_object());
    }
}
