//! JSON API for the guest chat widget and the operations dashboard.
//!
//! Endpoints:
//! - `POST /api/chat`: handle one guest turn
//! - `GET  /api/menu`: restaurant catalog with prices
//! - `GET  /api/dashboard`: recent orders and requests
//! - `GET  /api/conversations/{id}`: full transcript of a conversation
//! - `POST /api/orders/{id}/status`: move an order through its lifecycle
//! - `POST /api/room-service/{id}/status`: move a request through its lifecycle
//! - `GET  /health`: readiness probe

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use concierge_agent::{Orchestrator, OrchestratorError, TurnRequest};
use concierge_core::{
    ConversationId, ConversationTurn, Department, DomainError, Menu, MenuItem, RecordId, RecordRef,
    RestaurantOrder, RoomServiceRequest, ServiceRecord, ServiceStatus, CURRENCY,
};
use concierge_db::DbPool;

/// Body for 500 responses. Internals go to the log, not the guest.
const GENERIC_APOLOGY: &str = "Something went wrong on our side. Please try again in a moment.";

#[derive(Clone)]
pub struct ApiState {
    orchestrator: Arc<Orchestrator>,
    db_pool: DbPool,
    parser_mode: &'static str,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    /// Room stated by the caller (widget session), which outranks any room
    /// the parser reads out of the message text.
    pub room_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub reply: String,
    pub departments: Vec<Department>,
    pub records: Vec<ServiceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub record: ServiceRecord,
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub currency: &'static str,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub orders: Vec<RestaurantOrder>,
    pub requests: Vec<RoomServiceRequest>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub conversation_id: String,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub parser: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(
    orchestrator: Arc<Orchestrator>,
    db_pool: DbPool,
    parser_mode: &'static str,
) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/menu", get(menu))
        .route("/api/dashboard", get(dashboard))
        .route("/api/conversations/{id}", get(transcript))
        .route("/api/orders/{id}/status", post(update_order_status))
        .route("/api/room-service/{id}/status", post(update_request_status))
        .route("/health", get(health))
        .with_state(ApiState { orchestrator, db_pool, parser_mode })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn chat(
    State(state): State<ApiState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiError>)> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError { error: "message must not be empty".to_string() }),
        ));
    }

    let request = TurnRequest {
        conversation_id: body.conversation_id.map(ConversationId),
        room_number: body.room_number,
        message,
    };

    let outcome = state.orchestrator.handle_turn(request).await.map_err(error_response)?;

    Ok(Json(ChatResponse {
        conversation_id: outcome.conversation_id.0,
        reply: outcome.reply,
        departments: outcome.departments,
        records: outcome.records,
    }))
}

pub async fn menu() -> Json<MenuResponse> {
    let catalog = Menu::standard();
    Json(MenuResponse { currency: CURRENCY, items: catalog.items().to_vec() })
}

pub async fn dashboard(
    State(state): State<ApiState>,
) -> Result<Json<DashboardResponse>, (StatusCode, Json<ApiError>)> {
    let snapshot = state.orchestrator.dashboard().await.map_err(error_response)?;
    Ok(Json(DashboardResponse { orders: snapshot.orders, requests: snapshot.requests }))
}

pub async fn transcript(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<TranscriptResponse>, (StatusCode, Json<ApiError>)> {
    let conversation_id = ConversationId(id);
    let turns = state.orchestrator.transcript(&conversation_id).await.map_err(error_response)?;
    if turns.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError { error: format!("no conversation {conversation_id}") }),
        ));
    }
    Ok(Json(TranscriptResponse { conversation_id: conversation_id.0, turns }))
}

pub async fn update_order_status(
    Path(id): Path<i64>,
    State(state): State<ApiState>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ApiError>)> {
    update_record_status(&state, RecordRef::Order(RecordId(id)), body.status).await
}

pub async fn update_request_status(
    Path(id): Path<i64>,
    State(state): State<ApiState>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ApiError>)> {
    update_record_status(&state, RecordRef::Request(RecordId(id)), body.status).await
}

async fn update_record_status(
    state: &ApiState,
    target: RecordRef,
    next: ServiceStatus,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ApiError>)> {
    let record = state.orchestrator.update_status(target, next).await.map_err(error_response)?;
    Ok(Json(StatusResponse { record }))
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        parser: state.parser_mode,
        service: HealthCheck {
            status: "ready",
            detail: "concierge-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

/// Maps orchestrator failures onto HTTP statuses. Client mistakes keep their
/// real message; infrastructure faults are logged and answered with the
/// generic apology.
fn error_response(error: OrchestratorError) -> (StatusCode, Json<ApiError>) {
    match error {
        OrchestratorError::InvalidRoom(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiError { error: error.to_string() }))
        }
        OrchestratorError::Domain(DomainError::InvalidStatusTransition { .. }) => {
            (StatusCode::CONFLICT, Json(ApiError { error: error.to_string() }))
        }
        OrchestratorError::Domain(domain @ DomainError::DisplayIdExhausted { .. }) => {
            error!(error = %domain, "record creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: domain.user_message().to_string() }),
            )
        }
        OrchestratorError::Repository(repository) if repository.is_not_found() => {
            (StatusCode::NOT_FOUND, Json(ApiError { error: repository.to_string() }))
        }
        OrchestratorError::Repository(repository) => {
            error!(error = %repository, "request failed on the store");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: GENERIC_APOLOGY.to_string() }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use concierge_agent::{Orchestrator, RuleBasedParser};
    use concierge_db::repositories::{
        SqlConversationRepository, SqlOrderRepository, SqlRequestRepository, SqlRoomRepository,
    };
    use concierge_db::{connect_with_settings, migrations, seed_rooms, DbPool};

    use super::*;

    async fn setup() -> (ApiState, DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        seed_rooms(&pool).await.expect("seed rooms");

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(RuleBasedParser::default()),
            Arc::new(SqlConversationRepository::new(pool.clone())),
            Arc::new(SqlRoomRepository::new(pool.clone())),
            Arc::new(SqlOrderRepository::new(pool.clone())),
            Arc::new(SqlRequestRepository::new(pool.clone())),
        ));

        (ApiState { orchestrator, db_pool: pool.clone(), parser_mode: "rule_based" }, pool)
    }

    #[tokio::test]
    async fn chat_places_an_order_end_to_end() {
        let (api, pool) = setup().await;

        let response = chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "Two margherita pizzas for room 204".to_string(),
                conversation_id: None,
                room_number: None,
            }),
        )
        .await
        .expect("chat should succeed");

        assert!(response.0.reply.contains("₹24.00"), "reply: {}", response.0.reply);
        assert_eq!(response.0.departments, vec![Department::Restaurant]);
        match &response.0.records[..] {
            [ServiceRecord::RestaurantOrder(order)] => {
                assert_eq!(order.total_amount, Decimal::new(2400, 2));
                assert_eq!(order.items.len(), 1);
            }
            other => panic!("expected one order, got {other:?}"),
        }

        let snapshot = dashboard(State(api)).await.expect("dashboard should load");
        assert_eq!(snapshot.0.orders.len(), 1);
        assert_eq!(snapshot.0.orders[0].room_number.as_str(), "204");
        assert!(snapshot.0.requests.is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn chat_rejects_blank_messages() {
        let (api, pool) = setup().await;

        let error = chat(
            State(api),
            Json(ChatRequest {
                message: "   ".to_string(),
                conversation_id: None,
                room_number: None,
            }),
        )
        .await
        .expect_err("blank message should be rejected");

        assert_eq!(error.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.1 .0.error, "message must not be empty");

        pool.close().await;
    }

    #[tokio::test]
    async fn chat_surfaces_invalid_caller_rooms() {
        let (api, pool) = setup().await;

        let error = chat(
            State(api),
            Json(ChatRequest {
                message: "a coffee please".to_string(),
                conversation_id: None,
                room_number: Some("12b".to_string()),
            }),
        )
        .await
        .expect_err("malformed room should be rejected");

        assert_eq!(error.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.1 .0.error.contains("12b"));

        pool.close().await;
    }

    #[tokio::test]
    async fn order_status_follows_the_machine() {
        let (api, pool) = setup().await;

        let placed = chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "One coffee for room 118".to_string(),
                conversation_id: None,
                room_number: None,
            }),
        )
        .await
        .expect("order should be placed");
        let order_id = match &placed.0.records[0] {
            ServiceRecord::RestaurantOrder(order) => order.id.0,
            other => panic!("expected an order, got {other:?}"),
        };

        let updated = update_order_status(
            Path(order_id),
            State(api.clone()),
            Json(StatusRequest { status: ServiceStatus::InProgress }),
        )
        .await
        .expect("pending to in progress is legal");
        match updated.0.record {
            ServiceRecord::RestaurantOrder(order) => {
                assert_eq!(order.status, ServiceStatus::InProgress);
            }
            other => panic!("expected an order, got {other:?}"),
        }

        let conflict = update_order_status(
            Path(order_id),
            State(api.clone()),
            Json(StatusRequest { status: ServiceStatus::Pending }),
        )
        .await
        .expect_err("walking backwards is not");
        assert_eq!(conflict.0, StatusCode::CONFLICT);
        assert!(conflict.1 .0.error.contains("invalid status transition"));

        let missing = update_order_status(
            Path(9999),
            State(api),
            Json(StatusRequest { status: ServiceStatus::InProgress }),
        )
        .await
        .expect_err("unknown ids should 404");
        assert_eq!(missing.0, StatusCode::NOT_FOUND);

        pool.close().await;
    }

    #[tokio::test]
    async fn transcripts_are_returned_and_missing_ones_404() {
        let (api, pool) = setup().await;

        let first = chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "what time is check-in?".to_string(),
                conversation_id: Some("front-desk-1".to_string()),
                room_number: None,
            }),
        )
        .await
        .expect("chat should succeed");
        assert_eq!(first.0.conversation_id, "front-desk-1");

        let transcript = transcript(Path("front-desk-1".to_string()), State(api.clone()))
            .await
            .expect("transcript should exist");
        assert_eq!(transcript.0.turns.len(), 2);
        assert_eq!(transcript.0.turns[0].content, "what time is check-in?");

        let missing = super::transcript(Path("nobody-here".to_string()), State(api))
            .await
            .expect_err("unknown conversations should 404");
        assert_eq!(missing.0, StatusCode::NOT_FOUND);

        pool.close().await;
    }

    #[tokio::test]
    async fn health_reports_ready_then_degraded() {
        let (api, pool) = setup().await;

        let (status, Json(payload)) = health(State(api.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.parser, "rule_based");
        assert_eq!(payload.database.status, "ready");

        pool.close().await;

        let (status, Json(payload)) = health(State(api)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn the_router_wires_chat_through_http() {
        let (api, pool) = setup().await;
        let app = router(api.orchestrator.clone(), pool.clone(), api.parser_mode);

        let body = serde_json::json!({ "message": "Need laundry pickup in 301" });
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build");

        let response = app.oneshot(request).await.expect("router should answer");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.expect("body should read").to_bytes();
        let payload: serde_json::Value =
            serde_json::from_slice(&bytes).expect("body should be json");
        assert_eq!(payload["departments"][0], "room_service");
        assert_eq!(payload["records"][0]["kind"], "room_service_request");
        assert_eq!(payload["records"][0]["status"], "Pending");

        pool.close().await;
    }

    #[tokio::test]
    async fn the_router_serves_the_menu() {
        let (api, pool) = setup().await;
        let app = router(api.orchestrator.clone(), pool.clone(), api.parser_mode);

        let request = Request::builder()
            .uri("/api/menu")
            .body(Body::empty())
            .expect("request should build");
        let response = app.oneshot(request).await.expect("router should answer");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.expect("body should read").to_bytes();
        let payload: serde_json::Value =
            serde_json::from_slice(&bytes).expect("body should be json");
        assert_eq!(payload["currency"], "₹");
        let names: Vec<&str> = payload["items"]
            .as_array()
            .expect("items should be a list")
            .iter()
            .filter_map(|item| item["name"].as_str())
            .collect();
        assert!(names.contains(&"Margherita Pizza"), "menu: {names:?}");

        pool.close().await;
    }

    #[tokio::test]
    async fn conversations_survive_across_requests() {
        let (api, pool) = setup().await;

        let gated = chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "two margherita pizzas please".to_string(),
                conversation_id: None,
                room_number: None,
            }),
        )
        .await
        .expect("chat should succeed");
        assert!(gated.0.records.is_empty());
        assert!(gated.0.reply.contains("room number"));

        let conversation_id = gated.0.conversation_id.clone();
        chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "room 212".to_string(),
                conversation_id: Some(conversation_id.clone()),
                room_number: None,
            }),
        )
        .await
        .expect("follow-up should succeed");

        // The room alone does not replay the order; the guest repeats it.
        let placed = chat(
            State(api.clone()),
            Json(ChatRequest {
                message: "two margherita pizzas please".to_string(),
                conversation_id: Some(conversation_id.clone()),
                room_number: None,
            }),
        )
        .await
        .expect("repeat should succeed");
        assert_eq!(placed.0.records.len(), 1);

        let transcript = transcript(Path(conversation_id.clone()), State(api))
            .await
            .expect("transcript should exist");
        assert_eq!(transcript.0.conversation_id, conversation_id);
        assert_eq!(transcript.0.turns.len(), 6);

        pool.close().await;
    }
}
