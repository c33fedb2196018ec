use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use concierge_core::domain::conversation::{ConversationId, ConversationTurn, NewConversationTurn};
use concierge_core::domain::department::Department;
use concierge_core::domain::order::{NewRestaurantOrder, RestaurantOrder};
use concierge_core::domain::record::{RecordId, ServiceStatus};
use concierge_core::domain::room::{Room, RoomNumber};
use concierge_core::domain::room_service::{NewRoomServiceRequest, RoomServiceRequest};
use concierge_core::domain::session::GuestSession;
use concierge_core::tracking::DisplayId;

pub mod conversations;
pub mod memory;
pub mod orders;
pub mod room_service;
pub mod rooms;

pub use conversations::SqlConversationRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryOrderRepository, InMemoryRequestRepository,
    InMemoryRoomRepository,
};
pub use orders::SqlOrderRepository;
pub use room_service::SqlRequestRepository;
pub use rooms::SqlRoomRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}

/// Maps a unique-index violation to `Conflict` so callers can regenerate the
/// display id and retry; every other failure stays a `Database` error.
pub(crate) fn conflict_on_unique(error: sqlx::Error, what: &str) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{what} already exists"))
        }
        _ => RepositoryError::Database(error),
    }
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_status(column: &str, value: &str) -> Result<ServiceStatus, RepositoryError> {
    ServiceStatus::parse(value).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown service status in `{column}`: `{value}`"))
    })
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order. A duplicate display id surfaces as `Conflict`.
    async fn create(&self, new_order: NewRestaurantOrder)
        -> Result<RestaurantOrder, RepositoryError>;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<RestaurantOrder>, RepositoryError>;

    /// Lookup by the external tracking code.
    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RestaurantOrder>, RepositoryError>;

    /// Sets the status column. Fails with `NotFound` when no row matches;
    /// transition legality is the caller's concern.
    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RestaurantOrder, RepositoryError>;

    /// Every order, newest first, for the operations dashboard.
    async fn list_newest_first(&self) -> Result<Vec<RestaurantOrder>, RepositoryError>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn create(
        &self,
        new_request: NewRoomServiceRequest,
    ) -> Result<RoomServiceRequest, RepositoryError>;

    async fn find_by_id(&self, id: RecordId)
        -> Result<Option<RoomServiceRequest>, RepositoryError>;

    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RoomServiceRequest>, RepositoryError>;

    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RoomServiceRequest, RepositoryError>;

    async fn list_newest_first(&self) -> Result<Vec<RoomServiceRequest>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_session(
        &self,
        id: &ConversationId,
    ) -> Result<Option<GuestSession>, RepositoryError>;

    /// Inserts or overwrites the session keyed by its conversation id.
    async fn save_session(&self, session: GuestSession) -> Result<(), RepositoryError>;

    async fn append_turn(
        &self,
        turn: NewConversationTurn,
    ) -> Result<ConversationTurn, RepositoryError>;

    async fn list_turns(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError>;

    /// Department of the most recent agent turn, for routing continuity.
    async fn last_agent_department(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Department>, RepositoryError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find(&self, room_number: &RoomNumber) -> Result<Option<Room>, RepositoryError>;

    async fn list_available(&self) -> Result<Vec<Room>, RepositoryError>;
}
