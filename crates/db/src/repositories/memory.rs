use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use concierge_core::domain::conversation::{
    ConversationId, ConversationTurn, NewConversationTurn, Sender,
};
use concierge_core::domain::department::Department;
use concierge_core::domain::order::{NewRestaurantOrder, RestaurantOrder};
use concierge_core::domain::record::{RecordId, ServiceStatus};
use concierge_core::domain::room::{seed_room_numbers, Room, RoomNumber};
use concierge_core::domain::room_service::{NewRoomServiceRequest, RoomServiceRequest};
use concierge_core::domain::session::GuestSession;
use concierge_core::tracking::DisplayId;

use super::{
    ConversationRepository, OrderRepository, RepositoryError, RequestRepository, RoomRepository,
};

/// Store-backed behavior without a store: ids are assigned sequentially and
/// the display-id uniqueness rule is mirrored so `Conflict` paths are
/// testable.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<RestaurantOrder>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(
        &self,
        new_order: NewRestaurantOrder,
    ) -> Result<RestaurantOrder, RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|order| order.display_id == new_order.display_id) {
            return Err(RepositoryError::Conflict("order display id already exists".to_string()));
        }

        let now = Utc::now();
        let order = RestaurantOrder {
            id: RecordId(orders.len() as i64 + 1),
            display_id: new_order.display_id,
            room_number: new_order.room_number,
            items: new_order.items,
            total_amount: new_order.total_amount,
            status: new_order.status,
            created_at: now,
            updated_at: now,
        };
        orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<RestaurantOrder>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|order| order.id == id).cloned())
    }

    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RestaurantOrder>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|order| &order.display_id == display_id).cloned())
    }

    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RestaurantOrder, RepositoryError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("restaurant order {id}")))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn list_newest_first(&self) -> Result<Vec<RestaurantOrder>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: RwLock<Vec<RoomServiceRequest>>,
}

#[async_trait::async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn create(
        &self,
        new_request: NewRoomServiceRequest,
    ) -> Result<RoomServiceRequest, RepositoryError> {
        let mut requests = self.requests.write().await;
        if requests.iter().any(|request| request.display_id == new_request.display_id) {
            return Err(RepositoryError::Conflict(
                "request display id already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let request = RoomServiceRequest {
            id: RecordId(requests.len() as i64 + 1),
            display_id: new_request.display_id,
            room_number: new_request.room_number,
            request_type: new_request.request_type,
            status: new_request.status,
            created_at: now,
            updated_at: now,
        };
        requests.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(
        &self,
        id: RecordId,
    ) -> Result<Option<RoomServiceRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|request| request.id == id).cloned())
    }

    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RoomServiceRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|request| &request.display_id == display_id).cloned())
    }

    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RoomServiceRequest, RepositoryError> {
        let mut requests = self.requests.write().await;
        let request = requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("room service request {id}")))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn list_newest_first(&self) -> Result<Vec<RoomServiceRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    sessions: RwLock<HashMap<String, GuestSession>>,
    turns: RwLock<Vec<ConversationTurn>>,
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_session(
        &self,
        id: &ConversationId,
    ) -> Result<Option<GuestSession>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id.0).cloned())
    }

    async fn save_session(&self, session: GuestSession) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.conversation_id.0.clone(), session);
        Ok(())
    }

    async fn append_turn(
        &self,
        turn: NewConversationTurn,
    ) -> Result<ConversationTurn, RepositoryError> {
        let mut turns = self.turns.write().await;
        let turn = ConversationTurn {
            id: turns.len() as i64 + 1,
            conversation_id: turn.conversation_id,
            sender: turn.sender,
            department: turn.department,
            content: turn.content,
            created_at: Utc::now(),
        };
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn list_turns(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let turns = self.turns.read().await;
        Ok(turns.iter().filter(|turn| &turn.conversation_id == id).cloned().collect())
    }

    async fn last_agent_department(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Department>, RepositoryError> {
        let turns = self.turns.read().await;
        Ok(turns
            .iter()
            .rev()
            .filter(|turn| &turn.conversation_id == id && turn.sender == Sender::Agent)
            .find_map(|turn| turn.department))
    }
}

#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<Vec<Room>>,
}

impl InMemoryRoomRepository {
    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        Self { rooms: RwLock::new(rooms) }
    }

    /// All rentable rooms marked available, matching a freshly seeded store.
    pub fn seeded() -> Self {
        Self::with_rooms(
            seed_room_numbers()
                .into_iter()
                .map(|room_number| Room { room_number, available: true })
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find(&self, room_number: &RoomNumber) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.iter().find(|room| &room.room_number == room_number).cloned())
    }

    async fn list_available(&self) -> Result<Vec<Room>, RepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.iter().filter(|room| room.available).cloned().collect())
    }
}
