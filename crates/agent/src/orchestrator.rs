//! Turn orchestration: parse the guest's message, gate on the room rule,
//! dispatch to every matched department, then persist the exchange.

use std::sync::Arc;

use thiserror::Error;

use concierge_core::{
    ConversationId, ConversationTurn, Department, DomainError, GuestSession, Menu,
    NewConversationTurn, RecordRef, ResortInfo, RestaurantOrder, RoomNumber, RoomServiceRequest,
    Sender, ServiceRecord, ServiceStatus,
};
use concierge_db::repositories::{
    ConversationRepository, OrderRepository, RepositoryError, RequestRepository, RoomRepository,
};

use crate::agents::{AgentError, ReceptionistAgent, RestaurantAgent, RoomServiceAgent};
use crate::intent::{DepartmentRequest, IntentParser, ParseContext};

const CLARIFICATION_REPLY: &str =
    "I can connect you with reception, the restaurant, or room service. What do you need?";

const ROOM_GATE_REPLY: &str = "Of course! Could you share your room number first? \
    I need it before I can send anything to your room.";

#[derive(Clone, Debug)]
pub struct TurnRequest {
    pub conversation_id: Option<ConversationId>,
    /// Room stated out-of-band (by the API caller); outranks whatever the
    /// parser reads out of the message.
    pub room_number: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub reply: String,
    pub departments: Vec<Department>,
    pub records: Vec<ServiceRecord>,
}

#[derive(Clone, Debug)]
pub struct DashboardSnapshot {
    pub orders: Vec<RestaurantOrder>,
    pub requests: Vec<RoomServiceRequest>,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid room number {0:?}")]
    InvalidRoom(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AgentError> for OrchestratorError {
    fn from(error: AgentError) -> OrchestratorError {
        match error {
            AgentError::Domain(domain) => OrchestratorError::Domain(domain),
            AgentError::Persistence(repository) => OrchestratorError::Repository(repository),
        }
    }
}

pub struct Orchestrator {
    parser: Arc<dyn IntentParser>,
    receptionist: ReceptionistAgent,
    restaurant: RestaurantAgent,
    room_service: RoomServiceAgent,
    conversations: Arc<dyn ConversationRepository>,
    rooms: Arc<dyn RoomRepository>,
    orders: Arc<dyn OrderRepository>,
    requests: Arc<dyn RequestRepository>,
}

impl Orchestrator {
    pub fn new(
        parser: Arc<dyn IntentParser>,
        conversations: Arc<dyn ConversationRepository>,
        rooms: Arc<dyn RoomRepository>,
        orders: Arc<dyn OrderRepository>,
        requests: Arc<dyn RequestRepository>,
    ) -> Orchestrator {
        Orchestrator {
            parser,
            receptionist: ReceptionistAgent::new(ResortInfo::standard(), rooms.clone()),
            restaurant: RestaurantAgent::new(Menu::standard(), orders.clone()),
            room_service: RoomServiceAgent::new(requests.clone()),
            conversations,
            rooms,
            orders,
            requests,
        }
    }

    pub async fn handle_turn(
        &self,
        request: TurnRequest,
    ) -> Result<TurnOutcome, OrchestratorError> {
        let conversation_id =
            request.conversation_id.clone().unwrap_or_else(ConversationId::new_random);

        let mut session = match self.conversations.find_session(&conversation_id).await? {
            Some(session) => session,
            None => {
                // The session row exists from the conversation's first turn,
                // with or without a room.
                let session = GuestSession::new(conversation_id.clone());
                self.conversations.save_session(session.clone()).await?;
                session
            }
        };
        let last_department = self.conversations.last_agent_department(&conversation_id).await?;

        let context =
            ParseContext { room_number: session.room_number.clone(), last_department };
        let intent = self.parser.parse(&request.message, &context).await;
        tracing::debug!(
            conversation = %conversation_id,
            source = intent.source.as_str(),
            departments = ?intent.departments(),
            "guest message parsed"
        );

        let candidate_room = match &request.room_number {
            Some(raw) => match RoomNumber::parse(raw) {
                Some(room) => Some(room),
                None => return Err(OrchestratorError::InvalidRoom(raw.clone())),
            },
            None => intent.room_number.clone(),
        };

        // A room the guest has not used before is checked against the
        // registry before it sticks to the session.
        if let Some(room) = candidate_room {
            if session.room_number.as_ref() != Some(&room) {
                if self.rooms.find(&room).await?.is_none() {
                    let reply = format!(
                        "I couldn't find room {room} in our records. Could you double-check the number?"
                    );
                    self.log_exchange(&conversation_id, &request.message, &[(None, reply.as_str())])
                        .await?;
                    return Ok(TurnOutcome {
                        conversation_id,
                        reply,
                        departments: Vec::new(),
                        records: Vec::new(),
                    });
                }
                session.assign_room(room);
                self.conversations.save_session(session.clone()).await?;
            }
        }

        if intent.needs_room() && session.room_number.is_none() {
            self.log_exchange(&conversation_id, &request.message, &[(None, ROOM_GATE_REPLY)])
                .await?;
            return Ok(TurnOutcome {
                conversation_id,
                reply: ROOM_GATE_REPLY.to_string(),
                departments: intent.departments(),
                records: Vec::new(),
            });
        }

        if intent.requests.is_empty() {
            self.log_exchange(&conversation_id, &request.message, &[(None, CLARIFICATION_REPLY)])
                .await?;
            return Ok(TurnOutcome {
                conversation_id,
                reply: CLARIFICATION_REPLY.to_string(),
                departments: Vec::new(),
                records: Vec::new(),
            });
        }

        let mut sections: Vec<(Department, String)> = Vec::new();
        let mut records: Vec<ServiceRecord> = Vec::new();
        for department_request in &intent.requests {
            let department = department_request.department();
            let result = match department_request {
                DepartmentRequest::Reception => {
                    self.receptionist.fulfill(&request.message).await?
                }
                DepartmentRequest::Restaurant(slots) => {
                    // The gate above guarantees a room for these branches.
                    let Some(room) = session.room_number.as_ref() else {
                        continue;
                    };
                    self.restaurant.fulfill(slots, room).await?
                }
                DepartmentRequest::RoomService(slots) => {
                    let Some(room) = session.room_number.as_ref() else {
                        continue;
                    };
                    self.room_service.fulfill(slots, room).await?
                }
            };
            if let Some(record) = result.record {
                records.push(record);
            }
            sections.push((department, result.reply));
        }

        // One department answers in its own voice; several get labelled.
        let reply = match sections.as_slice() {
            [(_, text)] => text.clone(),
            _ => sections
                .iter()
                .map(|(department, text)| format!("{}: {}", department.label(), text))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        let logged: Vec<(Option<Department>, &str)> = sections
            .iter()
            .map(|(department, text)| (Some(*department), text.as_str()))
            .collect();
        self.log_exchange(&conversation_id, &request.message, &logged).await?;

        let departments: Vec<Department> =
            sections.iter().map(|(department, _)| *department).collect();
        tracing::info!(
            conversation = %conversation_id,
            departments = ?departments,
            records = records.len(),
            "guest turn handled"
        );

        Ok(TurnOutcome { conversation_id, reply, departments, records })
    }

    /// Validates the transition against the status machine before touching
    /// the store. Repeating the current status of a live record is a no-op
    /// that leaves the row (and its `updated_at`) untouched.
    pub async fn update_status(
        &self,
        target: RecordRef,
        next: ServiceStatus,
    ) -> Result<ServiceRecord, OrchestratorError> {
        match target {
            RecordRef::Order(id) => {
                let order = self
                    .orders
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound(format!("restaurant order {id}")))?;
                let validated = order.status.transition_to(next)?;
                if validated == order.status {
                    return Ok(ServiceRecord::RestaurantOrder(order));
                }
                let updated = self.orders.update_status(id, validated).await?;
                tracing::info!(
                    display_id = %updated.display_id,
                    status = updated.status.as_str(),
                    "order status updated"
                );
                Ok(ServiceRecord::RestaurantOrder(updated))
            }
            RecordRef::Request(id) => {
                let request = self.requests.find_by_id(id).await?.ok_or_else(|| {
                    RepositoryError::NotFound(format!("room service request {id}"))
                })?;
                let validated = request.status.transition_to(next)?;
                if validated == request.status {
                    return Ok(ServiceRecord::RoomServiceRequest(request));
                }
                let updated = self.requests.update_status(id, validated).await?;
                tracing::info!(
                    display_id = %updated.display_id,
                    status = updated.status.as_str(),
                    "room service status updated"
                );
                Ok(ServiceRecord::RoomServiceRequest(updated))
            }
        }
    }

    pub async fn dashboard(&self) -> Result<DashboardSnapshot, OrchestratorError> {
        let orders = self.orders.list_newest_first().await?;
        let requests = self.requests.list_newest_first().await?;
        Ok(DashboardSnapshot { orders, requests })
    }

    pub async fn transcript(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, OrchestratorError> {
        Ok(self.conversations.list_turns(conversation_id).await?)
    }

    /// Appends the guest turn plus one agent turn per department reply.
    /// Runs after fulfilment so a failed record write leaves no partial
    /// transcript behind.
    async fn log_exchange(
        &self,
        conversation_id: &ConversationId,
        message: &str,
        replies: &[(Option<Department>, &str)],
    ) -> Result<(), RepositoryError> {
        self.conversations
            .append_turn(NewConversationTurn {
                conversation_id: conversation_id.clone(),
                sender: Sender::Guest,
                department: None,
                content: message.to_string(),
            })
            .await?;
        for (department, reply) in replies {
            self.conversations
                .append_turn(NewConversationTurn {
                    conversation_id: conversation_id.clone(),
                    sender: Sender::Agent,
                    department: *department,
                    content: (*reply).to_string(),
                })
                .await?;
        }
        Ok(())
    }
}
