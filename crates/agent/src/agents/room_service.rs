//! Room service: housekeeping, laundry and amenity requests.

use std::sync::Arc;

use concierge_core::tracking::{candidate_display_id, MAX_GENERATION_ATTEMPTS};
use concierge_core::{
    DomainError, NewRoomServiceRequest, RequestType, RoomNumber, RoomServiceRequest,
    ServiceRecord, ServiceStatus,
};
use concierge_db::repositories::RequestRepository;

use super::{AgentError, AgentResult};
use crate::intent::RoomServiceSlots;

const DISPLAY_PREFIX: &str = "ROS";

pub struct RoomServiceAgent {
    requests: Arc<dyn RequestRepository>,
}

impl RoomServiceAgent {
    pub fn new(requests: Arc<dyn RequestRepository>) -> RoomServiceAgent {
        RoomServiceAgent { requests }
    }

    /// A message with no recognizable type still reached this department
    /// through its keywords, so it is logged as `Other` rather than bounced.
    pub async fn fulfill(
        &self,
        slots: &RoomServiceSlots,
        room_number: &RoomNumber,
    ) -> Result<AgentResult, AgentError> {
        let request_type = slots.request_type.unwrap_or(RequestType::Other);

        let request = self.place(request_type, room_number).await?;
        tracing::info!(
            display_id = %request.display_id,
            room = %request.room_number,
            request_type = request.request_type.as_str(),
            "room service request logged"
        );

        let reply = format!(
            "{} request {} logged for room {}. Status: {}.",
            type_label(request.request_type),
            request.display_id,
            request.room_number,
            request.status.as_str()
        );
        Ok(AgentResult::created(reply, ServiceRecord::RoomServiceRequest(request)))
    }

    /// Same collision handling as order placement: the store's unique index
    /// decides, a `Conflict` means try a fresh candidate.
    async fn place(
        &self,
        request_type: RequestType,
        room_number: &RoomNumber,
    ) -> Result<RoomServiceRequest, AgentError> {
        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            let new_request = NewRoomServiceRequest {
                display_id: candidate_display_id(DISPLAY_PREFIX, room_number),
                room_number: room_number.clone(),
                request_type,
                status: ServiceStatus::Pending,
            };
            match self.requests.create(new_request).await {
                Ok(request) => return Ok(request),
                Err(error) if error.is_conflict() => {
                    tracing::debug!(attempt, "display id collided, regenerating");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Err(AgentError::Domain(DomainError::DisplayIdExhausted {
            prefix: DISPLAY_PREFIX.to_string(),
            attempts: MAX_GENERATION_ATTEMPTS,
        }))
    }
}

fn type_label(request_type: RequestType) -> &'static str {
    match request_type {
        RequestType::Cleaning => "Cleaning",
        RequestType::Laundry => "Laundry",
        RequestType::Amenity => "Amenity",
        RequestType::Other => "Room service",
    }
}
