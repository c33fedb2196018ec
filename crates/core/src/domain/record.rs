use crate::domain::department::Department;
use crate::domain::order::RestaurantOrder;
use crate::domain::room::RoomNumber;
use crate::domain::room_service::RoomServiceRequest;
use crate::errors::DomainError;
use crate::tracking::DisplayId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal identifier of a persisted record, assigned by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a record from the outside, qualified by its kind because
/// internal ids are only unique per table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordRef {
    Order(RecordId),
    Request(RecordId),
}

/// Lifecycle shared by restaurant orders and room-service requests.
///
/// `Completed` and `Cancelled` are terminal. Repeating the current status is
/// a no-op success for the non-terminal states only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Pending,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "Pending",
            ServiceStatus::InProgress => "In Progress",
            ServiceStatus::Completed => "Completed",
            ServiceStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<ServiceStatus> {
        match value.trim() {
            "Pending" => Some(ServiceStatus::Pending),
            "In Progress" | "InProgress" => Some(ServiceStatus::InProgress),
            "Completed" => Some(ServiceStatus::Completed),
            "Cancelled" => Some(ServiceStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        if *self == next {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (ServiceStatus::Pending, ServiceStatus::InProgress)
                | (ServiceStatus::Pending, ServiceStatus::Cancelled)
                | (ServiceStatus::InProgress, ServiceStatus::Completed)
                | (ServiceStatus::InProgress, ServiceStatus::Cancelled)
        )
    }

    pub fn transition_to(&self, next: ServiceStatus) -> Result<ServiceStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidStatusTransition { from: *self, to: next })
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted service record of either kind, as handed back to callers of
/// the orchestrator and the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceRecord {
    RestaurantOrder(RestaurantOrder),
    RoomServiceRequest(RoomServiceRequest),
}

impl ServiceRecord {
    pub fn department(&self) -> Department {
        match self {
            ServiceRecord::RestaurantOrder(_) => Department::Restaurant,
            ServiceRecord::RoomServiceRequest(_) => Department::RoomService,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            ServiceRecord::RestaurantOrder(order) => order.id,
            ServiceRecord::RoomServiceRequest(request) => request.id,
        }
    }

    pub fn display_id(&self) -> &DisplayId {
        match self {
            ServiceRecord::RestaurantOrder(order) => &order.display_id,
            ServiceRecord::RoomServiceRequest(request) => &request.display_id,
        }
    }

    pub fn room_number(&self) -> &RoomNumber {
        match self {
            ServiceRecord::RestaurantOrder(order) => &order.room_number,
            ServiceRecord::RoomServiceRequest(request) => &request.room_number,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        match self {
            ServiceRecord::RestaurantOrder(order) => order.status,
            ServiceRecord::RoomServiceRequest(request) => request.status,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ServiceRecord::RestaurantOrder(order) => order.created_at,
            ServiceRecord::RoomServiceRequest(request) => request.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(ServiceStatus::Pending.can_transition_to(ServiceStatus::InProgress));
        assert!(ServiceStatus::Pending.can_transition_to(ServiceStatus::Cancelled));
        assert!(ServiceStatus::InProgress.can_transition_to(ServiceStatus::Completed));
        assert!(ServiceStatus::InProgress.can_transition_to(ServiceStatus::Cancelled));
    }

    #[test]
    fn skipping_in_progress_is_rejected() {
        let error = ServiceStatus::Pending.transition_to(ServiceStatus::Completed).unwrap_err();
        assert!(matches!(
            error,
            DomainError::InvalidStatusTransition {
                from: ServiceStatus::Pending,
                to: ServiceStatus::Completed
            }
        ));
    }

    #[test]
    fn terminal_states_absorb_everything() {
        let all = [
            ServiceStatus::Pending,
            ServiceStatus::InProgress,
            ServiceStatus::Completed,
            ServiceStatus::Cancelled,
        ];
        for terminal in [ServiceStatus::Completed, ServiceStatus::Cancelled] {
            for next in all {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} must not transition to {next}"
                );
            }
        }
    }

    #[test]
    fn repeating_a_non_terminal_status_is_a_no_op_success() {
        assert_eq!(
            ServiceStatus::Pending.transition_to(ServiceStatus::Pending),
            Ok(ServiceStatus::Pending)
        );
        assert_eq!(
            ServiceStatus::InProgress.transition_to(ServiceStatus::InProgress),
            Ok(ServiceStatus::InProgress)
        );
    }

    #[test]
    fn repeating_a_terminal_status_is_rejected() {
        assert!(ServiceStatus::Completed.transition_to(ServiceStatus::Completed).is_err());
        assert!(ServiceStatus::Cancelled.transition_to(ServiceStatus::Cancelled).is_err());
    }

    #[test]
    fn reverse_transitions_are_rejected() {
        assert!(!ServiceStatus::InProgress.can_transition_to(ServiceStatus::Pending));
        assert!(!ServiceStatus::Completed.can_transition_to(ServiceStatus::InProgress));
        assert!(!ServiceStatus::Cancelled.can_transition_to(ServiceStatus::Pending));
    }

    #[test]
    fn status_wire_text_keeps_the_space_in_in_progress() {
        assert_eq!(ServiceStatus::InProgress.as_str(), "In Progress");
        assert_eq!(ServiceStatus::parse("In Progress"), Some(ServiceStatus::InProgress));
        assert_eq!(ServiceStatus::parse("InProgress"), Some(ServiceStatus::InProgress));
        assert_eq!(ServiceStatus::parse("finished"), None);
    }

    #[test]
    fn the_supertype_exposes_the_common_fields_of_both_kinds() {
        use crate::domain::order::OrderLine;
        use crate::domain::room_service::RequestType;
        use rust_decimal::Decimal;

        let now = Utc::now();
        let order = ServiceRecord::RestaurantOrder(RestaurantOrder {
            id: RecordId(7),
            display_id: DisplayId("RES-204-AB12CD".to_string()),
            room_number: RoomNumber("204".to_string()),
            items: vec![OrderLine {
                name: "Coffee".to_string(),
                quantity: 1,
                unit_price: Decimal::new(350, 2),
            }],
            total_amount: Decimal::new(350, 2),
            status: ServiceStatus::Pending,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(order.department(), Department::Restaurant);
        assert_eq!(order.id(), RecordId(7));
        assert_eq!(order.display_id().as_str(), "RES-204-AB12CD");
        assert_eq!(order.room_number().as_str(), "204");
        assert_eq!(order.status(), ServiceStatus::Pending);
        assert_eq!(order.created_at(), now);

        let request = ServiceRecord::RoomServiceRequest(RoomServiceRequest {
            id: RecordId(3),
            display_id: DisplayId("ROS-301-ZZ99XX".to_string()),
            room_number: RoomNumber("301".to_string()),
            request_type: RequestType::Laundry,
            status: ServiceStatus::InProgress,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(request.department(), Department::RoomService);
        assert_eq!(request.id(), RecordId(3));
        assert_eq!(request.display_id().as_str(), "ROS-301-ZZ99XX");
        assert_eq!(request.room_number().as_str(), "301");
        assert_eq!(request.status(), ServiceStatus::InProgress);
        assert_eq!(request.created_at(), now);
    }
}
