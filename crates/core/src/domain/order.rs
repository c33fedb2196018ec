use crate::domain::record::{RecordId, ServiceStatus};
use crate::domain::room::RoomNumber;
use crate::errors::DomainError;
use crate::tracking::DisplayId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a restaurant order. `unit_price` is captured from the menu at
/// order time so later menu edits do not rewrite history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of `quantity × unit_price` across all lines.
pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(OrderLine::line_total).sum()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestaurantOrder {
    pub id: RecordId,
    pub display_id: DisplayId,
    pub room_number: RoomNumber,
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub status: ServiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RestaurantOrder {
    pub fn transition_to(&mut self, next: ServiceStatus) -> Result<(), DomainError> {
        let resolved = self.status.transition_to(next)?;
        if resolved != self.status {
            self.status = resolved;
            self.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Creation input; the store assigns the internal id and the timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRestaurantOrder {
    pub display_id: DisplayId,
    pub room_number: RoomNumber,
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub status: ServiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: u32, cents: i64) -> OrderLine {
        OrderLine { name: name.to_string(), quantity, unit_price: Decimal::new(cents, 2) }
    }

    fn fixture_order() -> RestaurantOrder {
        let items = vec![line("Margherita Pizza", 2, 950)];
        let total = order_total(&items);
        RestaurantOrder {
            id: RecordId(1),
            display_id: DisplayId("RES-201-A1B2C3".to_string()),
            room_number: RoomNumber("201".to_string()),
            items,
            total_amount: total,
            status: ServiceStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totals_are_exact_decimals() {
        let items = vec![line("Margherita Pizza", 2, 950)];
        assert_eq!(order_total(&items), Decimal::new(1900, 2));
        assert_eq!(order_total(&items).to_string(), "19.00");
    }

    #[test]
    fn totals_sum_across_lines() {
        let items = vec![line("Caesar Salad", 1, 950), line("Coffee", 3, 350)];
        assert_eq!(order_total(&items), Decimal::new(2000, 2));
    }

    #[test]
    fn transition_updates_status_and_timestamp() {
        let mut order = fixture_order();
        let before = order.updated_at;
        order.transition_to(ServiceStatus::InProgress).unwrap();
        assert_eq!(order.status, ServiceStatus::InProgress);
        assert!(order.updated_at >= before);
    }

    #[test]
    fn invalid_transition_leaves_order_unchanged() {
        let mut order = fixture_order();
        let error = order.transition_to(ServiceStatus::Completed).unwrap_err();
        assert!(matches!(error, DomainError::InvalidStatusTransition { .. }));
        assert_eq!(order.status, ServiceStatus::Pending);
    }

    #[test]
    fn order_lines_round_trip_through_json() {
        let items = vec![line("Club Sandwich", 2, 1000)];
        let encoded = serde_json::to_string(&items).unwrap();
        let decoded: Vec<OrderLine> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, items);
    }
}
