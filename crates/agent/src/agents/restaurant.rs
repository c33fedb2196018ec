//! The restaurant: menu answers and order placement.

use std::sync::Arc;

use rust_decimal::Decimal;

use concierge_core::tracking::{candidate_display_id, MAX_GENERATION_ATTEMPTS};
use concierge_core::{
    order_total, DomainError, ItemMatch, Menu, NewRestaurantOrder, OrderLine, RestaurantOrder,
    RoomNumber, ServiceRecord, ServiceStatus, CURRENCY,
};
use concierge_db::repositories::OrderRepository;

use super::{AgentError, AgentResult};
use crate::intent::{RequestedItem, RestaurantSlots};

const DISPLAY_PREFIX: &str = "RES";

const EMPTY_ORDER_REPLY: &str =
    "I can place your food order. Tell me the items and quantities, or ask for the menu.";

pub struct RestaurantAgent {
    menu: Menu,
    orders: Arc<dyn OrderRepository>,
}

impl RestaurantAgent {
    pub fn new(menu: Menu, orders: Arc<dyn OrderRepository>) -> RestaurantAgent {
        RestaurantAgent { menu, orders }
    }

    pub async fn fulfill(
        &self,
        slots: &RestaurantSlots,
        room_number: &RoomNumber,
    ) -> Result<AgentResult, AgentError> {
        if slots.items.is_empty() {
            if slots.menu_requested {
                return Ok(AgentResult::answered(self.menu.formatted()));
            }
            return Ok(AgentResult::clarification(EMPTY_ORDER_REPLY));
        }

        let lines = match self.resolve_lines(&slots.items) {
            Ok(lines) => lines,
            Err(reply) => return Ok(AgentResult::clarification(reply)),
        };
        let total = order_total(&lines);

        let order = self.place(room_number, lines, total).await?;
        tracing::info!(
            display_id = %order.display_id,
            room = %order.room_number,
            total = %order.total_amount,
            "restaurant order placed"
        );

        let reply = format!(
            "Order {} placed for room {}. Total is {CURRENCY}{}. Anything else you would like to add?",
            order.display_id, order.room_number, order.total_amount
        );
        Ok(AgentResult::created(reply, ServiceRecord::RestaurantOrder(order)))
    }

    /// Resolves requested names against the menu, merging repeats of the
    /// same dish. One unknown item aborts the whole order so the guest can
    /// correct it before anything is charged.
    fn resolve_lines(&self, items: &[RequestedItem]) -> Result<Vec<OrderLine>, String> {
        let mut lines: Vec<OrderLine> = Vec::new();
        for requested in items {
            let item = match self.menu.resolve(&requested.name) {
                ItemMatch::Exact(item) => item,
                ItemMatch::NearMiss { item, .. } => item,
                ItemMatch::Unknown { suggestion } => {
                    let mut reply =
                        format!("I couldn't find \"{}\" on our menu.", requested.name);
                    match suggestion {
                        Some(item) => reply.push_str(&format!(" Did you mean {}?", item.name)),
                        None => reply.push_str(" Ask for the menu to see what we offer."),
                    }
                    return Err(reply);
                }
            };
            match lines.iter_mut().find(|line| line.name == item.name) {
                Some(line) => line.quantity += requested.quantity,
                None => lines.push(OrderLine {
                    name: item.name.clone(),
                    quantity: requested.quantity,
                    unit_price: item.price,
                }),
            }
        }
        Ok(lines)
    }

    /// The unique index on display ids is the collision authority: on
    /// `Conflict` a fresh candidate is generated and the insert retried.
    async fn place(
        &self,
        room_number: &RoomNumber,
        lines: Vec<OrderLine>,
        total: Decimal,
    ) -> Result<RestaurantOrder, AgentError> {
        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            let new_order = NewRestaurantOrder {
                display_id: candidate_display_id(DISPLAY_PREFIX, room_number),
                room_number: room_number.clone(),
                items: lines.clone(),
                total_amount: total,
                status: ServiceStatus::Pending,
            };
            match self.orders.create(new_order).await {
                Ok(order) => return Ok(order),
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
