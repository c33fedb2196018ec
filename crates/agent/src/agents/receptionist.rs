//! The reception desk: resort questions and room availability.

use std::sync::Arc;

use concierge_core::{ReceptionTopic, ResortInfo};
use concierge_db::repositories::RoomRepository;

use super::{AgentError, AgentResult};

/// Rooms named outright in an availability reply; beyond this the guest
/// just gets the count.
const AVAILABILITY_PREVIEW: usize = 12;

const FALLBACK_REPLY: &str = "Hi there! I can help with check-in and check-out times, \
    our gym, spa and pool, and room availability. What do you need?";

const FULLY_BOOKED_REPLY: &str = "I'm sorry, we are fully booked at the moment. \
    Would you like me to put you on the waitlist?";

pub struct ReceptionistAgent {
    info: ResortInfo,
    rooms: Arc<dyn RoomRepository>,
}

impl ReceptionistAgent {
    pub fn new(info: ResortInfo, rooms: Arc<dyn RoomRepository>) -> ReceptionistAgent {
        ReceptionistAgent { info, rooms }
    }

    /// Reception never creates records: every path either answers or nudges
    /// the guest toward the topics it can help with.
    pub async fn fulfill(&self, message: &str) -> Result<AgentResult, AgentError> {
        match ReceptionTopic::detect(message) {
            Some(ReceptionTopic::Availability) => self.availability().await,
            Some(topic) => {
                let reply =
                    self.info.answer(topic).unwrap_or_else(|| FALLBACK_REPLY.to_string());
                Ok(AgentResult::answered(reply))
            }
            None => Ok(AgentResult::clarification(FALLBACK_REPLY)),
        }
    }

    async fn availability(&self) -> Result<AgentResult, AgentError> {
        let rooms = self.rooms.list_available().await?;
        if rooms.is_empty() {
            return Ok(AgentResult::answered(FULLY_BOOKED_REPLY));
        }

        let preview: Vec<&str> = rooms
            .iter()
            .take(AVAILABILITY_PREVIEW)
            .map(|room| room.room_number.as_str())
            .collect();
        let reply = if rooms.len() == 1 {
            format!(
                "We have 1 room available: {}. Would you like me to reserve it?",
                preview[0]
            )
        } else {
            format!(
                "We have {} rooms available, including {}. Would you like me to reserve one?",
                rooms.len(),
                preview.join(", ")
            )
        };
        Ok(AgentResult::answered(reply))
    }
}

#[cfg(test)]
mod tests {
    use concierge_core::{Room, RoomNumber};
    use concierge_db::repositories::InMemoryRoomRepository;

    use super::*;
    use crate::agents::AgentOutcome;

    fn agent_with(rooms: InMemoryRoomRepository) -> ReceptionistAgent {
        ReceptionistAgent::new(ResortInfo::standard(), Arc::new(rooms))
    }

    #[tokio::test]
    async fn answers_resort_questions_without_creating_records() {
        let agent = agent_with(InMemoryRoomRepository::seeded());

        let result = agent.fulfill("What time is check-in?").await.unwrap();

        assert_eq!(result.outcome, AgentOutcome::Answered);
        assert!(result.record.is_none());
        assert!(result.reply.contains("2:00 PM"), "reply was: {}", result.reply);

        let result = agent.fulfill("tell me about the spa").await.unwrap();
        assert!(result.reply.to_lowercase().contains("spa"), "reply was: {}", result.reply);
    }

    #[tokio::test]
    async fn availability_reports_count_and_a_preview() {
        let agent = agent_with(InMemoryRoomRepository::seeded());

        let result = agent.fulfill("do you have rooms available?").await.unwrap();

        assert_eq!(result.outcome, AgentOutcome::Answered);
        assert!(result.reply.contains("87 rooms available"), "reply was: {}", result.reply);
        assert!(result.reply.contains("101"), "reply was: {}", result.reply);
    }

    #[tokio::test]
    async fn a_single_open_room_reads_naturally() {
        let rooms = InMemoryRoomRepository::with_rooms(vec![
            Room { room_number: RoomNumber("204".to_string()), available: true },
            Room { room_number: RoomNumber("205".to_string()), available: false },
        ]);
        let agent = agent_with(rooms);

        let result = agent.fulfill("any availability tonight?").await.unwrap();

        assert!(
            result.reply.contains("1 room available: 204"),
            "reply was: {}",
            result.reply
        );
    }

    #[tokio::test]
    async fn fully_booked_offers_the_waitlist() {
        let agent = agent_with(InMemoryRoomRepository::with_rooms(Vec::new()));

        let result = agent.fulfill("is anything available?").await.unwrap();

        assert_eq!(result.outcome, AgentOutcome::Answered);
        assert!(result.reply.contains("fully booked"), "reply was: {}", result.reply);
    }

    #[tokio::test]
    async fn off_topic_messages_get_the_menu_of_topics() {
        let agent = agent_with(InMemoryRoomRepository::seeded());

        let result = agent.fulfill("can you walk my dog?").await.unwrap();

        assert_eq!(result.outcome, AgentOutcome::Clarification);
        assert!(result.reply.contains("check-in"), "reply was: {}", result.reply);
    }
}
