use crate::domain::conversation::ConversationId;
use crate::domain::room::RoomNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-guest state that survives across turns. Created on the first turn of
/// a conversation; `room_number` stays empty until the guest's room is
/// confirmed and is only ever superseded, never cleared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestSession {
    pub conversation_id: ConversationId,
    pub room_number: Option<RoomNumber>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuestSession {
    pub fn new(conversation_id: ConversationId) -> GuestSession {
        let now = Utc::now();
        GuestSession { conversation_id, room_number: None, created_at: now, updated_at: now }
    }

    pub fn assign_room(&mut self, room_number: RoomNumber) {
        self.room_number = Some(room_number);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_have_no_room() {
        let session = GuestSession::new(ConversationId::new_random());
        assert!(session.room_number.is_none());
    }

    #[test]
    fn assigning_a_room_touches_the_timestamp() {
        let mut session = GuestSession::new(ConversationId::new_random());
        let before = session.updated_at;
        session.assign_room(RoomNumber("201".to_string()));
        assert_eq!(session.room_number.as_ref().map(RoomNumber::as_str), Some("201"));
        assert!(session.updated_at >= before);
    }
}
