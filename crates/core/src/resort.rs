//! Static front-desk knowledge: opening hours and facility blurbs the
//! receptionist answers from. Room availability is deliberately absent; it
//! lives in the store and is answered from the live room table.

use serde::{Deserialize, Serialize};

/// The reception questions the parser can recognize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionTopic {
    CheckIn,
    CheckOut,
    Gym,
    Spa,
    Pool,
    Availability,
}

impl ReceptionTopic {
    /// Keyword scan for a reception topic. Facility nouns are checked ahead
    /// of the availability words so "is the pool available" reads as a pool
    /// question, not a vacancy question.
    pub fn detect(text: &str) -> Option<ReceptionTopic> {
        let lowered = text.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));
        if has(&["gym", "fitness", "workout"]) {
            Some(ReceptionTopic::Gym)
        } else if has(&["spa", "massage", "sauna"]) {
            Some(ReceptionTopic::Spa)
        } else if has(&["pool", "swim"]) {
            Some(ReceptionTopic::Pool)
        } else if has(&["check-out", "check out", "checkout"]) {
            Some(ReceptionTopic::CheckOut)
        } else if has(&["check-in", "check in", "checkin"]) {
            Some(ReceptionTopic::CheckIn)
        } else if has(&["available", "availability", "vacanc", "book a room"]) {
            Some(ReceptionTopic::Availability)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResortInfo {
    pub check_in_time: String,
    pub check_out_time: String,
    pub gym: String,
    pub spa: String,
    pub pool: String,
}

impl ResortInfo {
    pub fn standard() -> ResortInfo {
        ResortInfo {
            check_in_time: "2:00 PM".to_string(),
            check_out_time: "11:00 AM".to_string(),
            gym: "The gym on level 1 is open around the clock for guests.".to_string(),
            spa: "The spa is open 9:00 AM to 8:00 PM; treatments can be booked at the front desk."
                .to_string(),
            pool: "The outdoor pool is open 7:00 AM to 10:00 PM, with towels provided poolside."
                .to_string(),
        }
    }

    /// Canned answer for a topic. `Availability` returns `None`; answering
    /// it needs the live room table.
    pub fn answer(&self, topic: ReceptionTopic) -> Option<String> {
        match topic {
            ReceptionTopic::CheckIn => Some(format!("Check-in is from {}.", self.check_in_time)),
            ReceptionTopic::CheckOut => Some(format!("Check-out is by {}.", self.check_out_time)),
            ReceptionTopic::Gym => Some(self.gym.clone()),
            ReceptionTopic::Spa => Some(self.spa.clone()),
            ReceptionTopic::Pool => Some(self.pool.clone()),
            ReceptionTopic::Availability => None,
        }
    }
}
