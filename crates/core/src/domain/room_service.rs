use crate::domain::record::{RecordId, ServiceStatus};
use crate::domain::room::RoomNumber;
use crate::errors::DomainError;
use crate::tracking::DisplayId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of room-service request categories. Unclassifiable requests
/// land on `Other` rather than being rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Cleaning,
    Laundry,
    Amenity,
    Other,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Cleaning => "cleaning",
            RequestType::Laundry => "laundry",
            RequestType::Amenity => "amenity",
            RequestType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<RequestType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cleaning" => Some(RequestType::Cleaning),
            "laundry" => Some(RequestType::Laundry),
            "amenity" => Some(RequestType::Amenity),
            "other" => Some(RequestType::Other),
            _ => None,
        }
    }

    /// Classifies free text into a request category by keyword. `None` means
    /// the text carries no recognizable category, not that it is invalid.
    pub fn from_phrase(text: &str) -> Option<RequestType> {
        let lowered = text.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));
        if has(&["laundry", "wash my", "washing", "iron", "dry clean"]) {
            Some(RequestType::Laundry)
        } else if has(&["clean", "housekeep", "tidy", "vacuum", "make up the room"]) {
            Some(RequestType::Cleaning)
        } else if has(&[
            "towel", "pillow", "blanket", "toiletries", "soap", "shampoo", "toothbrush",
            "toothpaste", "amenit", "water bottle",
        ]) {
            Some(RequestType::Amenity)
        } else {
            None
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomServiceRequest {
    pub id: RecordId,
    pub display_id: DisplayId,
    pub room_number: RoomNumber,
    pub request_type: RequestType,
    pub status: ServiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomServiceRequest {
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
pub struct NewRoomServiceRequest {
    pub display_id: DisplayId,
    pub room_number: RoomNumber,
    pub request_type: RequestType,
    pub status: ServiceStatus,
}
