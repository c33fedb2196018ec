use serde::{Deserialize, Serialize};
use std::fmt;

/// Room numbers are 3 or 4 digit strings; leading zeros are preserved, so
/// they are never handled as integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomNumber(pub String);

impl RoomNumber {
    /// Accepts a token in the room-number format. Returns `None` for
    /// anything else; callers treat that as "no room given", not an error.
    pub fn parse(value: &str) -> Option<RoomNumber> {
        let trimmed = value.trim();
        if (3..=4).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(RoomNumber(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_number: RoomNumber,
    pub available: bool,
}

/// Inclusive floor ranges the resort rents out.
pub const ROOM_SEED_RANGES: [(u16, u16); 3] = [(101, 119), (201, 229), (301, 339)];

/// The full set of room numbers, in ascending order. Seeding the store is
/// idempotent on top of this fixed list.
pub fn seed_room_numbers() -> Vec<RoomNumber> {
    ROOM_SEED_RANGES
        .iter()
        .flat_map(|(start, end)| (*start..=*end).map(|number| RoomNumber(number.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_three_and_four_digit_tokens() {
        assert_eq!(RoomNumber::parse("201"), Some(RoomNumber("201".to_string())));
        assert_eq!(RoomNumber::parse(" 1204 "), Some(RoomNumber("1204".to_string())));
    }

    #[test]
    fn parse_rejects_everything_else() {
        for bad in ["", "12", "12345", "20a", "two hundred", "-201"] {
            assert_eq!(RoomNumber::parse(bad), None, "{bad:?} must not parse");
        }
    }

    #[test]
    fn seed_list_covers_all_three_floors() {
        let rooms = seed_room_numbers();
        assert_eq!(rooms.len(), 19 + 29 + 39);
        assert_eq!(rooms.first().map(RoomNumber::as_str), Some("101"));
        assert_eq!(rooms.last().map(RoomNumber::as_str), Some("339"));
        assert!(rooms.contains(&RoomNumber("229".to_string())));
        assert!(!rooms.contains(&RoomNumber("120".to_string())));
    }
}
