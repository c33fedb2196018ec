use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing target for a guest message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Receptionist,
    Restaurant,
    RoomService,
}

impl Department {
    pub const ALL: [Department; 3] =
        [Department::Receptionist, Department::Restaurant, Department::RoomService];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Receptionist => "receptionist",
            Department::Restaurant => "restaurant",
            Department::RoomService => "room_service",
        }
    }

    /// Human-readable label used when replies from several departments are
    /// stitched together.
    pub fn label(&self) -> &'static str {
        match self {
            Department::Receptionist => "Reception",
            Department::Restaurant => "Restaurant",
            Department::RoomService => "Room Service",
        }
    }

    /// Receptionist questions are answerable without a booked room; the
    /// service departments are not.
    pub fn requires_room(&self) -> bool {
        !matches!(self, Department::Receptionist)
    }

    pub fn parse(value: &str) -> Option<Department> {
        match value.trim().to_ascii_lowercase().as_str() {
            "receptionist" | "reception" => Some(Department::Receptionist),
            "restaurant" => Some(Department::Restaurant),
            "room_service" | "room service" => Some(Department::RoomService),
            _ => None,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
