//! Parsed guest intent: which departments a message addresses and the slots
//! each department needs to act.

use concierge_core::{Department, RequestType, RoomNumber};
use serde::{Deserialize, Serialize};

/// Confidence reported by the keyword parser. Kept below
/// [`LLM_CONFIDENCE_FLOOR`]: a keyword hit proves less than a model that
/// read the whole sentence.
pub const RULE_CONFIDENCE: f32 = 0.4;

/// Minimum confidence accepted from the model. A parse below this is
/// discarded and the message re-runs through the keyword rules.
pub const LLM_CONFIDENCE_FLOOR: f32 = 0.5;

/// Quantities above this are treated as unparsed and fall back to 1.
pub const MAX_ITEM_QUANTITY: u32 = 20;

/// Which strategy produced a parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseSource {
    Llm,
    RuleBased,
}

impl ParseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseSource::Llm => "llm",
            ParseSource::RuleBased => "rule_based",
        }
    }
}

/// One menu item the guest asked for, before catalog validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestaurantSlots {
    pub items: Vec<RequestedItem>,
    pub menu_requested: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoomServiceSlots {
    pub request_type: Option<RequestType>,
}

/// A department the parser routed the message to, carrying the slots that
/// department consumes. Reception takes none; its agent answers from the raw
/// message, so both parser strategies hand it identical input.
#[derive(Clone, Debug, PartialEq)]
pub enum DepartmentRequest {
    Reception,
    Restaurant(RestaurantSlots),
    RoomService(RoomServiceSlots),
}

impl DepartmentRequest {
    pub fn department(&self) -> Department {
        match self {
            DepartmentRequest::Reception => Department::Receptionist,
            DepartmentRequest::Restaurant(_) => Department::Restaurant,
            DepartmentRequest::RoomService(_) => Department::RoomService,
        }
    }
}

/// An empty-slotted request for a department, used when a follow-up message
/// carries no signal of its own and routing falls back to the previous turn.
pub(crate) fn follow_up_request(department: Department) -> DepartmentRequest {
    match department {
        Department::Receptionist => DepartmentRequest::Reception,
        Department::Restaurant => DepartmentRequest::Restaurant(RestaurantSlots::default()),
        Department::RoomService => DepartmentRequest::RoomService(RoomServiceSlots::default()),
    }
}

pub(crate) fn clamp_quantity(value: u32) -> u32 {
    if (1..=MAX_ITEM_QUANTITY).contains(&value) {
        value
    } else {
        1
    }
}

/// A fully parsed guest turn.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedIntent {
    pub requests: Vec<DepartmentRequest>,
    pub room_number: Option<RoomNumber>,
    pub confidence: f32,
    pub source: ParseSource,
}

impl ParsedIntent {
    pub fn departments(&self) -> Vec<Department> {
        self.requests.iter().map(DepartmentRequest::department).collect()
    }

    /// True when any addressed department needs a booked room.
    pub fn needs_room(&self) -> bool {
        self.requests.iter().any(|request| request.department().requires_room())
    }
}

/// Session state the parser may lean on: the stored room number, and where
/// the previous agent turn went for follow-ups naming neither.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub room_number: Option<RoomNumber>,
    pub last_department: Option<Department>,
}

#[async_trait::async_trait]
pub trait IntentParser: Send + Sync {
    /// Parses one guest message. Never fails: a strategy that cannot produce
    /// a usable parse degrades to the keyword rules instead of erroring.
    async fn parse(&self, message: &str, context: &ParseContext) -> ParsedIntent;

    /// Short strategy name for logs.
    fn mode(&self) -> &'static str;
}
