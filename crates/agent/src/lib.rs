//! Intent routing and fulfilment for guest conversations.
//!
//! A guest turn moves through three stages:
//! 1. **Parse** (`intent`, `rules`, `llm`) - the message becomes a
//!    [`ParsedIntent`]: zero or more department requests with typed slots,
//!    plus the room number if one was given.
//! 2. **Gate** (`orchestrator`) - requests that would reach a guest's room
//!    are held until a verified room number is on the session.
//! 3. **Dispatch** (`agents`) - each matched department answers or creates
//!    a service record; replies are merged into one message.
//!
//! Two parser strategies exist behind [`IntentParser`]: deterministic
//! keyword rules, and a model-backed parser that degrades to those same
//! rules whenever the model is unreachable, slow, or unconvincing. The
//! model is strictly a translator; what gets ordered, logged, or charged
//! is decided by the agents and the catalog.

pub mod agents;
pub mod intent;
pub mod llm;
pub mod orchestrator;
pub mod rules;

pub use agents::{
    AgentError, AgentOutcome, AgentResult, ReceptionistAgent, RestaurantAgent, RoomServiceAgent,
};
pub use intent::{
    DepartmentRequest, IntentParser, ParseContext, ParseSource, ParsedIntent, RequestedItem,
    RestaurantSlots, RoomServiceSlots,
};
pub use llm::{LlmClient, LlmIntentParser, OpenAiCompatClient};
pub use orchestrator::{
    DashboardSnapshot, Orchestrator, OrchestratorError, TurnOutcome, TurnRequest,
};
pub use rules::RuleBasedParser;
