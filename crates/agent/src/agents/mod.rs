//! Department agents. Each takes the typed slots the parser produced plus
//! the guest's room and either answers outright, asks the guest for more,
//! or creates a service record.

mod receptionist;
mod restaurant;
mod room_service;

pub use receptionist::ReceptionistAgent;
pub use restaurant::RestaurantAgent;
pub use room_service::RoomServiceAgent;

use concierge_core::{DomainError, ServiceRecord};
use concierge_db::repositories::RepositoryError;
use thiserror::Error;

/// How a fulfilment attempt ended, for reply shaping and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    /// A service record was written.
    RecordCreated,
    /// The question was answered without touching storage.
    Answered,
    /// The agent needs more from the guest before it can act.
    Clarification,
}

#[derive(Clone, Debug)]
pub struct AgentResult {
    pub reply: String,
    pub record: Option<ServiceRecord>,
    pub outcome: AgentOutcome,
}

impl AgentResult {
    pub fn answered(reply: impl Into<String>) -> AgentResult {
        AgentResult { reply: reply.into(), record: None, outcome: AgentOutcome::Answered }
    }

    pub fn clarification(reply: impl Into<String>) -> AgentResult {
        AgentResult { reply: reply.into(), record: None, outcome: AgentOutcome::Clarification }
    }

    pub fn created(reply: impl Into<String>, record: ServiceRecord) -> AgentResult {
        AgentResult {
            reply: reply.into(),
            record: Some(record),
            outcome: AgentOutcome::RecordCreated,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}
