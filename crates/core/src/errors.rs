use thiserror::Error;

use crate::domain::record::ServiceStatus;

/// Violations of domain rules. These are expected business outcomes, not
/// infrastructure faults; every variant has a guest-presentable message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidStatusTransition { from: ServiceStatus, to: ServiceStatus },
    #[error("display-id generation gave up after {attempts} attempts for prefix {prefix}")]
    DisplayIdExhausted { prefix: String, attempts: usize },
}

impl DomainError {
    /// Stable text that can go to a guest or dashboard operator without
    /// leaking internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidStatusTransition { .. } => {
                "That status change is not allowed for this record."
            }
            Self::DisplayIdExhausted { .. } => {
                "We could not assign a tracking id. Please try again."
            }
        }
    }
}
