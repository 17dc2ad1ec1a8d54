use shared::{error::InputError, error::SolverErrorBody, impact::ImpactLevel};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Removing the failed edge leaves some house unreachable.
    Disconnected,
    Other,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverFailure {
    #[error("solver rejected the request: {message}")]
    Rejected {
        reason: RejectionReason,
        message: String,
    },
    #[error("communication error with solver: {0}")]
    Communication(String),
    #[error(transparent)]
    InvalidInput(#[from] InputError),
}

impl SolverFailure {
    pub fn from_rejection(body: SolverErrorBody) -> Self {
        let reason = if body.impact == Some(ImpactLevel::Critical) {
            RejectionReason::Disconnected
        } else {
            classify_rejection(&body.error)
        };
        let message = match body.details {
            Some(details) if !details.is_empty() => format!("{} ({details})", body.error),
            _ => body.error,
        };
        Self::Rejected { reason, message }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::Rejected {
            reason: RejectionReason::Disconnected,
            message: message.into(),
        }
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                reason: RejectionReason::Disconnected,
                ..
            }
        )
    }
}

pub fn classify_rejection(message: &str) -> RejectionReason {
    let lower = message.to_ascii_lowercase();
    if lower.contains("disconnect") || lower.contains("invalid edge") {
        RejectionReason::Disconnected
    } else {
        RejectionReason::Other
    }
}
