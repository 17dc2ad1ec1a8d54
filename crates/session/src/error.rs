use shared::{domain::HouseId, error::InputError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("house {0} does not exist")]
    UnknownHouse(HouseId),
    #[error("network state invariant violated: {0}")]
    Invariant(&'static str),
}

impl SessionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<InputError> for SessionError {
    fn from(err: InputError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
