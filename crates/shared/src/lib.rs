pub mod domain;
pub mod error;
pub mod impact;
pub mod protocol;
