//! Session controller for the distribution network designer.
//!
//! The controller owns every piece of client-visible state: placed houses,
//! the accepted primary layout, the simulated failure and its backup
//! layout. Solver replies and animation steps come back as
//! [`SessionEvent`]s and are applied on the single task that owns the
//! [`SessionController`].

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod render;
pub mod sequencer;
pub mod status;
pub mod store;

pub use config::{load_session_settings, load_session_settings_from, SessionSettings};
pub use controller::{SessionController, SessionEvent, SessionPhase, UserAction};
pub use error::SessionError;
pub use export::{export_file_name, SessionExport, PROJECT_NAME};
pub use render::{LineHandle, LineStyle, MarkerHandle, RenderSurface};
pub use status::{StatusMessage, StatusPanel, StatusTone};
pub use store::NetworkStore;
