use shared::domain::{BackupLayout, GeoPoint, PrimaryLayout};
use solver_client::{RequestTicket, SolverFailure};

use crate::{
    render::{LineHandle, MarkerHandle},
    sequencer::RenderStep,
};

/// Input coming from the map widget and the page controls.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    EnableAddMode,
    MapClicked(GeoPoint),
    MarkerDragged { marker: MarkerHandle, to: GeoPoint },
    /// Raw text of the cost-per-meter field.
    SetCostPerMeter(String),
    RequestCompute,
    LineClicked(LineHandle),
    Reset,
}

/// Work that finished off the controller task and now has to be applied.
#[derive(Debug)]
pub enum SessionEvent {
    PrimarySettled {
        ticket: RequestTicket,
        /// Store revision the request was built from.
        revision: u64,
        result: Result<PrimaryLayout, SolverFailure>,
    },
    ContingencySettled {
        ticket: RequestTicket,
        result: Result<BackupLayout, SolverFailure>,
    },
    RenderStep(RenderStep),
}
