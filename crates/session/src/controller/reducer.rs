//! Phase transitions of the interaction state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No houses placed.
    #[default]
    Idle,
    /// Houses placed, no layout.
    Editing,
    /// Primary request in flight.
    Computing,
    LayoutReady,
    /// Contingency request in flight.
    SimulatingFailure,
    ContingencyReady,
}

impl SessionPhase {
    pub fn has_layout(self) -> bool {
        matches!(
            self,
            Self::LayoutReady | Self::SimulatingFailure | Self::ContingencyReady
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    PlaceHouse,
    RequestCompute,
    PrimarySolved,
    PrimaryFailed,
    /// A house moved under an existing or pending layout.
    MoveHouse,
    /// The pending or current layout was dropped without a replacement.
    LayoutDiscarded,
    ClickEdge,
    ContingencySolved,
    ContingencyRejected,
    ContingencyUnreachable,
    Reset,
}

/// `None` means the trigger is not accepted in `phase`.
pub fn transition(phase: SessionPhase, trigger: Trigger) -> Option<SessionPhase> {
    use SessionPhase::*;
    use Trigger::*;

    match (phase, trigger) {
        (_, Reset) => Some(Idle),
        (_, PlaceHouse) => Some(Editing),

        (Idle, RequestCompute) => None,
        (_, RequestCompute) => Some(Computing),

        (Computing, PrimarySolved) => Some(LayoutReady),
        (Computing, PrimaryFailed) => Some(Editing),

        (Computing | LayoutReady | SimulatingFailure | ContingencyReady, MoveHouse) => {
            Some(Computing)
        }
        (Idle, LayoutDiscarded) => Some(Idle),
        (_, LayoutDiscarded) => Some(Editing),

        (LayoutReady | SimulatingFailure | ContingencyReady, ClickEdge) => {
            Some(SimulatingFailure)
        }

        (SimulatingFailure, ContingencySolved) => Some(ContingencyReady),
        (SimulatingFailure, ContingencyRejected | ContingencyUnreachable) => Some(LayoutReady),

        _ => None,
    }
}
