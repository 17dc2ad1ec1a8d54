//! Request generations used to discard replies that arrive after a newer
//! request of the same kind was issued.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Primary,
    Contingency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub generation: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Lane {
    generation: u64,
    outstanding: bool,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    primary: Lane,
    contingency: Lane,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, kind: RequestKind) -> &Lane {
        match kind {
            RequestKind::Primary => &self.primary,
            RequestKind::Contingency => &self.contingency,
        }
    }

    fn lane_mut(&mut self, kind: RequestKind) -> &mut Lane {
        match kind {
            RequestKind::Primary => &mut self.primary,
            RequestKind::Contingency => &mut self.contingency,
        }
    }

    /// Issues a ticket that supersedes every earlier ticket of the same kind.
    pub fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        let lane = self.lane_mut(kind);
        lane.generation += 1;
        lane.outstanding = true;
        RequestTicket {
            kind,
            generation: lane.generation,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        let lane = self.lane(ticket.kind);
        lane.outstanding && lane.generation == ticket.generation
    }

    /// Marks the reply for `ticket` as arrived. Returns `false` for stale
    /// tickets, whose replies must be dropped.
    pub fn complete(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.lane_mut(ticket.kind).outstanding = false;
        true
    }

    /// Invalidates any outstanding ticket of `kind` without issuing a new one.
    pub fn supersede(&mut self, kind: RequestKind) {
        let lane = self.lane_mut(kind);
        lane.generation += 1;
        lane.outstanding = false;
    }

    pub fn supersede_all(&mut self) {
        self.supersede(RequestKind::Primary);
        self.supersede(RequestKind::Contingency);
    }

    pub fn has_outstanding(&self, kind: RequestKind) -> bool {
        self.lane(kind).outstanding
    }
}
