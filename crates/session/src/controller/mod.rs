use std::{sync::Arc, time::Duration};

use chrono::Utc;
use shared::{
    domain::{BackupLayout, EdgeId, FailedEdge, GeoPoint, HouseId, PrimaryLayout, Substation},
    error::InputError,
    impact::{classify, ContingencyAssessment},
    protocol::{parse_cost_per_meter, MIN_HOUSES},
};
use solver_client::{RequestKind, SolverBackend, SolverClient, SolverFailure};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    config::SessionSettings,
    error::SessionError,
    export::SessionExport,
    render::{LineHandle, LineStyle, MarkerHandle, RenderLane, RenderRegistry, RenderSurface},
    sequencer::RenderSequencer,
    status::{StatusMessage, StatusPanel},
    store::NetworkStore,
};

mod events;
mod orchestration;
pub mod reducer;

pub use events::{SessionEvent, UserAction};
pub use reducer::{SessionPhase, Trigger};

/// Single owner of the session state. Every mutation goes through
/// [`SessionController::handle`] or [`SessionController::apply`], both called
/// from the task that owns the controller.
pub struct SessionController<R: RenderSurface> {
    settings: SessionSettings,
    substations: Vec<Substation>,
    store: NetworkStore,
    phase: SessionPhase,
    solver: SolverClient,
    surface: R,
    registry: RenderRegistry,
    sequencer: RenderSequencer,
    cost_input: String,
    assessment: Option<ContingencyAssessment>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl<R: RenderSurface> SessionController<R> {
    /// Places the substation markers and returns an idle session.
    pub fn mount(
        settings: SessionSettings,
        backend: Arc<dyn SolverBackend>,
        substations: Vec<Substation>,
        mut surface: R,
    ) -> Self {
        let mut registry = RenderRegistry::new();
        for substation in &substations {
            let marker = surface.place_marker(substation.location(), &substation.name, false);
            registry.register_substation(marker);
        }
        info!(substations = substations.len(), "session mounted");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            settings,
            substations,
            store: NetworkStore::new(),
            phase: SessionPhase::Idle,
            solver: SolverClient::new(backend),
            surface,
            registry,
            sequencer: RenderSequencer::new(),
            cost_input: String::new(),
            assessment: None,
            events_tx,
            events_rx,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn store(&self) -> &NetworkStore {
        &self.store
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn substations(&self) -> &[Substation] {
        &self.substations
    }

    pub fn solver(&self) -> &SolverClient {
        &self.solver
    }

    pub fn assessment(&self) -> Option<&ContingencyAssessment> {
        self.assessment.as_ref()
    }

    pub fn cost_input(&self) -> &str {
        &self.cost_input
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn registry(&self) -> &RenderRegistry {
        &self.registry
    }

    pub fn line_for_edge(&self, edge: EdgeId) -> Option<LineHandle> {
        self.registry.line_for_edge(edge)
    }

    pub fn marker_for_house(&self, house: HouseId) -> Option<MarkerHandle> {
        self.registry.marker_for_house(house)
    }

    /// A solver request is in flight or edges are still being revealed.
    pub fn is_busy(&self) -> bool {
        self.solver.has_outstanding(RequestKind::Primary)
            || self.solver.has_outstanding(RequestKind::Contingency)
            || self.sequencer.is_busy()
    }

    pub fn handle(&mut self, action: UserAction) -> Result<(), SessionError> {
        debug!(?action, phase = ?self.phase, "user action");
        match action {
            UserAction::EnableAddMode => {
                self.store.set_editing(true);
                Ok(())
            }
            UserAction::MapClicked(at) => self.place_house(at),
            UserAction::MarkerDragged { marker, to } => {
                let house = self.registry.house_for_marker(marker).ok_or_else(|| {
                    SessionError::invalid(format!("marker {} is not a house", marker.0))
                })?;
                self.drag_house(house, to)
            }
            UserAction::SetCostPerMeter(text) => {
                self.cost_input = text;
                Ok(())
            }
            UserAction::RequestCompute => self.request_compute(),
            UserAction::LineClicked(line) => self.simulate_failure(line),
            UserAction::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Waits for the next finished request or animation step.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Applies every event that is already queued without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Applies events until no request is in flight and no animation runs.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PrimarySettled {
                ticket,
                revision,
                result,
            } => {
                if !self.solver.complete(&ticket) {
                    debug!(
                        generation = ticket.generation,
                        "dropping superseded primary reply"
                    );
                    return;
                }
                self.primary_settled(revision, result);
            }
            SessionEvent::ContingencySettled { ticket, result } => {
                if !self.solver.complete(&ticket) {
                    debug!(
                        generation = ticket.generation,
                        "dropping superseded contingency reply"
                    );
                    return;
                }
                self.contingency_settled(result);
            }
            SessionEvent::RenderStep(step) => {
                if self.sequencer.accept(step) {
                    self.draw_step(step.lane, step.index);
                }
            }
        }
    }

    pub fn export(&self) -> Result<SessionExport, SessionError> {
        let layout = self
            .store
            .primary()
            .cloned()
            .ok_or_else(|| SessionError::invalid("generate a layout first"))?;
        Ok(SessionExport::new(
            layout,
            self.store.houses(),
            self.store.backup().cloned(),
            Utc::now(),
        ))
    }

    fn transition(&mut self, trigger: Trigger) -> Result<(), SessionError> {
        let next = reducer::transition(self.phase, trigger).ok_or_else(|| {
            SessionError::invalid(format!("{trigger:?} is not possible while {:?}", self.phase))
        })?;
        if next != self.phase {
            info!(from = ?self.phase, to = ?next, ?trigger, "session phase changed");
        }
        self.phase = next;
        Ok(())
    }

    /// Transition for solver outcomes, which are only applied while their
    /// request is current and so always find the matching phase.
    fn settle_transition(&mut self, trigger: Trigger) {
        if let Err(err) = self.transition(trigger) {
            warn!("unexpected solver outcome: {err}");
        }
    }

    fn place_house(&mut self, at: GeoPoint) -> Result<(), SessionError> {
        let had_layout = self.phase.has_layout()
            || self.phase == SessionPhase::Computing
            || self.store.primary().is_some();
        let house = self.store.add_house(at)?;
        let marker = self
            .surface
            .place_marker(house.location, &house.id.to_string(), true);
        self.registry.register_house(house.id, marker);
        info!(house = %house.id, location = %house.location, "house placed");

        if had_layout {
            self.solver.supersede_all();
            self.tear_down_layout();
            self.surface.hide_panel(StatusPanel::Results);
        }
        self.transition(Trigger::PlaceHouse)
    }

    fn drag_house(&mut self, house: HouseId, to: GeoPoint) -> Result<(), SessionError> {
        let pending_layout = self.phase == SessionPhase::Computing;
        let outcome = self.store.move_house(house, to)?;
        info!(house = %house, location = %to, "house moved");
        if !outcome.layout_discarded && !pending_layout {
            return Ok(());
        }

        self.solver.supersede(RequestKind::Contingency);
        self.tear_down_layout();
        match self.current_cost() {
            Ok(cost) => {
                self.begin_primary(cost)?;
                self.transition(Trigger::MoveHouse)
            }
            Err(err) => {
                self.solver.supersede(RequestKind::Primary);
                self.surface
                    .show_panel(StatusPanel::Results, &StatusMessage::error(&err));
                self.transition(Trigger::LayoutDiscarded)?;
                Err(err)
            }
        }
    }

    fn current_cost(&self) -> Result<f64, SessionError> {
        Ok(parse_cost_per_meter(&self.cost_input)?)
    }

    fn request_compute(&mut self) -> Result<(), SessionError> {
        self.store.set_editing(false);
        let house_count = self.store.houses().len();
        if house_count < MIN_HOUSES {
            return Err(InputError::TooFewHouses(house_count).into());
        }
        let cost = self.current_cost()?;

        self.solver.supersede(RequestKind::Contingency);
        self.tear_down_layout();
        self.store.discard_layout();
        self.begin_primary(cost)?;
        self.transition(Trigger::RequestCompute)
    }

    fn begin_primary(&mut self, cost_per_meter: f64) -> Result<(), SessionError> {
        let pending = self.solver.request_primary_layout(
            self.store.houses(),
            cost_per_meter,
            &self.substations,
        )?;
        info!(
            houses = self.store.houses().len(),
            cost_per_meter,
            generation = pending.ticket.generation,
            "requesting primary layout"
        );
        self.surface
            .show_panel(StatusPanel::Results, &StatusMessage::computing());
        orchestration::dispatch_primary(self.events_tx.clone(), pending, self.store.revision());
        Ok(())
    }

    fn primary_settled(
        &mut self,
        revision: u64,
        result: Result<PrimaryLayout, SolverFailure>,
    ) {
        let layout = match result {
            Ok(layout) => layout,
            Err(failure) => {
                warn!("primary layout failed: {failure}");
                self.store.discard_layout();
                self.surface
                    .show_panel(StatusPanel::Results, &StatusMessage::error(&failure));
                self.settle_transition(Trigger::PrimaryFailed);
                return;
            }
        };

        if let Err(err) = self.store.accept_primary_layout(layout, revision) {
            warn!("refusing primary layout: {err}");
            self.surface
                .show_panel(StatusPanel::Results, &StatusMessage::error(&err));
            self.settle_transition(Trigger::PrimaryFailed);
            return;
        }
        self.settle_transition(Trigger::PrimarySolved);
        self.render_primary();
    }

    fn render_primary(&mut self) {
        let Some(layout) = self.store.primary() else {
            return;
        };
        let link = layout.substation_connection.clone();
        let edge_count = layout.edges.len();
        let summary = StatusMessage::layout_ready(layout);
        info!(
            edges = edge_count,
            total_length = layout.total_length,
            total_cost = layout.total_cost,
            "primary layout accepted"
        );

        let handle = self
            .surface
            .draw_line(link.house, link.substation, LineStyle::SubstationLink);
        self.surface.bind_popup(
            handle,
            &format!("Substation Connection\nDistance: {:.2}m", link.distance),
            false,
        );
        self.registry.register_substation_link(handle);
        self.surface.show_panel(StatusPanel::Results, &summary);

        let cadence = self.settings.edge_reveal();
        self.reveal(RenderLane::Primary, edge_count, cadence);
    }

    fn reveal(&mut self, lane: RenderLane, len: usize, cadence: Duration) {
        if cadence.is_zero() {
            self.sequencer.cancel(lane);
            for index in 0..len {
                self.draw_step(lane, index);
            }
            return;
        }
        let events = self.events_tx.clone();
        self.sequencer.start(lane, len, cadence, move |step| {
            events.send(SessionEvent::RenderStep(step)).is_ok()
        });
    }

    fn draw_step(&mut self, lane: RenderLane, index: usize) {
        match lane {
            RenderLane::Primary => self.draw_tree_edge(index),
            RenderLane::Backup => self.draw_backup_edge(index),
        }
    }

    fn draw_tree_edge(&mut self, index: usize) {
        let Some(edge) = self
            .store
            .primary()
            .and_then(|layout| layout.edge(EdgeId(index)))
            .copied()
        else {
            return;
        };
        let handle = self.surface.draw_line(edge.start, edge.end, LineStyle::Primary);
        self.surface.enable_line_click(handle);
        self.surface.bind_popup(
            handle,
            &format!(
                "MST Edge {}\nDistance: {:.2}m\nClick to simulate failure",
                index + 1,
                edge.distance
            ),
            false,
        );
        self.registry.register_tree_edge(EdgeId(index), handle);
    }

    fn draw_backup_edge(&mut self, index: usize) {
        let Some(edge) = self
            .store
            .backup()
            .and_then(|layout| layout.edges.get(index))
            .copied()
        else {
            return;
        };
        let handle = self.surface.draw_line(edge.start, edge.end, LineStyle::Backup);
        self.surface.bind_popup(
            handle,
            &format!("Backup Edge {}\nDistance: {:.2}m", index + 1, edge.distance),
            false,
        );
        self.registry.register_backup_edge(handle);
    }

    fn simulate_failure(&mut self, line: LineHandle) -> Result<(), SessionError> {
        let edge_id = self
            .registry
            .edge_for_line(line)
            .ok_or_else(|| SessionError::invalid("only layout edges can be failed"))?;
        if reducer::transition(self.phase, Trigger::ClickEdge).is_none() {
            return Err(SessionError::invalid(format!(
                "cannot simulate a failure while {:?}",
                self.phase
            )));
        }
        let (edge, cost_per_meter) = match self.store.primary() {
            Some(layout) => match layout.edge(edge_id) {
                Some(edge) => (*edge, layout.cost_per_meter),
                None => return Err(SessionError::Invariant("rendered edge missing from layout")),
            },
            None => return Err(SessionError::invalid("generate a layout first")),
        };

        self.clear_backup_visuals();
        let failed = FailedEdge { id: edge_id, edge };
        self.store.mark_failed(failed)?;
        self.registry.set_failed(line);
        self.surface.set_line_style(line, LineStyle::FailedHighlight);
        self.surface.bind_popup(
            line,
            &format!(
                "Simulating failure of this edge\nDistance: {:.2}m",
                edge.distance
            ),
            true,
        );

        let pending = self.solver.request_contingency_layout(
            self.store.houses(),
            cost_per_meter,
            &self.substations,
            failed,
        )?;
        info!(
            edge = edge_id.0 + 1,
            generation = pending.ticket.generation,
            "simulating edge failure"
        );
        orchestration::dispatch_contingency(self.events_tx.clone(), pending);
        self.transition(Trigger::ClickEdge)
    }

    fn contingency_settled(&mut self, result: Result<BackupLayout, SolverFailure>) {
        let primary_cost = match self.store.primary() {
            Some(layout) => layout.total_cost,
            None => {
                warn!("contingency reply without a primary layout");
                return;
            }
        };

        match result {
            Ok(backup) => {
                let backup_cost = backup.total_cost;
                let edge_count = backup.edges.len();
                if let Err(err) = self.store.accept_backup_layout(backup) {
                    warn!("refusing backup layout: {err}");
                    self.conclude_contingency(
                        ContingencyAssessment::unknown(err.to_string()),
                        Trigger::ContingencyUnreachable,
                        primary_cost,
                        None,
                    );
                    return;
                }
                if let (Some(primary), Some(backup)) = (self.store.primary(), self.store.backup())
                {
                    let message = StatusMessage::backup_active(primary, backup);
                    self.surface.show_panel(StatusPanel::Backup, &message);
                }
                let cadence = self.settings.backup_reveal();
                self.reveal(RenderLane::Backup, edge_count, cadence);
                self.conclude_contingency(
                    classify(primary_cost, backup_cost),
                    Trigger::ContingencySolved,
                    primary_cost,
                    Some(backup_cost),
                );
            }
            Err(SolverFailure::Communication(message)) => {
                warn!("contingency request failed: {message}");
                self.conclude_contingency(
                    ContingencyAssessment::unknown("Communication error with backend"),
                    Trigger::ContingencyUnreachable,
                    primary_cost,
                    None,
                );
            }
            Err(failure) => {
                warn!(
                    disconnected = failure.is_disconnected(),
                    "contingency rejected: {failure}"
                );
                let detail = match failure {
                    SolverFailure::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                self.conclude_contingency(
                    ContingencyAssessment::disconnected(detail),
                    Trigger::ContingencyRejected,
                    primary_cost,
                    None,
                );
            }
        }
    }

    fn conclude_contingency(
        &mut self,
        assessment: ContingencyAssessment,
        trigger: Trigger,
        primary_cost: f64,
        backup_cost: Option<f64>,
    ) {
        info!(
            impact = %assessment.impact,
            increase_pct = ?assessment.increase_pct,
            "contingency assessed"
        );
        let message = StatusMessage::failure_analysis(&assessment, primary_cost, backup_cost);
        self.surface.show_panel(StatusPanel::FailureAnalysis, &message);
        self.assessment = Some(assessment);
        self.settle_transition(trigger);
    }

    /// Removes backup lines, restores the failed edge and hides the backup
    /// panels. The store's failure state is left to the caller.
    fn clear_backup_visuals(&mut self) {
        self.sequencer.cancel(RenderLane::Backup);
        for handle in self.registry.drain_lane(RenderLane::Backup) {
            self.surface.remove_line(handle);
        }
        if let Some(previous) = self.registry.clear_failed() {
            self.surface.set_line_style(previous, LineStyle::Primary);
        }
        self.surface.hide_panel(StatusPanel::Backup);
        self.surface.hide_panel(StatusPanel::FailureAnalysis);
        self.assessment = None;
    }

    fn tear_down_layout(&mut self) {
        self.sequencer.cancel_all();
        for lane in [RenderLane::Backup, RenderLane::Primary] {
            for handle in self.registry.drain_lane(lane) {
                self.surface.remove_line(handle);
            }
        }
        self.surface.hide_panel(StatusPanel::Backup);
        self.surface.hide_panel(StatusPanel::FailureAnalysis);
        self.assessment = None;
    }

    fn reset(&mut self) {
        self.solver.supersede_all();
        self.tear_down_layout();
        for marker in self.registry.drain_house_markers() {
            self.surface.remove_marker(marker);
        }
        self.store.reset();
        self.cost_input.clear();
        for panel in StatusPanel::ALL {
            self.surface.hide_panel(panel);
        }
        self.phase = SessionPhase::Idle;
        info!("session reset");
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
