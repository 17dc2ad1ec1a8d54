//! Timed reveal of layout edges, one lane per layout kind.
//!
//! A running sequence emits [`RenderStep`]s from a spawned task. The
//! controller passes every step back through [`RenderSequencer::accept`]
//! before drawing, so steps that were already queued when a sequence got
//! cancelled are dropped on arrival.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::render::RenderLane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStep {
    pub lane: RenderLane,
    pub sequence: u64,
    pub index: usize,
}

#[derive(Debug, Default)]
struct LaneState {
    sequence: u64,
    remaining: usize,
    task: Option<JoinHandle<()>>,
}

impl LaneState {
    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.sequence += 1;
        self.remaining = 0;
    }
}

#[derive(Debug, Default)]
pub struct RenderSequencer {
    primary: LaneState,
    backup: LaneState,
}

impl RenderSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane_mut(&mut self, lane: RenderLane) -> &mut LaneState {
        match lane {
            RenderLane::Primary => &mut self.primary,
            RenderLane::Backup => &mut self.backup,
        }
    }

    fn lane(&self, lane: RenderLane) -> &LaneState {
        match lane {
            RenderLane::Primary => &self.primary,
            RenderLane::Backup => &self.backup,
        }
    }

    /// Starts revealing `len` items on `lane`, replacing whatever that lane
    /// was doing. The first step fires at once, the rest `cadence` apart.
    /// `emit` returning `false` ends the sequence early.
    pub fn start<F>(&mut self, lane: RenderLane, len: usize, cadence: Duration, mut emit: F) -> u64
    where
        F: FnMut(RenderStep) -> bool + Send + 'static,
    {
        let state = self.lane_mut(lane);
        state.stop();
        let sequence = state.sequence;
        state.remaining = len;
        if len == 0 {
            return sequence;
        }

        debug!(?lane, sequence, len, ?cadence, "starting render sequence");
        state.task = Some(tokio::spawn(async move {
            for index in 0..len {
                if index > 0 {
                    tokio::time::sleep(cadence).await;
                }
                if !emit(RenderStep {
                    lane,
                    sequence,
                    index,
                }) {
                    break;
                }
            }
        }));
        sequence
    }

    /// Returns `true` when `step` belongs to the live sequence of its lane
    /// and should be drawn.
    pub fn accept(&mut self, step: RenderStep) -> bool {
        let state = self.lane_mut(step.lane);
        if state.sequence != step.sequence || state.remaining == 0 {
            debug!(
                lane = ?step.lane,
                sequence = step.sequence,
                index = step.index,
                "dropping render step from a cancelled sequence"
            );
            return false;
        }
        state.remaining -= 1;
        if state.remaining == 0 {
            state.task = None;
        }
        true
    }

    pub fn cancel(&mut self, lane: RenderLane) {
        self.lane_mut(lane).stop();
    }

    pub fn cancel_all(&mut self) {
        self.cancel(RenderLane::Primary);
        self.cancel(RenderLane::Backup);
    }

    pub fn is_animating(&self, lane: RenderLane) -> bool {
        self.lane(lane).remaining > 0
    }

    pub fn is_busy(&self) -> bool {
        self.is_animating(RenderLane::Primary) || self.is_animating(RenderLane::Backup)
    }
}

impl Drop for RenderSequencer {
    fn drop(&mut self) {
        for state in [&mut self.primary, &mut self.backup] {
            if let Some(task) = state.task.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
