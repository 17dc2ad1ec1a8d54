//! Owned network state: houses, the accepted primary layout, the failed
//! edge and the backup layout answering it.

use shared::domain::{BackupLayout, FailedEdge, GeoPoint, House, HouseId, PrimaryLayout};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub house: House,
    /// The primary layout was computed against the old coordinate and has
    /// been dropped.
    pub layout_discarded: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NetworkStore {
    houses: Vec<House>,
    editing: bool,
    /// Bumped on every change to the house set or a house coordinate.
    revision: u64,
    primary: Option<PrimaryLayout>,
    failed: Option<FailedEdge>,
    backup: Option<BackupLayout>,
}

impl NetworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.iter().find(|house| house.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn primary(&self) -> Option<&PrimaryLayout> {
        self.primary.as_ref()
    }

    pub fn failed(&self) -> Option<&FailedEdge> {
        self.failed.as_ref()
    }

    pub fn backup(&self) -> Option<&BackupLayout> {
        self.backup.as_ref()
    }

    pub fn add_house(&mut self, at: GeoPoint) -> Result<House, SessionError> {
        if !self.editing {
            return Err(SessionError::invalid(
                "enable add mode before placing houses",
            ));
        }
        if !at.is_valid() {
            return Err(SessionError::invalid(format!(
                "house coordinate {at} is out of range"
            )));
        }

        let house = House {
            id: HouseId(self.houses.len() as u32 + 1),
            location: at,
        };
        self.houses.push(house);
        self.revision += 1;
        self.discard_layout();
        Ok(house)
    }

    pub fn move_house(&mut self, id: HouseId, to: GeoPoint) -> Result<MoveOutcome, SessionError> {
        if !to.is_valid() {
            return Err(SessionError::invalid(format!(
                "house coordinate {to} is out of range"
            )));
        }
        let house = self
            .houses
            .iter_mut()
            .find(|house| house.id == id)
            .ok_or(SessionError::UnknownHouse(id))?;
        house.location = to;
        let house = *house;

        self.revision += 1;
        let layout_discarded = self.primary.is_some();
        self.discard_layout();
        Ok(MoveOutcome {
            house,
            layout_discarded,
        })
    }

    /// Replaces the primary layout and drops any failure simulation.
    /// `computed_for` is the revision the request was built from.
    pub fn accept_primary_layout(
        &mut self,
        layout: PrimaryLayout,
        computed_for: u64,
    ) -> Result<(), SessionError> {
        if computed_for != self.revision {
            return Err(SessionError::Invariant(
                "layout was computed for an outdated house set",
            ));
        }
        if layout.house_count != self.houses.len() {
            return Err(SessionError::Invariant(
                "layout house count differs from the placed houses",
            ));
        }
        self.primary = Some(layout);
        self.failed = None;
        self.backup = None;
        Ok(())
    }

    /// Marks a tree edge as failed. Any backup for a previous failure goes.
    pub fn mark_failed(&mut self, failed: FailedEdge) -> Result<(), SessionError> {
        let primary = self
            .primary
            .as_ref()
            .ok_or_else(|| SessionError::invalid("generate a layout first"))?;
        match primary.edge(failed.id) {
            Some(edge) if *edge == failed.edge => {}
            _ => {
                return Err(SessionError::Invariant(
                    "failed edge is not part of the primary layout",
                ))
            }
        }
        self.backup = None;
        self.failed = Some(failed);
        Ok(())
    }

    pub fn accept_backup_layout(&mut self, layout: BackupLayout) -> Result<(), SessionError> {
        if self.primary.is_none() {
            return Err(SessionError::Invariant("backup layout without a primary layout"));
        }
        if self.failed != Some(layout.failed) {
            return Err(SessionError::Invariant(
                "backup layout answers a different failed edge",
            ));
        }
        self.backup = Some(layout);
        Ok(())
    }

    pub fn clear_backup(&mut self) {
        self.backup = None;
        self.failed = None;
    }

    pub fn discard_layout(&mut self) {
        self.primary = None;
        self.clear_backup();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn check_invariants(&self) -> Result<(), SessionError> {
        if self.failed.is_some() && self.primary.is_none() {
            return Err(SessionError::Invariant("failed edge without a primary layout"));
        }
        if let Some(backup) = &self.backup {
            if self.primary.is_none() || self.failed != Some(backup.failed) {
                return Err(SessionError::Invariant(
                    "backup layout requires a primary layout and its failed edge",
                ));
            }
        }
        if let Some(primary) = &self.primary {
            if primary.house_count != self.houses.len() {
                return Err(SessionError::Invariant(
                    "primary layout does not cover the placed houses",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
