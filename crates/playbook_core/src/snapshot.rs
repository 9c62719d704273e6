//! Full per-slot position sets and formations

use crate::error::{CoreError, Result};
use crate::field::{Pos, FIELD_LEN, FIELD_WID};
use crate::roster::{Entity, Roster, Team};

/// One position per roster slot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    positions: Vec<Pos>,
}

impl Snapshot {
    pub fn new(positions: Vec<Pos>) -> Self {
        Self { positions }
    }

    /// Build from label-keyed positions that must cover `roster` exactly.
    ///
    /// A label given twice keeps its last value.
    pub fn from_labeled<L, I>(roster: &Roster, entries: I) -> Result<Self>
    where
        L: AsRef<str>,
        I: IntoIterator<Item = (L, Pos)>,
    {
        let mut slots: Vec<Option<Pos>> = vec![None; roster.len()];
        let mut extra = Vec::new();
        for (label, pos) in entries {
            match roster.slot(label.as_ref()) {
                Some(slot) => slots[slot] = Some(pos),
                None => extra.push(label.as_ref().to_string()),
            }
        }
        let missing: Vec<String> = slots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .filter_map(|(slot, _)| roster.label(slot).map(str::to_string))
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(CoreError::InvalidBaseline { missing, extra });
        }
        Ok(Self { positions: slots.into_iter().flatten().collect() })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<Pos> {
        self.positions.get(slot).copied()
    }

    /// Overwrite one slot. Out-of-range slots are ignored and reported.
    pub fn set(&mut self, slot: usize, pos: Pos) -> bool {
        match self.positions.get_mut(slot) {
            Some(p) => {
                *p = pos;
                true
            }
            None => false,
        }
    }

    pub fn positions(&self) -> &[Pos] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Pos)> + '_ {
        self.positions.iter().copied().enumerate()
    }

    /// Position of `label`, if it is in the roster.
    pub fn position_of(&self, roster: &Roster, label: &str) -> Option<Pos> {
        roster.slot(label).and_then(|slot| self.get(slot))
    }

    /// Per-slot linear blend. Both snapshots must cover the same roster.
    pub fn interpolate(&self, to: &Snapshot, frac: f64) -> Snapshot {
        Snapshot {
            positions: self.positions.iter().zip(&to.positions).map(|(a, b)| a.lerp(b, frac)).collect(),
        }
    }

    /// Player closest to `target`; exact ties go to the lowest slot.
    pub fn nearest_player(&self, roster: &Roster, target: Pos) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for slot in roster.player_slots() {
            let Some(pos) = self.get(slot) else { continue };
            let d = pos.distance_to(&target);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((slot, d));
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Player closest to the disc, for the "who has it" hint.
    pub fn nearest_player_to_disc(&self, roster: &Roster) -> Option<usize> {
        let disc = roster.disc_slot().and_then(|slot| self.get(slot))?;
        self.nearest_player(roster, disc)
    }

    /// Entity under a pointer.
    ///
    /// The disc wins whenever it is within `disc_radius`; otherwise the
    /// nearest player within `player_radius` (lowest slot on ties).
    pub fn hit_test(
        &self,
        roster: &Roster,
        point: Pos,
        player_radius: f64,
        disc_radius: f64,
    ) -> Option<usize> {
        if let Some(slot) = roster.disc_slot() {
            if self.get(slot).is_some_and(|p| p.distance_to(&point) <= disc_radius) {
                return Some(slot);
            }
        }
        self.nearest_player(roster, point)
            .filter(|&slot| self.get(slot).is_some_and(|p| p.distance_to(&point) <= player_radius))
    }
}

/// A roster together with one position per entity: the position-CSV shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    pub roster: Roster,
    pub positions: Snapshot,
}

impl Formation {
    pub fn new(entries: Vec<(Entity, Pos)>) -> Self {
        let roster = Roster::new(entries.iter().map(|(e, _)| e.clone()));
        // duplicates were dropped by the roster; keep the first position to match
        let mut positions = vec![None; roster.len()];
        for (entity, pos) in entries {
            if let Some(slot) = roster.slot(&entity.label) {
                positions[slot].get_or_insert(pos);
            }
        }
        Self { roster, positions: Snapshot::new(positions.into_iter().flatten().collect()) }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Entity, Pos)> + '_ {
        self.roster.entities().iter().zip(self.positions.positions().iter().copied())
    }
}

impl Default for Formation {
    /// Seven per side in two columns near each end zone, disc at centre.
    fn default() -> Self {
        let pad = 3.0;
        let usable = FIELD_WID - 2.0 * pad;
        let rows4: Vec<f64> = (0..4).map(|i| pad + usable * i as f64 / 3.0).collect();
        let rows3: Vec<f64> = (0..3).map(|i| pad + usable * (i as f64 + 0.5) / 3.0).collect();

        let side = |team: Team, front: f64, back: f64, prefix: &str| -> Vec<(Entity, Pos)> {
            rows4
                .iter()
                .map(|&y| Pos::new(front, y))
                .chain(rows3.iter().map(|&y| Pos::new(back, y)))
                .enumerate()
                .map(|(i, p)| (Entity::player(format!("{}{}", prefix, i + 1), team), p))
                .collect()
        };

        let mut entries = side(Team::Blue, 6.0, 12.0, "B");
        entries.extend(side(Team::Red, FIELD_LEN - 6.0, FIELD_LEN - 12.0, "R"));
        entries.push((Entity::disc(), Pos::center()));
        Self::new(entries)
    }
}
