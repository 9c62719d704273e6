//! Fixed entity roster: label -> stable slot
//!
//! Built once per session. Every per-entity array in the engine (snapshots,
//! deltas, the editable scene) is addressed by the slot handed out here.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DISC_LABEL: &str = "DISC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Blue => "Blue",
            Team::Red => "Red",
        }
    }

    /// Team implied by the default label scheme (`B3`, `R7`).
    pub fn from_label(label: &str) -> Option<Team> {
        match label.chars().next() {
            Some('B') | Some('b') => Some(Team::Blue),
            Some('R') | Some('r') => Some(Team::Red),
            _ => None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Blue" => Ok(Team::Blue),
            "Red" => Ok(Team::Red),
            other => Err(format!("unknown team '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player(Team),
    Disc,
}

impl EntityKind {
    /// `entity` column value in the CSV formats
    pub fn category(&self) -> &'static str {
        match self {
            EntityKind::Player(_) => "player",
            EntityKind::Disc => "disc",
        }
    }

    /// `team` column value in the position CSV
    pub fn team_column(&self) -> &'static str {
        match self {
            EntityKind::Player(team) => team.as_str(),
            EntityKind::Disc => "Disc",
        }
    }

    pub fn is_disc(&self) -> bool {
        matches!(self, EntityKind::Disc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub label: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(label: impl Into<String>, team: Team) -> Self {
        Self { label: label.into(), kind: EntityKind::Player(team) }
    }

    pub fn disc() -> Self {
        Self { label: DISC_LABEL.to_string(), kind: EntityKind::Disc }
    }
}

/// Ordered entity set plus the label -> slot index
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entities: Vec<Entity>,
    index: FxHashMap<String, usize>,
}

impl PartialEq for Roster {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
    }
}

impl Roster {
    /// Build a roster; a repeated label keeps its first slot.
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut roster = Self::default();
        for entity in entities {
            if roster.index.contains_key(&entity.label) {
                tracing::warn!(label = %entity.label, "duplicate roster label ignored");
                continue;
            }
            roster.index.insert(entity.label.clone(), roster.entities.len());
            roster.entities.push(entity);
        }
        roster
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn slot(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn entity(&self, slot: usize) -> Option<&Entity> {
        self.entities.get(slot)
    }

    pub fn label(&self, slot: usize) -> Option<&str> {
        self.entities.get(slot).map(|e| e.label.as_str())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.label.as_str())
    }

    pub fn disc_slot(&self) -> Option<usize> {
        self.entities.iter().position(|e| e.kind.is_disc())
    }

    pub fn player_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.entities.iter().enumerate().filter(|(_, e)| !e.kind.is_disc()).map(|(i, _)| i)
    }
}
