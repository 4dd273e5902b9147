//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Town identifier (node in the travel graph)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize,
    Deserialize,
)]
pub struct TownId(pub u32);

/// Traveler identifier (key into the simulation's traveler registry)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize,
    Deserialize,
)]
pub struct TravelerId(pub u32);

/// Nation identifier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize,
    Deserialize,
)]
pub struct NationId(pub u32);

/// Good type identifier. Stacking identity is this id plus the material.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize,
    Deserialize,
)]
pub struct GoodId(pub u32);

impl GoodId {
    /// Reserved for natural weapons (fists) that never enter an inventory
    pub const NATURAL: GoodId = GoodId(0);
}

/// Simulation time in milliseconds
pub type Millis = u32;

/// 2D map position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance. Route costs are compared in these units.
    pub fn dist_sq(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Move up to `step` units toward `target`.
    ///
    /// Returns true while the target has not been reached.
    pub fn step_toward(&mut self, target: &Self, step: f64) -> bool {
        let dist = self.dist_sq(target).sqrt();
        if dist <= step {
            *self = *target;
            return false;
        }
        let ratio = step / dist;
        self.x += (target.x - self.x) * ratio;
        self.y += (target.y - self.y) * ratio;
        true
    }
}
