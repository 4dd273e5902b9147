//! AI decision interface for computer-controlled travelers
//!
//! The engine only talks to an AI through `Controller`. It hands over
//! read-only views and gets back a fight choice, a target, or an intent to
//! act; it never looks inside the controller.

use serde::{Deserialize, Serialize};

use crate::combat::FightChoice;
use crate::core::types::{GoodId, Millis, TownId, TravelerId};

/// What a computer-controlled traveler does for a living
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRole {
    Trader,
    Soldier,
    Bandit,
    Agent,
    /// Follows and defends its employer
    Guard,
    /// Follows its employer and joins its attacks
    Thug,
}

impl AiRole {
    /// Employees with these roles follow their employer between towns
    pub fn follows_employer(self) -> bool {
        matches!(self, AiRole::Guard | AiRole::Thug)
    }
}

/// Something an AI wants to do this tick
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    PickTown(TownId),
    Attack(TravelerId),
    /// Offer goods to the current town's market in exchange for others
    Trade {
        offer: Vec<(GoodId, f64)>,
        request: Vec<(GoodId, f64)>,
    },
}

/// Combat situation as seen by one combatant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightView {
    /// 1.0 when unhurt, 0.0 when every part is destroyed
    pub health: f64,
    pub enemies: usize,
    pub allies: usize,
}

/// A candidate target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub id: TravelerId,
    pub alive: bool,
    pub choice: FightChoice,
    /// How many combatants are already targeting this one
    pub targeters: u32,
}

/// Travel situation of an idle traveler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelView {
    pub town: TownId,
    pub moving: bool,
    pub fighting: bool,
    pub neighbors: Vec<TownId>,
    pub attackable: Vec<TravelerId>,
    /// Goods carried, with amounts
    pub carried: Vec<(GoodId, f64)>,
}

/// Decision interface the simulation calls into
pub trait Controller: std::fmt::Debug {
    fn role(&self) -> AiRole;

    /// Tactical stance for the current fight
    fn choice(&self, view: &FightView) -> FightChoice;

    /// Pick a target among `enemies`
    fn target(&self, enemies: &[TargetView]) -> Option<TravelerId> {
        default_target(enemies)
    }

    /// Advance the controller's own clock and maybe act
    fn update(&mut self, _elapsed_ms: Millis, _view: &TravelView) -> Option<Intent> {
        None
    }

    /// Whether a won fight is followed by looting the losers
    fn loots(&self) -> bool {
        true
    }
}

/// Live enemies that still fight, then other live enemies; fewest targeters, then lowest id
pub fn default_target(enemies: &[TargetView]) -> Option<TravelerId> {
    enemies
        .iter()
        .filter(|e| e.alive)
        .min_by_key(|e| (e.choice != FightChoice::Fight, e.targeters, e.id))
        .map(|e| e.id)
}

/// Controller used for every generated traveler
#[derive(Debug, Clone, PartialEq)]
pub struct BasicAi {
    role: AiRole,
    /// Time spent idle in town
    idle_ms: Millis,
    /// Idle time before moving on
    wander_ms: Millis,
    /// Rotates through neighbors so routes vary deterministically
    next_neighbor: usize,
}

impl BasicAi {
    pub fn new(role: AiRole) -> Self {
        Self {
            role,
            idle_ms: 0,
            wander_ms: 3000,
            next_neighbor: 0,
        }
    }

    pub fn with_wander_ms(mut self, wander_ms: Millis) -> Self {
        self.wander_ms = wander_ms;
        self
    }

    fn wander(&mut self, view: &TravelView) -> Option<Intent> {
        if view.neighbors.is_empty() {
            return None;
        }
        let town = view.neighbors[self.next_neighbor % view.neighbors.len()];
        self.next_neighbor += 1;
        Some(Intent::PickTown(town))
    }
}

impl Controller for BasicAi {
    fn role(&self) -> AiRole {
        self.role
    }

    fn choice(&self, view: &FightView) -> FightChoice {
        match self.role {
            AiRole::Trader | AiRole::Agent => {
                if view.health < 0.5 {
                    FightChoice::Yield
                } else if view.enemies > view.allies + 1 {
                    FightChoice::Run
                } else {
                    FightChoice::Fight
                }
            }
            AiRole::Bandit => {
                if view.health < 0.5 {
                    FightChoice::Run
                } else {
                    FightChoice::Fight
                }
            }
            AiRole::Soldier | AiRole::Guard | AiRole::Thug => {
                if view.health < 0.25 {
                    FightChoice::Yield
                } else {
                    FightChoice::Fight
                }
            }
        }
    }

    fn update(&mut self, elapsed_ms: Millis, view: &TravelView) -> Option<Intent> {
        if view.moving || view.fighting {
            self.idle_ms = 0;
            return None;
        }
        if self.role == AiRole::Bandit {
            if let Some(&victim) = view.attackable.first() {
                return Some(Intent::Attack(victim));
            }
        }
        // Employees travel with their employer instead of wandering
        if self.role.follows_employer() {
            return None;
        }
        self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        if self.idle_ms < self.wander_ms {
            return None;
        }
        self.idle_ms = 0;
        self.wander(view)
    }

    fn loots(&self) -> bool {
        self.role != AiRole::Guard
    }
}

/// Boxed controller for a role
pub fn controller_for(role: AiRole) -> Box<dyn Controller> {
    Box::new(BasicAi::new(role))
}
