//! Simulation - the traveler registry and everything that spans travelers
//!
//! The simulation owns every traveler, keyed by id. Towns, allies, enemies
//! and employees refer to travelers by id only, so removing a traveler can
//! never leave a dangling reference behind.

pub mod commands;
pub mod snapshot;
pub mod tick;

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ai::{controller_for, AiRole};
use crate::combat::{Stat, Stats};
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{Millis, TownId, TravelerId};
use crate::traveler::Traveler;
use crate::world::WorldMap;

pub use snapshot::{Snapshot, TravelerRecord};

pub struct Simulation {
    pub config: SimulationConfig,
    pub map: WorldMap,
    pub(crate) travelers: BTreeMap<TravelerId, Traveler>,
    pub(crate) rng: ChaCha8Rng,
    next_traveler_id: u32,
    elapsed_ms: u64,
    /// Time since dead travelers were last removed
    since_check_ms: Millis,
}

impl Simulation {
    /// A simulation over `map`, with randomness seeded from the config.
    /// Town storage is sized from the config's space factors.
    pub fn new(config: SimulationConfig, mut map: WorldMap) -> Result<Self> {
        config.validate()?;
        for town in map.towns_mut() {
            town.property.set_maxes(&config);
        }
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            map,
            travelers: BTreeMap::new(),
            rng,
            next_traveler_id: 1,
            elapsed_ms: 0,
            since_check_ms: 0,
        })
    }

    /// Create a traveler in `town` with random stats and its nation's starting goods
    pub fn spawn(&mut self, name: &str, town: TownId, role: Option<AiRole>) -> Result<TravelerId> {
        let stat_max = self.config.stat_max;
        let mut stats: Stats = [0; Stat::COUNT];
        for stat in &mut stats {
            *stat = self.rng.gen_range(1..=stat_max);
        }
        self.spawn_with_stats(name, town, role, stats)
    }

    pub fn spawn_with_stats(
        &mut self,
        name: &str,
        town: TownId,
        role: Option<AiRole>,
        stats: Stats,
    ) -> Result<TravelerId> {
        let home = self.map.town(town).ok_or(SimError::TownNotFound(town))?;
        let nation = self
            .map
            .nation(home.nation)
            .ok_or(SimError::NationNotFound(home.nation))?;
        let id = TravelerId(self.next_traveler_id);
        let mut traveler = Traveler::new(id, name, home, nation.starting_property(), stats);
        if let Some(role) = role {
            traveler = traveler.with_ai(controller_for(role));
        }
        self.insert(traveler);
        tracing::debug!("spawned {} ({}) in {}", name, id, town);
        Ok(id)
    }

    /// Register a traveler, size its storage and place it in its source town
    pub fn insert(&mut self, mut traveler: Traveler) -> TravelerId {
        traveler.set_maxes(&self.config);
        let id = traveler.id;
        self.next_traveler_id = self.next_traveler_id.max(id.0 + 1);
        if let Some(town) = self.map.town_mut(traveler.source) {
            town.add_traveler(id);
        }
        self.travelers.insert(id, traveler);
        id
    }

    pub fn traveler(&self, id: TravelerId) -> Option<&Traveler> {
        self.travelers.get(&id)
    }

    pub fn traveler_mut(&mut self, id: TravelerId) -> Option<&mut Traveler> {
        self.travelers.get_mut(&id)
    }

    pub fn travelers(&self) -> impl Iterator<Item = &Traveler> {
        self.travelers.values()
    }

    pub fn traveler_count(&self) -> usize {
        self.travelers.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub(crate) fn get(&self, id: TravelerId) -> Result<&Traveler> {
        self.travelers.get(&id).ok_or(SimError::TravelerNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: TravelerId) -> Result<&mut Traveler> {
        self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))
    }

    /// Run `f` with mutable access to two distinct travelers
    pub(crate) fn with_pair<R>(
        &mut self,
        first: TravelerId,
        second: TravelerId,
        f: impl FnOnce(&mut Traveler, &mut Traveler) -> R,
    ) -> Result<R> {
        if first == second {
            return Err(SimError::InvalidCommand(format!(
                "{} cannot act on itself",
                first
            )));
        }
        let mut other = self
            .travelers
            .remove(&second)
            .ok_or(SimError::TravelerNotFound(second))?;
        let result = match self.travelers.get_mut(&first) {
            Some(traveler) => Ok(f(traveler, &mut other)),
            None => Err(SimError::TravelerNotFound(first)),
        };
        self.travelers.insert(second, other);
        result
    }

    /// Append the same entry to two travelers' logs
    pub(crate) fn note_both(&mut self, a: TravelerId, b: TravelerId, entry: &str) {
        for id in [a, b] {
            if let Some(t) = self.travelers.get_mut(&id) {
                t.note(entry);
            }
        }
    }

    /// Remove dead travelers from the registry, towns and every relation.
    ///
    /// A traveler is dead once flagged by a disengage, or when it is no
    /// longer alive and nobody is fighting it. Returns how many were removed.
    pub fn prune_dead(&mut self) -> usize {
        let dead: Vec<TravelerId> = self
            .travelers
            .values()
            .filter(|t| t.dead || (!t.alive() && t.enemies.is_empty()))
            .map(|t| t.id)
            .collect();
        if dead.is_empty() {
            return 0;
        }
        for id in &dead {
            self.travelers.remove(id);
        }
        for town in self.map.towns_mut() {
            for id in &dead {
                town.remove_traveler(*id);
                town.withdraw_bids(*id);
            }
        }
        for traveler in self.travelers.values_mut() {
            for id in &dead {
                traveler.allies.remove(id);
                traveler.enemies.remove(id);
                traveler.yielded.remove(id);
            }
            if traveler.target.is_some_and(|t| dead.contains(&t)) {
                traveler.target = None;
                traveler.next_hit = None;
            }
            if traveler.employer.is_some_and(|e| dead.contains(&e)) {
                traveler.employer = None;
                traveler.contract = None;
            }
            traveler.employees.retain(|(_, e)| !dead.contains(e));
        }
        tracing::info!("removed {} dead travelers", dead.len());
        dead.len()
    }
}
