//! Saving and restoring a simulation as JSON
//!
//! Travelers are stored as plain records. Their goods are keyed by town id
//! with key 0 holding the carried inventory. Combat relations are transient
//! and are not saved; a restored traveler starts out of combat.

use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{controller_for, AiRole};
use crate::combat::{Parts, Stats};
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{NationId, Position, TownId, TravelerId};
use crate::goods::{Good, Property};
use crate::simulation::Simulation;
use crate::traveler::{Contract, Traveler};
use crate::world::WorldMap;

/// Key of the carried inventory in `TravelerRecord::properties`
pub const CARRIED_KEY: u32 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelerRecord {
    pub id: TravelerId,
    pub name: String,
    pub nation: NationId,
    pub home: TownId,
    pub source: TownId,
    pub destination: TownId,
    pub position: Position,
    pub moving: bool,
    pub route: Vec<TownId>,
    pub portion: f64,
    /// 0 = carried, otherwise the town id of stored goods
    pub properties: BTreeMap<u32, Property>,
    pub equipment: Vec<Good>,
    pub parts: Parts,
    pub stats: Stats,
    pub log: Vec<String>,
    pub role: Option<AiRole>,
    pub contract: Option<Contract>,
    pub employer: Option<TravelerId>,
    pub employees: Vec<(AiRole, TravelerId)>,
    pub dead: bool,
}

impl From<&Traveler> for TravelerRecord {
    fn from(t: &Traveler) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(CARRIED_KEY, t.carried.clone());
        for (town, property) in &t.storage {
            properties.insert(town.0, property.clone());
        }
        Self {
            id: t.id,
            name: t.name.clone(),
            nation: t.nation,
            home: t.home,
            source: t.source,
            destination: t.destination,
            position: t.position,
            moving: t.moving,
            route: t.route.clone(),
            portion: t.portion(),
            properties,
            equipment: t.equipment.clone(),
            parts: t.parts,
            stats: t.stats,
            log: t.log.clone(),
            role: t.role(),
            contract: t.contract.clone(),
            employer: t.employer,
            employees: t.employees.clone(),
            dead: t.dead,
        }
    }
}

impl TravelerRecord {
    /// Rebuild the traveler, standing in its source town
    pub fn restore(self, map: &WorldMap) -> Result<Traveler> {
        let town = map.town(self.source).ok_or(SimError::TownNotFound(self.source))?;
        let mut properties = self.properties;
        let carried = properties.remove(&CARRIED_KEY).unwrap_or_default();
        let mut traveler = Traveler::new(self.id, self.name, town, carried, self.stats);
        traveler.nation = self.nation;
        traveler.home = self.home;
        traveler.destination = self.destination;
        traveler.position = self.position;
        traveler.moving = self.moving;
        traveler.route = self.route;
        traveler.set_portion(self.portion);
        traveler.storage = properties
            .into_iter()
            .map(|(town, property)| (TownId(town), property))
            .collect();
        traveler.equipment = self.equipment;
        traveler.parts = self.parts;
        traveler.log = self.log;
        traveler.contract = self.contract;
        traveler.employer = self.employer;
        traveler.employees = self.employees;
        traveler.dead = self.dead;
        if let Some(role) = self.role {
            traveler.ai = Some(controller_for(role));
        }
        Ok(traveler)
    }
}

/// Everything needed to resume a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub config: SimulationConfig,
    pub map: WorldMap,
    pub travelers: Vec<TravelerRecord>,
    pub elapsed_ms: u64,
}

impl Simulation {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            config: self.config.clone(),
            map: self.map.clone(),
            travelers: self.travelers.values().map(TravelerRecord::from).collect(),
            elapsed_ms: self.elapsed_ms,
        }
    }

    /// Resume from a snapshot. The random source is reseeded from the
    /// config seed and the elapsed time.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut sim = Simulation::new(snapshot.config, snapshot.map)?;
        sim.elapsed_ms = snapshot.elapsed_ms;
        sim.rng = ChaCha8Rng::seed_from_u64(sim.config.seed.wrapping_add(snapshot.elapsed_ms));
        for record in snapshot.travelers {
            let traveler = record.restore(&sim.map)?;
            sim.insert(traveler);
        }
        Ok(sim)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("saved simulation to {}", path.display());
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
