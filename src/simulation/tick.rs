//! Tick system - advances every traveler and town by elapsed time
//!
//! Within one traveler's update the order is fixed: AI decision, property
//! update, movement, then combat resolution. Travelers update in ascending
//! id order so runs with the same seed are identical.

use crate::ai::{Intent, TravelView};
use crate::core::error::{Result, SimError};
use crate::core::types::{Millis, TownId, TravelerId};
use crate::goods::Good;
use crate::simulation::Simulation;

/// Events generated during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// A traveler reached the next town on its route
    Arrived { traveler: TravelerId, town: TownId },
    /// An AI intent could not be carried out
    IntentFailed { traveler: TravelerId, reason: String },
    /// Dead travelers were removed from the registry
    Pruned { count: usize },
}

impl Simulation {
    /// Advance the whole world by `elapsed_ms`
    pub fn tick(&mut self, elapsed_ms: Millis) -> Vec<SimulationEvent> {
        let mut events = Vec::new();

        for town in self.map.towns_mut() {
            town.property.update(elapsed_ms, &self.config);
        }

        let ids: Vec<TravelerId> = self.travelers.keys().copied().collect();
        for id in ids {
            match self.update(id, elapsed_ms) {
                Ok(mut traveler_events) => events.append(&mut traveler_events),
                // Removed earlier in this tick
                Err(SimError::TravelerNotFound(_)) => {}
                Err(e) => tracing::warn!("update of {} failed: {}", id, e),
            }
        }

        self.elapsed_ms += u64::from(elapsed_ms);
        self.since_check_ms = self.since_check_ms.saturating_add(elapsed_ms);
        if self.since_check_ms >= self.config.travelers_check_ms {
            self.since_check_ms = 0;
            let count = self.prune_dead();
            if count > 0 {
                events.push(SimulationEvent::Pruned { count });
            }
        }
        events
    }

    /// Advance one traveler: AI, property, movement, then combat
    pub fn update(&mut self, id: TravelerId, elapsed_ms: Millis) -> Result<Vec<SimulationEvent>> {
        let mut events = Vec::new();
        let traveler = self.get(id)?;
        if traveler.dead || !traveler.alive() {
            return Ok(events);
        }

        if let Some(intent) = self.poll_intent(id, elapsed_ms)? {
            if let Err(e) = self.apply_intent(id, intent) {
                tracing::debug!("intent of {} failed: {}", id, e);
                events.push(SimulationEvent::IntentFailed {
                    traveler: id,
                    reason: e.to_string(),
                });
            }
        }

        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        traveler.update_property(elapsed_ms, &self.config);

        if let Some(town) = self.advance(id, elapsed_ms)? {
            events.push(SimulationEvent::Arrived { traveler: id, town });
        }

        self.resolve_enemies(id, elapsed_ms)?;
        Ok(events)
    }

    /// Let the traveler's AI look around and maybe decide something
    fn poll_intent(&mut self, id: TravelerId, elapsed_ms: Millis) -> Result<Option<Intent>> {
        let traveler = self.get(id)?;
        if traveler.ai.is_none() {
            return Ok(None);
        }
        let view = TravelView {
            town: traveler.destination,
            moving: traveler.moving,
            fighting: !traveler.enemies.is_empty(),
            neighbors: self
                .map
                .town(traveler.destination)
                .map(|t| t.neighbors().to_vec())
                .unwrap_or_default(),
            attackable: self.attackable(id),
            carried: traveler.carried_amounts(),
        };
        let traveler = self.get_mut(id)?;
        Ok(traveler.ai.as_mut().and_then(|ai| ai.update(elapsed_ms, &view)))
    }

    fn apply_intent(&mut self, id: TravelerId, intent: Intent) -> Result<()> {
        match intent {
            Intent::PickTown(town) => self.pick_town(id, town),
            Intent::Attack(target) => self.attack(id, target),
            Intent::Trade { offer, request } => {
                let traveler = self.get(id)?;
                let town = self
                    .map
                    .town(traveler.destination)
                    .ok_or(SimError::TownNotFound(traveler.destination))?;
                let offer: Vec<Good> = offer
                    .iter()
                    .filter_map(|(good, amount)| traveler.carried.good(*good).map(|g| g.request(*amount)))
                    .collect();
                let request: Vec<Good> = request
                    .iter()
                    .filter_map(|(good, amount)| town.property.good(*good).map(|g| g.request(*amount)))
                    .collect();
                let traveler = self.get_mut(id)?;
                traveler.offer = offer;
                traveler.request = request;
                self.make_trade(id)
            }
        }
    }

    /// Walk toward the destination; on arrival move between presence lists
    /// and continue along the route. Returns the town arrived in.
    fn advance(&mut self, id: TravelerId, elapsed_ms: Millis) -> Result<Option<TownId>> {
        let step = self.config.days(elapsed_ms) * self.config.travel_speed;
        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        if !traveler.moving {
            return Ok(None);
        }
        let destination = self
            .map
            .town(traveler.destination)
            .ok_or(SimError::TownNotFound(traveler.destination))?;
        traveler.moving = traveler.position.step_toward(&destination.position, step);
        if traveler.moving {
            return Ok(None);
        }

        let (source, arrived) = (traveler.source, traveler.destination);
        traveler.source = arrived;
        let adjective = self
            .map
            .nation(destination.nation)
            .map(|n| n.adjective.clone())
            .unwrap_or_default();
        let entry = if adjective.is_empty() {
            format!("{} has arrived in {}.", traveler.name, destination.name)
        } else {
            format!("{} has arrived in the {} town of {}.", traveler.name, adjective, destination.name)
        };
        tracing::info!("{}", entry);
        traveler.note(entry);
        if !traveler.route.is_empty() {
            traveler.destination = traveler.route.remove(0);
            traveler.moving = true;
        }

        if let Some(town) = self.map.town_mut(source) {
            town.remove_traveler(id);
        }
        if let Some(town) = self.map.town_mut(arrived) {
            town.add_traveler(id);
        }
        Ok(Some(arrived))
    }
}
