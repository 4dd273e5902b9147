//! Town - a node in the travel graph
//!
//! A town owns its market property, its edges and a job board. The
//! traveler presence list only holds ids; the simulation's registry owns
//! the travelers themselves.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{NationId, Position, TownId, TravelerId};
use crate::goods::Property;
use crate::traveler::trade::Contract;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Town {
    pub id: TownId,
    pub name: String,
    pub nation: NationId,
    pub position: Position,
    /// Market inventory
    pub property: Property,
    neighbors: Vec<TownId>,
    travelers: BTreeSet<TravelerId>,
    bids: Vec<Contract>,
}

impl Town {
    pub fn new(id: TownId, name: impl Into<String>, nation: NationId, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            nation,
            position,
            property: Property::new(),
            neighbors: Vec::new(),
            travelers: BTreeSet::new(),
            bids: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.property = property;
        self
    }

    /// Squared distance between town centers
    pub fn dist_sq(&self, other: &Town) -> f64 {
        self.position.dist_sq(&other.position)
    }

    pub fn neighbors(&self) -> &[TownId] {
        &self.neighbors
    }

    /// Add a one-way edge; duplicates and self-loops are ignored
    pub fn add_neighbor(&mut self, neighbor: TownId) {
        if neighbor != self.id && !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
    }

    pub fn travelers(&self) -> &BTreeSet<TravelerId> {
        &self.travelers
    }

    pub fn add_traveler(&mut self, traveler: TravelerId) {
        self.travelers.insert(traveler);
    }

    pub fn remove_traveler(&mut self, traveler: TravelerId) -> bool {
        self.travelers.remove(&traveler)
    }

    pub fn bids(&self) -> &[Contract] {
        &self.bids
    }

    pub fn add_bid(&mut self, bid: Contract) {
        self.bids.push(bid);
    }

    /// Remove and return the bid at `index`
    pub fn take_bid(&mut self, index: usize) -> Option<Contract> {
        (index < self.bids.len()).then(|| self.bids.remove(index))
    }

    /// Drop any bids posted by `party`
    pub fn withdraw_bids(&mut self, party: TravelerId) {
        self.bids.retain(|b| b.party != party);
    }
}
