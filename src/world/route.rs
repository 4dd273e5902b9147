//! World map and shortest-route search over the town graph
//!
//! Route cost is the sum of squared distances between consecutive towns.
//! Squared distances do not obey the triangle inequality (two hops of 100
//! are cheaper than one hop of 400), so a straight-line squared-distance
//! estimate can overshoot the true remaining cost. The frontier is
//! therefore ordered by accumulated cost alone, which keeps the closed set
//! exact: a town is finalized once and never reopened.

use std::collections::{BTreeMap, BTreeSet};

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{NationId, TownId};
use crate::world::nation::Nation;
use crate::world::town::Town;

/// All towns and nations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldMap {
    towns: BTreeMap<TownId, Town>,
    nations: BTreeMap<NationId, Nation>,
}

impl WorldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nation(&mut self, nation: Nation) {
        self.nations.insert(nation.id, nation);
    }

    pub fn add_town(&mut self, town: Town) {
        self.towns.insert(town.id, town);
    }

    /// Connect two towns in both directions
    pub fn connect(&mut self, a: TownId, b: TownId) -> Result<()> {
        if !self.towns.contains_key(&b) {
            return Err(SimError::TownNotFound(b));
        }
        self.towns.get_mut(&a).ok_or(SimError::TownNotFound(a))?.add_neighbor(b);
        if let Some(town) = self.towns.get_mut(&b) {
            town.add_neighbor(a);
        }
        Ok(())
    }

    pub fn town(&self, id: TownId) -> Option<&Town> {
        self.towns.get(&id)
    }

    pub fn town_mut(&mut self, id: TownId) -> Option<&mut Town> {
        self.towns.get_mut(&id)
    }

    pub fn towns(&self) -> impl Iterator<Item = &Town> {
        self.towns.values()
    }

    pub fn towns_mut(&mut self) -> impl Iterator<Item = &mut Town> {
        self.towns.values_mut()
    }

    pub fn nation(&self, id: NationId) -> Option<&Nation> {
        self.nations.get(&id)
    }

    pub fn nations(&self) -> impl Iterator<Item = &Nation> {
        self.nations.values()
    }

    /// Squared distance between two towns, if both exist
    pub fn dist_sq(&self, a: TownId, b: TownId) -> Option<f64> {
        Some(self.towns.get(&a)?.dist_sq(self.towns.get(&b)?))
    }

    /// Towns on the cheapest route from `from` to `to`, excluding `from`.
    ///
    /// Returns an empty route when `to` is unreachable, unknown, or equal to
    /// `from`. The frontier is keyed on accumulated cost only, with no
    /// remaining-distance estimate, so ties are between towns reached at the
    /// same cost and the lower id is expanded first.
    pub fn path_to(&self, from: TownId, to: TownId) -> Vec<TownId> {
        if !self.towns.contains_key(&from) || !self.towns.contains_key(&to) {
            return Vec::new();
        }

        // Town each town is most cheaply reached from
        let mut came_from: AHashMap<TownId, TownId> = AHashMap::new();
        // Accumulated cost along the best known route
        let mut dist_sq_to: AHashMap<TownId, f64> = AHashMap::new();
        let mut closed: AHashSet<TownId> = AHashSet::new();
        // Discovered towns not yet finalized, cheapest first, then lowest id
        let mut open: BTreeSet<(OrderedFloat<f64>, TownId)> = BTreeSet::new();

        dist_sq_to.insert(from, 0.0);
        open.insert((OrderedFloat(0.0), from));

        while let Some((cost, current)) = open.pop_first() {
            if current == to {
                return reconstruct_path(&came_from, current);
            }
            closed.insert(current);

            let Some(town) = self.towns.get(&current) else {
                continue;
            };
            for &neighbor in town.neighbors() {
                if closed.contains(&neighbor) {
                    continue;
                }
                let Some(next) = self.towns.get(&neighbor) else {
                    continue;
                };
                let tentative = cost.0 + town.dist_sq(next);
                let known = dist_sq_to.get(&neighbor).copied();
                if known.map_or(true, |d| tentative < d) {
                    if let Some(d) = known {
                        open.remove(&(OrderedFloat(d), neighbor));
                    }
                    came_from.insert(neighbor, current);
                    dist_sq_to.insert(neighbor, tentative);
                    open.insert((OrderedFloat(tentative), neighbor));
                }
            }
        }

        Vec::new()
    }

    /// Cost of the cheapest route from `from` to `to`; zero when there is none
    pub fn path_dist_sq(&self, from: TownId, to: TownId) -> f64 {
        route_dist_sq(self, from, &self.path_to(from, to))
    }
}

/// Walk `path` from `from`, summing squared distances between consecutive towns
pub fn route_dist_sq(map: &WorldMap, from: TownId, path: &[TownId]) -> f64 {
    let mut total = 0.0;
    let mut previous = from;
    for &town in path {
        total += map.dist_sq(previous, town).unwrap_or(0.0);
        previous = town;
    }
    total
}

/// Rebuild the route backwards through `came_from`, excluding the start
fn reconstruct_path(came_from: &AHashMap<TownId, TownId>, mut current: TownId) -> Vec<TownId> {
    let mut path = Vec::new();
    while let Some(&previous) = came_from.get(&current) {
        path.push(current);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;

    fn map_with(towns: &[(u32, f64, f64)], edges: &[(u32, u32)]) -> WorldMap {
        let mut map = WorldMap::new();
        for &(id, x, y) in towns {
            map.add_town(Town::new(TownId(id), format!("t{}", id), NationId(1), Position::new(x, y)));
        }
        for &(a, b) in edges {
            map.connect(TownId(a), TownId(b)).unwrap();
        }
        map
    }

    #[test]
    fn test_chain_route() {
        let map = map_with(&[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 20.0, 0.0)], &[(1, 2), (2, 3)]);
        assert_eq!(map.path_to(TownId(1), TownId(3)), vec![TownId(2), TownId(3)]);
        assert_eq!(map.path_dist_sq(TownId(1), TownId(3)), 200.0);
    }

    #[test]
    fn test_prefers_cheaper_multi_hop_route() {
        // Direct edge costs 400, the detour through 2 costs 200
        let map = map_with(
            &[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 20.0, 0.0)],
            &[(1, 2), (2, 3), (1, 3)],
        );
        assert_eq!(map.path_to(TownId(1), TownId(3)), vec![TownId(2), TownId(3)]);
    }

    #[test]
    fn test_cheaper_route_behind_far_town() {
        // Town 4 sits far from the goal but starts a cheap subdivided route
        let map = map_with(
            &[
                (1, 0.0, 0.0),
                (2, 10.0, 0.0),
                (4, 5.0, 6.0),
                (5, 6.67, 4.0),
                (6, 8.33, 2.0),
            ],
            &[(1, 2), (1, 4), (4, 5), (5, 6), (6, 2)],
        );
        let path = map.path_to(TownId(1), TownId(2));
        assert_eq!(path, vec![TownId(4), TownId(5), TownId(6), TownId(2)]);
        assert!(map.path_dist_sq(TownId(1), TownId(2)) < 100.0);
    }

    #[test]
    fn test_unreachable_is_empty() {
        let map = map_with(&[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 20.0, 0.0)], &[(1, 2)]);
        assert!(map.path_to(TownId(1), TownId(3)).is_empty());
        assert_eq!(map.path_dist_sq(TownId(1), TownId(3)), 0.0);
    }

    #[test]
    fn test_same_town_is_empty() {
        let map = map_with(&[(1, 0.0, 0.0)], &[]);
        assert!(map.path_to(TownId(1), TownId(1)).is_empty());
    }

    #[test]
    fn test_unknown_town_is_empty() {
        let map = map_with(&[(1, 0.0, 0.0)], &[]);
        assert!(map.path_to(TownId(1), TownId(9)).is_empty());
    }

    #[test]
    fn test_tie_breaks_on_lower_id() {
        // Two equally cheap routes from 1 to 4, through 2 or through 3
        let map = map_with(
            &[(1, 0.0, 0.0), (2, 10.0, 5.0), (3, 10.0, -5.0), (4, 20.0, 0.0)],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        );
        assert_eq!(map.path_to(TownId(1), TownId(4)), vec![TownId(2), TownId(4)]);

        let mirrored = map_with(
            &[(1, 0.0, 0.0), (3, 10.0, 5.0), (2, 10.0, -5.0), (4, 20.0, 0.0)],
            &[(1, 2), (1, 3), (2, 4), (3, 4)],
        );
        assert_eq!(mirrored.path_to(TownId(1), TownId(4)), vec![TownId(2), TownId(4)]);
    }

    #[test]
    fn test_connect_unknown_town_fails() {
        let mut map = map_with(&[(1, 0.0, 0.0)], &[]);
        assert!(matches!(map.connect(TownId(1), TownId(2)), Err(SimError::TownNotFound(_))));
    }
}
