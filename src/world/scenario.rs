//! A small deterministic world: two nations, six towns and eight goods
//!
//! Used by the headless runner and by tests that need a populated map.
//! Larger worlds can be loaded from JSON with `load_map`.

use std::path::Path;

use crate::ai::AiRole;
use crate::combat::{AttackType, Part, Stat};
use crate::core::error::Result;
use crate::core::types::{NationId, Position, TownId, TravelerId};
use crate::goods::{Business, CombatStat, Good, Material, Property};
use crate::simulation::Simulation;
use crate::world::{Nation, Town, WorldMap};

/// Good ids of the demo catalog
pub mod goods {
    use crate::core::types::GoodId;

    pub const GRAIN: GoodId = GoodId(1);
    pub const WINE: GoodId = GoodId(2);
    pub const WOOL: GoodId = GoodId(3);
    pub const CLOTH: GoodId = GoodId(4);
    pub const SWORD: GoodId = GoodId(5);
    pub const BOW: GoodId = GoodId(6);
    pub const ARROWS: GoodId = GoodId(7);
    pub const CAMEL: GoodId = GoodId(8);
    pub const LEATHER: GoodId = GoodId(9);
}

/// Every good in the demo world, with prices and no amount
pub fn catalog() -> Vec<Good> {
    let sword_stats = vec![
        CombatStat::new(Part::RightArm, Stat::Strength, 3, 0, AttackType::Slash, [1, 2, 1]),
        CombatStat::new(Part::RightArm, Stat::Agility, 0, 2, AttackType::Slash, [1, 2, 1]),
    ];
    let bow_stats = vec![
        CombatStat::new(Part::LeftArm, Stat::Agility, 2, 1, AttackType::Stab, [0, 0, 0]),
        CombatStat::new(Part::RightArm, Stat::Strength, 1, 0, AttackType::Stab, [0, 0, 0]),
    ];
    let leather_stats = vec![CombatStat::new(
        Part::Torso,
        Stat::Endurance,
        0,
        0,
        AttackType::Bash,
        [2, 1, 1],
    )];
    vec![
        Good::new(goods::GRAIN, "grain")
            .with_measure("bushels")
            .with_carry(1.0)
            .with_perish(0.01)
            .with_consumption(1.0)
            .with_price(1.0),
        Good::new(goods::WINE, "wine")
            .with_measure("jugs")
            .with_carry(1.0)
            .with_price(4.0),
        Good::new(goods::WOOL, "wool")
            .with_measure("bales")
            .with_carry(2.0)
            .with_price(3.0)
            .indivisible(),
        Good::new(goods::CLOTH, "cloth")
            .with_measure("bolts")
            .with_carry(1.0)
            .with_price(8.0),
        Good::new(goods::SWORD, "sword")
            .with_material(Material::new(1, "bronze").with_combat_stats(sword_stats))
            .with_carry(3.0)
            .with_price(20.0)
            .indivisible(),
        Good::new(goods::BOW, "bow")
            .with_material(Material::new(0, "").with_combat_stats(bow_stats))
            .with_shoots(goods::ARROWS)
            .with_carry(1.0)
            .with_price(15.0)
            .indivisible(),
        Good::new(goods::ARROWS, "arrows")
            .with_carry(0.1)
            .with_price(0.5)
            .indivisible(),
        Good::new(goods::CAMEL, "camel")
            .with_carry(-100.0)
            .with_price(50.0)
            .indivisible(),
        Good::new(goods::LEATHER, "leather armor")
            .with_material(Material::new(0, "").with_combat_stats(leather_stats))
            .with_carry(2.0)
            .with_price(12.0)
            .indivisible(),
    ]
}

pub fn farm() -> Business {
    Business::new(1, "farm").with_output(goods::GRAIN, 4.0)
}

pub fn weaver() -> Business {
    Business::new(2, "weaver")
        .with_input(goods::WOOL, 1.0)
        .with_output(goods::CLOTH, 1.0)
}

pub fn vineyard() -> Business {
    Business::new(3, "vineyard").with_output(goods::WINE, 1.0)
}

/// Catalog goods set to the given amounts; unlisted goods are held at zero
fn stocked(amounts: &[(crate::core::types::GoodId, f64)]) -> Property {
    Property::with_goods(catalog().into_iter().map(|good| {
        let amount = amounts
            .iter()
            .find(|(id, _)| *id == good.id())
            .map_or(0.0, |(_, amount)| *amount);
        good.with_amount(amount)
    }))
}

/// A town market stocked with every good. Each entry is
/// `(good, stock, demand per day)`; capacity follows from demand once the
/// simulation sizes storage.
fn market(entries: &[(crate::core::types::GoodId, f64, f64)]) -> Property {
    let amounts: Vec<_> = entries.iter().map(|(id, stock, _)| (*id, *stock)).collect();
    let mut property = Property::new();
    for good in stocked(&amounts).goods() {
        let demand = entries
            .iter()
            .find(|(id, _, _)| *id == good.id())
            .map_or(0.0, |(_, _, demand)| *demand);
        property.insert(good.clone().with_consumption(demand));
    }
    property
}

/// Starting goods every traveler of a nation carries
fn endowment() -> Property {
    stocked(&[
        (goods::GRAIN, 10.0),
        (goods::WOOL, 4.0),
        (goods::SWORD, 1.0),
        (goods::CAMEL, 1.0),
    ])
}

/// Six towns in two nations:
///
/// ```text
/// 1 Thebes -- 2 Coptos -- 3 Berenice
///               |            |
///             4 Marib ------+
///               |
///             5 Shabwa -- 6 Qana
/// ```
pub fn demo_map() -> WorldMap {
    let mut map = WorldMap::new();
    map.add_nation(Nation::new(NationId(1), "Kemet", "Kemetic").with_endowment(endowment()));
    map.add_nation(Nation::new(NationId(2), "Saba", "Sabaean").with_endowment(endowment()));

    let towns: [(u32, &str, u32, f64, f64); 6] = [
        (1, "Thebes", 1, 0.0, 0.0),
        (2, "Coptos", 1, 10.0, 0.0),
        (3, "Berenice", 1, 20.0, 0.0),
        (4, "Marib", 2, 14.0, 12.0),
        (5, "Shabwa", 2, 14.0, 24.0),
        (6, "Qana", 2, 26.0, 24.0),
    ];
    for (id, name, nation, x, y) in towns {
        let mut property = market(&[
            (goods::GRAIN, 60.0, 3.0),
            (goods::WINE, 20.0, 1.0),
            (goods::WOOL, 30.0, 2.0),
            (goods::CLOTH, 10.0, 0.5),
            (goods::SWORD, 5.0, 0.25),
            (goods::BOW, 3.0, 0.2),
            (goods::ARROWS, 100.0, 5.0),
            (goods::CAMEL, 4.0, 0.2),
            (goods::LEATHER, 4.0, 0.2),
        ]);
        let config = crate::core::config::SimulationConfig::default();
        match id % 3 {
            0 => property.build(&vineyard(), 2.0, &config),
            1 => property.build(&farm(), 2.0, &config),
            _ => property.build(&weaver(), 2.0, &config),
        }
        map.add_town(
            Town::new(TownId(id), name, NationId(nation), Position::new(x, y)).with_property(property),
        );
    }
    for (a, b) in [(1, 2), (2, 3), (2, 4), (3, 4), (4, 5), (5, 6)] {
        // Both ends were just added
        let _ = map.connect(TownId(a), TownId(b));
    }
    map
}

/// Spawn `per_town` computer travelers in every town, cycling through roles
pub fn populate(sim: &mut Simulation, per_town: usize) -> Result<Vec<TravelerId>> {
    const ROLES: [AiRole; 4] = [AiRole::Trader, AiRole::Trader, AiRole::Bandit, AiRole::Soldier];
    let towns: Vec<(TownId, String)> = sim.map.towns().map(|t| (t.id, t.name.clone())).collect();
    let mut spawned = Vec::new();
    for (town, name) in towns {
        for i in 0..per_town {
            let role = ROLES[(town.0 as usize + i) % ROLES.len()];
            let traveler_name = format!("{} {:?} {}", name, role, i + 1);
            spawned.push(sim.spawn(&traveler_name, town, Some(role))?);
        }
    }
    tracing::info!("populated {} travelers", spawned.len());
    Ok(spawned)
}

/// Load a map saved as JSON
pub fn load_map(path: &Path) -> Result<WorldMap> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_map_is_connected() {
        let map = demo_map();
        for town in map.towns() {
            if town.id != TownId(1) {
                assert!(!map.path_to(TownId(1), town.id).is_empty(), "{} unreachable", town.name);
            }
        }
    }

    #[test]
    fn test_markets_have_businesses() {
        let map = demo_map();
        assert_eq!(map.town(TownId(1)).unwrap().property.businesses()[0].name, "farm");
        assert_eq!(map.town(TownId(2)).unwrap().property.businesses()[0].name, "weaver");
        assert_eq!(map.town(TownId(3)).unwrap().property.businesses()[0].name, "vineyard");
    }

    #[test]
    fn test_endowment_is_light() {
        let map = demo_map();
        let carried = map.nation(NationId(1)).unwrap().starting_property();
        assert!(carried.weight() < 0.0);
        assert_eq!(carried.amount(goods::SWORD), 1.0);
    }

    #[test]
    fn test_map_round_trips_through_json() {
        let map = demo_map();
        let json = serde_json::to_string(&map).unwrap();
        let loaded: WorldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.towns().count(), 6);
        assert_eq!(loaded.path_to(TownId(1), TownId(6)), map.path_to(TownId(1), TownId(6)));
    }
}
