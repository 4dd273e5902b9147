//! Traveler - an agent moving between towns, trading and fighting
//!
//! A traveler only knows other travelers and towns by id. Anything that
//! touches more than one traveler (combat, hiring, looting) is done by the
//! `Simulation`, which owns the registry.

pub mod trade;

use std::collections::{BTreeMap, BTreeSet};

use crate::ai::{AiRole, Controller, FightView};
use crate::combat::{AttackType, CombatHit, FightChoice, Part, Parts, Stat, Stats, Status};
use crate::core::config::SimulationConfig;
use crate::core::types::{GoodId, NationId, Position, TownId, TravelerId};
use crate::goods::{CombatStat, Good, Material, Property};
use crate::world::Town;

pub use trade::{transfer, Contract, GoodsHolder};

#[derive(Debug)]
pub struct Traveler {
    pub id: TravelerId,
    pub name: String,
    pub nation: NationId,
    /// Town whose prices value this traveler's goods on dismissal
    pub home: TownId,
    /// Town most recently left or currently in
    pub source: TownId,
    /// Town being walked to; equal to `source` when stationary
    pub destination: TownId,
    pub position: Position,
    pub moving: bool,
    /// Remaining hops after `destination`
    pub route: Vec<TownId>,
    portion: f64,
    /// Goods carried on the road
    pub carried: Property,
    /// Goods and businesses left in towns
    pub storage: BTreeMap<TownId, Property>,
    pub equipment: Vec<Good>,
    pub parts: Parts,
    pub stats: Stats,
    pub ai: Option<Box<dyn Controller>>,

    // === COMBAT ===
    pub allies: BTreeSet<TravelerId>,
    pub enemies: BTreeSet<TravelerId>,
    pub target: Option<TravelerId>,
    /// Number of combatants targeting this traveler
    pub targeter_count: u32,
    pub next_hit: Option<CombatHit>,
    /// Milliseconds of fighting owed (negative) or already done (positive)
    pub fight_time: f64,
    pub choice: FightChoice,
    /// Enemies whose current yield is already in the log
    pub yielded: BTreeSet<TravelerId>,
    pub dead: bool,

    // === TRADE ===
    pub log: Vec<String>,
    pub offer: Vec<Good>,
    pub request: Vec<Good>,
    pub contract: Option<Contract>,
    pub employer: Option<TravelerId>,
    pub employees: Vec<(AiRole, TravelerId)>,
}

impl Traveler {
    /// A traveler standing in `town` with the given carried goods and fists equipped
    pub fn new(
        id: TravelerId,
        name: impl Into<String>,
        town: &Town,
        carried: Property,
        stats: Stats,
    ) -> Self {
        let mut traveler = Self {
            id,
            name: name.into(),
            nation: town.nation,
            home: town.id,
            source: town.id,
            destination: town.id,
            position: town.position,
            moving: false,
            route: Vec::new(),
            portion: 1.0,
            carried,
            storage: BTreeMap::new(),
            equipment: Vec::new(),
            parts: [Status::Normal; Part::COUNT],
            stats,
            ai: None,
            allies: BTreeSet::new(),
            enemies: BTreeSet::new(),
            target: None,
            targeter_count: 0,
            next_hit: None,
            fight_time: 0.0,
            choice: FightChoice::None,
            yielded: BTreeSet::new(),
            dead: false,
            log: Vec::new(),
            offer: Vec::new(),
            request: Vec::new(),
            contract: None,
            employer: None,
            employees: Vec::new(),
        };
        traveler.equip_fist(Part::LeftArm);
        traveler.equip_fist(Part::RightArm);
        traveler
    }

    pub fn with_ai(mut self, ai: Box<dyn Controller>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn role(&self) -> Option<AiRole> {
        self.ai.as_ref().map(|ai| ai.role())
    }

    /// Head and torso both short of destroyed
    pub fn alive(&self) -> bool {
        self.parts[Part::Head.index()] < Status::Destroyed
            && self.parts[Part::Torso.index()] < Status::Destroyed
    }

    /// Fraction of the body left undamaged
    pub fn health(&self) -> f64 {
        let damage: usize = self.parts.iter().map(|s| s.level()).sum();
        1.0 - damage as f64 / (Part::COUNT * Status::MAX_LEVEL) as f64
    }

    pub fn stat(&self, stat: Stat) -> u32 {
        self.stats[stat.index()]
    }

    /// Running speed: agility scaled by the condition of both legs
    pub fn speed(&self) -> f64 {
        let legs: f64 = Part::ALL
            .iter()
            .filter(|p| p.is_leg())
            .map(|p| 1.0 - self.parts[p.index()].level() as f64 / Status::MAX_LEVEL as f64)
            .sum();
        self.stat(Stat::Agility) as f64 * legs / 2.0
    }

    /// Carried weight beyond carrying capacity; positive means overloaded
    pub fn weight(&self, config: &SimulationConfig) -> f64 {
        self.carried.weight() - self.stat(Stat::Strength) as f64 * config.carry_per_strength
    }

    // === PORTION ===

    pub fn portion(&self) -> f64 {
        self.portion
    }

    /// Fraction of goods to offer, clamped to [0, 1]
    pub fn set_portion(&mut self, portion: f64) {
        self.portion = portion.clamp(0.0, 1.0);
    }

    pub fn change_portion(&mut self, delta: f64) {
        self.set_portion(self.portion + delta);
    }

    /// Portion without trailing zeros, keeping one decimal: "1.0", "0.25"
    pub fn portion_string(&self) -> String {
        let text = format!("{:.6}", self.portion);
        let trimmed = text.trim_end_matches('0');
        if trimmed.ends_with('.') {
            format!("{}0", trimmed)
        } else {
            trimmed.to_string()
        }
    }

    // === EQUIPMENT ===

    /// Defense per attack type from everything equipped
    pub fn defense(&self) -> [u32; AttackType::COUNT] {
        let mut defense = [0; AttackType::COUNT];
        for stat in self.equipment.iter().flat_map(|e| e.combat_stats()) {
            for attack_type in AttackType::ALL {
                defense[attack_type.index()] += stat.defense[attack_type.index()] * self.stat(stat.stat);
            }
        }
        defense
    }

    /// Equip `good` from carried inventory, unequipping whatever shares its parts
    ///
    /// Returns false if nothing was carried or a needed part cannot hold equipment.
    pub fn equip(&mut self, mut good: Good) -> bool {
        let mut parts: Vec<Part> = good.combat_stats().iter().map(|s| s.part).collect();
        parts.dedup();
        if parts.is_empty() || parts.iter().any(|p| !self.parts[p.index()].can_hold()) {
            return false;
        }
        self.carried.take(&mut good);
        if good.amount() <= 0.0 {
            return false;
        }
        for part in parts {
            self.remove_equipment(part);
        }
        tracing::debug!("{} equips {}", self.name, good.full_name());
        self.equipment.push(good);
        true
    }

    /// Unequip everything using `part`, falling back to a fist on a usable arm
    pub fn unequip(&mut self, part: Part) {
        self.remove_equipment(part);
        self.equip_fist(part);
    }

    /// Equipment using `part`
    pub fn equipped(&self, part: Part) -> Option<&Good> {
        self.equipment
            .iter()
            .find(|e| e.combat_stats().iter().any(|s| s.part == part))
    }

    fn remove_equipment(&mut self, part: Part) {
        let (removed, kept): (Vec<Good>, Vec<Good>) = std::mem::take(&mut self.equipment)
            .into_iter()
            .partition(|e| e.combat_stats().iter().any(|s| s.part == part));
        self.equipment = kept;
        for good in removed {
            if good.id() != GoodId::NATURAL && good.amount() > 0.0 {
                self.carried.put(&good);
            }
        }
    }

    /// Equip a fist on an empty, usable arm
    fn equip_fist(&mut self, part: Part) {
        let name = match part {
            Part::LeftArm => "left fist",
            Part::RightArm => "right fist",
            _ => return,
        };
        if !self.parts[part.index()].can_hold() || self.equipped(part).is_some() {
            return;
        }
        let stats = vec![
            CombatStat::new(part, Stat::Strength, 1, 0, AttackType::Bash, [1, 1, 1]),
            CombatStat::new(part, Stat::Agility, 0, 1, AttackType::Bash, [1, 1, 1]),
        ];
        let fist = Good::new(GoodId::NATURAL, name)
            .with_material(Material::new(0, "").with_combat_stats(stats))
            .with_amount(1.0)
            .indivisible();
        self.equipment.push(fist);
    }

    /// Whether a weapon can strike now; ranged weapons need a round
    pub fn can_strike_with(&self, weapon: &Good) -> bool {
        match weapon.shoots() {
            Some(ammo) => self.carried.amount(ammo) >= 1.0,
            None => true,
        }
    }

    /// Spend the rounds ranged weapons fire over `time` (unscaled hit-time units)
    pub fn use_ammo(&mut self, time: f64) {
        let mut spent: Vec<(GoodId, f64)> = Vec::new();
        for weapon in &self.equipment {
            if let Some(ammo) = weapon.shoots() {
                let speed: u32 = weapon
                    .combat_stats()
                    .iter()
                    .map(|s| s.speed * self.stat(s.stat))
                    .sum();
                spent.push((ammo, (time * speed as f64).floor()));
            }
        }
        for (ammo, rounds) in spent {
            if rounds > 0.0 {
                self.carried.input(ammo, rounds);
            }
        }
    }

    // === VIEWS ===

    pub fn fight_view(&self) -> FightView {
        FightView {
            health: self.health(),
            enemies: self.enemies.len(),
            allies: self.allies.len(),
        }
    }

    /// Title line then one `Part: status` line per body part
    pub fn status_text(&self) -> Vec<String> {
        let mut text = Vec::with_capacity(Part::COUNT + 1);
        text.push(format!("{}'s Status", self.name));
        for part in Part::ALL {
            text.push(format!("{}: {}", part.name(), self.parts[part.index()].name()));
        }
        text
    }

    /// Append an entry to the narrative log
    pub fn note(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    /// Storage property in `town`, created with this traveler's goods list if missing
    pub fn storage_mut(&mut self, town: TownId) -> &mut Property {
        let template = &self.carried;
        self.storage.entry(town).or_insert_with(|| template.empty_like())
    }

    /// Size carried and stored goods' capacity from their consumption
    pub fn set_maxes(&mut self, config: &SimulationConfig) {
        self.carried.set_maxes(config);
        for property in self.storage.values_mut() {
            property.set_maxes(config);
        }
    }

    /// Advance carried and stored goods by `elapsed_ms`
    pub fn update_property(&mut self, elapsed_ms: u32, config: &SimulationConfig) {
        self.carried.update(elapsed_ms, config);
        for property in self.storage.values_mut() {
            property.update(elapsed_ms, config);
        }
    }

    /// Employees with any of `roles`
    pub fn employees_with(&self, roles: &[AiRole]) -> Vec<TravelerId> {
        self.employees
            .iter()
            .filter(|(role, _)| roles.contains(role))
            .map(|(_, id)| *id)
            .collect()
    }

    /// Goods carried with positive amounts, for AI views
    pub fn carried_amounts(&self) -> Vec<(GoodId, f64)> {
        self.carried.held().map(|g| (g.id(), g.amount())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NationId;

    fn town() -> Town {
        Town::new(TownId(1), "Ur", NationId(1), Position::new(0.0, 0.0))
    }

    fn sword() -> Good {
        let stats = vec![
            CombatStat::new(Part::RightArm, Stat::Strength, 3, 0, AttackType::Slash, [1, 2, 1]),
            CombatStat::new(Part::RightArm, Stat::Agility, 0, 2, AttackType::Slash, [1, 2, 1]),
        ];
        Good::new(GoodId(5), "sword")
            .with_material(Material::new(1, "iron").with_combat_stats(stats))
            .indivisible()
    }

    fn traveler() -> Traveler {
        let carried = Property::with_goods([
            sword().with_amount(1.0),
            Good::new(GoodId(1), "grain").with_carry(1.0).with_amount(30.0),
        ]);
        Traveler::new(TravelerId(1), "Ana", &town(), carried, [5, 5, 4])
    }

    #[test]
    fn test_new_traveler_has_fists() {
        let t = traveler();
        assert_eq!(t.equipment.len(), 2);
        assert_eq!(t.equipped(Part::LeftArm).map(|g| g.name()), Some("left fist"));
        assert_eq!(t.equipped(Part::RightArm).map(|g| g.name()), Some("right fist"));
        assert!(t.alive());
        assert_eq!(t.source, t.destination);
    }

    #[test]
    fn test_equip_replaces_fist_and_unequip_restores_it() {
        let mut t = traveler();
        let request = t.carried.good(GoodId(5)).unwrap().request(1.0);
        assert!(t.equip(request));
        assert_eq!(t.equipped(Part::RightArm).map(|g| g.full_name()), Some("iron sword".to_string()));
        assert_eq!(t.carried.amount(GoodId(5)), 0.0);
        assert_eq!(t.equipment.len(), 2);

        t.unequip(Part::RightArm);
        assert_eq!(t.carried.amount(GoodId(5)), 1.0);
        assert_eq!(t.equipped(Part::RightArm).map(|g| g.name()), Some("right fist"));
    }

    #[test]
    fn test_equip_without_goods_fails() {
        let mut t = traveler();
        assert!(!t.equip(sword().with_amount(1.0).request(1.0).empty_like()));
        assert!(!t.equip(Good::new(GoodId(1), "grain").with_amount(1.0)));
    }

    #[test]
    fn test_crippled_arm_keeps_no_fist() {
        let mut t = traveler();
        t.parts[Part::LeftArm.index()] = Status::Broken;
        t.unequip(Part::LeftArm);
        assert!(t.equipped(Part::LeftArm).is_none());
        assert_eq!(t.carried.amount(GoodId::NATURAL), 0.0);
    }

    #[test]
    fn test_alive_depends_on_vital_parts() {
        let mut t = traveler();
        t.parts[Part::LeftLeg.index()] = Status::Destroyed;
        assert!(t.alive());
        t.parts[Part::Head.index()] = Status::Destroyed;
        assert!(!t.alive());
    }

    #[test]
    fn test_speed_drops_with_leg_damage() {
        let mut t = traveler();
        assert_eq!(t.speed(), 4.0);
        t.parts[Part::LeftLeg.index()] = Status::Destroyed;
        assert_eq!(t.speed(), 2.0);
    }

    #[test]
    fn test_weight_against_capacity() {
        let t = traveler();
        let config = SimulationConfig::default();
        // 30 grain against 5 strength * 10
        assert_eq!(t.weight(&config), -20.0);
    }

    #[test]
    fn test_portion_clamps_and_formats() {
        let mut t = traveler();
        assert_eq!(t.portion_string(), "1.0");
        t.change_portion(-0.75);
        assert_eq!(t.portion_string(), "0.25");
        t.set_portion(-3.0);
        assert_eq!(t.portion(), 0.0);
        assert_eq!(t.portion_string(), "0.0");
        t.set_portion(7.0);
        assert_eq!(t.portion(), 1.0);
    }

    #[test]
    fn test_defense_sums_equipment() {
        let t = traveler();
        // Two fists, defense 1 scaled by strength 5 and agility 4
        assert_eq!(t.defense(), [18, 18, 18]);
    }

    #[test]
    fn test_use_ammo_spends_rounds() {
        let bow_stats = vec![CombatStat::new(Part::LeftArm, Stat::Agility, 2, 1, AttackType::Stab, [0, 0, 0])];
        let bow = Good::new(GoodId(6), "bow")
            .with_material(Material::new(0, "").with_combat_stats(bow_stats))
            .with_shoots(GoodId(7))
            .indivisible();
        let arrows = Good::new(GoodId(7), "arrows").indivisible().with_amount(10.0);
        let mut t = Traveler::new(
            TravelerId(2),
            "Bo",
            &town(),
            Property::with_goods([bow.with_amount(1.0), arrows]),
            [3, 3, 2],
        );
        let request = t.carried.good(GoodId(6)).unwrap().request(1.0);
        assert!(t.equip(request));
        // speed = 1 * agility 2, so 1.6 time units fire 3 rounds
        t.use_ammo(1.6);
        assert_eq!(t.carried.amount(GoodId(7)), 7.0);
        let bow = t.equipped(Part::LeftArm).cloned().unwrap();
        assert!(t.can_strike_with(&bow));
        t.use_ammo(10.0);
        assert!(!t.can_strike_with(&bow));
    }

    #[test]
    fn test_status_text() {
        let mut t = traveler();
        t.parts[Part::Torso.index()] = Status::Bruised;
        let text = t.status_text();
        assert_eq!(text.len(), Part::COUNT + 1);
        assert_eq!(text[0], "Ana's Status");
        assert_eq!(text[2], "torso: bruised");
    }

    #[test]
    fn test_storage_created_on_demand() {
        let mut t = traveler();
        assert!(t.storage.is_empty());
        let storage = t.storage_mut(TownId(1));
        assert_eq!(storage.amount(GoodId(1)), 0.0);
        assert!(storage.good(GoodId(1)).is_some());
    }
}
