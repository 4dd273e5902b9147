//! Good - a quantity of a tradable, usable resource
//!
//! A Good is a value type. It is moved between owners by copying a request
//! out of one collection and putting it into another, so no Good is ever
//! referenced from two places at once.
//!
//! Amounts never go negative and never exceed `max`: over-use and
//! over-production clamp silently instead of failing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::{AttackType, Part, Stat};
use crate::core::types::GoodId;

/// Combat contribution of one body part / stat pairing of an equipped good
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStat {
    /// Body part the good occupies
    pub part: Part,
    /// Wielder stat that scales this entry
    pub stat: Stat,
    pub attack: u32,
    pub speed: u32,
    pub attack_type: AttackType,
    /// Defense against each attack type, indexed by `AttackType::index`
    pub defense: [u32; AttackType::COUNT],
}

impl CombatStat {
    pub fn new(
        part: Part,
        stat: Stat,
        attack: u32,
        speed: u32,
        attack_type: AttackType,
        defense: [u32; AttackType::COUNT],
    ) -> Self {
        Self { part, stat, attack, speed, attack_type, defense }
    }
}

/// A material variant of a good (e.g. iron vs bronze swords)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u32,
    /// Empty for the default material
    pub name: String,
    pub amount: f64,
    pub combat_stats: Vec<CombatStat>,
}

impl Material {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            amount: 0.0,
            combat_stats: Vec::new(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount.max(0.0);
        self
    }

    pub fn with_combat_stats(mut self, stats: Vec<CombatStat>) -> Self {
        self.combat_stats = stats;
        self
    }

    fn is_placeholder(&self) -> bool {
        self.id == 0 && self.name.is_empty() && self.amount == 0.0 && self.combat_stats.is_empty()
    }
}

/// A quantity of a named resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Good {
    id: GoodId,
    name: String,
    materials: Vec<Material>,
    /// Fraction of the amount lost per day
    perish: f64,
    /// Weight per unit; negative for pack animals that add capacity
    carry: f64,
    measure: String,
    /// Whether fractional amounts are allowed
    split: bool,
    /// Storage capacity; `None` is unbounded
    max: Option<f64>,
    /// Ammunition consumed when used as a ranged weapon
    shoots: Option<GoodId>,
    /// Units used per day by the owner
    consumption: f64,
    /// Value of one unit at the owner's market
    price: f64,
}

impl PartialEq for Good {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Good {}

impl Good {
    pub fn new(id: GoodId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            materials: vec![Material::new(0, "")],
            perish: 0.0,
            carry: 0.0,
            measure: String::new(),
            split: true,
            max: None,
            shoots: None,
            consumption: 0.0,
            price: 0.0,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.set_amount(amount);
        self
    }

    pub fn with_perish(mut self, perish: f64) -> Self {
        self.perish = perish.max(0.0);
        self
    }

    pub fn with_carry(mut self, carry: f64) -> Self {
        self.carry = carry;
        self
    }

    pub fn with_measure(mut self, measure: impl Into<String>) -> Self {
        self.measure = measure.into();
        self
    }

    /// Mark the good as held only in whole units
    pub fn indivisible(mut self) -> Self {
        self.split = false;
        let amount = self.amount();
        self.set_amount(amount);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max.max(0.0));
        self.remove_excess();
        self
    }

    pub fn with_shoots(mut self, ammo: GoodId) -> Self {
        self.shoots = Some(ammo);
        self
    }

    pub fn with_consumption(mut self, per_day: f64) -> Self {
        self.consumption = per_day;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price.max(0.0);
        self
    }

    /// Add a material variant, replacing the unnamed default if it is unused
    pub fn with_material(mut self, material: Material) -> Self {
        if self.materials.len() == 1 && self.materials[0].is_placeholder() {
            self.materials.clear();
        }
        self.materials.push(material);
        self.remove_excess();
        self
    }

    pub fn id(&self) -> GoodId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name including the primary material, e.g. "iron sword"
    pub fn full_name(&self) -> String {
        match self.materials.first() {
            Some(m) if !m.name.is_empty() => format!("{} {}", m.name, self.name),
            _ => self.name.clone(),
        }
    }

    pub fn amount(&self) -> f64 {
        self.materials.iter().map(|m| m.amount).sum()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, id: u32) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Combat stats of the primary material
    pub fn combat_stats(&self) -> &[CombatStat] {
        self.materials.first().map(|m| m.combat_stats.as_slice()).unwrap_or(&[])
    }

    pub fn perish(&self) -> f64 {
        self.perish
    }

    pub fn carry(&self) -> f64 {
        self.carry
    }

    pub fn measure(&self) -> &str {
        &self.measure
    }

    pub fn split(&self) -> bool {
        self.split
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn shoots(&self) -> Option<GoodId> {
        self.shoots
    }

    /// Net units used per day
    pub fn consumption(&self) -> f64 {
        self.consumption
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// True if this good can be wielded as a weapon
    pub fn is_weapon(&self) -> bool {
        self.combat_stats().first().is_some_and(|s| s.attack > 0)
    }

    /// Put the whole amount on the primary material
    pub fn set_amount(&mut self, amount: f64) {
        let amount = self.whole(amount.max(0.0));
        for (i, m) in self.materials.iter_mut().enumerate() {
            m.amount = if i == 0 { amount } else { 0.0 };
        }
        self.remove_excess();
    }

    /// Size storage from throughput: `max = |consumption| * factor`
    ///
    /// Goods nobody consumes keep their current capacity.
    pub fn set_max(&mut self, factor: f64) {
        self.set_max_above(factor, 0.0);
    }

    /// Like `set_max`, but never below `floor`
    pub fn set_max_above(&mut self, factor: f64, floor: f64) {
        let max = (self.consumption.abs() * factor).max(floor);
        if max > 0.0 {
            self.max = Some(max);
            self.remove_excess();
        }
    }

    /// Raise capacity to at least `max`; an unbounded good stays unbounded
    pub fn raise_max(&mut self, max: f64) {
        if let Some(current) = self.max {
            if max > current {
                self.max = Some(max);
            }
        }
    }

    /// Reduce the amount, clamping at zero. Returns the amount actually used.
    pub fn use_up(&mut self, amount: f64) -> f64 {
        let mut remaining = self.whole(amount.max(0.0)).min(self.amount());
        let used = remaining;
        for m in &mut self.materials {
            if remaining <= 0.0 {
                break;
            }
            let taken = remaining.min(m.amount);
            m.amount -= taken;
            remaining -= taken;
        }
        used
    }

    /// Add to the primary material. Returns the amount discarded over capacity.
    pub fn create(&mut self, amount: f64) -> f64 {
        let amount = self.whole(amount.max(0.0));
        if let Some(m) = self.materials.first_mut() {
            m.amount += amount;
        }
        self.remove_excess()
    }

    /// Add per-material amounts. Returns the amount discarded over capacity.
    pub fn create_materials(&mut self, amounts: &BTreeMap<u32, f64>) -> f64 {
        for (&id, &amount) in amounts {
            let amount = self.whole(amount.max(0.0));
            match self.materials.iter_mut().find(|m| m.id == id) {
                Some(m) => m.amount += amount,
                None => self.materials.push(Material::new(id, "").with_amount(amount)),
            }
        }
        self.remove_excess()
    }

    /// Apply perish decay for `days` of elapsed time
    pub fn consume(&mut self, days: f64) -> f64 {
        if self.perish <= 0.0 || days <= 0.0 {
            return 0.0;
        }
        let decay = self.amount() * (self.perish * days).min(1.0);
        self.use_up(decay)
    }

    /// Move up to the requested per-material amounts out of this good.
    ///
    /// On return `request` holds what was actually taken.
    pub fn take(&mut self, request: &mut Good) {
        for wanted in &mut request.materials {
            let taken = match self.materials.iter_mut().find(|m| m.id == wanted.id) {
                Some(held) => {
                    let taken = wanted.amount.max(0.0).min(held.amount);
                    held.amount -= taken;
                    taken
                }
                None => 0.0,
            };
            wanted.amount = taken;
        }
    }

    /// Add every material of `incoming`. Returns the amount discarded over capacity.
    pub fn put(&mut self, incoming: &Good) -> f64 {
        for m in incoming.materials.iter().filter(|m| m.amount > 0.0) {
            match self.materials.iter_mut().find(|held| held.id == m.id) {
                Some(held) => held.amount += m.amount,
                None => self.materials.push(m.clone()),
            }
        }
        self.remove_excess()
    }

    /// Same good with every material emptied
    pub fn empty_like(&self) -> Good {
        let mut good = self.clone();
        for m in &mut good.materials {
            m.amount = 0.0;
        }
        good
    }

    /// A request for `amount` of this good's primary material
    pub fn request(&self, amount: f64) -> Good {
        let mut good = self.empty_like();
        good.max = None;
        good.set_amount(amount);
        good
    }

    /// Value of `quantity` units at this good's price
    pub fn value_of(&self, quantity: f64) -> f64 {
        quantity * self.price
    }

    /// Units worth `value` at this good's price
    pub fn quantity(&self, value: f64) -> f64 {
        if self.price <= 0.0 {
            return 0.0;
        }
        (value / self.price).max(0.0)
    }

    /// Units worth `value`, rounded down to whole units for indivisible goods
    pub fn quota(&self, value: f64) -> f64 {
        self.whole(self.quantity(value))
    }

    /// Human-readable description, e.g. "5 bushels of wheat"
    pub fn log_entry(&self) -> String {
        let amount = format_amount(self.amount());
        if self.measure.is_empty() {
            format!("{} {}", amount, self.full_name())
        } else {
            format!("{} {} of {}", amount, self.measure, self.full_name())
        }
    }

    fn whole(&self, amount: f64) -> f64 {
        if self.split {
            amount
        } else {
            amount.floor()
        }
    }

    fn remove_excess(&mut self) -> f64 {
        let Some(max) = self.max else {
            return 0.0;
        };
        let max = if self.split { max } else { max.floor() };
        let excess = self.amount() - max;
        if excess > 0.0 {
            self.use_up(excess)
        } else {
            0.0
        }
    }
}

/// Format an amount with at most two decimals and no trailing zeros
pub fn format_amount(amount: f64) -> String {
    let text = format!("{:.2}", amount);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
