//! Property - an owner's goods and businesses at one location
//!
//! Towns hold a market property, travelers hold one carried property plus
//! one storage property per town they have stored goods in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::GoodId;
use crate::goods::business::Business;
use crate::goods::good::Good;

/// A collection of goods keyed by good id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    goods: BTreeMap<GoodId, Good>,
    businesses: Vec<Business>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goods(goods: impl IntoIterator<Item = Good>) -> Self {
        let mut property = Self::new();
        for good in goods {
            property.insert(good);
        }
        property
    }

    /// Add or replace a good
    pub fn insert(&mut self, good: Good) {
        self.goods.insert(good.id(), good);
    }

    pub fn good(&self, id: GoodId) -> Option<&Good> {
        self.goods.get(&id)
    }

    pub fn good_mut(&mut self, id: GoodId) -> Option<&mut Good> {
        self.goods.get_mut(&id)
    }

    /// Amount held of a good, zero if unknown
    pub fn amount(&self, id: GoodId) -> f64 {
        self.goods.get(&id).map(|g| g.amount()).unwrap_or(0.0)
    }

    pub fn goods(&self) -> impl Iterator<Item = &Good> {
        self.goods.values()
    }

    /// Goods with a positive amount
    pub fn held(&self) -> impl Iterator<Item = &Good> {
        self.goods.values().filter(|g| g.amount() > 0.0)
    }

    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    /// Same goods list with every amount emptied
    pub fn empty_like(&self) -> Property {
        Property {
            goods: self.goods.iter().map(|(id, g)| (*id, g.empty_like())).collect(),
            businesses: Vec::new(),
        }
    }

    /// Remove up to `request` from this property; `request` is clamped to what was taken
    pub fn take(&mut self, request: &mut Good) {
        match self.goods.get_mut(&request.id()) {
            Some(held) => held.take(request),
            None => request.set_amount(0.0),
        }
    }

    /// Add `incoming`; returns the amount discarded over capacity
    pub fn put(&mut self, incoming: &Good) -> f64 {
        self.goods
            .entry(incoming.id())
            .or_insert_with(|| incoming.empty_like())
            .put(incoming)
    }

    /// Produce `amount` of a known good; returns the amount discarded
    pub fn create(&mut self, id: GoodId, amount: f64) -> f64 {
        match self.goods.get_mut(&id) {
            Some(good) => good.create(amount),
            None => {
                tracing::warn!("create of unknown good {} ignored", id);
                0.0
            }
        }
    }

    /// Use up `amount` of a good (ammunition, consumption); returns amount used
    pub fn input(&mut self, id: GoodId, amount: f64) -> f64 {
        self.goods.get_mut(&id).map(|g| g.use_up(amount)).unwrap_or(0.0)
    }

    /// Total carry weight of held goods
    pub fn weight(&self) -> f64 {
        self.goods.values().map(|g| g.amount() * g.carry()).sum()
    }

    /// Value of `other`'s goods at this property's prices
    pub fn total_value(&self, other: &Property) -> f64 {
        other
            .held()
            .filter_map(|g| self.goods.get(&g.id()).map(|own| own.value_of(g.amount())))
            .sum()
    }

    /// Add built area to a business, raising storage for its throughput
    pub fn build(&mut self, business: &Business, area: f64, config: &SimulationConfig) {
        if area <= 0.0 {
            return;
        }
        let built = match self.businesses.iter_mut().find(|b| b.id == business.id) {
            Some(existing) => {
                existing.area += area;
                existing.clone()
            }
            None => {
                let built = business.clone().with_area(area);
                self.businesses.push(built.clone());
                built
            }
        };
        for (id, good) in self.goods.iter_mut() {
            good.raise_max(built.storage_need(*id, config));
        }
    }

    /// Remove built area, dropping the business once nothing is left
    pub fn demolish(&mut self, business_id: u32, area: f64) {
        if let Some(existing) = self.businesses.iter_mut().find(|b| b.id == business_id) {
            existing.area = (existing.area - area).max(0.0);
        }
        self.businesses.retain(|b| b.area > 0.0);
    }

    /// Size every good's capacity from its consumption, then make room for
    /// the throughput of built businesses
    pub fn set_maxes(&mut self, config: &SimulationConfig) {
        for (id, good) in self.goods.iter_mut() {
            let floor = self
                .businesses
                .iter()
                .map(|b| b.storage_need(*id, config))
                .fold(0.0, f64::max);
            good.set_max_above(config.consumption_space_factor, floor);
        }
    }

    /// Advance perishing, consumption and production by `elapsed_ms`.
    /// Returns the output discarded for lack of storage.
    pub fn update(&mut self, elapsed_ms: u32, config: &SimulationConfig) -> f64 {
        let days = config.days(elapsed_ms);
        if days <= 0.0 {
            return 0.0;
        }
        for good in self.goods.values_mut() {
            good.consume(days);
            let consumption = good.consumption();
            if consumption > 0.0 {
                good.use_up(consumption * days);
            }
        }
        let mut discarded = 0.0;
        for business in &self.businesses {
            let result = business.run(&mut self.goods, days);
            if result.discarded > 0.0 {
                tracing::debug!(
                    "{} discarded {:.2} output at rate {:.2}",
                    business.name,
                    result.discarded,
                    result.rate
                );
            }
            discarded += result.discarded;
        }
        discarded
    }

    /// Call `f` on every held good
    pub fn for_good(&self, mut f: impl FnMut(&Good)) {
        for good in self.held() {
            f(good);
        }
    }
}
