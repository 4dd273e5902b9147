//! Business - area-scaled production inside a property
//!
//! A business turns inputs into outputs every day in proportion to its
//! built area. Production is throttled by the scarcest input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::GoodId;
use crate::goods::good::Good;

/// A production facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: u32,
    pub name: String,
    /// Built area; all rates scale with it
    pub area: f64,
    /// Units consumed per unit area per day
    pub inputs: Vec<(GoodId, f64)>,
    /// Units produced per unit area per day
    pub outputs: Vec<(GoodId, f64)>,
}

/// Result of one production run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionResult {
    /// Fraction of full output achieved (0.0 to 1.0)
    pub rate: f64,
    /// Output discarded over storage capacity
    pub discarded: f64,
}

impl Business {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            area: 0.0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area.max(0.0);
        self
    }

    pub fn with_input(mut self, good: GoodId, per_day: f64) -> Self {
        self.inputs.push((good, per_day));
        self
    }

    pub fn with_output(mut self, good: GoodId, per_day: f64) -> Self {
        self.outputs.push((good, per_day));
        self
    }

    /// Storage a good needs to buffer this business's daily throughput
    pub fn storage_need(&self, good: GoodId, config: &SimulationConfig) -> f64 {
        let inputs = self
            .inputs
            .iter()
            .filter(|(id, _)| *id == good)
            .map(|(_, per_day)| per_day * self.area * config.input_space_factor);
        let outputs = self
            .outputs
            .iter()
            .filter(|(id, _)| *id == good)
            .map(|(_, per_day)| per_day * self.area * config.output_space_factor);
        inputs.chain(outputs).fold(0.0, f64::max)
    }

    /// Fraction of full production the available inputs allow
    pub fn production_rate(&self, goods: &BTreeMap<GoodId, Good>, days: f64) -> f64 {
        let scale = self.area * days;
        if scale <= 0.0 {
            return 0.0;
        }
        self.inputs
            .iter()
            .map(|(id, per_day)| {
                let needed = per_day * scale;
                if needed <= 0.0 {
                    return 1.0;
                }
                let available = goods.get(id).map(|g| g.amount()).unwrap_or(0.0);
                (available / needed).min(1.0)
            })
            .fold(1.0, f64::min)
    }

    /// Run production for `days` against the given goods
    pub fn run(&self, goods: &mut BTreeMap<GoodId, Good>, days: f64) -> ProductionResult {
        let rate = self.production_rate(goods, days);
        if rate <= 0.0 {
            return ProductionResult::default();
        }
        let scale = self.area * days * rate;
        for (id, per_day) in &self.inputs {
            if let Some(good) = goods.get_mut(id) {
                good.use_up(per_day * scale);
            }
        }
        let mut discarded = 0.0;
        for (id, per_day) in &self.outputs {
            if let Some(good) = goods.get_mut(id) {
                discarded += good.create(per_day * scale);
            }
        }
        ProductionResult { rate, discarded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goods(wool: f64) -> BTreeMap<GoodId, Good> {
        let mut goods = BTreeMap::new();
        goods.insert(GoodId(1), Good::new(GoodId(1), "wool").with_amount(wool));
        goods.insert(GoodId(2), Good::new(GoodId(2), "cloth"));
        goods
    }

    fn weaver() -> Business {
        Business::new(1, "weaver")
            .with_area(2.0)
            .with_input(GoodId(1), 2.0)
            .with_output(GoodId(2), 1.0)
    }

    #[test]
    fn test_full_production() {
        let mut goods = goods(10.0);
        let result = weaver().run(&mut goods, 1.0);
        assert_eq!(result.rate, 1.0);
        assert_eq!(goods[&GoodId(1)].amount(), 6.0);
        assert_eq!(goods[&GoodId(2)].amount(), 2.0);
    }

    #[test]
    fn test_input_limited_production() {
        let mut goods = goods(2.0);
        let result = weaver().run(&mut goods, 1.0);
        assert_eq!(result.rate, 0.5);
        assert_eq!(goods[&GoodId(1)].amount(), 0.0);
        assert_eq!(goods[&GoodId(2)].amount(), 1.0);
    }

    #[test]
    fn test_no_area_no_production() {
        let mut goods = goods(10.0);
        let result = weaver().with_area(0.0).run(&mut goods, 1.0);
        assert_eq!(result.rate, 0.0);
        assert_eq!(goods[&GoodId(2)].amount(), 0.0);
    }
}
