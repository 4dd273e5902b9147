//! Goods, inventories and production

pub mod business;
pub mod good;
pub mod property;

pub use business::{Business, ProductionResult};
pub use good::{format_amount, CombatStat, Good, Material};
pub use property::Property;
