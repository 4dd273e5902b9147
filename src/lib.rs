//! Wayfarer - a world of towns, traveling traders, bandits and soldiers
//!
//! Towns produce and store goods. Travelers walk between towns along the
//! road network, trade, hire each other, and fight when attacked.

pub mod ai;
pub mod combat;
pub mod core;
pub mod goods;
pub mod simulation;
pub mod traveler;
pub mod world;
