//! Simulation configuration with documented constants
//!
//! Every tunable number the engine consumes lives here. The engine only
//! reads these values; nothing in the simulation writes them back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::CombatRules;
use crate::core::error::{Result, SimError};

/// Configuration for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TIME ===
    /// Length of a simulated day in milliseconds
    ///
    /// Movement, perishing, consumption and production are all expressed
    /// per day and scaled by `elapsed / day_length_ms`.
    pub day_length_ms: u32,

    /// Interval between sweeps that remove dead travelers (milliseconds)
    pub travelers_check_ms: u32,

    // === STORAGE ===
    /// Storage capacity as a multiple of a good's daily consumption
    ///
    /// `max = |consumption| * consumption_space_factor`. At 30.0 an owner
    /// can store a month of what it consumes.
    pub consumption_space_factor: f64,

    /// Storage capacity as a multiple of a business's daily input
    pub input_space_factor: f64,

    /// Storage capacity as a multiple of a business's daily output
    pub output_space_factor: f64,

    // === TRAVEL ===
    /// Map units a traveler covers per day
    pub travel_speed: f64,

    /// Carrying capacity granted per point of strength
    pub carry_per_strength: f64,

    /// Squared distance within which a moving traveler can be attacked
    pub attack_dist_sq: f64,

    // === COMBAT ===
    /// Base chance a runner escapes, scaled by the speed ratio
    pub escape_chance: f64,

    /// Highest value a traveler stat can roll
    pub stat_max: u32,

    /// Converts unit-less hit times into milliseconds
    ///
    /// At 1000.0 a weapon with speed 5 and certain hits strikes five times
    /// per simulated second.
    pub hit_time_scale_ms: f64,

    /// Hit chances and status escalation tables per attack type
    pub combat: CombatRules,

    // === RANDOMNESS ===
    /// Seed for the simulation's random source
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            day_length_ms: 1000,
            travelers_check_ms: 5000,

            consumption_space_factor: 30.0,
            input_space_factor: 2.0,
            output_space_factor: 2.0,

            travel_speed: 1.0,
            carry_per_strength: 10.0,
            attack_dist_sq: 4.0,

            escape_chance: 0.5,
            stat_max: 10,
            hit_time_scale_ms: 1000.0,
            combat: CombatRules::default(),

            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Days represented by `elapsed_ms` of simulation time
    pub fn days(&self, elapsed_ms: u32) -> f64 {
        f64::from(elapsed_ms) / f64::from(self.day_length_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.day_length_ms == 0 {
            return Err(SimError::InvalidConfig("day_length_ms must be positive".into()));
        }

        if self.stat_max == 0 {
            return Err(SimError::InvalidConfig("stat_max must be at least 1".into()));
        }

        if !(0.0..=1.0).contains(&self.escape_chance) {
            return Err(SimError::InvalidConfig(format!(
                "escape_chance ({}) must be within [0, 1]",
                self.escape_chance
            )));
        }

        if self.consumption_space_factor < 0.0
            || self.input_space_factor < 0.0
            || self.output_space_factor < 0.0
        {
            return Err(SimError::InvalidConfig("space factors must not be negative".into()));
        }

        if self.hit_time_scale_ms <= 0.0 {
            return Err(SimError::InvalidConfig("hit_time_scale_ms must be positive".into()));
        }

        self.combat.validate().map_err(SimError::InvalidConfig)
    }
}
