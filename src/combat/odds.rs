//! Attack types, hit odds and status escalation tables

use serde::{Deserialize, Serialize};

use crate::combat::body::Status;

/// Category of damage with its own hit chance and escalation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    Bash,
    Slash,
    Stab,
}

impl AttackType {
    pub const COUNT: usize = 3;

    pub const ALL: [AttackType; AttackType::COUNT] =
        [AttackType::Bash, AttackType::Slash, AttackType::Stab];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Tactical stance a combatant has chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightChoice {
    /// Undecided. Never drives a fight, but still strikes back when swept into one.
    #[default]
    None,
    Fight,
    Run,
    Yield,
}

/// Hit chance and probability-weighted status escalation for one attack type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatOdds {
    /// Divides attack over defense; higher means harder to land
    pub hit_chance: f64,
    /// Statuses in increasing severity with the chance of reaching each
    pub status_chances: Vec<(Status, f64)>,
}

/// Odds for every attack type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    pub bash: CombatOdds,
    pub slash: CombatOdds,
    pub stab: CombatOdds,
}

impl Default for CombatRules {
    fn default() -> Self {
        use Status::*;
        Self {
            bash: CombatOdds {
                hit_chance: 1.0,
                status_chances: vec![
                    (Bruised, 0.6),
                    (Wounded, 0.25),
                    (Broken, 0.1),
                    (Mangled, 0.04),
                    (Destroyed, 0.01),
                ],
            },
            slash: CombatOdds {
                hit_chance: 1.2,
                status_chances: vec![
                    (Bruised, 0.3),
                    (Wounded, 0.4),
                    (Broken, 0.1),
                    (Mangled, 0.15),
                    (Destroyed, 0.05),
                ],
            },
            stab: CombatOdds {
                hit_chance: 1.5,
                status_chances: vec![
                    (Bruised, 0.2),
                    (Wounded, 0.5),
                    (Broken, 0.05),
                    (Mangled, 0.15),
                    (Destroyed, 0.1),
                ],
            },
        }
    }
}

impl CombatRules {
    pub fn odds(&self, attack_type: AttackType) -> &CombatOdds {
        match attack_type {
            AttackType::Bash => &self.bash,
            AttackType::Slash => &self.slash,
            AttackType::Stab => &self.stab,
        }
    }

    /// Hit chances must be positive and tables must escalate
    pub fn validate(&self) -> Result<(), String> {
        for attack_type in AttackType::ALL {
            let odds = self.odds(attack_type);
            if odds.hit_chance <= 0.0 {
                return Err(format!("{:?} hit_chance must be positive", attack_type));
            }
            let ascending = odds.status_chances.windows(2).all(|w| w[0].0 < w[1].0);
            if !ascending {
                return Err(format!("{:?} status_chances must be in increasing severity", attack_type));
            }
        }
        Ok(())
    }
}

/// The next strike a combatant will land
#[derive(Debug, Clone, PartialEq)]
pub struct CombatHit {
    /// Milliseconds until the strike lands
    pub time: f64,
    pub attack_type: AttackType,
    /// Full name of the weapon, for the log
    pub weapon: String,
    pub target: crate::core::types::TravelerId,
}
