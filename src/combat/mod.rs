//! Combat: body damage, hit timing and fight orchestration
//!
//! A fight is a discrete-event race. Every combatant draws the time of its
//! next hit, the soonest hit lands, the clock advances by that time, and the
//! race repeats until the elapsed budget is spent or one side stops fighting.

pub mod body;
pub mod engine;
pub mod odds;
pub mod resolution;

pub use body::{Part, Parts, Stat, Stats, Status};
pub use odds::{AttackType, CombatHit, CombatOdds, CombatRules, FightChoice};
pub use resolution::{escalate, first_hit, hit_time, weapon_profile, WeaponProfile};
