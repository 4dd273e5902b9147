//! Hit timing and damage escalation
//!
//! Pure functions over travelers and odds tables. Randomness comes in as an
//! `Rng` or as pre-drawn uniforms so the math can be tested exactly.

use rand::Rng;

use crate::combat::{AttackType, CombatHit, CombatOdds, CombatRules, Part, Status};
use crate::goods::Good;
use crate::traveler::Traveler;

/// Aggregate attack, speed and attack type of a wielded weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponProfile {
    pub attack: u32,
    pub speed: u32,
    pub attack_type: AttackType,
}

/// Attack and speed summed over the weapon's stat entries, each scaled by
/// the wielder's stat. `None` for goods that are not weapons.
pub fn weapon_profile(weapon: &Good, wielder: &Traveler) -> Option<WeaponProfile> {
    if !weapon.is_weapon() {
        return None;
    }
    let stats = weapon.combat_stats();
    let first = stats.first()?;
    let mut profile = WeaponProfile {
        attack: 0,
        speed: 0,
        attack_type: first.attack_type,
    };
    for s in stats {
        profile.attack += s.attack * wielder.stat(s.stat);
        profile.speed += s.speed * wielder.stat(s.stat);
    }
    Some(profile)
}

/// Time until a hit lands, in unscaled units.
///
/// Each swing lands with probability `p = attack / hit_chance / defense`;
/// the number of swings is drawn by inverting the geometric distribution
/// with the uniform `r` in (0, 1]. A certain hit (`p >= 1`) lands on the
/// first swing. Weapons with no attack or speed never land.
pub fn hit_time(attack: u32, speed: u32, defense: u32, hit_chance: f64, r: f64) -> f64 {
    if attack == 0 || speed == 0 {
        return f64::INFINITY;
    }
    let speed = speed as f64;
    let p = attack as f64 / hit_chance / defense as f64;
    if p >= 1.0 {
        return 1.0 / speed;
    }
    let miss_ln = (1.0 - p).ln();
    if miss_ln >= 0.0 {
        return f64::INFINITY;
    }
    (r.ln() / miss_ln + 1.0) / speed
}

/// Soonest hit `attacker` can land on `target` with any equipped weapon.
///
/// Times are scaled to milliseconds by `scale_ms`. Ranged weapons without
/// ammunition are skipped. `None` when no weapon can land a hit.
pub fn first_hit<R: Rng>(
    attacker: &Traveler,
    target: &Traveler,
    rules: &CombatRules,
    scale_ms: f64,
    rng: &mut R,
) -> Option<CombatHit> {
    let defense = target.defense();
    let mut first: Option<CombatHit> = None;
    for weapon in &attacker.equipment {
        let Some(profile) = weapon_profile(weapon, attacker) else {
            continue;
        };
        if !attacker.can_strike_with(weapon) {
            continue;
        }
        let odds = rules.odds(profile.attack_type);
        let r = 1.0 - rng.gen::<f64>();
        let time = hit_time(
            profile.attack,
            profile.speed,
            defense[profile.attack_type.index()],
            odds.hit_chance,
            r,
        ) * scale_ms;
        if !time.is_finite() {
            continue;
        }
        if first.as_ref().map_or(true, |f| time < f.time) {
            first = Some(CombatHit {
                time,
                attack_type: profile.attack_type,
                weapon: weapon.full_name(),
                target: target.id,
            });
        }
    }
    first
}

/// New status of a part hit at `current`, walking the escalation table with `r`.
///
/// Every entry more severe than the status reached so far is taken and its
/// chance subtracted from `r`; the walk stops once `r` is spent. The result
/// is never less severe than `current`.
pub fn escalate(current: Status, odds: &CombatOdds, mut r: f64) -> Status {
    let mut status = current;
    for &(candidate, chance) in &odds.status_chances {
        if r <= 0.0 {
            break;
        }
        if candidate > status {
            status = candidate;
            r -= chance;
        }
    }
    status
}

pub fn random_part<R: Rng>(rng: &mut R) -> Part {
    Part::ALL[rng.gen_range(0..Part::COUNT)]
}
