//! Fight orchestration over the traveler registry
//!
//! Combat state lives on the travelers themselves (`enemies`, `allies`,
//! `target`, `next_hit`, `fight_time`, `choice`). These methods keep both
//! sides of every relation consistent.

use std::collections::BTreeSet;

use rand::Rng;

use crate::ai::{default_target, AiRole, TargetView};
use crate::combat::resolution::{escalate, first_hit, random_part};
use crate::combat::{FightChoice, Status};
use crate::core::error::{Result, SimError};
use crate::core::types::{Millis, TravelerId};
use crate::simulation::Simulation;

/// Chance a runner escapes a pursuer, scaled by their speed ratio
pub fn escape_chance(base: f64, runner_speed: f64, pursuer_speed: f64) -> f64 {
    if pursuer_speed <= 0.0 {
        return 1.0;
    }
    base * runner_speed / pursuer_speed
}

impl Simulation {
    /// `attacker` attacks `target`, waking the target's defenders if it was not fighting yet
    pub fn attack(&mut self, attacker: TravelerId, target: TravelerId) -> Result<()> {
        if attacker == target {
            return Err(SimError::InvalidCommand(format!("{} cannot attack itself", attacker)));
        }
        self.get(attacker)?;
        let defender = self.get_mut(target)?;
        if defender.enemies.is_empty() {
            let defenders = defender.employees_with(&[AiRole::Guard, AiRole::Thug]);
            defender.allies.extend(defenders);
            defender.fight_time = 0.0;
            self.clear_combat(target);
        }
        let defender = self.get_mut(target)?;
        defender.enemies.insert(attacker);
        let fight_time = defender.fight_time;
        let defender_name = defender.name.clone();

        let aggressor = self.get_mut(attacker)?;
        aggressor.enemies.insert(target);
        let thugs = aggressor.employees_with(&[AiRole::Thug]);
        aggressor.allies.extend(thugs);
        aggressor.fight_time = fight_time;
        aggressor.choice = if aggressor.ai.is_some() {
            FightChoice::Fight
        } else {
            FightChoice::None
        };
        let entry = format!("{} attacks {}.", aggressor.name, defender_name);
        self.clear_combat(attacker);

        let defender = self.get_mut(target)?;
        defender.choice = match &defender.ai {
            Some(ai) => ai.choice(&defender.fight_view()),
            None => FightChoice::None,
        };
        tracing::info!("{}", entry);
        self.note_both(attacker, target, &entry);
        Ok(())
    }

    /// True if `id` has enemies and none of them is alive and still fighting
    pub fn fight_won(&self, id: TravelerId) -> bool {
        self.travelers_fighting(id).is_some_and(|fighting| !fighting)
    }

    /// `Some(true)` while some enemy is alive and fighting; `None` without enemies
    fn travelers_fighting(&self, id: TravelerId) -> Option<bool> {
        let traveler = self.traveler(id)?;
        if traveler.enemies.is_empty() {
            return None;
        }
        Some(traveler.enemies.iter().any(|e| {
            self.traveler(*e)
                .is_some_and(|enemy| enemy.alive() && enemy.choice == FightChoice::Fight)
        }))
    }

    /// Moving travelers near `id` on its road, excluding `id`
    pub fn attackable(&self, id: TravelerId) -> Vec<TravelerId> {
        let Some(me) = self.traveler(id) else {
            return Vec::new();
        };
        let mut towns = vec![me.source];
        if me.destination != me.source {
            towns.push(me.destination);
        }
        let candidates: BTreeSet<TravelerId> = towns
            .iter()
            .filter_map(|t| self.map.town(*t))
            .flat_map(|t| t.travelers().iter().copied())
            .collect();
        candidates
            .into_iter()
            .filter(|other| *other != id)
            .filter(|other| {
                self.traveler(*other).is_some_and(|t| {
                    !t.dead
                        && t.destination != t.source
                        && me.position.dist_sq(&t.position) <= self.config.attack_dist_sq
                })
            })
            .collect()
    }

    /// Fight for `elapsed_ms` on behalf of `id`.
    ///
    /// Runs while `id` is alive, chooses to fight, still owes fight time, and
    /// some enemy is alive and fighting. Each iteration lands exactly one hit
    /// and advances every combatant's clock by that hit's time.
    pub fn fight(&mut self, id: TravelerId, elapsed_ms: Millis) -> Result<()> {
        let elapsed = f64::from(elapsed_ms);
        let me = self.get_mut(id)?;
        me.fight_time -= elapsed;
        // Enemies have fought this stretch already and must not fight it again
        let enemies: Vec<TravelerId> = me.enemies.iter().copied().collect();
        for enemy in enemies {
            if let Some(e) = self.traveler_mut(enemy) {
                e.fight_time += elapsed;
            }
        }

        let scale = self.config.hit_time_scale_ms;
        while self.keeps_fighting(id) {
            self.retarget(id);
            let combatants = self.combatants(id);
            for c in &combatants {
                self.prepare_hit(*c);
            }
            let soonest = combatants
                .iter()
                .filter_map(|c| {
                    let hit = self.traveler(*c)?.next_hit.as_ref()?;
                    Some((hit.time, *c))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0));
            let Some((hit_time, striker)) = soonest else {
                tracing::debug!("no combatant of {} can land a hit", id);
                break;
            };
            for c in &combatants {
                let Some(t) = self.traveler_mut(*c) else {
                    continue;
                };
                t.use_ammo(hit_time / scale);
                t.fight_time += hit_time;
                if *c != striker {
                    if let Some(hit) = t.next_hit.as_mut() {
                        hit.time -= hit_time;
                    }
                }
            }
            self.hit(striker);
            for c in &combatants {
                self.poll_choice(*c);
            }
        }
        Ok(())
    }

    fn keeps_fighting(&self, id: TravelerId) -> bool {
        let Some(me) = self.traveler(id) else {
            return false;
        };
        me.alive()
            && me.choice == FightChoice::Fight
            && me.fight_time < 0.0
            && self.travelers_fighting(id) == Some(true)
    }

    /// `id`, its allies, then each enemy followed by that enemy's allies
    pub fn combatants(&self, id: TravelerId) -> Vec<TravelerId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let Some(me) = self.traveler(id) else {
            return out;
        };
        let mut push = |c: TravelerId| {
            if seen.insert(c) && self.travelers_contains(c) {
                out.push(c);
            }
        };
        push(id);
        me.allies.iter().for_each(|a| push(*a));
        for enemy in &me.enemies {
            push(*enemy);
            if let Some(e) = self.traveler(*enemy) {
                e.allies.iter().for_each(|a| push(*a));
            }
        }
        out
    }

    fn travelers_contains(&self, id: TravelerId) -> bool {
        self.traveler(id).is_some()
    }

    /// Give every combatant without a live target in its pool a new one
    fn retarget(&mut self, id: TravelerId) {
        let Some(me) = self.traveler(id) else {
            return;
        };
        let mut sides: Vec<(Vec<TravelerId>, Vec<TravelerId>)> = Vec::new();
        let mut ours = vec![id];
        ours.extend(me.allies.iter().copied());
        sides.push((ours, me.enemies.iter().copied().collect()));
        for enemy in &me.enemies {
            if let Some(e) = self.traveler(*enemy) {
                let mut theirs = vec![*enemy];
                theirs.extend(e.allies.iter().copied());
                sides.push((theirs, e.enemies.iter().copied().collect()));
            }
        }

        for (members, pool) in sides {
            for member in members {
                let Some(m) = self.traveler(member) else {
                    continue;
                };
                let keep = m.target.is_some_and(|t| {
                    pool.contains(&t) && self.traveler(t).is_some_and(|t| t.alive())
                });
                if keep {
                    continue;
                }
                let views: Vec<TargetView> = pool
                    .iter()
                    .filter_map(|p| self.traveler(*p))
                    .map(|p| TargetView {
                        id: p.id,
                        alive: p.alive(),
                        choice: p.choice,
                        targeters: p.targeter_count,
                    })
                    .collect();
                let target = match &m.ai {
                    Some(ai) => ai.target(&views),
                    None => default_target(&views),
                };
                self.set_target(member, target);
            }
        }
    }

    fn set_target(&mut self, id: TravelerId, target: Option<TravelerId>) {
        let Some(me) = self.traveler_mut(id) else {
            return;
        };
        let old = me.target;
        if old == target {
            return;
        }
        me.target = target;
        me.next_hit = None;
        if let Some(t) = old.and_then(|o| self.traveler_mut(o)) {
            t.targeter_count = t.targeter_count.saturating_sub(1);
        }
        if let Some(t) = target.and_then(|n| self.traveler_mut(n)) {
            t.targeter_count += 1;
        }
    }

    /// Draw the next hit of `id` unless one is already pending.
    ///
    /// Every live combatant with a target takes part in the race, whatever
    /// its stance.
    fn prepare_hit(&mut self, id: TravelerId) {
        let Some(me) = self.travelers.get(&id) else {
            return;
        };
        if !me.alive() {
            if let Some(me) = self.travelers.get_mut(&id) {
                me.next_hit = None;
            }
            return;
        }
        if me.next_hit.is_some() {
            return;
        }
        let Some(target) = me.target.and_then(|t| self.travelers.get(&t)) else {
            return;
        };
        if !target.alive() {
            return;
        }
        let hit = first_hit(
            me,
            target,
            &self.config.combat,
            self.config.hit_time_scale_ms,
            &mut self.rng,
        );
        if let Some(me) = self.travelers.get_mut(&id) {
            me.next_hit = hit;
        }
    }

    /// Land the pending hit of `striker` on its target
    fn hit(&mut self, striker: TravelerId) {
        let Some(attacker) = self.traveler_mut(striker) else {
            return;
        };
        let Some(hit) = attacker.next_hit.take() else {
            return;
        };
        let attacker_name = attacker.name.clone();
        let part = random_part(&mut self.rng);
        let r: f64 = self.rng.gen();
        let odds = self.config.combat.odds(hit.attack_type);
        let Some(target) = self.travelers.get_mut(&hit.target) else {
            return;
        };
        let status = escalate(target.parts[part.index()], odds, r);
        target.parts[part.index()] = status;
        if status > Status::Wounded {
            target.unequip(part);
        }
        let entry = format!(
            "{}'s {} strikes {}. {}'s {} has been {}.",
            attacker_name,
            hit.weapon,
            target.name,
            target.name,
            part.name(),
            status.name()
        );
        tracing::debug!("{}", entry);
        self.note_both(striker, hit.target, &entry);
    }

    /// Ask an AI combatant for its current stance
    fn poll_choice(&mut self, id: TravelerId) {
        if let Some(t) = self.traveler_mut(id) {
            if let Some(choice) = t.ai.as_ref().map(|ai| ai.choice(&t.fight_view())) {
                t.choice = choice;
            }
        }
    }

    /// Reset targeting state of `id` and its allies
    fn clear_combat(&mut self, id: TravelerId) {
        let mut side = vec![id];
        if let Some(me) = self.traveler(id) {
            side.extend(me.allies.iter().copied());
        }
        for member in side {
            if let Some(t) = self.traveler_mut(member) {
                t.targeter_count = 0;
                t.target = None;
                t.next_hit = None;
            }
        }
    }

    /// Leave combat, tearing down both sides of every enemy relation.
    ///
    /// Enemies lose their target if it was `id` or one of its allies, are
    /// taken off their town's presence list, and are flagged dead if they no
    /// longer live.
    pub fn disengage(&mut self, id: TravelerId) -> Result<()> {
        let me = self.get_mut(id)?;
        let enemies = std::mem::take(&mut me.enemies);
        me.yielded.clear();
        let mut ours = me.allies.clone();
        ours.insert(id);
        let name = me.name.clone();
        self.clear_combat(id);

        for enemy in &enemies {
            let Some(e) = self.traveler_mut(*enemy) else {
                continue;
            };
            e.enemies.remove(&id);
            e.yielded.remove(&id);
            if e.target.is_some_and(|t| ours.contains(&t)) {
                e.target = None;
                e.next_hit = None;
            }
            e.dead = !e.alive();
            let source = e.source;
            let enemy_allies: Vec<TravelerId> = e.allies.iter().copied().collect();
            for ally in enemy_allies {
                if let Some(a) = self.traveler_mut(ally) {
                    if a.target.is_some_and(|t| ours.contains(&t)) {
                        a.target = None;
                        a.next_hit = None;
                    }
                }
            }
            if let Some(town) = self.map.town_mut(source) {
                town.remove_traveler(*enemy);
            }
        }
        if let Some(me) = self.traveler_mut(id) {
            me.allies.clear();
        }
        tracing::info!("{} disengages from {} enemies", name, enemies.len());
        Ok(())
    }

    /// React to each enemy's stance: fight, chase a runner, or accept a yield.
    /// An AI that has won loots the losers and leaves the fight.
    pub(crate) fn resolve_enemies(&mut self, id: TravelerId, elapsed_ms: Millis) -> Result<()> {
        let enemies: Vec<TravelerId> = self.get(id)?.enemies.iter().copied().collect();
        let mut fought = false;
        for enemy in enemies {
            let me = self.get(id)?;
            if !me.enemies.contains(&enemy) {
                continue;
            }
            let Some(choice) = self.traveler(enemy).map(|e| e.choice) else {
                continue;
            };
            if choice != FightChoice::Yield {
                self.get_mut(id)?.yielded.remove(&enemy);
            }
            let me = self.get(id)?;
            let Some(e) = self.traveler(enemy) else {
                continue;
            };
            let logged_yield = me.yielded.contains(&enemy);
            match e.choice {
                FightChoice::Fight => {
                    if !fought {
                        self.fight(id, elapsed_ms)?;
                        fought = true;
                    }
                }
                FightChoice::Run if me.choice == FightChoice::Fight => {
                    let chance = escape_chance(self.config.escape_chance, e.speed(), me.speed());
                    let (my_name, enemy_name) = (me.name.clone(), e.name.clone());
                    if self.rng.gen::<f64>() > chance {
                        if let Some(e) = self.traveler_mut(enemy) {
                            e.choice = FightChoice::Fight;
                        }
                        let entry = format!("{} catches up to {}.", my_name, enemy_name);
                        self.note_both(id, enemy, &entry);
                        if !fought {
                            self.fight(id, elapsed_ms)?;
                            fought = true;
                        }
                    } else {
                        let entry = format!("{} has eluded {}.", enemy_name, my_name);
                        self.note_both(id, enemy, &entry);
                        self.disengage(enemy)?;
                    }
                }
                FightChoice::Run => {
                    let entry = format!("{} and {} have eluded each other.", me.name, e.name);
                    self.note_both(id, enemy, &entry);
                    self.disengage(enemy)?;
                }
                FightChoice::Yield if !logged_yield => {
                    let entry = format!("{} has yielded to {}.", e.name, me.name);
                    self.note_both(id, enemy, &entry);
                    self.get_mut(id)?.yielded.insert(enemy);
                }
                FightChoice::Yield => {}
                FightChoice::None => {}
            }
        }

        if self.fight_won(id) {
            let me = self.get(id)?;
            if let Some(ai) = &me.ai {
                let loots = ai.loots();
                let losers: Vec<TravelerId> = me.enemies.iter().copied().collect();
                if loots {
                    for loser in losers {
                        self.loot_all(id, loser)?;
                    }
                }
                self.disengage(id)?;
            }
        }
        Ok(())
    }
}
