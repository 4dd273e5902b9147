//! Combat integration tests
//!
//! Attacks, fight loops and their resolution through the public simulation API.

use std::collections::BTreeSet;

use wayfarer::ai::AiRole;
use wayfarer::combat::{FightChoice, Status};
use wayfarer::core::config::SimulationConfig;
use wayfarer::core::types::{TownId, TravelerId};
use wayfarer::simulation::Simulation;
use wayfarer::world::scenario::{self, goods};

fn sim() -> Simulation {
    Simulation::new(SimulationConfig::default(), scenario::demo_map()).unwrap()
}

fn spawn(sim: &mut Simulation, name: &str, role: Option<AiRole>) -> TravelerId {
    sim.spawn_with_stats(name, TownId(1), role, [5, 5, 5]).unwrap()
}

#[test]
fn test_attack_links_both_sides() {
    let mut sim = sim();
    let bandit = spawn(&mut sim, "Bandit", Some(AiRole::Bandit));
    let ana = spawn(&mut sim, "Ana", None);

    sim.attack(bandit, ana).unwrap();

    let a = sim.traveler(bandit).unwrap();
    let b = sim.traveler(ana).unwrap();
    assert_eq!(b.enemies, BTreeSet::from([bandit]));
    assert_eq!(a.enemies, BTreeSet::from([ana]));
    assert_eq!(b.fight_time, 0.0);
    assert_eq!(a.fight_time, 0.0);
    assert_eq!(a.choice, FightChoice::Fight);
    assert_eq!(b.choice, FightChoice::None);
    assert_eq!(a.log.last().map(String::as_str), Some("Bandit attacks Ana."));
    assert_eq!(b.log.last().map(String::as_str), Some("Bandit attacks Ana."));
}

#[test]
fn test_attack_self_is_rejected() {
    let mut sim = sim();
    let ana = spawn(&mut sim, "Ana", None);
    assert!(sim.attack(ana, ana).is_err());
    assert!(sim.traveler(ana).unwrap().enemies.is_empty());
}

#[test]
fn test_guards_join_defender() {
    let mut sim = sim();
    let bandit = spawn(&mut sim, "Bandit", Some(AiRole::Bandit));
    let ana = spawn(&mut sim, "Ana", None);
    let guard = spawn(&mut sim, "Guard", Some(AiRole::Guard));
    sim.traveler_mut(ana).unwrap().employees.push((AiRole::Guard, guard));

    sim.attack(bandit, ana).unwrap();

    assert!(sim.traveler(ana).unwrap().allies.contains(&guard));
    assert!(sim.combatants(bandit).contains(&guard));
}

#[test]
fn test_fight_won_requires_enemies() {
    let mut sim = sim();
    let bandit = spawn(&mut sim, "Bandit", Some(AiRole::Bandit));
    let ana = spawn(&mut sim, "Ana", None);
    assert!(!sim.fight_won(bandit));

    sim.attack(bandit, ana).unwrap();
    // An undecided target is not fighting back yet
    assert!(sim.fight_won(bandit));

    sim.set_choice(ana, FightChoice::Fight).unwrap();
    assert!(!sim.fight_won(bandit));
    assert!(!sim.fight_won(ana));
}

#[test]
fn test_fight_lands_hits_and_stops() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", Some(AiRole::Soldier));
    let b = spawn(&mut sim, "Bel", Some(AiRole::Soldier));
    sim.attack(a, b).unwrap();

    sim.fight(a, 5000).unwrap();

    let ta = sim.traveler(a).unwrap();
    let tb = sim.traveler(b).unwrap();
    assert!(ta.log.iter().any(|l| l.contains("strikes")));
    assert!(ta
        .parts
        .iter()
        .chain(tb.parts.iter())
        .any(|s| *s != Status::Normal));
}

#[test]
fn test_fight_runs_once_per_stretch() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", Some(AiRole::Soldier));
    let b = spawn(&mut sim, "Bel", Some(AiRole::Soldier));
    sim.attack(a, b).unwrap();

    sim.fight(a, 1000).unwrap();
    // The defender was credited with the stretch the attacker fought
    assert!(sim.traveler(b).unwrap().fight_time >= 0.0);
    let hits = sim.traveler(b).unwrap().log.len();
    sim.fight(b, 1000).unwrap();
    assert_eq!(sim.traveler(b).unwrap().log.len(), hits);
}

#[test]
fn test_undecided_target_is_looted() {
    let mut sim = sim();
    let bandit = spawn(&mut sim, "Bandit", Some(AiRole::Bandit));
    let ana = spawn(&mut sim, "Ana", None);
    let grain_before = sim.traveler(bandit).unwrap().carried.amount(goods::GRAIN);

    sim.attack(bandit, ana).unwrap();
    sim.tick(100);

    let a = sim.traveler(bandit).unwrap();
    let b = sim.traveler(ana).unwrap();
    assert!(a.enemies.is_empty());
    assert!(b.enemies.is_empty());
    assert_eq!(b.carried.amount(goods::SWORD), 0.0);
    assert!(a.carried.amount(goods::GRAIN) > grain_before);
    assert!(b.log.iter().any(|l| l.starts_with("Bandit loots")));
}

#[test]
fn test_disengage_clears_both_sides() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", Some(AiRole::Soldier));
    let b = spawn(&mut sim, "Bel", None);
    sim.attack(a, b).unwrap();
    sim.set_choice(b, FightChoice::Fight).unwrap();
    sim.fight(a, 300).unwrap();

    sim.disengage(a).unwrap();

    let ta = sim.traveler(a).unwrap();
    let tb = sim.traveler(b).unwrap();
    assert!(ta.enemies.is_empty());
    assert!(ta.allies.is_empty());
    assert!(!tb.enemies.contains(&a));
    assert_ne!(tb.target, Some(a));
    assert_eq!(tb.dead, !tb.alive());
    assert!(!sim.map.town(TownId(1)).unwrap().travelers().contains(&b));
}

#[test]
fn test_yield_is_logged_once() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", None);
    let b = spawn(&mut sim, "Bel", None);
    sim.attack(a, b).unwrap();
    sim.set_choice(a, FightChoice::Fight).unwrap();
    sim.set_choice(b, FightChoice::Yield).unwrap();

    sim.tick(100);
    sim.tick(100);

    let yields = sim
        .traveler(a)
        .unwrap()
        .log
        .iter()
        .filter(|l| *l == "Bel has yielded to Ari.")
        .count();
    assert_eq!(yields, 1);
    assert!(sim.traveler(a).unwrap().enemies.contains(&b));
}

#[test]
fn test_mutual_run_ends_fight() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", None);
    let b = spawn(&mut sim, "Bel", None);
    sim.attack(a, b).unwrap();
    sim.set_choice(a, FightChoice::Run).unwrap();
    sim.set_choice(b, FightChoice::Run).unwrap();

    sim.tick(100);

    assert!(sim.traveler(a).unwrap().enemies.is_empty());
    assert!(sim.traveler(b).unwrap().enemies.is_empty());
    assert!(sim
        .traveler(a)
        .unwrap()
        .log
        .iter()
        .any(|l| l == "Ari and Bel have eluded each other."));
}

#[test]
fn test_yielding_combatant_still_draws_hits() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", None);
    let b = spawn(&mut sim, "Bel", None);
    let c = spawn(&mut sim, "Cal", None);
    sim.attack(a, b).unwrap();
    sim.attack(a, c).unwrap();
    sim.set_choice(a, FightChoice::Fight).unwrap();
    sim.set_choice(b, FightChoice::Fight).unwrap();
    sim.set_choice(c, FightChoice::Yield).unwrap();

    sim.fight(a, 1).unwrap();

    let cal = sim.traveler(c).unwrap();
    let struck = cal.log.iter().any(|l| l.starts_with("Cal's"));
    assert_eq!(cal.target, Some(a));
    assert!(struck || cal.next_hit.is_some());
}

#[test]
fn test_fight_terminates_with_many_combatants() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", Some(AiRole::Soldier));
    let b = spawn(&mut sim, "Bel", None);
    for name in ["Gus", "Hal"] {
        let guard = spawn(&mut sim, name, Some(AiRole::Guard));
        sim.traveler_mut(b).unwrap().employees.push((AiRole::Guard, guard));
    }
    let thug = spawn(&mut sim, "Ike", Some(AiRole::Thug));
    sim.traveler_mut(a).unwrap().employees.push((AiRole::Thug, thug));
    sim.attack(a, b).unwrap();
    sim.set_choice(b, FightChoice::Fight).unwrap();

    sim.fight(a, 600_000).unwrap();

    let me = sim.traveler(a).unwrap();
    let enemy_fighting = me.enemies.iter().any(|e| {
        sim.traveler(*e)
            .is_some_and(|t| t.alive() && t.choice == FightChoice::Fight)
    });
    // Disabled arms can leave nobody able to strike
    let stalled = sim
        .combatants(a)
        .iter()
        .all(|c| sim.traveler(*c).is_some_and(|t| t.next_hit.is_none()));
    assert!(
        me.fight_time >= 0.0
            || !me.alive()
            || me.choice != FightChoice::Fight
            || !enemy_fighting
            || stalled
    );
}

#[test]
fn test_fight_won_holds_while_enemy_yields() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", None);
    let b = spawn(&mut sim, "Bel", None);
    sim.attack(a, b).unwrap();
    sim.set_choice(a, FightChoice::Fight).unwrap();
    sim.set_choice(b, FightChoice::Yield).unwrap();
    assert!(sim.fight_won(a));

    for _ in 0..10 {
        sim.tick(100);
        assert!(sim.fight_won(a));
    }
}

#[test]
fn test_each_yield_is_logged_once_between_other_entries() {
    let mut sim = sim();
    let a = spawn(&mut sim, "Ari", None);
    let b = spawn(&mut sim, "Bel", None);
    let c = spawn(&mut sim, "Cal", None);
    sim.attack(a, b).unwrap();
    sim.attack(a, c).unwrap();
    sim.set_choice(a, FightChoice::Fight).unwrap();
    sim.set_choice(b, FightChoice::Yield).unwrap();
    sim.set_choice(c, FightChoice::Yield).unwrap();

    for _ in 0..3 {
        sim.tick(100);
    }

    let count = |sim: &Simulation, entry: &str| {
        sim.traveler(a).unwrap().log.iter().filter(|l| *l == entry).count()
    };
    assert_eq!(count(&sim, "Bel has yielded to Ari."), 1);
    assert_eq!(count(&sim, "Cal has yielded to Ari."), 1);

    // Yielding again after changing stance is a new surrender
    sim.set_choice(b, FightChoice::None).unwrap();
    sim.tick(100);
    sim.set_choice(b, FightChoice::Yield).unwrap();
    sim.tick(100);
    assert_eq!(count(&sim, "Bel has yielded to Ari."), 2);
    assert_eq!(count(&sim, "Cal has yielded to Ari."), 1);
}
