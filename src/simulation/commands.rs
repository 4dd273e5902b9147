//! Imperative commands issued by players or AI intents
//!
//! Unknown ids are errors. Inside a valid call the usual policy holds:
//! over-use clamps and meaningless requests (empty trades, moving while
//! overloaded) do nothing and return `Ok`.

use crate::ai::AiRole;
use crate::combat::{FightChoice, Part};
use crate::core::error::{Result, SimError};
use crate::core::types::{TownId, TravelerId};
use crate::goods::{Business, Good};
use crate::simulation::Simulation;
use crate::traveler::{transfer, Contract};

impl Simulation {
    /// Start walking toward `town` along the cheapest route.
    ///
    /// Ignored while moving, while overloaded, or when no route exists.
    /// Guards and thugs take the same route.
    pub fn pick_town(&mut self, id: TravelerId, town: TownId) -> Result<()> {
        self.map.town(town).ok_or(SimError::TownNotFound(town))?;
        let traveler = self.get(id)?;
        if traveler.moving || traveler.weight(&self.config) > 0.0 {
            tracing::debug!("{} cannot leave for {}", traveler.name, town);
            return Ok(());
        }
        let mut route = self.map.path_to(traveler.destination, town);
        if route.is_empty() {
            return Ok(());
        }
        let first = route.remove(0);
        let followers = traveler.employees_with(&[AiRole::Guard, AiRole::Thug]);
        for member in std::iter::once(id).chain(followers) {
            if let Some(t) = self.traveler_mut(member) {
                t.destination = first;
                t.route = route.clone();
                t.moving = true;
            }
        }
        Ok(())
    }

    /// Exchange the traveler's offer for its request at the current town's market
    pub fn make_trade(&mut self, id: TravelerId) -> Result<()> {
        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        if traveler.offer.is_empty() || traveler.request.is_empty() {
            return Ok(());
        }
        let town = self
            .map
            .town_mut(traveler.destination)
            .ok_or(SimError::TownNotFound(traveler.destination))?;
        let mut offer = std::mem::take(&mut traveler.offer);
        let mut request = std::mem::take(&mut traveler.request);
        let mut entry = format!("{} trades ", traveler.name);
        transfer(&mut offer, &mut traveler.carried, &mut *town, &mut entry);
        entry.push_str(" for ");
        transfer(&mut request, &mut *town, &mut traveler.carried, &mut entry);
        entry.push_str(&format!(" in {}.", town.name));
        tracing::debug!("{}", entry);
        traveler.note(entry);
        Ok(())
    }

    /// Shrink each offered good so the offer stops exceeding the request.
    ///
    /// `excess` is split evenly across offered goods and converted back to a
    /// quantity at the town's price for that good divided by `town_price`.
    pub fn divide_excess(&mut self, id: TravelerId, excess: f64, town_price: f64) -> Result<()> {
        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        if traveler.offer.is_empty() || town_price <= 0.0 {
            return Ok(());
        }
        let town = self
            .map
            .town(traveler.destination)
            .ok_or(SimError::TownNotFound(traveler.destination))?;
        let share = excess / traveler.offer.len() as f64;
        for offered in &mut traveler.offer {
            let Some(town_good) = town.property.good(offered.id()) else {
                continue;
            };
            let mut quantity = town_good.quantity(share / town_price);
            if !town_good.split() {
                quantity = quantity.floor();
            }
            offered.use_up(quantity);
        }
        Ok(())
    }

    /// Post a job bid in the current town worth the traveler's goods plus `add`
    pub fn bid(&mut self, id: TravelerId, add: f64, wage: f64) -> Result<()> {
        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        let town = self
            .map
            .town_mut(traveler.destination)
            .ok_or(SimError::TownNotFound(traveler.destination))?;
        let contract = Contract::new(id, town.property.total_value(&traveler.carried) + add, wage);
        town.add_bid(contract.clone());
        traveler.contract = Some(contract);
        Ok(())
    }

    /// Hire the bidder at `index` on the current town's job board.
    ///
    /// The employer's offer is handed over as signing payment.
    pub fn hire(&mut self, id: TravelerId, index: usize) -> Result<TravelerId> {
        let town_id = self.get(id)?.destination;
        let town = self.map.town(town_id).ok_or(SimError::TownNotFound(town_id))?;
        let bid = town
            .bids()
            .get(index)
            .cloned()
            .ok_or_else(|| SimError::InvalidCommand(format!("no bid {} in {}", index, town.name)))?;
        let employee = bid.party;
        let role = self.get(employee)?.role().ok_or_else(|| {
            SimError::InvalidCommand(format!("{} has no role to be hired for", employee))
        })?;
        if employee == id {
            return Err(SimError::InvalidCommand(format!("{} cannot hire itself", id)));
        }
        if let Some(town) = self.map.town_mut(town_id) {
            town.take_bid(index);
        }

        let entry = self.with_pair(id, employee, |employer, hired| {
            employer.employees.push((role, hired.id));
            hired.employer = Some(employer.id);
            hired.contract = Some(Contract { party: employer.id, ..bid });
            let mut offer = std::mem::take(&mut employer.offer);
            let mut entry = format!("{} hires {}", employer.name, hired.name);
            if !offer.is_empty() {
                entry.push_str(" for ");
                transfer(&mut offer, &mut employer.carried, &mut hired.carried, &mut entry);
            }
            entry.push('.');
            entry
        })?;
        tracing::info!("{}", entry);
        self.note_both(id, employee, &entry);
        Ok(employee)
    }

    /// Let an employee go, collecting goods worth what they hold beyond what is owed.
    ///
    /// The employee's goods are valued at their home town's prices; the
    /// surplus is split evenly across those goods and requested back.
    pub fn dismiss(&mut self, id: TravelerId, employee: TravelerId) -> Result<()> {
        if !self.get(id)?.employees.iter().any(|(_, e)| *e == employee) {
            return Err(SimError::InvalidCommand(format!("{} does not employ {}", id, employee)));
        }
        let hired = self.get(employee)?;
        let home = self.map.town(hired.home).ok_or(SimError::TownNotFound(hired.home))?;
        let mut total_value = 0.0;
        let mut town_goods: Vec<&Good> = Vec::new();
        for good in hired.carried.held() {
            if let Some(town_good) = home.property.good(good.id()) {
                total_value += town_good.value_of(good.amount());
                town_goods.push(town_good);
            }
        }
        let owed = hired.contract.as_ref().map_or(0.0, |c| c.owed);
        let mut request: Vec<Good> = Vec::new();
        if !town_goods.is_empty() {
            let request_value = (total_value - owed) / town_goods.len() as f64;
            request = town_goods
                .iter()
                .map(|g| g.request(g.quota(request_value)))
                .filter(|g| g.amount() > 0.0)
                .collect();
        }

        let entry = self.with_pair(id, employee, |employer, hired| {
            let mut entry = format!("{} dismisses {}", employer.name, hired.name);
            if !request.is_empty() {
                entry.push_str(" and collects ");
                transfer(&mut request, &mut hired.carried, &mut employer.carried, &mut entry);
            }
            entry.push('.');
            employer.employees.retain(|(_, e)| *e != hired.id);
            hired.employer = None;
            hired.contract = None;
            entry
        })?;
        tracing::info!("{}", entry);
        self.note_both(id, employee, &entry);
        Ok(())
    }

    /// Town the traveler is standing in; commands on storage need one
    fn standing_town(&self, id: TravelerId) -> Result<TownId> {
        let traveler = self.get(id)?;
        if traveler.moving {
            return Err(SimError::InvalidCommand(format!("{} is on the road", traveler.name)));
        }
        Ok(traveler.destination)
    }

    /// Move carried goods into storage in the current town
    pub fn deposit(&mut self, id: TravelerId, mut good: Good) -> Result<f64> {
        let town = self.standing_town(id)?;
        let traveler = self.get_mut(id)?;
        traveler.carried.take(&mut good);
        traveler.storage_mut(town).put(&good);
        Ok(good.amount())
    }

    /// Move stored goods in the current town back into carried inventory
    pub fn withdraw(&mut self, id: TravelerId, mut good: Good) -> Result<f64> {
        let town = self.standing_town(id)?;
        let traveler = self.get_mut(id)?;
        traveler.storage_mut(town).take(&mut good);
        traveler.carried.put(&good);
        Ok(good.amount())
    }

    /// Build `area` of a business on the traveler's land in the current town
    pub fn build(&mut self, id: TravelerId, business: &Business, area: f64) -> Result<()> {
        let town = self.standing_town(id)?;
        let traveler = self.travelers.get_mut(&id).ok_or(SimError::TravelerNotFound(id))?;
        traveler.storage_mut(town).build(business, area, &self.config);
        Ok(())
    }

    pub fn demolish(&mut self, id: TravelerId, business_id: u32, area: f64) -> Result<()> {
        let town = self.standing_town(id)?;
        self.get_mut(id)?.storage_mut(town).demolish(business_id, area);
        Ok(())
    }

    /// Equip a carried good; returns false if it could not be equipped
    pub fn equip(&mut self, id: TravelerId, good: Good) -> Result<bool> {
        Ok(self.get_mut(id)?.equip(good))
    }

    pub fn unequip(&mut self, id: TravelerId, part: Part) -> Result<()> {
        self.get_mut(id)?.unequip(part);
        Ok(())
    }

    pub fn set_choice(&mut self, id: TravelerId, choice: FightChoice) -> Result<()> {
        self.get_mut(id)?.choice = choice;
        Ok(())
    }

    /// Take up to `good` from `target`'s carried inventory
    pub fn loot(&mut self, id: TravelerId, target: TravelerId, good: Good) -> Result<f64> {
        self.with_pair(id, target, |looter, victim| {
            let mut good = good;
            victim.carried.take(&mut good);
            looter.carried.put(&good);
            good.amount()
        })
    }

    /// Take everything `target` carries
    pub fn loot_all(&mut self, id: TravelerId, target: TravelerId) -> Result<()> {
        let entry = self.with_pair(id, target, |looter, victim| {
            let mut goods: Vec<Good> = Vec::new();
            victim.carried.for_good(|g| goods.push(g.clone()));
            if goods.is_empty() {
                return None;
            }
            let mut entry = format!("{} loots ", looter.name);
            transfer(&mut goods, &mut victim.carried, &mut looter.carried, &mut entry);
            entry.push_str(&format!(" from {}.", victim.name));
            Some(entry)
        })?;
        if let Some(entry) = entry {
            tracing::debug!("{}", entry);
            self.note_both(id, target, &entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::GoodId;
    use crate::world::scenario::{self, goods};

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default(), scenario::demo_map()).unwrap()
    }

    fn spawn(sim: &mut Simulation, name: &str, role: Option<AiRole>) -> TravelerId {
        sim.spawn_with_stats(name, TownId(1), role, [5, 5, 5]).unwrap()
    }

    fn request(sim: &Simulation, id: TravelerId, good: GoodId, amount: f64) -> Good {
        sim.traveler(id).unwrap().carried.good(good).unwrap().request(amount)
    }

    #[test]
    fn test_pick_town_sets_route() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        sim.pick_town(id, TownId(3)).unwrap();
        let t = sim.traveler(id).unwrap();
        assert!(t.moving);
        assert_eq!(t.destination, TownId(2));
        assert_eq!(t.route, vec![TownId(3)]);
    }

    #[test]
    fn test_pick_town_ignored_when_overloaded() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        sim.traveler_mut(id).unwrap().carried.create(goods::WOOL, 1000.0);
        sim.pick_town(id, TownId(2)).unwrap();
        assert!(!sim.traveler(id).unwrap().moving);
    }

    #[test]
    fn test_pick_town_unknown_town_errors() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        assert!(matches!(sim.pick_town(id, TownId(42)), Err(SimError::TownNotFound(_))));
    }

    #[test]
    fn test_guards_follow_employer() {
        let mut sim = sim();
        let boss = spawn(&mut sim, "Boss", None);
        let guard = spawn(&mut sim, "Guard", Some(AiRole::Guard));
        sim.traveler_mut(boss).unwrap().employees.push((AiRole::Guard, guard));
        sim.pick_town(boss, TownId(2)).unwrap();
        let g = sim.traveler(guard).unwrap();
        assert!(g.moving);
        assert_eq!(g.destination, TownId(2));
    }

    #[test]
    fn test_make_trade_moves_both_ways() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let wool_before = sim.traveler(id).unwrap().carried.amount(goods::WOOL);
        let town_wine_before = sim.map.town(TownId(1)).unwrap().property.amount(goods::WINE);
        let offer = request(&sim, id, goods::WOOL, 2.0);
        let wanted = sim.map.town(TownId(1)).unwrap().property.good(goods::WINE).unwrap().request(1.0);
        {
            let t = sim.traveler_mut(id).unwrap();
            t.offer = vec![offer];
            t.request = vec![wanted];
        }
        sim.make_trade(id).unwrap();
        let t = sim.traveler(id).unwrap();
        assert_eq!(t.carried.amount(goods::WOOL), wool_before - 2.0);
        assert_eq!(t.carried.amount(goods::WINE), 1.0);
        assert_eq!(sim.map.town(TownId(1)).unwrap().property.amount(goods::WINE), town_wine_before - 1.0);
        assert!(t.log.last().unwrap().starts_with("Ana trades 2 bales of wool for 1 jugs of wine in "));
        assert!(t.offer.is_empty() && t.request.is_empty());
    }

    #[test]
    fn test_make_trade_with_empty_request_is_noop() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let offer = request(&sim, id, goods::WOOL, 2.0);
        sim.traveler_mut(id).unwrap().offer = vec![offer];
        sim.make_trade(id).unwrap();
        let t = sim.traveler(id).unwrap();
        assert!(t.log.is_empty());
        assert_eq!(t.offer.len(), 1);
    }

    #[test]
    fn test_divide_excess_reduces_offer() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let offer = request(&sim, id, goods::WOOL, 4.0);
        sim.traveler_mut(id).unwrap().offer = vec![offer];
        let wool_price = sim.map.town(TownId(1)).unwrap().property.good(goods::WOOL).unwrap().price();
        // Excess worth exactly two bales at a neutral town price
        sim.divide_excess(id, 2.0 * wool_price, 1.0).unwrap();
        assert_eq!(sim.traveler(id).unwrap().offer[0].amount(), 2.0);
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let before = sim.traveler(id).unwrap().carried.amount(goods::GRAIN);
        let moved = sim.deposit(id, request(&sim, id, goods::GRAIN, 3.0)).unwrap();
        assert_eq!(moved, 3.0);
        let t = sim.traveler(id).unwrap();
        assert_eq!(t.carried.amount(goods::GRAIN), before - 3.0);
        assert_eq!(t.storage[&TownId(1)].amount(goods::GRAIN), 3.0);

        let back = sim.withdraw(id, request(&sim, id, goods::GRAIN, 10.0)).unwrap();
        assert_eq!(back, 3.0);
        assert_eq!(sim.traveler(id).unwrap().carried.amount(goods::GRAIN), before);
    }

    #[test]
    fn test_deposit_on_the_road_fails() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        sim.pick_town(id, TownId(2)).unwrap();
        let good = request(&sim, id, goods::GRAIN, 1.0);
        assert!(matches!(sim.deposit(id, good), Err(SimError::InvalidCommand(_))));
    }

    #[test]
    fn test_build_and_demolish() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let farm = scenario::farm();
        sim.build(id, &farm, 2.0).unwrap();
        assert_eq!(sim.traveler(id).unwrap().storage[&TownId(1)].businesses()[0].area, 2.0);
        sim.demolish(id, farm.id, 2.0).unwrap();
        assert!(sim.traveler(id).unwrap().storage[&TownId(1)].businesses().is_empty());
    }

    #[test]
    fn test_hire_and_dismiss() {
        let mut sim = sim();
        let boss = spawn(&mut sim, "Boss", None);
        let guard = spawn(&mut sim, "Gus", Some(AiRole::Guard));
        sim.bid(guard, 0.0, 1.0).unwrap();
        assert_eq!(sim.map.town(TownId(1)).unwrap().bids().len(), 1);

        let pay = request(&sim, boss, goods::GRAIN, 2.0);
        sim.traveler_mut(boss).unwrap().offer = vec![pay];
        assert_eq!(sim.hire(boss, 0).unwrap(), guard);
        assert!(sim.map.town(TownId(1)).unwrap().bids().is_empty());
        let b = sim.traveler(boss).unwrap();
        assert_eq!(b.employees, vec![(AiRole::Guard, guard)]);
        assert_eq!(b.log.last().unwrap(), "Boss hires Gus for 2 bushels of grain.");
        let g = sim.traveler(guard).unwrap();
        assert_eq!(g.employer, Some(boss));
        assert_eq!(g.contract.as_ref().map(|c| c.party), Some(boss));

        sim.dismiss(boss, guard).unwrap();
        assert!(sim.traveler(boss).unwrap().employees.is_empty());
        let g = sim.traveler(guard).unwrap();
        assert_eq!(g.employer, None);
        assert!(g.log.last().unwrap().starts_with("Boss dismisses Gus"));
    }

    #[test]
    fn test_hire_player_fails() {
        let mut sim = sim();
        let boss = spawn(&mut sim, "Boss", None);
        let other = spawn(&mut sim, "Pat", None);
        sim.bid(other, 0.0, 1.0).unwrap();
        assert!(matches!(sim.hire(boss, 0), Err(SimError::InvalidCommand(_))));
        assert_eq!(sim.map.town(TownId(1)).unwrap().bids().len(), 1);
        assert!(sim.hire(boss, 5).is_err());
    }

    #[test]
    fn test_dismiss_non_employee_fails() {
        let mut sim = sim();
        let a = spawn(&mut sim, "a", None);
        let b = spawn(&mut sim, "b", Some(AiRole::Guard));
        assert!(sim.dismiss(a, b).is_err());
    }

    #[test]
    fn test_loot_all_takes_everything() {
        let mut sim = sim();
        let a = spawn(&mut sim, "a", None);
        let b = spawn(&mut sim, "b", None);
        let grain = sim.traveler(a).unwrap().carried.amount(goods::GRAIN);
        sim.loot_all(a, b).unwrap();
        assert_eq!(sim.traveler(b).unwrap().carried.held().count(), 0);
        assert_eq!(sim.traveler(a).unwrap().carried.amount(goods::GRAIN), grain * 2.0);
        assert!(sim.traveler(b).unwrap().log.last().unwrap().starts_with("a loots "));
    }

    #[test]
    fn test_loot_single_good() {
        let mut sim = sim();
        let a = spawn(&mut sim, "a", None);
        let b = spawn(&mut sim, "b", None);
        let good = request(&sim, b, goods::WOOL, 1.0);
        assert_eq!(sim.loot(a, b, good).unwrap(), 1.0);
    }

    #[test]
    fn test_equip_command() {
        let mut sim = sim();
        let id = spawn(&mut sim, "Ana", None);
        let sword = request(&sim, id, goods::SWORD, 1.0);
        assert!(sim.equip(id, sword).unwrap());
        sim.unequip(id, Part::RightArm).unwrap();
        assert_eq!(sim.traveler(id).unwrap().carried.amount(goods::SWORD), 1.0);
    }
}
