//! Zombie state machine: walk, eat, die.

use std::{collections::BTreeMap, time::Duration};

use lawn_defence_core::{
    EffectKind, EntityClass, EntityId, Event, Position, ZombieKind, ZombieState,
};

use crate::{
    combat::Being,
    effects::EffectHost,
    lawn,
    plants::Plant,
    timers::{Cooldown, Task, TaskQueue, TaskToken},
};

/// Time a dead zombie lingers before it is removed.
pub(crate) const DYING_DURATION: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
pub(crate) struct Zombie {
    pub(crate) being: Being,
    pub(crate) kind: ZombieKind,
    pub(crate) lane: u32,
    pub(crate) state: ZombieState,
    pub(crate) state_complete: bool,
    pub(crate) movement_speed: f32,
    pub(crate) armor: Option<EntityId>,
    pub(crate) target: Option<EntityId>,
    attack: Cooldown,
}

impl Zombie {
    pub(crate) fn new(id: EntityId, kind: ZombieKind, lane: u32, position: Position) -> Self {
        Self {
            being: Being::new(id, kind.max_health(), position),
            kind,
            lane,
            state: ZombieState::Moving,
            state_complete: false,
            movement_speed: kind.movement_speed(),
            armor: None,
            target: None,
            attack: Cooldown::ready(kind.attack_cooldown()),
        }
    }

    /// Living zombies can be aimed at; dying ones are ignored by every probe.
    pub(crate) fn is_targetable(&self) -> bool {
        self.being.is_alive()
    }

    pub(crate) fn cooldown_elapsed(&mut self, token: TaskToken) {
        let _ = self.attack.complete(token);
    }

    /// Runs one tick: contact probe, state selection, then the state's action.
    ///
    /// Returns `true` when the zombie entered [`ZombieState::Dying`] this tick.
    pub(crate) fn update(
        &mut self,
        dt: f32,
        plants: &mut BTreeMap<EntityId, Plant>,
        tasks: &mut TaskQueue,
        events: &mut Vec<Event>,
    ) -> bool {
        if self.state == ZombieState::Dying {
            return false;
        }

        if self.being.is_alive() {
            let contact = lawn::plant_in_contact(plants, self.lane, self.being.position.x());
            if contact != self.target {
                self.target = contact;
                self.state_complete = true;
            }
        }

        let mut started_dying = false;
        if self.state_complete {
            self.select_state(tasks, events);
            started_dying = self.state == ZombieState::Dying;
        }

        match self.state {
            ZombieState::Moving => {
                self.being.position = self
                    .being
                    .position
                    .translated(-self.movement_speed * dt, 0.0);
            }
            ZombieState::Eating => self.bite(plants, tasks),
            ZombieState::Dying => {}
        }
        started_dying
    }

    fn select_state(&mut self, tasks: &mut TaskQueue, events: &mut Vec<Event>) {
        self.state_complete = false;
        self.state = if !self.being.is_alive() {
            ZombieState::Dying
        } else if self.target.is_some() {
            ZombieState::Eating
        } else {
            ZombieState::Moving
        };

        if self.state == ZombieState::Dying {
            self.attack.block(tasks);
            self.target = None;
            let _ = tasks.schedule(
                Some(self.being.id),
                DYING_DURATION,
                Task::CorpseCleared {
                    zombie: self.being.id,
                },
            );
        }

        events.push(Event::AnimationRequested {
            entity: self.being.id,
            clip: self.state.clip(),
        });
    }

    fn bite(&mut self, plants: &mut BTreeMap<EntityId, Plant>, tasks: &mut TaskQueue) {
        if !self.attack.is_ready() {
            return;
        }
        let Some(target) = self.target else {
            return;
        };
        let Some(plant) = plants.get_mut(&target) else {
            return;
        };
        let _ = plant.being.take_damage(self.kind.bite_damage());
        self.attack.trigger(self.being.id, tasks);
    }
}

impl EffectHost for Zombie {
    fn class(&self) -> EntityClass {
        EntityClass::Zombie(self.kind)
    }

    fn immunities(&self) -> &'static [EffectKind] {
        self.kind.immunities()
    }

    fn multiply_speed(&mut self, factor: f32) {
        self.movement_speed *= factor;
    }

    fn divide_speed(&mut self, factor: f32) {
        self.movement_speed /= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::{Health, PlantKind, SlotCoord};

    fn zombie_at(x: f32) -> Zombie {
        Zombie::new(EntityId::new(1), ZombieKind::Basic, 0, Position::new(x, 0.5))
    }

    fn lawn_with_wall_nut(tasks: &mut TaskQueue) -> BTreeMap<EntityId, Plant> {
        let mut plants = BTreeMap::new();
        let id = EntityId::new(10);
        let _ = plants.insert(id, Plant::new(id, PlantKind::WallNut, SlotCoord::new(0, 2), tasks));
        plants
    }

    #[test]
    fn walks_left_by_speed_times_dt() {
        let mut tasks = TaskQueue::new();
        let mut plants = BTreeMap::new();
        let mut events = Vec::new();
        let mut zombie = zombie_at(8.0);

        let _ = zombie.update(0.5, &mut plants, &mut tasks, &mut events);

        assert!((zombie.being.position.x() - 7.5).abs() < 1e-6);
        assert_eq!(zombie.state, ZombieState::Moving);
    }

    #[test]
    fn stops_and_eats_plant_in_contact() {
        let mut tasks = TaskQueue::new();
        let mut plants = lawn_with_wall_nut(&mut tasks);
        let mut events = Vec::new();
        let mut zombie = zombie_at(2.8);

        let _ = zombie.update(0.1, &mut plants, &mut tasks, &mut events);

        assert_eq!(zombie.state, ZombieState::Eating);
        assert_eq!(zombie.target, Some(EntityId::new(10)));
        assert!((zombie.being.position.x() - 2.8).abs() < 1e-6);
        assert_eq!(plants[&EntityId::new(10)].being.health, Health::new(190));

        let _ = zombie.update(0.1, &mut plants, &mut tasks, &mut events);
        assert_eq!(
            plants[&EntityId::new(10)].being.health,
            Health::new(190),
            "bite waits for the attack cooldown"
        );
    }

    #[test]
    fn dying_is_selected_before_eating_and_schedules_removal() {
        let mut tasks = TaskQueue::new();
        let mut plants = lawn_with_wall_nut(&mut tasks);
        let mut events = Vec::new();
        let mut zombie = zombie_at(2.8);
        let _ = zombie.being.take_damage(500);
        zombie.state_complete = true;

        assert!(zombie.update(0.1, &mut plants, &mut tasks, &mut events));
        assert_eq!(zombie.state, ZombieState::Dying);
        assert_eq!(plants[&EntityId::new(10)].being.health, Health::new(200));

        tasks.advance(DYING_DURATION);
        let mut cleared = false;
        while let Some((_, task)) = tasks.pop_due() {
            cleared |= task == Task::CorpseCleared { zombie: EntityId::new(1) };
        }
        assert!(cleared);
    }
}
