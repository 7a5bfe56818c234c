//! Non-plant moving entities: projectiles, sun pickups and lawnmowers.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use lawn_defence_core::{EntityId, Position, ProjectileKind, SUN_FALL_SPEED};

use crate::{
    lawn::{self, SlotGrid},
    zombies::Zombie,
};

/// Lifetime of a sun pickup that nobody collects.
pub(crate) const SUN_LIFETIME: Duration = Duration::from_secs(20);
/// Damage a running lawnmower deals to every zombie it touches.
pub(crate) const MOWER_DAMAGE: u32 = 2000;
/// Time a lawnmower keeps running before it leaves the lawn.
pub(crate) const MOWER_RUN_TIME: Duration = Duration::from_secs(7);
const MOWER_SPEED: f32 = 4.0;

/// What happened to a projectile during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flight {
    Flying,
    Hit(EntityId),
    OutOfBounds,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: EntityId,
    pub(crate) kind: ProjectileKind,
    pub(crate) lane: u32,
    pub(crate) position: Position,
}

impl Projectile {
    /// Moves right and reports the first zombie swept on the way.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        zombies: &BTreeMap<EntityId, Zombie>,
        grid: &SlotGrid,
    ) -> Flight {
        let from = self.position.x();
        self.position = self
            .position
            .translated(self.kind.movement_speed() * dt, 0.0);
        let to = self.position.x();
        if let Some(zombie) = lawn::first_zombie_swept(zombies, self.lane, from, to) {
            return Flight::Hit(zombie);
        }
        if grid.is_beyond(self.position.x()) {
            Flight::OutOfBounds
        } else {
            Flight::Flying
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Sun {
    pub(crate) id: EntityId,
    pub(crate) position: Position,
    pub(crate) value: u32,
    pub(crate) landed: bool,
}

impl Sun {
    pub(crate) fn fall(&mut self, dt: f32) {
        if !self.landed {
            self.position = self.position.translated(0.0, SUN_FALL_SPEED * dt);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Mower {
    pub(crate) id: EntityId,
    pub(crate) lane: u32,
    pub(crate) position: Position,
    pub(crate) active: bool,
    struck: BTreeSet<EntityId>,
}

impl Mower {
    pub(crate) fn parked(id: EntityId, lane: u32) -> Self {
        Self {
            id,
            lane,
            position: Position::new(lawn::MOWER_X, lawn_defence_core::lane_center(lane)),
            active: false,
            struck: BTreeSet::new(),
        }
    }

    /// Runs one tick and returns the zombies it rolled over for the first time.
    ///
    /// A parked mower starts on the first contact; `started` is set when it does.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        zombies: &BTreeMap<EntityId, Zombie>,
        started: &mut bool,
    ) -> Vec<EntityId> {
        if self.active {
            self.position = self.position.translated(MOWER_SPEED * dt, 0.0);
        } else if lawn::zombie_near(zombies, self.lane, self.position.x(), lawn::MOWER_REACH)
            .is_some()
        {
            self.active = true;
            *started = true;
        } else {
            return Vec::new();
        }

        let x = self.position.x();
        let mut victims = Vec::new();
        for zombie in zombies.values() {
            if zombie.is_targetable()
                && zombie.lane == self.lane
                && (zombie.being.position.x() - x).abs() <= lawn::MOWER_REACH
                && self.struck.insert(zombie.being.id)
            {
                victims.push(zombie.being.id);
            }
        }
        victims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::ZombieKind;

    fn horde(positions: &[(u32, u32, f32)]) -> BTreeMap<EntityId, Zombie> {
        positions
            .iter()
            .map(|&(id, lane, x)| {
                let id = EntityId::new(id);
                (id, Zombie::new(id, ZombieKind::Basic, lane, Position::new(x, 0.5)))
            })
            .collect()
    }

    #[test]
    fn projectile_hits_first_zombie_in_its_path() {
        let zombies = horde(&[(1, 0, 3.2), (2, 0, 3.0), (3, 1, 2.5)]);
        let grid = SlotGrid::new(5, 9);
        let mut pea = Projectile {
            id: EntityId::new(9),
            kind: ProjectileKind::Pea,
            lane: 0,
            position: Position::new(2.0, 0.5),
        };

        assert_eq!(pea.advance(0.1, &zombies, &grid), Flight::Flying);
        assert_eq!(pea.advance(0.1, &zombies, &grid), Flight::Hit(EntityId::new(2)));
    }

    #[test]
    fn projectile_leaves_the_lawn() {
        let grid = SlotGrid::new(5, 9);
        let mut pea = Projectile {
            id: EntityId::new(9),
            kind: ProjectileKind::SnowPea,
            lane: 0,
            position: Position::new(10.8, 0.5),
        };

        assert_eq!(pea.advance(0.1, &BTreeMap::new(), &grid), Flight::OutOfBounds);
    }

    #[test]
    fn sun_stops_falling_once_landed() {
        let mut sun = Sun {
            id: EntityId::new(1),
            position: Position::new(1.0, 1.0),
            value: 50,
            landed: false,
        };
        sun.fall(0.5);
        assert!((sun.position.y() - 2.0).abs() < 1e-6);
        sun.landed = true;
        sun.fall(0.5);
        assert!((sun.position.y() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn mower_starts_on_contact_and_strikes_each_zombie_once() {
        let zombies = horde(&[(1, 0, -0.2), (2, 0, 1.5), (3, 1, 0.0)]);
        let mut mower = Mower::parked(EntityId::new(5), 0);
        let mut started = false;

        assert_eq!(mower.advance(0.1, &zombies, &mut started), vec![EntityId::new(1)]);
        assert!(started && mower.active);

        let mut later = Vec::new();
        for _ in 0..10 {
            later.extend(mower.advance(0.1, &zombies, &mut started));
        }
        assert_eq!(later, vec![EntityId::new(2)]);
    }

    #[test]
    fn idle_mower_ignores_other_lanes() {
        let zombies = horde(&[(1, 1, -0.4)]);
        let mut mower = Mower::parked(EntityId::new(5), 0);
        let mut started = false;

        assert!(mower.advance(0.1, &zombies, &mut started).is_empty());
        assert!(!mower.active);
    }
}
