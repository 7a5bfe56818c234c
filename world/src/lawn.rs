//! Lawn geometry: slot occupancy and contact probes along a lane.

use std::collections::BTreeMap;

use lawn_defence_core::{EntityId, SlotCoord};

use crate::{plants::Plant, zombies::Zombie};

/// Horizontal coordinate of the house. Zombies crossing it end the game.
pub(crate) const HOUSE_X: f32 = -1.0;
/// Resting coordinate of lawnmowers.
pub(crate) const MOWER_X: f32 = -0.5;
/// Distance at which a zombie and a plant are touching.
pub(crate) const CONTACT_REACH: f32 = 0.4;
/// Distance at which a projectile strikes a zombie.
pub(crate) const PROJECTILE_HIT_RADIUS: f32 = 0.3;
/// Distance at which a lawnmower touches a zombie.
pub(crate) const MOWER_REACH: f32 = 0.5;
/// Margin past the last column before projectiles leave the lawn.
const OUT_OF_BOUNDS_MARGIN: f32 = 2.0;

/// Dense lane-major grid tracking which plant occupies each slot.
#[derive(Clone, Debug)]
pub(crate) struct SlotGrid {
    lanes: u32,
    columns: u32,
    cells: Vec<Option<EntityId>>,
}

impl SlotGrid {
    pub(crate) fn new(lanes: u32, columns: u32) -> Self {
        let capacity_u64 = u64::from(lanes) * u64::from(columns);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            lanes,
            columns,
            cells: vec![None; capacity],
        }
    }

    pub(crate) fn lanes(&self) -> u32 {
        self.lanes
    }

    pub(crate) fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn contains(&self, slot: SlotCoord) -> bool {
        self.index(slot).is_some()
    }

    pub(crate) fn occupant(&self, slot: SlotCoord) -> Option<EntityId> {
        self.index(slot)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub(crate) fn occupy(&mut self, slot: SlotCoord, plant: EntityId) {
        if let Some(cell) = self.index(slot).and_then(|index| self.cells.get_mut(index)) {
            *cell = Some(plant);
        }
    }

    /// Frees the slot if `plant` still occupies it.
    pub(crate) fn vacate(&mut self, slot: SlotCoord, plant: EntityId) {
        if let Some(cell) = self.index(slot).and_then(|index| self.cells.get_mut(index)) {
            if *cell == Some(plant) {
                *cell = None;
            }
        }
    }

    /// Horizontal coordinate where zombies enter the lawn.
    pub(crate) fn entry_x(&self) -> f32 {
        self.columns as f32 + 0.5
    }

    /// Reports whether `x` lies past the far edge of the lawn.
    pub(crate) fn is_beyond(&self, x: f32) -> bool {
        x > self.columns as f32 + OUT_OF_BOUNDS_MARGIN
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        if slot.lane() < self.lanes && slot.column() < self.columns {
            let lane = usize::try_from(slot.lane()).ok()?;
            let column = usize::try_from(slot.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(lane * width + column)
        } else {
            None
        }
    }
}

/// Living plant in `lane` touching a zombie standing at `x`, nearest first.
pub(crate) fn plant_in_contact(
    plants: &BTreeMap<EntityId, Plant>,
    lane: u32,
    x: f32,
) -> Option<EntityId> {
    nearest(
        plants
            .values()
            .filter(|plant| plant.being.is_alive() && plant.slot.lane() == lane)
            .map(|plant| (plant.being.id, (plant.being.position.x() - x).abs())),
        CONTACT_REACH,
    )
}

/// Living zombie in `lane` within `reach` of `x`, nearest first.
pub(crate) fn zombie_near(
    zombies: &BTreeMap<EntityId, Zombie>,
    lane: u32,
    x: f32,
    reach: f32,
) -> Option<EntityId> {
    nearest(
        zombies
            .values()
            .filter(|zombie| zombie.is_targetable() && zombie.lane == lane)
            .map(|zombie| (zombie.being.id, (zombie.being.position.x() - x).abs())),
        reach,
    )
}

/// Reports whether a living zombie stands in `lane` between `x` and `x + range`.
pub(crate) fn zombie_ahead(
    zombies: &BTreeMap<EntityId, Zombie>,
    lane: u32,
    x: f32,
    range: f32,
) -> bool {
    zombies.values().any(|zombie| {
        let offset = zombie.being.position.x() - x;
        zombie.is_targetable() && zombie.lane == lane && (0.0..=range).contains(&offset)
    })
}

/// First living zombie in `lane` swept by a body travelling right from `from` to `to`.
pub(crate) fn first_zombie_swept(
    zombies: &BTreeMap<EntityId, Zombie>,
    lane: u32,
    from: f32,
    to: f32,
) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for zombie in zombies.values() {
        let x = zombie.being.position.x();
        if !zombie.is_targetable()
            || zombie.lane != lane
            || x < from - PROJECTILE_HIT_RADIUS
            || x > to + PROJECTILE_HIT_RADIUS
        {
            continue;
        }
        match best {
            Some((_, best_x)) if best_x <= x => {}
            _ => best = Some((zombie.being.id, x)),
        }
    }
    best.map(|(id, _)| id)
}

fn nearest(candidates: impl Iterator<Item = (EntityId, f32)>, reach: f32) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for (id, distance) in candidates {
        if distance > reach {
            continue;
        }
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_grid_rejects_out_of_bounds_slots() {
        let grid = SlotGrid::new(5, 9);
        assert!(grid.contains(SlotCoord::new(4, 8)));
        assert!(!grid.contains(SlotCoord::new(5, 0)));
        assert!(!grid.contains(SlotCoord::new(0, 9)));
    }

    #[test]
    fn vacate_ignores_stale_occupants() {
        let mut grid = SlotGrid::new(1, 3);
        let slot = SlotCoord::new(0, 1);
        grid.occupy(slot, EntityId::new(4));
        grid.vacate(slot, EntityId::new(3));
        assert_eq!(grid.occupant(slot), Some(EntityId::new(4)));
        grid.vacate(slot, EntityId::new(4));
        assert_eq!(grid.occupant(slot), None);
    }

    #[test]
    fn nearest_prefers_closest_then_lowest_identifier() {
        let picked = nearest(
            [
                (EntityId::new(3), 0.3),
                (EntityId::new(1), 0.2),
                (EntityId::new(2), 0.2),
                (EntityId::new(4), 0.9),
            ]
            .into_iter(),
            0.4,
        );
        assert_eq!(picked, Some(EntityId::new(1)));
    }
}
