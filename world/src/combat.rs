//! Health bookkeeping, armor layers and damage resolution.

use std::collections::BTreeMap;

use lawn_defence_core::{ArmorKind, EntityId, Event, Health, Position};

use crate::zombies::Zombie;

/// Result of applying damage to a single entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DamageOutcome {
    /// The entity was already destroyed, so nothing changed.
    Ignored,
    /// Health dropped but some remains.
    Wounded,
    /// Health reached zero with this hit.
    Destroyed,
}

/// Common record shared by every living entity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Being {
    pub(crate) id: EntityId,
    pub(crate) health: Health,
    pub(crate) max_health: Health,
    pub(crate) position: Position,
    alive: bool,
}

impl Being {
    pub(crate) fn new(id: EntityId, max_health: Health, position: Position) -> Self {
        Self {
            id,
            health: max_health,
            max_health,
            position,
            alive: true,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive
    }

    /// Subtracts `amount`, saturating at zero. The destroyed transition happens once.
    pub(crate) fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health.is_depleted() {
            self.alive = false;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Wounded
        }
    }

    /// Marks the entity destroyed without touching its health.
    pub(crate) fn destroy(&mut self) {
        self.alive = false;
    }

    /// Brings the entity back to full health.
    pub(crate) fn restore(&mut self) {
        self.health = self.max_health;
        self.alive = true;
    }
}

/// Items that a magnet can pull off their owner.
pub(crate) trait MagnetRemovable {
    /// Reports whether a magnet already took the item.
    fn is_removed(&self) -> bool;

    /// Hands the item to `magnet`, returning the owner that must drop it.
    ///
    /// Taking an item twice is a no-op that returns `None`.
    fn take(&mut self, magnet: EntityId) -> Option<EntityId>;
}

/// Armor layer worn by a zombie or held by a magnet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Item {
    pub(crate) being: Being,
    pub(crate) kind: ArmorKind,
    pub(crate) owner: Option<EntityId>,
    pub(crate) holder: Option<EntityId>,
    removed: bool,
}

impl Item {
    pub(crate) fn worn_by(
        id: EntityId,
        kind: ArmorKind,
        owner: EntityId,
        position: Position,
    ) -> Self {
        Self {
            being: Being::new(id, kind.max_health(), position),
            kind,
            owner: Some(owner),
            holder: None,
            removed: false,
        }
    }
}

impl MagnetRemovable for Item {
    fn is_removed(&self) -> bool {
        self.removed
    }

    fn take(&mut self, magnet: EntityId) -> Option<EntityId> {
        if self.removed {
            return None;
        }
        self.removed = true;
        self.holder = Some(magnet);
        self.owner.take()
    }
}

/// Damages an armor item and reports the sprite frame it should show.
pub(crate) fn strike_item(item: &mut Item, amount: u32, events: &mut Vec<Event>) -> DamageOutcome {
    let outcome = item.being.take_damage(amount);
    if outcome == DamageOutcome::Wounded {
        if let Some(stage) = item.kind.wear_stage(item.being.health) {
            events.push(Event::ArmorWorn {
                item: item.being.id,
                stage,
            });
        }
    }
    outcome
}

/// Damages a zombie, letting its armor layer absorb the hit first.
///
/// The armor takes the full amount; the zombie takes whatever exceeded the
/// armor's health before the hit. Broken armor is dropped by its owner so later
/// hits land unmitigated.
pub(crate) fn strike_zombie(
    zombies: &mut BTreeMap<EntityId, Zombie>,
    items: &mut BTreeMap<EntityId, Item>,
    zombie_id: EntityId,
    amount: u32,
    events: &mut Vec<Event>,
) -> DamageOutcome {
    let Some(zombie) = zombies.get_mut(&zombie_id) else {
        return DamageOutcome::Ignored;
    };
    if !zombie.being.is_alive() {
        return DamageOutcome::Ignored;
    }

    let mut carried = amount;
    if let Some(item_id) = zombie.armor {
        match items.get_mut(&item_id) {
            Some(item) => {
                carried = amount.saturating_sub(item.being.health.get());
                if strike_item(item, amount, events) == DamageOutcome::Destroyed {
                    zombie.armor = None;
                    item.owner = None;
                    events.push(Event::ArmorBroken {
                        zombie: zombie_id,
                        item: item_id,
                    });
                }
            }
            None => zombie.armor = None,
        }
    }

    let outcome = zombie.being.take_damage(carried);
    if outcome == DamageOutcome::Destroyed {
        zombie.state_complete = true;
        events.push(Event::ZombieDied { zombie: zombie_id });
    }
    outcome
}
