//! Plant state machines.
//!
//! Every plant shares the [`Plant`] record (health, slot, state, edge flag and
//! one cooldown) and carries a [`PlantBehavior`] variant with the payload of
//! its family. Each tick a plant first re-selects its state when the previous
//! one completed, then runs the action of the current state.

use std::{collections::BTreeMap, time::Duration};

use lawn_defence_core::{
    Capability, EffectKind, EntityClass, EntityId, Event, PlantKind, PlantState, Position,
    ProjectileKind, SlotCoord,
};

use crate::{
    combat::{self, Being, DamageOutcome, Item, MagnetRemovable},
    effects::EffectHost,
    lawn,
    timers::{Cooldown, Task, TaskQueue, TaskToken},
    zombies::Zombie,
};

const SHOOTER_RANGE: f32 = 20.0;
const SHOOTER_COOLDOWN: Duration = Duration::from_secs(2);
const SUN_COOLDOWN: Duration = Duration::from_secs(10);
const DOUBLE_SUN_OFFSET: f32 = 0.3;
/// Time a plant-made sun spends falling before it settles.
pub(crate) const PLANT_SUN_FALL_TIME: Duration = Duration::from_millis(200);
const MAGNET_DAMAGE: u32 = 6;
const MAGNET_COOLDOWN: Duration = Duration::from_millis(500);
const MAGNET_RETRIEVE_SPEED: f32 = 8.0;
const MAGNET_SNAP_DISTANCE: f32 = 0.01;
const MINE_ARMING_DELAY: Duration = Duration::from_secs(10);
const MINE_DAMAGE: u32 = 500;
const MINE_RADIUS: f32 = 0.8;

/// Entity a plant asks the world to create once its update finishes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Spawn {
    Projectile {
        kind: ProjectileKind,
        source: EntityId,
        lane: u32,
        position: Position,
    },
    Sun {
        position: Position,
        fall_time: Duration,
    },
}

/// Mutable slice of the world a plant may touch during its update.
pub(crate) struct PlantContext<'a> {
    pub(crate) dt: f32,
    pub(crate) zombies: &'a mut BTreeMap<EntityId, Zombie>,
    pub(crate) items: &'a mut BTreeMap<EntityId, Item>,
    pub(crate) tasks: &'a mut TaskQueue,
    pub(crate) spawns: &'a mut Vec<Spawn>,
    pub(crate) events: &'a mut Vec<Event>,
}

/// Family-specific payload of a plant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PlantBehavior {
    /// Pea, snow pea and fire pea shooters.
    Shooter { projectile: ProjectileKind },
    /// Sunflowers; one sun per offset.
    SunProducer { offsets: &'static [f32] },
    /// Wall-nut; `bitten` tracks whether a zombie is touching it.
    Wall { bitten: bool },
    /// Magnet; `target` is the item it holds.
    Magnet { target: Option<EntityId> },
    /// Potato mine; `ready` flips once it surfaces.
    Mine {
        arming: Option<TaskToken>,
        ready: bool,
    },
}

impl PlantBehavior {
    fn for_kind(kind: PlantKind) -> Self {
        match kind {
            PlantKind::PeaShooter => Self::Shooter {
                projectile: ProjectileKind::Pea,
            },
            PlantKind::SnowPea => Self::Shooter {
                projectile: ProjectileKind::SnowPea,
            },
            PlantKind::FirePea => Self::Shooter {
                projectile: ProjectileKind::FirePea,
            },
            PlantKind::SunFlower => Self::SunProducer { offsets: &[0.0] },
            PlantKind::DoubleSunFlower => Self::SunProducer {
                offsets: &[-DOUBLE_SUN_OFFSET, DOUBLE_SUN_OFFSET],
            },
            PlantKind::WallNut => Self::Wall { bitten: false },
            PlantKind::Magnet => Self::Magnet { target: None },
            PlantKind::PotatoMine => Self::Mine {
                arming: None,
                ready: false,
            },
        }
    }

    fn initial_state(&self) -> PlantState {
        match self {
            Self::Mine { .. } => PlantState::IdleDown,
            _ => PlantState::Idle,
        }
    }

    fn cooldown(&self) -> Cooldown {
        match self {
            Self::Shooter { .. } => Cooldown::ready(SHOOTER_COOLDOWN),
            Self::SunProducer { .. } => Cooldown::ready(SUN_COOLDOWN),
            Self::Magnet { .. } => Cooldown::blocked(MAGNET_COOLDOWN),
            Self::Wall { .. } | Self::Mine { .. } => Cooldown::ready(Duration::ZERO),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Plant {
    pub(crate) being: Being,
    pub(crate) kind: PlantKind,
    pub(crate) slot: SlotCoord,
    pub(crate) state: PlantState,
    pub(crate) state_complete: bool,
    pub(crate) behavior: PlantBehavior,
    cooldown: Cooldown,
}

impl Plant {
    pub(crate) fn new(
        id: EntityId,
        kind: PlantKind,
        slot: SlotCoord,
        tasks: &mut TaskQueue,
    ) -> Self {
        let behavior = PlantBehavior::for_kind(kind);
        let mut plant = Self {
            being: Being::new(id, kind.max_health(), slot.center()),
            kind,
            slot,
            state: behavior.initial_state(),
            state_complete: false,
            cooldown: behavior.cooldown(),
            behavior,
        };
        plant.start_arming(tasks);
        plant
    }

    /// Restores the plant to its freshly placed condition.
    ///
    /// Returns the item a magnet was holding so the world can discard it.
    pub(crate) fn reset(&mut self, tasks: &mut TaskQueue) -> Option<EntityId> {
        let held = match self.behavior {
            PlantBehavior::Magnet { target } => target,
            _ => None,
        };
        if let PlantBehavior::Mine {
            arming: Some(token),
            ..
        } = self.behavior
        {
            let _ = tasks.cancel(token);
        }
        self.cooldown.block(tasks);
        self.being.restore();
        self.behavior = PlantBehavior::for_kind(self.kind);
        self.cooldown = self.behavior.cooldown();
        self.state = self.behavior.initial_state();
        self.state_complete = false;
        self.start_arming(tasks);
        held
    }

    pub(crate) fn cooldown_elapsed(&mut self, token: TaskToken) {
        let _ = self.cooldown.complete(token);
    }

    /// Surfaces a potato mine once its arming delay ran out.
    pub(crate) fn finish_arming(&mut self, token: TaskToken) -> bool {
        match &mut self.behavior {
            PlantBehavior::Mine { arming, .. } if *arming == Some(token) => {
                *arming = None;
                self.state_complete = true;
                true
            }
            _ => false,
        }
    }

    fn start_arming(&mut self, tasks: &mut TaskQueue) {
        let id = self.being.id;
        if let PlantBehavior::Mine { arming, .. } = &mut self.behavior {
            let task = Task::MineArmed { mine: id };
            *arming = Some(tasks.schedule(Some(id), MINE_ARMING_DELAY, task));
        }
    }

    /// Runs one tick: state selection when the edge is raised, then the action.
    pub(crate) fn update(&mut self, ctx: &mut PlantContext<'_>) {
        if !self.being.is_alive() {
            return;
        }
        if self.state_complete {
            self.select_state(ctx.events);
        }
        match self.behavior {
            PlantBehavior::Shooter { projectile } => self.act_shooter(projectile, ctx),
            PlantBehavior::SunProducer { offsets } => self.act_sun_producer(offsets, ctx),
            PlantBehavior::Wall { bitten } => self.act_wall(bitten, ctx),
            PlantBehavior::Magnet { target } => self.act_magnet(target, ctx),
            PlantBehavior::Mine { ready, .. } => self.act_mine(ready, ctx),
        }
    }

    fn select_state(&mut self, events: &mut Vec<Event>) {
        self.state_complete = false;
        let previous = self.state;
        self.state = match &mut self.behavior {
            PlantBehavior::Shooter { .. } if self.cooldown.is_ready() => PlantState::Shooting,
            PlantBehavior::SunProducer { .. } if self.cooldown.is_ready() => {
                PlantState::Generating
            }
            PlantBehavior::Shooter { .. } | PlantBehavior::SunProducer { .. } => PlantState::Idle,
            PlantBehavior::Wall { bitten: true } => PlantState::Tanking,
            PlantBehavior::Wall { bitten: false } => PlantState::Idle,
            PlantBehavior::Magnet { .. } if self.cooldown.is_ready() => PlantState::Destroying,
            PlantBehavior::Magnet { target: Some(_) } => PlantState::Retrieving,
            PlantBehavior::Magnet { target: None } => PlantState::Idle,
            PlantBehavior::Mine { ready: true, .. } => PlantState::Exploding,
            PlantBehavior::Mine { ready, .. } => {
                *ready = true;
                PlantState::IdleUp
            }
        };
        if self.state != previous {
            events.push(Event::AnimationRequested {
                entity: self.being.id,
                clip: self.state.clip(),
            });
        }
    }

    fn act_shooter(&mut self, projectile: ProjectileKind, ctx: &mut PlantContext<'_>) {
        let lane = self.slot.lane();
        match self.state {
            PlantState::Idle => {
                if lawn::zombie_ahead(ctx.zombies, lane, self.being.position.x(), SHOOTER_RANGE) {
                    self.state_complete = true;
                }
            }
            PlantState::Shooting => {
                ctx.spawns.push(Spawn::Projectile {
                    kind: projectile,
                    source: self.being.id,
                    lane,
                    position: self.being.position,
                });
                self.cooldown.trigger(self.being.id, ctx.tasks);
                self.state_complete = true;
            }
            _ => {}
        }
    }

    fn act_sun_producer(&mut self, offsets: &'static [f32], ctx: &mut PlantContext<'_>) {
        match self.state {
            PlantState::Idle => {
                if self.cooldown.is_ready() {
                    self.state_complete = true;
                }
            }
            PlantState::Generating => {
                for offset in offsets {
                    ctx.spawns.push(Spawn::Sun {
                        position: self.being.position.translated(*offset, 0.0),
                        fall_time: PLANT_SUN_FALL_TIME,
                    });
                }
                self.cooldown.trigger(self.being.id, ctx.tasks);
                self.state_complete = true;
            }
            _ => {}
        }
    }

    fn act_wall(&mut self, bitten: bool, ctx: &mut PlantContext<'_>) {
        let touching = lawn::zombie_near(
            ctx.zombies,
            self.slot.lane(),
            self.being.position.x(),
            lawn::CONTACT_REACH,
        )
        .is_some();
        if touching != bitten {
            self.behavior = PlantBehavior::Wall { bitten: touching };
            self.state_complete = true;
        }
    }

    fn act_magnet(&mut self, target: Option<EntityId>, ctx: &mut PlantContext<'_>) {
        match self.state {
            PlantState::Idle => {
                if target.is_none() {
                    if let Some(item) = self.seize_metal(ctx) {
                        self.behavior = PlantBehavior::Magnet { target: Some(item) };
                        self.state_complete = true;
                    }
                }
            }
            PlantState::Retrieving => self.reel_in(target, ctx),
            PlantState::Destroying => self.crush(target, ctx),
            _ => {}
        }
    }

    fn seize_metal(&mut self, ctx: &mut PlantContext<'_>) -> Option<EntityId> {
        let magnet = self.being.id;
        let item = ctx.items.values_mut().find(|item| {
            item.being.is_alive()
                && !item.is_removed()
                && EntityClass::Armor(item.kind).has_capability(Capability::MagnetRemovable)
        })?;
        let item_id = item.being.id;
        let previous_owner = item.take(magnet)?;
        if let Some(zombie) = ctx.zombies.get_mut(&previous_owner) {
            if zombie.armor == Some(item_id) {
                zombie.armor = None;
            }
        }
        ctx.events.push(Event::ArmorTaken {
            magnet,
            item: item_id,
            zombie: previous_owner,
        });
        Some(item_id)
    }

    fn reel_in(&mut self, target: Option<EntityId>, ctx: &mut PlantContext<'_>) {
        let home = self.being.position;
        let Some(item) = live_item(ctx.items, target) else {
            self.drop_target(ctx.tasks);
            return;
        };
        let step = MAGNET_RETRIEVE_SPEED * ctx.dt;
        item.being.position = item.being.position.move_towards(home, step);
        if item.being.position.distance(home) < MAGNET_SNAP_DISTANCE {
            item.being.position = home;
            self.cooldown.arm(ctx.tasks);
            self.state_complete = true;
        }
    }

    fn crush(&mut self, target: Option<EntityId>, ctx: &mut PlantContext<'_>) {
        let Some(item) = live_item(ctx.items, target) else {
            self.drop_target(ctx.tasks);
            return;
        };
        if !self.cooldown.is_ready() {
            return;
        }
        self.cooldown.trigger(self.being.id, ctx.tasks);
        let _ = combat::strike_item(item, MAGNET_DAMAGE, ctx.events);
    }

    fn drop_target(&mut self, tasks: &mut TaskQueue) {
        self.cooldown.block(tasks);
        self.behavior = PlantBehavior::Magnet { target: None };
        self.state_complete = true;
    }

    fn act_mine(&mut self, ready: bool, ctx: &mut PlantContext<'_>) {
        let lane = self.slot.lane();
        let x = self.being.position.x();
        match self.state {
            PlantState::IdleUp if ready => {
                if lawn::zombie_ahead(ctx.zombies, lane, x, MINE_RADIUS - 0.01) {
                    self.state_complete = true;
                }
            }
            PlantState::Exploding => {
                let centre = self.being.position;
                let caught: Vec<EntityId> = ctx
                    .zombies
                    .values()
                    .filter(|zombie| {
                        zombie.is_targetable()
                            && zombie.being.position.distance(centre) <= MINE_RADIUS
                    })
                    .map(|zombie| zombie.being.id)
                    .collect();
                let mut hits = 0;
                for zombie in caught {
                    let outcome = combat::strike_zombie(
                        ctx.zombies,
                        ctx.items,
                        zombie,
                        MINE_DAMAGE,
                        ctx.events,
                    );
                    if outcome != DamageOutcome::Ignored {
                        hits += 1;
                    }
                }
                ctx.events.push(Event::MineDetonated {
                    mine: self.being.id,
                    hits,
                });
                self.being.destroy();
            }
            _ => {}
        }
    }
}

impl EffectHost for Plant {
    fn class(&self) -> EntityClass {
        EntityClass::Plant(self.kind)
    }

    fn immunities(&self) -> &'static [EffectKind] {
        &[]
    }

    // Plants never move.
    fn multiply_speed(&mut self, _factor: f32) {}

    fn divide_speed(&mut self, _factor: f32) {}
}

fn live_item(items: &mut BTreeMap<EntityId, Item>, target: Option<EntityId>) -> Option<&mut Item> {
    let item = items.get_mut(&target?)?;
    item.being.is_alive().then_some(item)
}
