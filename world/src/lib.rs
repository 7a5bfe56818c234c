#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Lawn Defence.
//!
//! The world owns every entity, the scheduled-task queue and the economy. All
//! mutation flows through [`apply`]; read access goes through [`query`].

mod combat;
mod economy;
mod effects;
mod hazards;
mod lawn;
mod plants;
mod timers;
mod zombies;

use std::{collections::BTreeMap, time::Duration};

use lawn_defence_core::{
    lane_center, Capability, Command, EffectKind, EffectRejection, EntityClass, EntityId, Event,
    HandError, Phase, PlacementError, PlantKind, PlantState, Position, ProjectileKind,
    RemovalCause, SellError, SlotCoord, SpawnError, ZombieKind, HAND_LIMIT, STARTING_SUN,
    SUN_VALUE, WELCOME_BANNER,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    combat::{DamageOutcome, Item},
    economy::Economy,
    effects::{EffectOutcome, EffectRegistry},
    hazards::{Flight, Mower, Projectile, Sun},
    lawn::SlotGrid,
    plants::{Plant, PlantBehavior, PlantContext, Spawn},
    timers::{Task, TaskQueue, TaskToken},
    zombies::Zombie,
};

const DEFEAT_DELAY: Duration = Duration::from_secs(2);

/// Tunable parameters used when a world is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of lanes zombies walk along.
    pub lanes: u32,
    /// Number of planting columns per lane.
    pub columns: u32,
    /// Sun balance at the start of the game.
    pub starting_sun: u32,
    /// Maximum number of cards in the hand.
    pub hand_limit: usize,
    /// Places one lawnmower at the house end of every lane.
    pub lawnmowers: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            lanes: 5,
            columns: 9,
            starting_sun: STARTING_SUN,
            hand_limit: HAND_LIMIT,
            lawnmowers: true,
        }
    }
}

/// Represents the authoritative Lawn Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    phase: Phase,
    round: u32,
    rounds_completed: u32,
    tick_index: u64,
    next_entity: u32,
    tasks: TaskQueue,
    effects: EffectRegistry,
    economy: Economy,
    slots: SlotGrid,
    plants: BTreeMap<EntityId, Plant>,
    zombies: BTreeMap<EntityId, Zombie>,
    items: BTreeMap<EntityId, Item>,
    projectiles: BTreeMap<EntityId, Projectile>,
    suns: BTreeMap<EntityId, Sun>,
    mowers: BTreeMap<EntityId, Mower>,
    defeat_pending: bool,
    final_score: Option<u64>,
}

impl World {
    /// Creates a world with the default lawn.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world in card selection for the provided configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            phase: Phase::CardSelection,
            round: 1,
            rounds_completed: 0,
            tick_index: 0,
            next_entity: 0,
            tasks: TaskQueue::new(),
            effects: EffectRegistry::new(),
            economy: Economy::new(config.starting_sun, config.hand_limit),
            slots: SlotGrid::new(config.lanes, config.columns),
            plants: BTreeMap::new(),
            zombies: BTreeMap::new(),
            items: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            suns: BTreeMap::new(),
            mowers: BTreeMap::new(),
            defeat_pending: false,
            final_score: None,
            config,
        };
        if world.config.lawnmowers {
            for lane in 0..world.config.lanes {
                let id = world.allocate();
                let _ = world.mowers.insert(id, Mower::parked(id, lane));
            }
        }
        world
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out.push(Event::TimeAdvanced { dt });
        if self.phase != Phase::Round {
            return;
        }

        self.tasks.advance(dt);
        self.run_due_tasks(out);
        if self.phase != Phase::Round {
            return;
        }

        self.economy.recharge(dt);
        let seconds = dt.as_secs_f32();
        self.update_plants(seconds, out);
        self.update_zombies(seconds, out);
        self.update_projectiles(seconds, out);
        self.update_mowers(seconds, out);
        for sun in self.suns.values_mut() {
            sun.fall(seconds);
        }
        self.sync_items();
        self.reap(out);
    }

    fn run_due_tasks(&mut self, out: &mut Vec<Event>) {
        while let Some((token, task)) = self.tasks.pop_due() {
            match task {
                Task::CooldownElapsed { owner } => {
                    if let Some(plant) = self.plants.get_mut(&owner) {
                        plant.cooldown_elapsed(token);
                    } else if let Some(zombie) = self.zombies.get_mut(&owner) {
                        zombie.cooldown_elapsed(token);
                    }
                }
                Task::EffectExpired { target, effect } => {
                    self.expire_effect(target, effect, token, out);
                }
                Task::EffectPulse { target, effect } => {
                    if let Some(damage) = self.effects.pulse(&mut self.tasks, target, effect, token)
                    {
                        self.burn(target, damage, out);
                    }
                }
                Task::MineArmed { mine } => {
                    if let Some(plant) = self.plants.get_mut(&mine) {
                        if plant.finish_arming(token) {
                            out.push(Event::MineArmed { mine });
                        }
                    }
                }
                Task::CorpseCleared { zombie } => {
                    self.remove_entity(zombie, RemovalCause::Killed, out);
                }
                Task::SunLanded { sun } => {
                    if let Some(sun) = self.suns.get_mut(&sun) {
                        sun.landed = true;
                    }
                }
                Task::SunFaded { sun } => self.remove_entity(sun, RemovalCause::Expired, out),
                Task::MowerParked { mower } => {
                    self.remove_entity(mower, RemovalCause::Expired, out);
                }
                Task::DefeatConfirmed => self.confirm_defeat(out),
            }
        }
    }

    fn update_plants(&mut self, dt: f32, out: &mut Vec<Event>) {
        let mut spawns = Vec::new();
        let mut ctx = PlantContext {
            dt,
            zombies: &mut self.zombies,
            items: &mut self.items,
            tasks: &mut self.tasks,
            spawns: &mut spawns,
            events: &mut *out,
        };
        for plant in self.plants.values_mut() {
            plant.update(&mut ctx);
        }

        for spawn in spawns {
            match spawn {
                Spawn::Projectile {
                    kind,
                    source,
                    lane,
                    position,
                } => self.fire(kind, source, lane, position, out),
                Spawn::Sun {
                    position,
                    fall_time,
                } => self.spawn_sun(position, fall_time, out),
            }
        }
    }

    fn update_zombies(&mut self, dt: f32, out: &mut Vec<Event>) {
        let mut dying = Vec::new();
        let mut arrived = Vec::new();
        for zombie in self.zombies.values_mut() {
            if zombie.update(dt, &mut self.plants, &mut self.tasks, out) {
                dying.push(zombie.being.id);
            } else if zombie.being.is_alive() && zombie.being.position.x() <= lawn::HOUSE_X {
                arrived.push((zombie.being.id, zombie.lane));
            }
        }

        for id in dying {
            let Some(zombie) = self.zombies.get_mut(&id) else {
                continue;
            };
            for effect in self.effects.clear_all(&mut self.tasks, id, zombie) {
                out.push(Event::EffectExpired { target: id, effect });
            }
        }

        for (zombie, lane) in arrived {
            out.push(Event::ZombieReachedHouse { zombie, lane });
            self.remove_entity(zombie, RemovalCause::ReachedHouse, out);
            if !self.defeat_pending {
                info!("zombie {} reached the house in lane {lane}", zombie.get());
                self.defeat_pending = true;
                let _ = self.tasks.schedule(None, DEFEAT_DELAY, Task::DefeatConfirmed);
            }
        }
    }

    fn update_projectiles(&mut self, dt: f32, out: &mut Vec<Event>) {
        let mut hits = Vec::new();
        let mut lost = Vec::new();
        for projectile in self.projectiles.values_mut() {
            match projectile.advance(dt, &self.zombies, &self.slots) {
                Flight::Flying => {}
                Flight::Hit(zombie) => hits.push((projectile.id, projectile.kind, zombie)),
                Flight::OutOfBounds => lost.push(projectile.id),
            }
        }

        for (projectile, kind, zombie) in hits {
            let outcome = combat::strike_zombie(
                &mut self.zombies,
                &mut self.items,
                zombie,
                kind.damage(),
                out,
            );
            if outcome == DamageOutcome::Wounded {
                if let Some(effect) = kind.effect() {
                    self.apply_effect(zombie, effect, out);
                }
            }
            self.remove_entity(projectile, RemovalCause::Impact, out);
        }
        for projectile in lost {
            self.remove_entity(projectile, RemovalCause::OutOfBounds, out);
        }
    }

    fn update_mowers(&mut self, dt: f32, out: &mut Vec<Event>) {
        let mut victims = Vec::new();
        for mower in self.mowers.values_mut() {
            let mut started = false;
            victims.extend(mower.advance(dt, &self.zombies, &mut started));
            if started {
                info!("lawnmower in lane {} started", mower.lane);
                out.push(Event::MowerActivated {
                    mower: mower.id,
                    lane: mower.lane,
                });
                let _ = self.tasks.schedule(
                    Some(mower.id),
                    hazards::MOWER_RUN_TIME,
                    Task::MowerParked { mower: mower.id },
                );
            }
        }
        for zombie in victims {
            let _ = combat::strike_zombie(
                &mut self.zombies,
                &mut self.items,
                zombie,
                hazards::MOWER_DAMAGE,
                out,
            );
        }
    }

    fn sync_items(&mut self) {
        for item in self.items.values_mut() {
            let Some(owner) = item.owner else {
                continue;
            };
            if let Some(zombie) = self.zombies.get(&owner) {
                item.being.position = zombie.being.position;
            }
        }
    }

    fn reap(&mut self, out: &mut Vec<Event>) {
        let dead_plants: Vec<(EntityId, RemovalCause)> = self
            .plants
            .values()
            .filter(|plant| !plant.being.is_alive())
            .map(|plant| {
                let cause = if plant.state == PlantState::Exploding {
                    RemovalCause::Detonated
                } else {
                    RemovalCause::Killed
                };
                (plant.being.id, cause)
            })
            .collect();
        let dead_items: Vec<EntityId> = self
            .items
            .values()
            .filter(|item| !item.being.is_alive())
            .map(|item| item.being.id)
            .collect();

        for (plant, cause) in dead_plants {
            self.remove_entity(plant, cause, out);
        }
        for item in dead_items {
            self.remove_entity(item, RemovalCause::Killed, out);
        }
    }

    /// Detaches an entity from every collection and cancels its tasks.
    fn remove_entity(&mut self, id: EntityId, cause: RemovalCause, out: &mut Vec<Event>) {
        self.tasks.cancel_owned_by(id);
        let class = if let Some(plant) = self.plants.remove(&id) {
            self.slots.vacate(plant.slot, id);
            self.effects.forget(&mut self.tasks, id);
            if let PlantBehavior::Magnet { target: Some(item) } = plant.behavior {
                self.remove_entity(item, RemovalCause::CarrierRemoved, out);
            }
            EntityClass::Plant(plant.kind)
        } else if let Some(zombie) = self.zombies.remove(&id) {
            self.effects.forget(&mut self.tasks, id);
            if let Some(item) = zombie.armor {
                self.remove_entity(item, RemovalCause::CarrierRemoved, out);
            }
            EntityClass::Zombie(zombie.kind)
        } else if let Some(item) = self.items.remove(&id) {
            if let Some(owner) = item.owner {
                if let Some(zombie) = self.zombies.get_mut(&owner) {
                    if zombie.armor == Some(id) {
                        zombie.armor = None;
                    }
                }
            }
            EntityClass::Armor(item.kind)
        } else if let Some(projectile) = self.projectiles.remove(&id) {
            EntityClass::Projectile(projectile.kind)
        } else if self.suns.remove(&id).is_some() {
            EntityClass::Sun
        } else if self.mowers.remove(&id).is_some() {
            EntityClass::Lawnmower
        } else {
            return;
        };
        out.push(Event::EntityRemoved {
            entity: id,
            class,
            cause,
        });
    }

    fn fire(
        &mut self,
        kind: ProjectileKind,
        source: EntityId,
        lane: u32,
        position: Position,
        out: &mut Vec<Event>,
    ) {
        let id = self.allocate();
        let _ = self.projectiles.insert(
            id,
            Projectile {
                id,
                kind,
                lane,
                position,
            },
        );
        out.push(Event::ProjectileFired {
            projectile: id,
            kind,
            source,
        });
    }

    fn spawn_sun(&mut self, position: Position, fall_time: Duration, out: &mut Vec<Event>) {
        let id = self.allocate();
        let landed = fall_time.is_zero();
        if !landed {
            let _ = self
                .tasks
                .schedule(Some(id), fall_time, Task::SunLanded { sun: id });
        }
        let _ = self
            .tasks
            .schedule(Some(id), hazards::SUN_LIFETIME, Task::SunFaded { sun: id });
        let _ = self.suns.insert(
            id,
            Sun {
                id,
                position,
                value: SUN_VALUE,
                landed,
            },
        );
        out.push(Event::SunSpawned {
            sun: id,
            position,
            value: SUN_VALUE,
        });
    }

    fn spawn_zombie(&mut self, kind: ZombieKind, lane: u32, out: &mut Vec<Event>) {
        let rejection = if self.phase != Phase::Round {
            Some(SpawnError::InvalidPhase)
        } else if lane >= self.slots.lanes() {
            Some(SpawnError::UnknownLane)
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!("rejected {kind:?} spawn in lane {lane}: {reason:?}");
            out.push(Event::ZombieSpawnRejected { kind, lane, reason });
            return;
        }

        let id = self.allocate();
        let position = Position::new(self.slots.entry_x(), lane_center(lane));
        let mut zombie = Zombie::new(id, kind, lane, position);
        if let Some(armor) = kind.armor() {
            let item = self.allocate();
            zombie.armor = Some(item);
            let _ = self
                .items
                .insert(item, Item::worn_by(item, armor, id, position));
        }
        let _ = self.zombies.insert(id, zombie);
        out.push(Event::ZombieSpawned {
            zombie: id,
            kind,
            lane,
        });
    }

    fn apply_effect(&mut self, target: EntityId, effect: EffectKind, out: &mut Vec<Event>) {
        let outcome = if let Some(zombie) = self
            .zombies
            .get_mut(&target)
            .filter(|zombie| zombie.being.is_alive())
        {
            self.effects.apply(&mut self.tasks, target, zombie, effect)
        } else if let Some(plant) = self
            .plants
            .get_mut(&target)
            .filter(|plant| plant.being.is_alive())
        {
            self.effects.apply(&mut self.tasks, target, plant, effect)
        } else {
            EffectOutcome::Rejected(EffectRejection::MissingTarget)
        };

        match outcome {
            EffectOutcome::Rejected(reason) => {
                debug!("rejected {effect:?} on entity {}: {reason:?}", target.get());
                out.push(Event::EffectRejected {
                    target,
                    effect,
                    reason,
                });
            }
            EffectOutcome::Refreshed => out.push(Event::EffectRefreshed { target, effect }),
            EffectOutcome::Applied { displaced, burn } => {
                for displaced in displaced {
                    out.push(Event::EffectExpired {
                        target,
                        effect: displaced,
                    });
                }
                out.push(Event::EffectApplied { target, effect });
                if let Some(damage) = burn {
                    self.burn(target, damage, out);
                }
            }
        }
    }

    fn expire_effect(
        &mut self,
        target: EntityId,
        effect: EffectKind,
        token: TaskToken,
        out: &mut Vec<Event>,
    ) {
        let expired = if let Some(zombie) = self.zombies.get_mut(&target) {
            self.effects
                .expire(&mut self.tasks, target, zombie, effect, token)
        } else if let Some(plant) = self.plants.get_mut(&target) {
            self.effects
                .expire(&mut self.tasks, target, plant, effect, token)
        } else {
            false
        };
        if expired {
            out.push(Event::EffectExpired { target, effect });
        }
    }

    fn burn(&mut self, target: EntityId, damage: u32, out: &mut Vec<Event>) {
        if self.zombies.contains_key(&target) {
            let _ = combat::strike_zombie(&mut self.zombies, &mut self.items, target, damage, out);
        } else if let Some(plant) = self.plants.get_mut(&target) {
            let _ = plant.being.take_damage(damage);
        }
    }

    fn score(&self) -> u64 {
        self.economy
            .collected_total()
            .saturating_mul(u64::from(self.rounds_completed))
    }

    fn confirm_defeat(&mut self, out: &mut Vec<Event>) {
        let score = self.score();
        info!("player defeated in round {} with score {score}", self.round);
        self.phase = Phase::Defeated;
        self.final_score = Some(score);
        out.push(Event::PhaseChanged {
            phase: Phase::Defeated,
        });
        out.push(Event::PlayerDefeated { score });
    }

    fn add_card(&mut self, kind: PlantKind, out: &mut Vec<Event>) {
        let result = if self.phase == Phase::CardSelection {
            self.economy.add_card(kind)
        } else {
            Err(HandError::InvalidPhase)
        };
        match result {
            Ok(index) => out.push(Event::CardAdded { index, kind }),
            Err(reason) => self.reject_hand(reason, out),
        }
    }

    fn remove_card(&mut self, index: usize, out: &mut Vec<Event>) {
        let result = if self.phase == Phase::CardSelection {
            self.economy.remove_card(index)
        } else {
            Err(HandError::InvalidPhase)
        };
        match result {
            Ok(kind) => out.push(Event::CardRemoved { index, kind }),
            Err(reason) => self.reject_hand(reason, out),
        }
    }

    fn select_card(&mut self, card: Option<usize>, out: &mut Vec<Event>) {
        if self.phase != Phase::Round {
            self.reject_hand(HandError::InvalidPhase, out);
            return;
        }
        let card = self.economy.select(card);
        out.push(Event::CardSelected { card });
    }

    fn reject_hand(&self, reason: HandError, out: &mut Vec<Event>) {
        debug!("hand command rejected in {:?}: {reason:?}", self.phase);
        out.push(Event::HandRejected { reason });
    }

    fn start_round(&mut self, out: &mut Vec<Event>) {
        if self.phase != Phase::CardSelection {
            self.reject_hand(HandError::InvalidPhase, out);
            return;
        }
        if self.economy.hand_is_empty() {
            self.reject_hand(HandError::EmptyHand, out);
            return;
        }

        let mut released = Vec::new();
        for plant in self.plants.values_mut() {
            self.effects.forget(&mut self.tasks, plant.being.id);
            if let Some(item) = plant.reset(&mut self.tasks) {
                released.push(item);
            }
        }
        for item in released {
            self.remove_entity(item, RemovalCause::RoundEnded, out);
        }

        self.economy.clear_selection();
        self.phase = Phase::Round;
        info!("round {} started", self.round);
        out.push(Event::PhaseChanged { phase: Phase::Round });
        out.push(Event::RoundStarted { round: self.round });
    }

    fn end_round(&mut self, out: &mut Vec<Event>) {
        if self.phase != Phase::Round || self.defeat_pending {
            debug!("ignored end of round {} in {:?}", self.round, self.phase);
            return;
        }

        let mut doomed: Vec<EntityId> = self.projectiles.keys().copied().collect();
        doomed.extend(self.suns.keys().copied());
        doomed.extend(self.zombies.keys().copied());
        doomed.extend(
            self.mowers
                .values()
                .filter(|mower| mower.active)
                .map(|mower| mower.id),
        );
        for id in doomed {
            self.remove_entity(id, RemovalCause::RoundEnded, out);
        }

        self.economy.reset_cooldowns();
        self.economy.clear_selection();
        info!("round {} ended", self.round);
        out.push(Event::RoundEnded { round: self.round });
        self.rounds_completed = self.rounds_completed.saturating_add(1);
        self.round = self.round.saturating_add(1);
        self.phase = Phase::CardSelection;
        out.push(Event::PhaseChanged {
            phase: Phase::CardSelection,
        });
    }

    fn check_placement(&self, slot: SlotCoord) -> Result<(usize, PlantKind), PlacementError> {
        if self.phase != Phase::Round {
            return Err(PlacementError::InvalidPhase);
        }
        if !self.slots.contains(slot) {
            return Err(PlacementError::OutOfBounds);
        }
        let index = self
            .economy
            .selected()
            .ok_or(PlacementError::NoCardSelected)?;
        let card = self
            .economy
            .card(index)
            .ok_or(PlacementError::NoCardSelected)?;
        if !card.is_ready() {
            return Err(PlacementError::CardOnCooldown);
        }

        let occupant = self
            .slots
            .occupant(slot)
            .and_then(|id| self.plants.get(&id))
            .map(|plant| plant.kind);
        let replaces = card
            .kind
            .upgrade_of()
            .filter(|_| EntityClass::Plant(card.kind).has_capability(Capability::Upgradeable));
        match (replaces, occupant) {
            (Some(_), None) => return Err(PlacementError::NothingToUpgrade),
            (Some(base), Some(current)) if base != current => {
                return Err(PlacementError::UpgradeMismatch)
            }
            (None, Some(_)) => return Err(PlacementError::Occupied),
            _ => {}
        }

        if card.kind.card().cost() > self.economy.balance() {
            return Err(PlacementError::InsufficientSun);
        }
        Ok((index, card.kind))
    }

    fn place_plant(&mut self, slot: SlotCoord, out: &mut Vec<Event>) {
        let outcome = self.check_placement(slot).and_then(|(index, kind)| {
            if self.economy.spend(index) {
                Ok(kind)
            } else {
                Err(PlacementError::InsufficientSun)
            }
        });

        match outcome {
            Ok(kind) => {
                if let Some(replaced) = self.slots.occupant(slot) {
                    self.remove_entity(replaced, RemovalCause::Upgraded, out);
                }
                let id = self.allocate();
                let plant = Plant::new(id, kind, slot, &mut self.tasks);
                self.slots.occupy(slot, id);
                let _ = self.plants.insert(id, plant);
                out.push(Event::SunChanged {
                    balance: self.economy.balance(),
                });
                out.push(Event::PlantPlaced {
                    plant: id,
                    kind,
                    slot,
                });
            }
            Err(reason) => {
                debug!(
                    "rejected placement at lane {} column {}: {reason:?}",
                    slot.lane(),
                    slot.column()
                );
                out.push(Event::PlacementRejected { slot, reason });
            }
        }

        self.economy.clear_selection();
        out.push(Event::CardSelected { card: None });
    }

    fn sell_plant(&mut self, slot: SlotCoord, out: &mut Vec<Event>) {
        let outcome = if self.phase != Phase::Round {
            Err(SellError::InvalidPhase)
        } else if !self.slots.contains(slot) {
            Err(SellError::OutOfBounds)
        } else {
            self.slots
                .occupant(slot)
                .and_then(|id| self.plants.get(&id))
                .map(|plant| (plant.being.id, plant.kind))
                .ok_or(SellError::EmptySlot)
                .and_then(|(plant, kind)| {
                    if EntityClass::Plant(kind).has_capability(Capability::Sellable) {
                        Ok((plant, kind))
                    } else {
                        Err(SellError::NotSellable)
                    }
                })
        };

        match outcome {
            Ok((plant, kind)) => {
                let refund = kind.card().refund();
                self.economy.refund(refund);
                self.remove_entity(plant, RemovalCause::Sold, out);
                out.push(Event::PlantSold {
                    plant,
                    slot,
                    refund,
                });
                out.push(Event::SunChanged {
                    balance: self.economy.balance(),
                });
            }
            Err(reason) => {
                debug!("rejected sale: {reason:?}");
                out.push(Event::SellRejected { slot, reason });
            }
        }
    }

    fn collect_sun(&mut self, sun: EntityId, out: &mut Vec<Event>) {
        if self.phase == Phase::Defeated {
            return;
        }
        let Some(value) = self.suns.get(&sun).map(|sun| sun.value) else {
            debug!("sun {} is no longer on the lawn", sun.get());
            return;
        };
        self.economy.collect(value);
        self.remove_entity(sun, RemovalCause::Collected, out);
        out.push(Event::SunCollected { sun, value });
        out.push(Event::SunChanged {
            balance: self.economy.balance(),
        });
    }

    fn drop_sun(&mut self, position: Position, fall_time: Duration, out: &mut Vec<Event>) {
        if self.phase != Phase::Round {
            debug!("ignored sun drop in {:?}", self.phase);
            return;
        }
        self.spawn_sun(position, fall_time, out);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::AddCard { kind } => world.add_card(kind, out_events),
        Command::RemoveCard { index } => world.remove_card(index, out_events),
        Command::StartRound => world.start_round(out_events),
        Command::EndRound => world.end_round(out_events),
        Command::SelectCard { card } => world.select_card(card, out_events),
        Command::PlacePlant { slot } => world.place_plant(slot, out_events),
        Command::SellPlant { slot } => world.sell_plant(slot, out_events),
        Command::CollectSun { sun } => world.collect_sun(sun, out_events),
        Command::DropSun {
            position,
            fall_time,
        } => world.drop_sun(position, fall_time, out_events),
        Command::SpawnZombie { kind, lane } => world.spawn_zombie(kind, lane, out_events),
        Command::ApplyEffect { target, effect } => world.apply_effect(target, effect, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use lawn_defence_core::{
        CardSnapshot, EffectKind, EntityId, ItemSnapshot, MowerSnapshot, Phase, PlantSnapshot,
        PlantView, ProjectileSnapshot, SlotCoord, SunSnapshot, ZombieSnapshot, ZombieView,
    };

    use super::{World, WorldConfig};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Number of lanes and columns of the lawn.
    #[must_use]
    pub fn lawn_size(world: &World) -> (u32, u32) {
        (world.slots.lanes(), world.slots.columns())
    }

    /// Phase the game is in.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// One-based number of the current (or next) round.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Number of rounds that ended without a defeat.
    #[must_use]
    pub fn rounds_completed(world: &World) -> u32 {
        world.rounds_completed
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time spent inside rounds.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.tasks.now()
    }

    /// Current sun balance.
    #[must_use]
    pub fn sun_balance(world: &World) -> u32 {
        world.economy.balance()
    }

    /// Sun gathered from pickups since the game started.
    #[must_use]
    pub fn sun_collected_total(world: &World) -> u64 {
        world.economy.collected_total()
    }

    /// Score recorded when the player was defeated.
    #[must_use]
    pub fn final_score(world: &World) -> Option<u64> {
        world.final_score
    }

    /// Score the game would end with right now.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.final_score.unwrap_or_else(|| world.score())
    }

    /// Cards in the hand with their remaining recharge.
    #[must_use]
    pub fn hand(world: &World) -> Vec<CardSnapshot> {
        world.economy.snapshots()
    }

    /// Hand index of the selected card.
    #[must_use]
    pub fn selected_card(world: &World) -> Option<usize> {
        world.economy.selected()
    }

    /// Plant occupying the slot, if any.
    #[must_use]
    pub fn slot_occupant(world: &World, slot: SlotCoord) -> Option<EntityId> {
        world.slots.occupant(slot)
    }

    /// Captures a read-only view of the plants on the lawn.
    #[must_use]
    pub fn plant_view(world: &World) -> PlantView {
        PlantView::from_snapshots(
            world
                .plants
                .values()
                .map(|plant| PlantSnapshot {
                    id: plant.being.id,
                    kind: plant.kind,
                    slot: plant.slot,
                    health: plant.being.health,
                    state: plant.state,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the zombies on the lawn, dying ones included.
    #[must_use]
    pub fn zombie_view(world: &World) -> ZombieView {
        ZombieView::from_snapshots(
            world
                .zombies
                .values()
                .map(|zombie| ZombieSnapshot {
                    id: zombie.being.id,
                    kind: zombie.kind,
                    lane: zombie.lane,
                    position: zombie.being.position,
                    health: zombie.being.health,
                    movement_speed: zombie.movement_speed,
                    armor: zombie.armor,
                    target: zombie.target,
                    state: zombie.state,
                })
                .collect(),
        )
    }

    /// Armor items, worn or held by a magnet.
    #[must_use]
    pub fn items(world: &World) -> Vec<ItemSnapshot> {
        world
            .items
            .values()
            .map(|item| ItemSnapshot {
                id: item.being.id,
                kind: item.kind,
                health: item.being.health,
                position: item.being.position,
                owner: item.owner,
                holder: item.holder,
            })
            .collect()
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .values()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                kind: projectile.kind,
                lane: projectile.lane,
                position: projectile.position,
            })
            .collect()
    }

    /// Sun pickups waiting to be collected.
    #[must_use]
    pub fn suns(world: &World) -> Vec<SunSnapshot> {
        world
            .suns
            .values()
            .map(|sun| SunSnapshot {
                id: sun.id,
                position: sun.position,
                value: sun.value,
                landed: sun.landed,
            })
            .collect()
    }

    /// Lawnmowers still on the lawn.
    #[must_use]
    pub fn mowers(world: &World) -> Vec<MowerSnapshot> {
        world
            .mowers
            .values()
            .map(|mower| MowerSnapshot {
                id: mower.id,
                lane: mower.lane,
                position: mower.position,
                active: mower.active,
            })
            .collect()
    }

    /// Status effects active on the entity, in application order.
    #[must_use]
    pub fn active_effects(world: &World, target: EntityId) -> Vec<EffectKind> {
        world.effects.active_on(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::{Health, ZombieState};

    const DT: Duration = Duration::from_millis(100);

    fn world_with(config: WorldConfig, hand: &[PlantKind]) -> World {
        let mut world = World::with_config(config);
        let mut events = Vec::new();
        for kind in hand {
            apply(&mut world, Command::AddCard { kind: *kind }, &mut events);
        }
        apply(&mut world, Command::StartRound, &mut events);
        assert_eq!(query::phase(&world), Phase::Round);
        world
    }

    fn rich(hand: &[PlantKind]) -> World {
        world_with(
            WorldConfig {
                starting_sun: 1000,
                ..WorldConfig::default()
            },
            hand,
        )
    }

    fn run(world: &mut World, seconds: u32) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..seconds * 10 {
            apply(world, Command::Tick { dt: DT }, &mut events);
        }
        events
    }

    fn place(world: &mut World, card: usize, slot: SlotCoord) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::SelectCard { card: Some(card) }, &mut events);
        apply(world, Command::PlacePlant { slot }, &mut events);
        events
    }

    fn spawn(world: &mut World, kind: ZombieKind, lane: u32) -> EntityId {
        let mut events = Vec::new();
        apply(world, Command::SpawnZombie { kind, lane }, &mut events);
        events
            .iter()
            .find_map(|event| match event {
                Event::ZombieSpawned { zombie, .. } => Some(*zombie),
                _ => None,
            })
            .expect("zombie spawned")
    }

    fn rejection(events: &[Event]) -> Option<PlacementError> {
        events.iter().find_map(|event| match event {
            Event::PlacementRejected { reason, .. } => Some(*reason),
            _ => None,
        })
    }

    #[test]
    fn new_world_waits_in_card_selection_with_mowers() {
        let world = World::new();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::phase(&world), Phase::CardSelection);
        assert_eq!(query::round(&world), 1);
        assert_eq!(query::sun_balance(&world), STARTING_SUN);
        assert_eq!(query::lawn_size(&world), (5, 9));
        assert_eq!(query::mowers(&world).len(), 5);
    }

    #[test]
    fn round_requires_a_hand() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRound, &mut events);
        assert_eq!(
            events,
            vec![Event::HandRejected {
                reason: HandError::EmptyHand
            }]
        );
        assert_eq!(query::phase(&world), Phase::CardSelection);
    }

    #[test]
    fn hand_is_frozen_during_rounds() {
        let mut world = rich(&[PlantKind::SunFlower]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AddCard {
                kind: PlantKind::WallNut,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::HandRejected {
                reason: HandError::InvalidPhase
            }]
        );
        assert_eq!(query::hand(&world).len(), 1);
    }

    #[test]
    fn ticks_outside_rounds_do_not_advance_the_clock() {
        let mut world = World::new();
        let events = run(&mut world, 1);
        assert_eq!(events.len(), 10);
        assert_eq!(query::elapsed(&world), Duration::ZERO);
        assert_eq!(query::tick_index(&world), 10);
    }

    #[test]
    fn unaffordable_selection_keeps_balance() {
        let mut world = world_with(WorldConfig::default(), &[PlantKind::PeaShooter]);
        let mut events = Vec::new();
        apply(&mut world, Command::SelectCard { card: Some(0) }, &mut events);
        assert_eq!(events, vec![Event::CardSelected { card: None }]);
        assert_eq!(query::sun_balance(&world), STARTING_SUN);
    }

    #[test]
    fn placement_spends_sun_and_clears_selection() {
        let mut world = world_with(WorldConfig::default(), &[PlantKind::SunFlower]);
        let slot = SlotCoord::new(2, 3);
        let events = place(&mut world, 0, slot);

        assert!(events.contains(&Event::SunChanged { balance: 0 }));
        assert_eq!(events.last(), Some(&Event::CardSelected { card: None }));
        assert!(query::slot_occupant(&world, slot).is_some());
        assert_eq!(query::selected_card(&world), None);
        assert!(query::hand(&world)[0].cooldown_remaining > Duration::ZERO);
    }

    #[test]
    fn placement_checks_cooldown_then_occupancy() {
        let mut world = rich(&[PlantKind::PeaShooter, PlantKind::SunFlower]);
        let slot = SlotCoord::new(0, 0);
        let _ = place(&mut world, 0, slot);

        assert_eq!(rejection(&place(&mut world, 1, slot)), Some(PlacementError::Occupied));

        let mut events = Vec::new();
        apply(&mut world, Command::SelectCard { card: Some(0) }, &mut events);
        assert_eq!(events, vec![Event::CardSelected { card: None }]);
        apply(&mut world, Command::PlacePlant { slot }, &mut events);
        assert_eq!(rejection(&events), Some(PlacementError::NoCardSelected));

        let outside = SlotCoord::new(5, 0);
        assert_eq!(
            rejection(&place(&mut world, 1, outside)),
            Some(PlacementError::OutOfBounds)
        );
    }

    #[test]
    fn double_sunflower_upgrades_only_a_sunflower() {
        let mut world = rich(&[
            PlantKind::SunFlower,
            PlantKind::DoubleSunFlower,
            PlantKind::PeaShooter,
        ]);
        assert_eq!(
            rejection(&place(&mut world, 1, SlotCoord::new(0, 0))),
            Some(PlacementError::NothingToUpgrade)
        );
        let _ = place(&mut world, 2, SlotCoord::new(1, 0));
        assert_eq!(
            rejection(&place(&mut world, 1, SlotCoord::new(1, 0))),
            Some(PlacementError::UpgradeMismatch)
        );

        let slot = SlotCoord::new(0, 4);
        let _ = place(&mut world, 0, slot);
        let original = query::slot_occupant(&world, slot).expect("sunflower placed");
        let events = place(&mut world, 1, slot);

        assert!(events.contains(&Event::EntityRemoved {
            entity: original,
            class: EntityClass::Plant(PlantKind::SunFlower),
            cause: RemovalCause::Upgraded,
        }));
        let plants = query::plant_view(&world).into_vec();
        let upgraded = plants
            .iter()
            .find(|plant| plant.slot == slot)
            .expect("upgrade placed");
        assert_eq!(upgraded.kind, PlantKind::DoubleSunFlower);
        assert_eq!(query::sun_balance(&world), 1000 - 100 - 50 - 150);
    }

    #[test]
    fn selling_refunds_and_frees_the_slot() {
        let mut world = rich(&[PlantKind::PeaShooter]);
        let slot = SlotCoord::new(3, 3);
        let _ = place(&mut world, 0, slot);
        let mut events = Vec::new();
        apply(&mut world, Command::SellPlant { slot }, &mut events);

        assert_eq!(query::sun_balance(&world), 1000 - 100 + 50);
        assert_eq!(query::slot_occupant(&world, slot), None);

        events.clear();
        apply(&mut world, Command::SellPlant { slot }, &mut events);
        assert_eq!(
            events,
            vec![Event::SellRejected {
                slot,
                reason: SellError::EmptySlot
            }]
        );
    }

    #[test]
    fn upgraded_plants_sell_for_their_own_refund() {
        let mut world = rich(&[PlantKind::SunFlower, PlantKind::DoubleSunFlower]);
        let slot = SlotCoord::new(2, 1);
        let _ = place(&mut world, 0, slot);
        let _ = place(&mut world, 1, slot);
        let before = query::sun_balance(&world);

        let mut events = Vec::new();
        apply(&mut world, Command::SellPlant { slot }, &mut events);

        let refund = PlantKind::DoubleSunFlower.card().refund();
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PlantSold { refund: paid, .. } if *paid == refund
        )));
        assert_eq!(query::sun_balance(&world), before + refund);
        assert_eq!(query::slot_occupant(&world, slot), None);
    }

    #[test]
    fn pea_shooter_defends_its_lane() {
        let mut world = rich(&[PlantKind::PeaShooter]);
        let _ = place(&mut world, 0, SlotCoord::new(0, 0));
        let zombie = spawn(&mut world, ZombieKind::Basic, 0);

        let events = run(&mut world, 12);

        assert!(events.contains(&Event::ZombieDied { zombie }));
        assert!(events.contains(&Event::EntityRemoved {
            entity: zombie,
            class: EntityClass::Zombie(ZombieKind::Basic),
            cause: RemovalCause::Killed,
        }));
        assert!(query::zombie_view(&world).into_vec().is_empty());
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::MowerActivated { .. })));
    }

    #[test]
    fn zombie_eats_an_undefended_wall_nut() {
        let mut world = rich(&[PlantKind::WallNut]);
        let slot = SlotCoord::new(1, 5);
        let _ = place(&mut world, 0, slot);
        let _ = spawn(&mut world, ZombieKind::Basic, 1);

        let _ = run(&mut world, 5);
        let zombie = query::zombie_view(&world).into_vec()[0];
        assert_eq!(zombie.state, ZombieState::Eating);
        let wall = query::plant_view(&world).into_vec()[0];
        assert!(wall.health < Health::new(200));
        assert_eq!(wall.state, PlantState::Tanking);
    }

    #[test]
    fn lawnmower_saves_the_house() {
        let mut world = rich(&[PlantKind::SunFlower]);
        let zombie = spawn(&mut world, ZombieKind::Bucket, 2);

        let events = run(&mut world, 12);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::MowerActivated { lane: 2, .. })));
        assert!(events.contains(&Event::ZombieDied { zombie }));
        assert_eq!(query::phase(&world), Phase::Round);
        assert_eq!(query::mowers(&world).len(), 5);

        let _ = run(&mut world, 7);
        assert_eq!(query::mowers(&world).len(), 4);
    }

    #[test]
    fn zombie_in_the_house_defeats_the_player() {
        let mut world = world_with(
            WorldConfig {
                lawnmowers: false,
                ..WorldConfig::default()
            },
            &[PlantKind::SunFlower],
        );
        let zombie = spawn(&mut world, ZombieKind::Basic, 4);

        let events = run(&mut world, 13);

        assert!(events.contains(&Event::ZombieReachedHouse { zombie, lane: 4 }));
        assert!(events.contains(&Event::PlayerDefeated { score: 0 }));
        assert_eq!(query::phase(&world), Phase::Defeated);
        assert_eq!(query::final_score(&world), Some(0));

        let mut after = Vec::new();
        apply(&mut world, Command::EndRound, &mut after);
        assert!(after.is_empty());
    }

    #[test]
    fn slow_and_fire_replace_each_other() {
        let mut world = rich(&[PlantKind::SunFlower]);
        let zombie = spawn(&mut world, ZombieKind::Basic, 0);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ApplyEffect {
                target: zombie,
                effect: EffectKind::Slow,
            },
            &mut events,
        );
        let slowed = query::zombie_view(&world).into_vec()[0];
        assert!((slowed.movement_speed - 0.75).abs() < 1e-6);

        events.clear();
        apply(
            &mut world,
            Command::ApplyEffect {
                target: zombie,
                effect: EffectKind::Fire,
            },
            &mut events,
        );
        assert_eq!(
            events[..2],
            [
                Event::EffectExpired {
                    target: zombie,
                    effect: EffectKind::Slow
                },
                Event::EffectApplied {
                    target: zombie,
                    effect: EffectKind::Fire
                },
            ]
        );
        let burning = query::zombie_view(&world).into_vec()[0];
        assert!((burning.movement_speed - 1.0).abs() < 1e-6);
        assert_eq!(burning.health, Health::new(99));
        assert_eq!(query::active_effects(&world, zombie), vec![EffectKind::Fire]);
    }

    #[test]
    fn cone_zombies_do_not_burn() {
        let mut world = rich(&[PlantKind::SunFlower]);
        let zombie = spawn(&mut world, ZombieKind::Cone, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyEffect {
                target: zombie,
                effect: EffectKind::Fire,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EffectRejected {
                target: zombie,
                effect: EffectKind::Fire,
                reason: EffectRejection::Immune,
            }]
        );
    }

    #[test]
    fn collected_sun_adds_to_balance_and_total() {
        let mut world = world_with(WorldConfig::default(), &[PlantKind::SunFlower]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DropSun {
                position: Position::new(3.0, 1.0),
                fall_time: Duration::from_secs(1),
            },
            &mut events,
        );
        let sun = query::suns(&world)[0];
        assert!(!sun.landed);

        let _ = run(&mut world, 2);
        assert!(query::suns(&world)[0].landed);

        events.clear();
        apply(&mut world, Command::CollectSun { sun: sun.id }, &mut events);
        assert_eq!(query::sun_balance(&world), STARTING_SUN + SUN_VALUE);
        assert_eq!(query::sun_collected_total(&world), u64::from(SUN_VALUE));
        assert!(query::suns(&world).is_empty());
    }

    #[test]
    fn uncollected_sun_fades() {
        let mut world = world_with(WorldConfig::default(), &[PlantKind::SunFlower]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DropSun {
                position: Position::new(3.0, 1.0),
                fall_time: Duration::ZERO,
            },
            &mut events,
        );
        let events = run(&mut world, 21);
        assert!(events.iter().any(|event| matches!(
            event,
            Event::EntityRemoved {
                class: EntityClass::Sun,
                cause: RemovalCause::Expired,
                ..
            }
        )));
    }

    #[test]
    fn magnet_strips_bucket_from_zombie() {
        let mut world = rich(&[PlantKind::Magnet]);
        let _ = place(&mut world, 0, SlotCoord::new(0, 0));
        let zombie = spawn(&mut world, ZombieKind::Bucket, 0);

        let events = run(&mut world, 1);

        assert!(events.iter().any(|event| matches!(
            event,
            Event::ArmorTaken { zombie: owner, .. } if *owner == zombie
        )));
        assert_eq!(query::zombie_view(&world).into_vec()[0].armor, None);
        let bucket = query::items(&world)[0];
        assert_eq!(bucket.owner, None);
        assert!(bucket.holder.is_some());
    }

    #[test]
    fn ending_a_round_clears_the_lawn_and_recharges_cards() {
        let mut world = rich(&[PlantKind::PeaShooter]);
        let _ = place(&mut world, 0, SlotCoord::new(0, 0));
        let _ = spawn(&mut world, ZombieKind::Cone, 3);
        let _ = run(&mut world, 1);

        let mut events = Vec::new();
        apply(&mut world, Command::EndRound, &mut events);

        assert!(events.contains(&Event::RoundEnded { round: 1 }));
        assert_eq!(query::phase(&world), Phase::CardSelection);
        assert_eq!(query::round(&world), 2);
        assert_eq!(query::rounds_completed(&world), 1);
        assert!(query::zombie_view(&world).into_vec().is_empty());
        assert!(query::items(&world).is_empty());
        assert!(query::projectiles(&world).is_empty());
        assert_eq!(query::hand(&world)[0].cooldown_remaining, Duration::ZERO);
        assert_eq!(query::plant_view(&world).into_vec().len(), 1);

        events.clear();
        apply(&mut world, Command::StartRound, &mut events);
        assert!(events.contains(&Event::RoundStarted { round: 2 }));
    }

    #[test]
    fn spawns_outside_the_lawn_are_rejected() {
        let mut world = rich(&[PlantKind::SunFlower]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnZombie {
                kind: ZombieKind::Basic,
                lane: 5,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ZombieSpawnRejected {
                kind: ZombieKind::Basic,
                lane: 5,
                reason: SpawnError::UnknownLane,
            }]
        );
    }
}
