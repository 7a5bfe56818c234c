#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lawn Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.
//!
//! Static game data (plant cards, zombie stats, projectile payloads and
//! status-effect rules) lives on the kind enums so every crate reads the same
//! tables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Lawn Defence.";

/// Sun balance granted to a fresh game.
pub const STARTING_SUN: u32 = 50;

/// Value of a single sun pickup.
pub const SUN_VALUE: u32 = 50;

/// Distance a falling sun covers per second of simulated time.
pub const SUN_FALL_SPEED: f32 = 2.0;

/// Maximum number of cards a hand may hold.
pub const HAND_LIMIT: usize = 5;

/// Describes the active phase of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Between rounds: the hand may be edited and plants are dormant.
    CardSelection,
    /// A round is running: zombies advance and the hand may be played.
    Round,
    /// A zombie reached the house. The simulation is frozen.
    Defeated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Adds a plant card to the hand during card selection.
    AddCard {
        /// Plant bound to the card.
        kind: PlantKind,
    },
    /// Removes the card at the provided hand index during card selection.
    RemoveCard {
        /// Zero-based index of the card in the hand.
        index: usize,
    },
    /// Starts the next round using the current hand.
    StartRound,
    /// Ends the running round and returns to card selection.
    EndRound,
    /// Selects a card from the hand, or clears the selection with `None`.
    SelectCard {
        /// Hand index of the requested card.
        card: Option<usize>,
    },
    /// Plants the selected card into the provided lawn slot.
    PlacePlant {
        /// Slot receiving the plant.
        slot: SlotCoord,
    },
    /// Digs up the plant occupying the slot and refunds part of its cost.
    SellPlant {
        /// Slot whose occupant should be sold.
        slot: SlotCoord,
    },
    /// Collects a sun pickup, adding its value to the balance.
    CollectSun {
        /// Identifier of the sun pickup.
        sun: EntityId,
    },
    /// Drops a sun pickup from the sky.
    DropSun {
        /// Location the sun appears at.
        position: Position,
        /// Duration the sun keeps falling before it settles.
        fall_time: Duration,
    },
    /// Requests that a zombie enter the lawn at the provided lane.
    SpawnZombie {
        /// Kind of zombie to create.
        kind: ZombieKind,
        /// Lane entry point used for the spawn.
        lane: u32,
    },
    /// Applies a status effect to an entity.
    ApplyEffect {
        /// Entity receiving the effect.
        target: EntityId,
        /// Effect to apply.
        effect: EffectKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the game entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Announces the start of a round.
    RoundStarted {
        /// One-based number of the round.
        round: u32,
    },
    /// Announces the end of a round.
    RoundEnded {
        /// One-based number of the round that finished.
        round: u32,
    },
    /// Confirms that a card joined the hand.
    CardAdded {
        /// Hand index assigned to the card.
        index: usize,
        /// Plant bound to the card.
        kind: PlantKind,
    },
    /// Confirms that a card left the hand.
    CardRemoved {
        /// Hand index the card occupied.
        index: usize,
        /// Plant bound to the card.
        kind: PlantKind,
    },
    /// Reports that a hand edit or round start was rejected.
    HandRejected {
        /// Specific reason the request failed.
        reason: HandError,
    },
    /// Reports the current card selection after a change.
    CardSelected {
        /// Hand index of the selected card, if any.
        card: Option<usize>,
    },
    /// Reports the sun balance after it changed.
    SunChanged {
        /// Balance after the change.
        balance: u32,
    },
    /// Confirms that a plant was created in a slot.
    PlantPlaced {
        /// Identifier allocated to the plant.
        plant: EntityId,
        /// Kind of plant placed.
        kind: PlantKind,
        /// Slot the plant occupies.
        slot: SlotCoord,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Slot provided in the request.
        slot: SlotCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a plant was sold.
    PlantSold {
        /// Identifier of the sold plant.
        plant: EntityId,
        /// Slot freed by the sale.
        slot: SlotCoord,
        /// Sun returned to the balance.
        refund: u32,
    },
    /// Reports that a sale request was rejected.
    SellRejected {
        /// Slot provided in the request.
        slot: SlotCoord,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Confirms that a sun pickup appeared.
    SunSpawned {
        /// Identifier allocated to the pickup.
        sun: EntityId,
        /// Location of the pickup.
        position: Position,
        /// Sun granted when collected.
        value: u32,
    },
    /// Confirms that a sun pickup was collected.
    SunCollected {
        /// Identifier of the pickup.
        sun: EntityId,
        /// Sun added to the balance.
        value: u32,
    },
    /// Confirms that a zombie entered the lawn.
    ZombieSpawned {
        /// Identifier allocated to the zombie.
        zombie: EntityId,
        /// Kind of zombie created.
        kind: ZombieKind,
        /// Lane the zombie walks along.
        lane: u32,
    },
    /// Reports that a spawn request was rejected.
    ZombieSpawnRejected {
        /// Kind requested.
        kind: ZombieKind,
        /// Lane requested.
        lane: u32,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that a zombie's health ran out and it started dying.
    ZombieDied {
        /// Identifier of the zombie.
        zombie: EntityId,
    },
    /// Confirms that a plant launched a projectile.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: EntityId,
        /// Kind of projectile.
        kind: ProjectileKind,
        /// Plant that fired it.
        source: EntityId,
    },
    /// Reports that an armor layer was destroyed and dropped by its owner.
    ArmorBroken {
        /// Zombie that wore the armor.
        zombie: EntityId,
        /// Identifier of the armor item.
        item: EntityId,
    },
    /// Requests a new sprite frame for damaged armor.
    ArmorWorn {
        /// Identifier of the armor item.
        item: EntityId,
        /// Wear stage to display.
        stage: WearStage,
    },
    /// Reports that a magnet pulled an armor layer off its owner.
    ArmorTaken {
        /// Magnet plant that took the item.
        magnet: EntityId,
        /// Identifier of the armor item.
        item: EntityId,
        /// Zombie that lost the item.
        zombie: EntityId,
    },
    /// Confirms that a status effect was attached to an entity.
    EffectApplied {
        /// Entity hosting the effect.
        target: EntityId,
        /// Effect attached.
        effect: EffectKind,
    },
    /// Reports that an active effect had its lifetime refreshed.
    EffectRefreshed {
        /// Entity hosting the effect.
        target: EntityId,
        /// Effect refreshed.
        effect: EffectKind,
    },
    /// Reports that an effect ended and its modifiers were reverted.
    EffectExpired {
        /// Entity that hosted the effect.
        target: EntityId,
        /// Effect that ended.
        effect: EffectKind,
    },
    /// Reports that an effect could not be attached.
    EffectRejected {
        /// Entity targeted.
        target: EntityId,
        /// Effect requested.
        effect: EffectKind,
        /// Specific reason the effect was refused.
        reason: EffectRejection,
    },
    /// Announces that a potato mine finished arming.
    MineArmed {
        /// Identifier of the mine.
        mine: EntityId,
    },
    /// Announces that a potato mine exploded.
    MineDetonated {
        /// Identifier of the mine.
        mine: EntityId,
        /// Number of zombies caught in the blast.
        hits: u32,
    },
    /// Announces that a lawnmower started moving.
    MowerActivated {
        /// Identifier of the lawnmower.
        mower: EntityId,
        /// Lane the mower clears.
        lane: u32,
    },
    /// Reports that a zombie walked into the house.
    ZombieReachedHouse {
        /// Identifier of the zombie.
        zombie: EntityId,
        /// Lane the zombie used.
        lane: u32,
    },
    /// Announces the end of the game.
    PlayerDefeated {
        /// Final score of the game.
        score: u64,
    },
    /// Confirms that an entity left the world.
    EntityRemoved {
        /// Identifier of the entity.
        entity: EntityId,
        /// Class of the entity.
        class: EntityClass,
        /// Reason the entity was removed.
        cause: RemovalCause,
    },
    /// Asks the presentation layer to play an animation clip.
    AnimationRequested {
        /// Entity that entered a new state.
        entity: EntityId,
        /// Clip associated with the new state.
        clip: AnimationClip,
    },
}

/// Unique identifier assigned to any entity living in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a lawn slot expressed as lane and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    lane: u32,
    column: u32,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(lane: u32, column: u32) -> Self {
        Self { lane, column }
    }

    /// Zero-based lane index of the slot.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.lane
    }

    /// Zero-based column index of the slot, counted from the house.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Centre of the slot in world units.
    #[must_use]
    pub fn center(self) -> Position {
        Position::new(self.column as f32 + 0.5, lane_center(self.lane))
    }
}

/// Vertical world coordinate of the centre of a lane.
#[must_use]
pub fn lane_center(lane: u32) -> f32 {
    lane as f32 + 0.5
}

/// Point on the lawn measured in world units.
///
/// `x` grows away from the house; `y` grows with the lane index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Returns a copy translated by the provided offsets.
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Moves toward `target` by at most `max_step`, never overshooting.
    #[must_use]
    pub fn move_towards(self, target: Position, max_step: f32) -> Self {
        let distance = self.distance(target);
        if distance <= max_step || distance <= f32::EPSILON {
            return target;
        }
        let ratio = max_step / distance;
        Self::new(
            self.x + (target.x - self.x) * ratio,
            self.y + (target.y - self.y) * ratio,
        )
    }
}

/// Hit points stored for a damageable entity. Never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(u32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts damage, saturating at zero.
    #[must_use]
    pub const fn saturating_sub(self, amount: u32) -> Self {
        Self(self.0.saturating_sub(amount))
    }

    /// Fraction of `max` that remains. A zero maximum reports zero.
    #[must_use]
    pub fn ratio(self, max: Health) -> f32 {
        if max.0 == 0 {
            return 0.0;
        }
        self.0 as f32 / max.0 as f32
    }
}

/// Static card data bound to each plant kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardDefinition {
    cost: u32,
    refund: u32,
    cooldown: Duration,
}

impl CardDefinition {
    /// Creates a card definition.
    #[must_use]
    pub const fn new(cost: u32, refund: u32, cooldown: Duration) -> Self {
        Self {
            cost,
            refund,
            cooldown,
        }
    }

    /// Sun spent when the card is played.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Sun returned when the plant is sold.
    #[must_use]
    pub const fn refund(&self) -> u32 {
        self.refund
    }

    /// Recharge time after the card is played.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Types of plants that can be placed on the lawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlantKind {
    /// Fires peas down its lane.
    PeaShooter,
    /// Fires frozen peas that slow their target.
    SnowPea,
    /// Fires burning peas that set their target alight.
    FirePea,
    /// Produces one sun at a time.
    SunFlower,
    /// Upgrade of [`PlantKind::SunFlower`] producing two suns at a time.
    DoubleSunFlower,
    /// Sturdy blocker without an attack.
    WallNut,
    /// Single-use explosive that arms after a delay.
    PotatoMine,
    /// Pulls metal armor off zombies and crushes it.
    Magnet,
}

impl PlantKind {
    /// Every plant kind in catalog order.
    pub const ALL: [PlantKind; 8] = [
        PlantKind::PeaShooter,
        PlantKind::SnowPea,
        PlantKind::FirePea,
        PlantKind::SunFlower,
        PlantKind::DoubleSunFlower,
        PlantKind::WallNut,
        PlantKind::PotatoMine,
        PlantKind::Magnet,
    ];

    /// Card data for the plant.
    #[must_use]
    pub const fn card(self) -> CardDefinition {
        match self {
            Self::PeaShooter => CardDefinition::new(100, 50, Duration::from_millis(7_500)),
            Self::SnowPea | Self::FirePea => {
                CardDefinition::new(175, 85, Duration::from_millis(7_500))
            }
            Self::SunFlower => CardDefinition::new(50, 25, Duration::from_millis(7_500)),
            Self::DoubleSunFlower => CardDefinition::new(150, 75, Duration::from_secs(15)),
            Self::WallNut => CardDefinition::new(50, 25, Duration::from_secs(30)),
            Self::PotatoMine => CardDefinition::new(25, 10, Duration::from_secs(30)),
            Self::Magnet => CardDefinition::new(100, 50, Duration::from_secs(30)),
        }
    }

    /// Hit points of a freshly placed plant.
    #[must_use]
    pub const fn max_health(self) -> Health {
        match self {
            Self::WallNut => Health::new(200),
            _ => Health::new(100),
        }
    }

    /// Plant this kind replaces when played as an upgrade.
    #[must_use]
    pub const fn upgrade_of(self) -> Option<PlantKind> {
        match self {
            Self::DoubleSunFlower => Some(Self::SunFlower),
            _ => None,
        }
    }

    /// Resource path of the plant's prefab.
    #[must_use]
    pub const fn resource_path(self) -> &'static str {
        match self {
            Self::PeaShooter => "Prefabs/Beings/Plants/Pea Shooter",
            Self::SnowPea => "Prefabs/Beings/Plants/Snow Pea Shooter",
            Self::FirePea => "Prefabs/Beings/Plants/Fire Pea Shooter",
            Self::SunFlower => "Prefabs/Beings/Plants/Sun Flower",
            Self::DoubleSunFlower => "Prefabs/Beings/Plants/Double Sun Flower",
            Self::WallNut => "Prefabs/Beings/Plants/Wall Nut",
            Self::PotatoMine => "Prefabs/Beings/Plants/Potato Mine",
            Self::Magnet => "Prefabs/Beings/Plants/Magnet",
        }
    }

    /// Resolves a prefab resource path back to its plant kind.
    #[must_use]
    pub fn from_resource_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.resource_path() == path)
    }
}

/// Types of zombies that walk the lawn, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZombieKind {
    /// Unarmored zombie.
    Basic,
    /// Zombie wearing a plastic cone. Immune to fire.
    Cone,
    /// Zombie wearing a metal bucket.
    Bucket,
}

impl ZombieKind {
    /// Every zombie kind ordered from weakest to strongest.
    pub const ALL: [ZombieKind; 3] = [ZombieKind::Basic, ZombieKind::Cone, ZombieKind::Bucket];

    /// Hit points of the zombie body.
    #[must_use]
    pub const fn max_health(self) -> Health {
        Health::new(100)
    }

    /// Walking speed in world units per second.
    #[must_use]
    pub const fn movement_speed(self) -> f32 {
        1.0
    }

    /// Damage dealt per bite.
    #[must_use]
    pub const fn bite_damage(self) -> u32 {
        10
    }

    /// Delay between bites.
    #[must_use]
    pub const fn attack_cooldown(self) -> Duration {
        Duration::from_secs(1)
    }

    /// Armor layer worn when the zombie spawns.
    #[must_use]
    pub const fn armor(self) -> Option<ArmorKind> {
        match self {
            Self::Basic => None,
            Self::Cone => Some(ArmorKind::Cone),
            Self::Bucket => Some(ArmorKind::Bucket),
        }
    }

    /// Status effects the zombie ignores.
    #[must_use]
    pub const fn immunities(self) -> &'static [EffectKind] {
        match self {
            Self::Cone => &[EffectKind::Fire],
            Self::Basic | Self::Bucket => &[],
        }
    }

    /// Resource path of the zombie's prefab.
    #[must_use]
    pub const fn resource_path(self) -> &'static str {
        match self {
            Self::Basic => "Prefabs/Beings/Zombies/Basic Zombie",
            Self::Cone => "Prefabs/Beings/Zombies/Cone Zombie",
            Self::Bucket => "Prefabs/Beings/Zombies/Bucket Zombie",
        }
    }

    /// Resolves a prefab resource path back to its zombie kind.
    #[must_use]
    pub fn from_resource_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.resource_path() == path)
    }
}

/// Material an armor layer is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Plastic items ignore magnets.
    Plastic,
    /// Metal items can be pulled off by magnets.
    Metal,
}

/// Armor layers worn by zombies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorKind {
    /// Traffic cone.
    Cone,
    /// Metal bucket.
    Bucket,
}

impl ArmorKind {
    /// Hit points of a fresh armor layer.
    #[must_use]
    pub const fn max_health(self) -> Health {
        match self {
            Self::Cone => Health::new(100),
            Self::Bucket => Health::new(200),
        }
    }

    /// Material of the layer.
    #[must_use]
    pub const fn material(self) -> Material {
        match self {
            Self::Cone => Material::Plastic,
            Self::Bucket => Material::Metal,
        }
    }

    /// Sprite stage to show after a hit that left the armor with `health`.
    ///
    /// Returns `None` when the sprite keeps its current frame.
    #[must_use]
    pub fn wear_stage(self, health: Health) -> Option<WearStage> {
        let ratio = health.ratio(self.max_health());
        if ratio > 0.5 {
            Some(WearStage::Dented)
        } else if ratio > 0.25 {
            Some(WearStage::Battered)
        } else {
            None
        }
    }
}

/// Damage frames shown by armor sprites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WearStage {
    /// Second frame: lightly damaged.
    Dented,
    /// Third frame: heavily damaged.
    Battered,
}

/// Projectiles fired by shooting plants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Plain pea.
    Pea,
    /// Frozen pea that slows.
    SnowPea,
    /// Burning pea that ignites.
    FirePea,
}

impl ProjectileKind {
    /// Damage dealt on contact.
    #[must_use]
    pub const fn damage(self) -> u32 {
        match self {
            Self::Pea | Self::FirePea => 20,
            Self::SnowPea => 15,
        }
    }

    /// Flight speed in world units per second.
    #[must_use]
    pub const fn movement_speed(self) -> f32 {
        5.0
    }

    /// Status effect applied to the zombie that was hit.
    #[must_use]
    pub const fn effect(self) -> Option<EffectKind> {
        match self {
            Self::Pea => None,
            Self::SnowPea => Some(EffectKind::Slow),
            Self::FirePea => Some(EffectKind::Fire),
        }
    }
}

/// Periodic damage delivered by an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectPulse {
    /// Damage dealt per pulse.
    pub damage: u32,
    /// Delay between pulses.
    pub interval: Duration,
}

/// Timed status effects that can be attached to entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    /// Burns the host periodically.
    Fire,
    /// Scales the host's movement speed down.
    Slow,
}

impl EffectKind {
    /// Lifetime of a freshly applied or refreshed effect.
    #[must_use]
    pub const fn duration(self) -> Duration {
        Duration::from_secs(5)
    }

    /// Effects that cannot coexist with this one on the same host.
    ///
    /// Applying this effect force-expires every listed effect first.
    #[must_use]
    pub const fn restricted_with(self) -> &'static [EffectKind] {
        match self {
            Self::Fire => &[Self::Slow],
            Self::Slow => &[Self::Fire],
        }
    }

    /// Capabilities a host needs before the effect can attach.
    #[must_use]
    pub const fn requires(self) -> &'static [Capability] {
        match self {
            Self::Fire => &[Capability::Damageable],
            Self::Slow => &[Capability::Movable],
        }
    }

    /// Periodic damage, if the effect deals any.
    #[must_use]
    pub const fn pulse(self) -> Option<EffectPulse> {
        match self {
            Self::Fire => Some(EffectPulse {
                damage: 1,
                interval: Duration::from_secs(1),
            }),
            Self::Slow => None,
        }
    }

    /// Factor applied to movement speed while the effect is active.
    #[must_use]
    pub const fn speed_multiplier(self) -> Option<f32> {
        match self {
            Self::Fire => None,
            Self::Slow => Some(0.75),
        }
    }
}

/// Behaviors an entity may support, used in place of runtime type checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Has health and can be damaged.
    Damageable,
    /// Moves under its own speed.
    Movable,
    /// Can be dug up for a refund.
    Sellable,
    /// Replaces another plant when played.
    Upgradeable,
    /// Can be pulled away by a magnet.
    MagnetRemovable,
}

/// Closed set of entity classes living in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    /// A plant.
    Plant(PlantKind),
    /// A zombie.
    Zombie(ZombieKind),
    /// A projectile.
    Projectile(ProjectileKind),
    /// An armor layer.
    Armor(ArmorKind),
    /// A sun pickup.
    Sun,
    /// A lawnmower.
    Lawnmower,
}

impl EntityClass {
    /// Capabilities implemented by the class.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Plant(PlantKind::DoubleSunFlower) => &[
                Capability::Damageable,
                Capability::Sellable,
                Capability::Upgradeable,
            ],
            Self::Plant(_) => &[Capability::Damageable, Capability::Sellable],
            Self::Zombie(_) => &[Capability::Damageable, Capability::Movable],
            Self::Projectile(_) | Self::Sun | Self::Lawnmower => &[Capability::Movable],
            Self::Armor(ArmorKind::Cone) => &[Capability::Damageable],
            Self::Armor(ArmorKind::Bucket) => {
                &[Capability::Damageable, Capability::MagnetRemovable]
            }
        }
    }

    /// Reports whether the class implements `capability`.
    #[must_use]
    pub fn has_capability(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Reasons an entity left the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Health ran out.
    Killed,
    /// Sold by the player.
    Sold,
    /// Replaced by an upgrade.
    Upgraded,
    /// Walked into the house.
    ReachedHouse,
    /// Lifetime ran out.
    Expired,
    /// Projectile hit something.
    Impact,
    /// Left the lawn bounds.
    OutOfBounds,
    /// Collected by the player.
    Collected,
    /// Cleared during round housekeeping.
    RoundEnded,
    /// Removed together with the entity that carried it.
    CarrierRemoved,
    /// A potato mine went off.
    Detonated,
}

/// Animation clips requested when entities change state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationClip {
    /// Resting loop.
    Idle,
    /// Shooting a projectile.
    Shoot,
    /// Producing sun.
    Generate,
    /// Absorbing bites.
    Tank,
    /// Reeling in an item.
    Retrieve,
    /// Crushing an item.
    Destroy,
    /// Buried mine.
    IdleDown,
    /// Armed mine.
    IdleUp,
    /// Mine detonation.
    Explode,
    /// Walking.
    Move,
    /// Biting a plant.
    Eat,
    /// Death.
    Die,
}

/// States a plant may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantState {
    /// Scanning or waiting.
    Idle,
    /// Shooters: launching a projectile.
    Shooting,
    /// Sun producers: producing sun.
    Generating,
    /// Wall-nut: being eaten.
    Tanking,
    /// Magnet: pulling an item in.
    Retrieving,
    /// Magnet: crushing the held item.
    Destroying,
    /// Potato mine: arming underground.
    IdleDown,
    /// Potato mine: armed and waiting.
    IdleUp,
    /// Potato mine: exploding.
    Exploding,
}

impl PlantState {
    /// Clip played when the state is entered.
    #[must_use]
    pub const fn clip(self) -> AnimationClip {
        match self {
            Self::Idle => AnimationClip::Idle,
            Self::Shooting => AnimationClip::Shoot,
            Self::Generating => AnimationClip::Generate,
            Self::Tanking => AnimationClip::Tank,
            Self::Retrieving => AnimationClip::Retrieve,
            Self::Destroying => AnimationClip::Destroy,
            Self::IdleDown => AnimationClip::IdleDown,
            Self::IdleUp => AnimationClip::IdleUp,
            Self::Exploding => AnimationClip::Explode,
        }
    }
}

/// States a zombie may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZombieState {
    /// Walking toward the house.
    Moving,
    /// Biting the plant in front of it.
    Eating,
    /// Out of health, waiting to be removed.
    Dying,
}

impl ZombieState {
    /// Clip played when the state is entered.
    #[must_use]
    pub const fn clip(self) -> AnimationClip {
        match self {
            Self::Moving => AnimationClip::Move,
            Self::Eating => AnimationClip::Eat,
            Self::Dying => AnimationClip::Die,
        }
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// No round is running.
    InvalidPhase,
    /// No card is selected.
    NoCardSelected,
    /// The slot lies outside the lawn.
    OutOfBounds,
    /// The selected card is still recharging.
    CardOnCooldown,
    /// The balance cannot cover the card cost.
    InsufficientSun,
    /// The slot already holds a plant the card cannot replace.
    Occupied,
    /// An upgrade card was played on an empty slot.
    NothingToUpgrade,
    /// An upgrade card was played on the wrong kind of plant.
    UpgradeMismatch,
}

/// Reasons a sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellError {
    /// No round is running.
    InvalidPhase,
    /// The slot lies outside the lawn.
    OutOfBounds,
    /// The slot holds no plant.
    EmptySlot,
    /// The occupant cannot be dug up.
    NotSellable,
}

/// Reasons a hand edit or round start may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandError {
    /// The hand can only change during card selection.
    InvalidPhase,
    /// The hand already holds the maximum number of cards.
    HandFull,
    /// The card is already in the hand.
    DuplicateCard,
    /// No card exists at the provided index.
    MissingCard,
    /// A round cannot start without cards.
    EmptyHand,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// No round is running.
    InvalidPhase,
    /// The lane does not exist.
    UnknownLane,
}

/// Reasons a status effect may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectRejection {
    /// The host is immune to the effect.
    Immune,
    /// The host lacks a capability the effect requires.
    Incompatible,
    /// No live host exists with the provided identifier.
    MissingTarget,
}

/// Immutable representation of a card in the hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardSnapshot {
    /// Index of the card in the hand.
    pub index: usize,
    /// Plant bound to the card.
    pub kind: PlantKind,
    /// Time left before the card can be played again.
    pub cooldown_remaining: Duration,
}

/// Immutable representation of a single plant used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantSnapshot {
    /// Identifier allocated to the plant.
    pub id: EntityId,
    /// Kind of plant.
    pub kind: PlantKind,
    /// Slot the plant occupies.
    pub slot: SlotCoord,
    /// Remaining hit points.
    pub health: Health,
    /// Current state-machine state.
    pub state: PlantState,
}

/// Read-only snapshot describing all plants on the lawn.
#[derive(Clone, Debug, Default)]
pub struct PlantView {
    snapshots: Vec<PlantSnapshot>,
}

impl PlantView {
    /// Creates a new plant view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlantSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured plant snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &PlantSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PlantSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of an armor layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSnapshot {
    /// Identifier allocated to the item.
    pub id: EntityId,
    /// Kind of armor.
    pub kind: ArmorKind,
    /// Remaining hit points.
    pub health: Health,
    /// Current location.
    pub position: Position,
    /// Zombie wearing the item, if still attached.
    pub owner: Option<EntityId>,
    /// Magnet holding the item, if it was pulled off.
    pub holder: Option<EntityId>,
}

/// Immutable representation of a single zombie used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZombieSnapshot {
    /// Identifier allocated to the zombie.
    pub id: EntityId,
    /// Kind the zombie spawned as.
    pub kind: ZombieKind,
    /// Lane the zombie walks along.
    pub lane: u32,
    /// Current location.
    pub position: Position,
    /// Remaining body hit points.
    pub health: Health,
    /// Current walking speed after modifiers.
    pub movement_speed: f32,
    /// Armor layer still worn, if any.
    pub armor: Option<EntityId>,
    /// Plant currently being eaten, if any.
    pub target: Option<EntityId>,
    /// Current state-machine state.
    pub state: ZombieState,
}

/// Read-only snapshot describing all zombies on the lawn.
#[derive(Clone, Debug, Default)]
pub struct ZombieView {
    snapshots: Vec<ZombieSnapshot>,
}

impl ZombieView {
    /// Creates a new zombie view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ZombieSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured zombie snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ZombieSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ZombieSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: EntityId,
    /// Kind of projectile.
    pub kind: ProjectileKind,
    /// Lane the projectile travels along.
    pub lane: u32,
    /// Current location.
    pub position: Position,
}

/// Immutable representation of a sun pickup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunSnapshot {
    /// Identifier allocated to the pickup.
    pub id: EntityId,
    /// Current location.
    pub position: Position,
    /// Sun granted when collected.
    pub value: u32,
    /// Whether the pickup stopped falling.
    pub landed: bool,
}

/// Immutable representation of a lawnmower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MowerSnapshot {
    /// Identifier allocated to the mower.
    pub id: EntityId,
    /// Lane the mower guards.
    pub lane: u32,
    /// Current location.
    pub position: Position,
    /// Whether the mower has been triggered.
    pub active: bool,
}
