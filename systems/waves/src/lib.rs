#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that turns a round number into timed zombie spawn commands.
//!
//! Every round is split into waves. Each wave spawns its normal zombies one
//! interval apart; once they are all on the lawn and every active zombie has
//! been cleared, the wave's flag burst follows. The round ends after the last
//! flag burst drained and the lawn is empty.

use std::{collections::BTreeSet, time::Duration};

use lawn_defence_core::{Command, EntityClass, EntityId, Event, ZombieKind};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MAX_WAVES_PER_ROUND: u32 = 10;
const FLAG_INTERVAL: Duration = Duration::from_millis(300);

/// Spawn plan for one wave of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wave {
    normal_count: u32,
    flag_count: u32,
    normal_interval: Duration,
    flag_interval: Duration,
}

impl Wave {
    /// Zombies spawned by the normal part of the wave.
    #[must_use]
    pub const fn normal_count(&self) -> u32 {
        self.normal_count
    }

    /// Zombies spawned by the flag burst.
    #[must_use]
    pub const fn flag_count(&self) -> u32 {
        self.flag_count
    }

    /// Delay before each normal spawn.
    #[must_use]
    pub const fn normal_interval(&self) -> Duration {
        self.normal_interval
    }

    /// Delay before each flag spawn.
    #[must_use]
    pub const fn flag_interval(&self) -> Duration {
        self.flag_interval
    }
}

/// Builds the waves of round `round`.
///
/// Counts use integer arithmetic throughout, so the quarter term of the flag
/// formula is always zero and the normal interval is `10 / round` whole
/// seconds. A zero interval spawns one zombie per tick.
#[must_use]
pub fn create_waves(round: u32) -> Vec<Wave> {
    let round = round.max(1);
    let total = round.min(MAX_WAVES_PER_ROUND);
    (0..total)
        .map(|index| Wave {
            normal_count: index + round + total + 1 + 15,
            flag_count: index + round + total + 4,
            normal_interval: Duration::from_secs(u64::from(10 / round)),
            flag_interval: FLAG_INTERVAL,
        })
        .collect()
}

/// Selection weight of every zombie kind in round `round`, in [`ZombieKind::ALL`] order.
#[must_use]
pub fn spawn_weights(round: u32) -> [f32; 3] {
    let lambda = 1.0 / (round.max(1) as f32 * 0.5);
    let mut weights = [0.0; 3];
    for (index, weight) in weights.iter_mut().enumerate() {
        *weight = (-lambda * index as f32).exp();
    }
    weights
}

/// Picks the strongest kind whose weight covers `roll`, falling back to the weakest.
#[must_use]
pub fn pick_kind(weights: &[f32; 3], roll: f32) -> ZombieKind {
    for index in (0..ZombieKind::ALL.len()).rev() {
        if roll <= weights[index] {
            return ZombieKind::ALL[index];
        }
    }
    ZombieKind::ALL[0]
}

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    lanes: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration spawning across `lanes` entry points.
    #[must_use]
    pub const fn new(lanes: u32, rng_seed: u64) -> Self {
        Self { lanes, rng_seed }
    }
}

#[derive(Clone, Copy, Debug)]
struct Burst {
    remaining: u32,
    interval: Duration,
    elapsed: Duration,
    flag: bool,
}

impl Burst {
    fn normal(wave: &Wave) -> Self {
        Self {
            remaining: wave.normal_count,
            interval: wave.normal_interval,
            elapsed: Duration::ZERO,
            flag: false,
        }
    }

    fn flag(wave: &Wave) -> Self {
        Self {
            remaining: wave.flag_count,
            interval: wave.flag_interval,
            elapsed: Duration::ZERO,
            flag: true,
        }
    }

    /// Number of spawns due after `dt` more time.
    fn due(&mut self, dt: Duration) -> u32 {
        if self.interval.is_zero() {
            return self.remaining.min(1);
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut due = 0;
        while due < self.remaining && self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            due += 1;
        }
        due
    }
}

/// Pure system that schedules zombie spawns for the running round.
#[derive(Debug)]
pub struct Waves {
    lanes: u32,
    rng: ChaCha8Rng,
    running: bool,
    round: u32,
    waves: Vec<Wave>,
    weights: [f32; 3],
    current: usize,
    normal_done: bool,
    flag_done: bool,
    burst: Option<Burst>,
    total: u32,
    remainder: u32,
    active: BTreeSet<EntityId>,
    pending: u32,
}

impl Waves {
    /// Creates an idle scheduler. It starts working on the next round start.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            lanes: config.lanes,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            running: false,
            round: 0,
            waves: Vec::new(),
            weights: spawn_weights(1),
            current: 0,
            normal_done: false,
            flag_done: true,
            burst: None,
            total: 0,
            remainder: 0,
            active: BTreeSet::new(),
            pending: 0,
        }
    }

    /// Consumes world events and emits spawn and round-end commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RoundStarted { round } => self.start_round(*round),
                Event::RoundEnded { .. } | Event::PlayerDefeated { .. } => self.stop(),
                Event::ZombieSpawned { zombie, .. } => {
                    self.pending = self.pending.saturating_sub(1);
                    let _ = self.active.insert(*zombie);
                }
                Event::ZombieSpawnRejected { .. } => {
                    self.pending = self.pending.saturating_sub(1);
                }
                Event::EntityRemoved {
                    entity,
                    class: EntityClass::Zombie(_),
                    ..
                } => {
                    let _ = self.active.remove(entity);
                }
                Event::TimeAdvanced { dt } if self.running => self.advance(*dt, out),
                _ => {}
            }
        }
    }

    /// Reports whether a round is being scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Waves of the current round.
    #[must_use]
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Normal zombies of the round that have not spawned yet.
    #[must_use]
    pub fn remainder(&self) -> u32 {
        self.remainder
    }

    /// Fraction of the round's normal zombies already spawned.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.remainder) as f32 / self.total as f32
    }

    /// Progress value at which each wave's flag burst becomes possible.
    #[must_use]
    pub fn flag_marks(&self) -> Vec<f32> {
        let mut offset = 0.0;
        self.waves
            .iter()
            .map(|wave| {
                offset += wave.normal_count as f32 / self.total.max(1) as f32;
                offset
            })
            .collect()
    }

    fn start_round(&mut self, round: u32) {
        self.round = round;
        self.waves = create_waves(round);
        self.weights = spawn_weights(round);
        self.total = self.waves.iter().map(Wave::normal_count).sum();
        self.remainder = self.total;
        self.current = 0;
        self.normal_done = false;
        self.flag_done = true;
        self.burst = None;
        self.running = true;
        debug!(
            "round {round}: {} waves, {} normal zombies",
            self.waves.len(),
            self.total
        );
    }

    fn stop(&mut self) {
        self.running = false;
        self.burst = None;
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        self.drain_burst(dt, out);

        let on_lawn = self.active.len() + self.pending as usize;
        if self.normal_done && on_lawn == 0 {
            let Some(wave) = self.waves.get(self.current) else {
                self.normal_done = false;
                return;
            };
            debug!("round {}: flag wave {}", self.round, self.current + 1);
            self.normal_done = false;
            self.burst = Some(Burst::flag(wave));
            self.current += 1;
        } else if self.current < self.waves.len() && self.flag_done {
            debug!("round {}: wave {}", self.round, self.current + 1);
            self.flag_done = false;
            self.burst = Some(Burst::normal(&self.waves[self.current]));
        } else if self.flag_done && on_lawn == 0 && self.current >= self.waves.len() {
            debug!("round {} cleared", self.round);
            self.running = false;
            out.push(Command::EndRound);
        }
    }

    fn drain_burst(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(mut burst) = self.burst.take() else {
            return;
        };
        for _ in 0..burst.due(dt) {
            self.spawn(burst.flag, out);
            burst.remaining -= 1;
        }
        if burst.remaining > 0 {
            self.burst = Some(burst);
        } else if burst.flag {
            self.flag_done = true;
        } else {
            self.normal_done = true;
        }
    }

    fn spawn(&mut self, flag: bool, out: &mut Vec<Command>) {
        if self.lanes == 0 {
            return;
        }
        let lane = self.rng.gen_range(0..self.lanes);
        let kind = pick_kind(&self.weights, self.rng.gen::<f32>());
        if !flag {
            self.remainder = self.remainder.saturating_sub(1);
        }
        self.pending += 1;
        out.push(Command::SpawnZombie { kind, lane });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_three_matches_the_wave_table() {
        let waves = create_waves(3);
        assert_eq!(waves.len(), 3);
        for (index, wave) in waves.iter().enumerate() {
            assert_eq!(wave.normal_count(), index as u32 + 22);
            assert_eq!(wave.flag_count(), index as u32 + 10);
            assert_eq!(wave.normal_interval(), Duration::from_secs(3));
            assert_eq!(wave.flag_interval(), Duration::from_millis(300));
        }
    }

    #[test]
    fn wave_count_caps_at_ten() {
        assert_eq!(create_waves(25).len(), 10);
        assert_eq!(create_waves(25)[0].normal_interval(), Duration::ZERO);
    }

    #[test]
    fn later_rounds_favour_tougher_zombies() {
        let early = spawn_weights(1);
        let late = spawn_weights(10);
        assert_eq!(early[0], 1.0);
        assert!(late[2] > early[2]);
        assert_eq!(pick_kind(&early, 0.5), ZombieKind::Basic);
        assert_eq!(pick_kind(&late, 0.5), ZombieKind::Bucket);
        assert_eq!(pick_kind(&early, 0.1), ZombieKind::Cone);
    }

    #[test]
    fn pick_falls_back_to_the_weakest_kind() {
        assert_eq!(pick_kind(&[0.0, 0.0, 0.0], 0.5), ZombieKind::Basic);
    }

    struct Lawn {
        waves: Waves,
        next_id: u32,
        alive: Vec<EntityId>,
    }

    impl Lawn {
        fn new() -> Self {
            let mut waves = Waves::new(Config::new(5, 7));
            let mut out = Vec::new();
            waves.handle(&[Event::RoundStarted { round: 1 }], &mut out);
            assert!(out.is_empty());
            Self {
                waves,
                next_id: 0,
                alive: Vec::new(),
            }
        }

        /// Advances time and confirms every spawn, returning the other commands.
        fn advance(&mut self, dt: Duration) -> (u32, Vec<Command>) {
            let mut out = Vec::new();
            self.waves.handle(&[Event::TimeAdvanced { dt }], &mut out);
            let mut spawned = 0;
            let mut rest = Vec::new();
            let mut confirmations = Vec::new();
            for command in out {
                match command {
                    Command::SpawnZombie { kind, lane } => {
                        assert!(lane < 5);
                        self.next_id += 1;
                        let zombie = EntityId::new(self.next_id);
                        self.alive.push(zombie);
                        confirmations.push(Event::ZombieSpawned { zombie, kind, lane });
                        spawned += 1;
                    }
                    other => rest.push(other),
                }
            }
            let mut ignored = Vec::new();
            self.waves.handle(&confirmations, &mut ignored);
            assert!(ignored.is_empty());
            (spawned, rest)
        }

        fn clear(&mut self) {
            let removals: Vec<Event> = self
                .alive
                .drain(..)
                .map(|entity| Event::EntityRemoved {
                    entity,
                    class: EntityClass::Zombie(ZombieKind::Basic),
                    cause: lawn_defence_core::RemovalCause::Killed,
                })
                .collect();
            let mut out = Vec::new();
            self.waves.handle(&removals, &mut out);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn flag_burst_waits_for_an_empty_lawn_then_the_round_ends() {
        let mut lawn = Lawn::new();
        assert_eq!(lawn.waves.remainder(), 18);

        let (spawned, _) = lawn.advance(Duration::from_millis(100));
        assert_eq!(spawned, 0, "the first wave starts its timer");

        let mut normal = 0;
        for _ in 0..18 {
            let (spawned, rest) = lawn.advance(Duration::from_secs(10));
            assert!(rest.is_empty());
            normal += spawned;
        }
        assert_eq!(normal, 18);
        assert_eq!(lawn.waves.remainder(), 0);
        assert_eq!(lawn.waves.progress(), 1.0);

        let (spawned, rest) = lawn.advance(Duration::from_secs(30));
        assert_eq!((spawned, rest.len()), (0, 0), "zombies still on the lawn");

        lawn.clear();
        let (spawned, _) = lawn.advance(Duration::from_millis(100));
        assert_eq!(spawned, 0, "flag burst starts its timer");
        let (spawned, rest) = lawn.advance(Duration::from_secs(2));
        assert_eq!(spawned, 6);
        assert!(rest.is_empty());

        let (_, rest) = lawn.advance(Duration::from_millis(100));
        assert!(rest.is_empty(), "flag zombies still on the lawn");

        lawn.clear();
        let (spawned, rest) = lawn.advance(Duration::from_millis(100));
        assert_eq!(spawned, 0);
        assert_eq!(rest, vec![Command::EndRound]);
        assert!(!lawn.waves.is_running());
    }

    #[test]
    fn defeat_stops_the_schedule() {
        let mut lawn = Lawn::new();
        let mut out = Vec::new();
        lawn.waves
            .handle(&[Event::PlayerDefeated { score: 0 }], &mut out);
        let (spawned, rest) = lawn.advance(Duration::from_secs(60));
        assert_eq!(spawned, 0);
        assert!(rest.is_empty());
    }

    #[test]
    fn flag_marks_split_the_progress_bar_by_wave() {
        let mut waves = Waves::new(Config::new(5, 1));
        let mut out = Vec::new();
        waves.handle(&[Event::RoundStarted { round: 2 }], &mut out);
        let marks = waves.flag_marks();
        assert_eq!(marks.len(), 2);
        assert!((marks[0] - 20.0 / 41.0).abs() < 1e-6);
        assert!((marks[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_interval_burst_spawns_once_per_tick() {
        let mut burst = Burst {
            remaining: 3,
            interval: Duration::ZERO,
            elapsed: Duration::ZERO,
            flag: false,
        };
        assert_eq!(burst.due(Duration::from_secs(5)), 1);
    }
}
