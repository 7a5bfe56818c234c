#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Drops sun pickups from the sky while a round is running.

use std::time::Duration;

use lawn_defence_core::{Command, Event, Position, SUN_FALL_SPEED};
use log::trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Delay between two sky drops.
pub const DROP_INTERVAL: Duration = Duration::from_secs(10);
/// Time a sky sun keeps falling before it settles.
pub const FALL_TIME: Duration = Duration::from_secs(6);

/// Configuration parameters required to construct the sky sun system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    lanes: u32,
    columns: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration covering a lawn of `lanes` by `columns` slots.
    #[must_use]
    pub const fn new(lanes: u32, columns: u32, rng_seed: u64) -> Self {
        Self {
            lanes,
            columns,
            rng_seed,
        }
    }
}

/// Pure system that emits [`Command::DropSun`] on a fixed cadence.
#[derive(Debug)]
pub struct SkySun {
    lanes: u32,
    columns: u32,
    rng: ChaCha8Rng,
    active: bool,
    accumulator: Duration,
}

impl SkySun {
    /// Creates an inactive dropper.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            lanes: config.lanes,
            columns: config.columns,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            active: false,
            accumulator: Duration::ZERO,
        }
    }

    /// Reports whether suns are currently dropping.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Consumes world events and emits sun drops.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RoundStarted { .. } => {
                    self.active = true;
                    self.accumulator = Duration::ZERO;
                    self.drop_sun(out);
                }
                Event::RoundEnded { .. } | Event::PlayerDefeated { .. } => {
                    self.active = false;
                }
                Event::TimeAdvanced { dt } if self.active => {
                    self.accumulator = self.accumulator.saturating_add(*dt);
                    while self.accumulator >= DROP_INTERVAL {
                        self.accumulator -= DROP_INTERVAL;
                        self.drop_sun(out);
                    }
                }
                _ => {}
            }
        }
    }

    fn drop_sun(&mut self, out: &mut Vec<Command>) {
        if self.lanes == 0 || self.columns == 0 {
            return;
        }
        let x = self.rng.gen_range(0.0..self.columns as f32);
        let landing = self.rng.gen_range(0.0..self.lanes as f32);
        let start = landing - SUN_FALL_SPEED * FALL_TIME.as_secs_f32();
        trace!("sky sun at x {x:.2} landing at y {landing:.2}");
        out.push(Command::DropSun {
            position: Position::new(x, start),
            fall_time: FALL_TIME,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drops(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|command| matches!(command, Command::DropSun { .. }))
            .count()
    }

    #[test]
    fn drops_once_on_round_start_and_then_every_interval() {
        let mut sky = SkySun::new(Config::new(5, 9, 3));
        let mut out = Vec::new();
        sky.handle(&[Event::RoundStarted { round: 1 }], &mut out);
        assert_eq!(drops(&out), 1);

        sky.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(9_900),
            }],
            &mut out,
        );
        assert_eq!(drops(&out), 1);

        sky.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(20),
            }],
            &mut out,
        );
        assert_eq!(drops(&out), 3);
    }

    #[test]
    fn suns_land_inside_the_lawn() {
        let mut sky = SkySun::new(Config::new(5, 9, 11));
        let mut out = Vec::new();
        sky.handle(&[Event::RoundStarted { round: 1 }], &mut out);
        for _ in 0..50 {
            sky.handle(&[Event::TimeAdvanced { dt: DROP_INTERVAL }], &mut out);
        }
        assert_eq!(out.len(), 51);
        for command in out {
            let Command::DropSun { position, fall_time } = command else {
                panic!("unexpected command {command:?}");
            };
            assert_eq!(fall_time, FALL_TIME);
            let landing = position.y() + SUN_FALL_SPEED * fall_time.as_secs_f32();
            assert!((0.0..9.0).contains(&position.x()));
            assert!((-0.001..5.001).contains(&landing));
        }
    }

    #[test]
    fn stays_quiet_outside_rounds() {
        let mut sky = SkySun::new(Config::new(5, 9, 3));
        let mut out = Vec::new();
        sky.handle(&[Event::TimeAdvanced { dt: DROP_INTERVAL }], &mut out);
        assert!(out.is_empty());

        sky.handle(&[Event::RoundStarted { round: 1 }], &mut out);
        sky.handle(&[Event::RoundEnded { round: 1 }], &mut out);
        sky.handle(&[Event::TimeAdvanced { dt: DROP_INTERVAL }], &mut out);
        assert_eq!(drops(&out), 1);
        assert!(!sky.is_active());
    }
}
