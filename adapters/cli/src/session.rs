//! Headless game loop driving the world, its systems and a scripted player.

use std::time::Duration;

use anyhow::{bail, Result};
use lawn_defence_core::{Command, EntityId, Event, HandError, Phase};
use lawn_defence_system_sky_sun::{self as sky_sun, SkySun};
use lawn_defence_system_waves::{self as waves, Waves};
use lawn_defence_world::{self as world, query, World};
use log::{debug, info};

use crate::config::{PlannedPlant, SessionConfig};

/// Result of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) rounds_completed: u32,
    pub(crate) score: u64,
    pub(crate) defeated: bool,
}

#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    waves: Waves,
    sky: SkySun,
    plan: Vec<PlannedPlant>,
    tick: Duration,
    round_time_limit: Duration,
    max_rounds: u32,
}

impl Session {
    /// Builds the world and fills the hand.
    pub(crate) fn new(config: &SessionConfig) -> Result<Self> {
        let world = World::with_config(config.world.clone());
        let (lanes, columns) = query::lawn_size(&world);
        let mut session = Self {
            world,
            waves: Waves::new(waves::Config::new(lanes, config.seed)),
            sky: SkySun::new(sky_sun::Config::new(lanes, columns, config.seed.rotate_left(32))),
            plan: config.plan.clone(),
            tick: config.tick(),
            round_time_limit: config.round_time_limit(),
            max_rounds: config.max_rounds,
        };

        for kind in &config.hand {
            let events = session.apply(Command::AddCard { kind: *kind });
            if let Some(reason) = hand_rejection(&events) {
                bail!("{kind:?} cannot join the hand: {reason:?}");
            }
        }
        Ok(session)
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Plays rounds until the player is defeated or the round cap is reached.
    pub(crate) fn run(&mut self) -> Result<Outcome> {
        while query::phase(&self.world) != Phase::Defeated
            && query::rounds_completed(&self.world) < self.max_rounds
        {
            self.play_round()?;
        }
        Ok(Outcome {
            rounds_completed: query::rounds_completed(&self.world),
            score: query::score(&self.world),
            defeated: query::phase(&self.world) == Phase::Defeated,
        })
    }

    fn play_round(&mut self) -> Result<()> {
        self.start_round()?;
        let round = query::round(&self.world);
        let started = query::elapsed(&self.world);
        while query::phase(&self.world) == Phase::Round {
            self.step();
            let spent = query::elapsed(&self.world).saturating_sub(started);
            if spent > self.round_time_limit {
                bail!(
                    "round {round} still running after {}s of simulated time",
                    spent.as_secs()
                );
            }
        }
        Ok(())
    }

    fn start_round(&mut self) -> Result<()> {
        let events = self.apply(Command::StartRound);
        if let Some(reason) = hand_rejection(&events) {
            bail!("round could not start: {reason:?}");
        }
        Ok(())
    }

    /// Advances one tick and lets the scripted player act.
    fn step(&mut self) {
        let _ = self.apply(Command::Tick { dt: self.tick });
        self.collect_suns();
        for index in 0..self.plan.len() {
            self.tend(self.plan[index]);
        }
    }

    fn collect_suns(&mut self) {
        let suns: Vec<EntityId> = query::suns(&self.world)
            .into_iter()
            .map(|sun| sun.id)
            .collect();
        for sun in suns {
            let _ = self.apply(Command::CollectSun { sun });
        }
    }

    /// Plants `entry` when its slot needs it and the card can be played.
    fn tend(&mut self, entry: PlannedPlant) {
        let slot = entry.slot();
        let occupant = query::plant_view(&self.world)
            .iter()
            .find(|plant| plant.slot == slot)
            .map(|plant| plant.kind);
        let needed = match (entry.plant.upgrade_of(), occupant) {
            (_, Some(kind)) if kind == entry.plant => false,
            (None, None) => true,
            (Some(base), Some(kind)) => base == kind,
            _ => false,
        };
        if !needed {
            return;
        }

        let Some(card) = query::hand(&self.world)
            .into_iter()
            .find(|card| card.kind == entry.plant)
        else {
            return;
        };
        if !card.cooldown_remaining.is_zero()
            || entry.plant.card().cost() > query::sun_balance(&self.world)
        {
            return;
        }

        let _ = self.apply(Command::SelectCard {
            card: Some(card.index),
        });
        let events = self.apply(Command::PlacePlant { slot });
        for event in &events {
            if let Event::PlacementRejected { reason, .. } = event {
                debug!("autopilot could not plant {:?}: {reason:?}", entry.plant);
            }
        }
    }

    /// Applies `command` and pumps the resulting events through the systems.
    fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = vec![command];
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in std::mem::take(&mut pending) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.waves.handle(&events, &mut pending);
            self.sky.handle(&events, &mut pending);
            report(&events);
            log.extend(events);
        }
        log
    }
}

fn hand_rejection(events: &[Event]) -> Option<HandError> {
    events.iter().find_map(|event| match event {
        Event::HandRejected { reason } => Some(*reason),
        _ => None,
    })
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::RoundStarted { round } => info!("round {round} begins"),
            Event::RoundEnded { round } => info!("round {round} cleared"),
            Event::ZombieReachedHouse { lane, .. } => {
                info!("a zombie broke into the house from lane {lane}");
            }
            Event::MowerActivated { lane, .. } => debug!("lawnmower started in lane {lane}"),
            Event::PlayerDefeated { score } => info!("defeated with {score} points"),
            _ => {}
        }
    }
}
