//! TOML session file describing a scripted game.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use lawn_defence_core::{PlantKind, SlotCoord};
use lawn_defence_world::WorldConfig;
use serde::Deserialize;

/// Plant the autopilot keeps in a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct PlannedPlant {
    pub(crate) plant: PlantKind,
    pub(crate) lane: u32,
    pub(crate) column: u32,
}

impl PlannedPlant {
    pub(crate) const fn slot(&self) -> SlotCoord {
        SlotCoord::new(self.lane, self.column)
    }
}

/// Every field is optional; an empty file plays the default game.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    pub(crate) world: WorldConfig,
    pub(crate) seed: u64,
    pub(crate) tick_ms: u64,
    pub(crate) max_rounds: u32,
    pub(crate) round_time_limit_secs: u64,
    pub(crate) hand: Vec<PlantKind>,
    pub(crate) plan: Vec<PlannedPlant>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut plan: Vec<PlannedPlant> = (0..5)
            .map(|lane| PlannedPlant {
                plant: PlantKind::SunFlower,
                lane,
                column: 0,
            })
            .collect();
        for column in 1..3 {
            plan.extend((0..5).map(|lane| PlannedPlant {
                plant: PlantKind::PeaShooter,
                lane,
                column,
            }));
        }
        plan.extend((0..5).map(|lane| PlannedPlant {
            plant: PlantKind::WallNut,
            lane,
            column: 6,
        }));

        Self {
            world: WorldConfig::default(),
            seed: 0x1a3d_5eed,
            tick_ms: 100,
            max_rounds: 3,
            round_time_limit_secs: 1_800,
            hand: vec![
                PlantKind::SunFlower,
                PlantKind::PeaShooter,
                PlantKind::WallNut,
                PlantKind::SnowPea,
                PlantKind::PotatoMine,
            ],
            plan,
        }
    }
}

impl SessionConfig {
    /// Loads the session file at `path`, or the defaults when none is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid session file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse session toml contents")?;
        if config.tick_ms == 0 {
            bail!("tick_ms must be positive");
        }
        Ok(config)
    }

    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) fn round_time_limit(&self) -> Duration {
        Duration::from_secs(self.round_time_limit_secs)
    }
}
