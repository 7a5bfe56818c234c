//! Status-effect engine: admission, conflict resolution, refresh and expiry.

use std::collections::BTreeMap;

use lawn_defence_core::{EffectKind, EffectRejection, EntityClass, EntityId};

use crate::timers::{Task, TaskQueue, TaskToken};

/// Entity able to host status effects.
pub(crate) trait EffectHost {
    /// Class used to resolve the capabilities an effect requires.
    fn class(&self) -> EntityClass;

    /// Effects the host refuses outright.
    fn immunities(&self) -> &'static [EffectKind];

    /// Multiplies the host's movement speed.
    fn multiply_speed(&mut self, factor: f32);

    /// Divides the host's movement speed.
    fn divide_speed(&mut self, factor: f32);
}

#[derive(Clone, Copy, Debug)]
struct ActiveEffect {
    kind: EffectKind,
    expiry: TaskToken,
    pulse: Option<TaskToken>,
}

/// Result of attaching an effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum EffectOutcome {
    /// The effect was refused.
    Rejected(EffectRejection),
    /// The effect was already active; its lifetime restarted.
    Refreshed,
    /// The effect attached after force-expiring the listed conflicts.
    Applied {
        displaced: Vec<EffectKind>,
        burn: Option<u32>,
    },
}

/// Active effects keyed by host.
#[derive(Debug, Default)]
pub(crate) struct EffectRegistry {
    active: BTreeMap<EntityId, Vec<ActiveEffect>>,
}

impl EffectRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attaches `kind` to `target`.
    ///
    /// Checks immunity, then required capabilities. A second application of an
    /// active kind restarts its lifetime and nothing else. Otherwise every
    /// active effect restricted with `kind` is expired and reverted before the
    /// new effect applies its modifiers. Periodic effects report their first
    /// pulse in [`EffectOutcome::Applied::burn`] for the caller to deliver.
    pub(crate) fn apply(
        &mut self,
        tasks: &mut TaskQueue,
        target: EntityId,
        host: &mut impl EffectHost,
        kind: EffectKind,
    ) -> EffectOutcome {
        if host.immunities().contains(&kind) {
            return EffectOutcome::Rejected(EffectRejection::Immune);
        }
        let class = host.class();
        if !kind
            .requires()
            .iter()
            .all(|capability| class.has_capability(*capability))
        {
            return EffectOutcome::Rejected(EffectRejection::Incompatible);
        }

        let effects = self.active.entry(target).or_default();
        if let Some(existing) = effects.iter_mut().find(|effect| effect.kind == kind) {
            let _ = tasks.cancel(existing.expiry);
            existing.expiry = schedule_expiry(tasks, target, kind);
            return EffectOutcome::Refreshed;
        }

        let mut displaced = Vec::new();
        let mut index = 0;
        while index < effects.len() {
            if kind.restricted_with().contains(&effects[index].kind) {
                let conflict = effects.remove(index);
                revert(tasks, host, conflict);
                displaced.push(conflict.kind);
            } else {
                index += 1;
            }
        }

        if let Some(factor) = kind.speed_multiplier() {
            host.multiply_speed(factor);
        }
        let expiry = schedule_expiry(tasks, target, kind);
        let pulse = kind.pulse().map(|pulse| {
            tasks.schedule(
                Some(target),
                pulse.interval,
                Task::EffectPulse {
                    target,
                    effect: kind,
                },
            )
        });
        effects.push(ActiveEffect {
            kind,
            expiry,
            pulse,
        });

        EffectOutcome::Applied {
            displaced,
            burn: kind.pulse().map(|pulse| pulse.damage),
        }
    }

    /// Ends `kind` on `target` when `token` is its current expiry.
    ///
    /// Returns `false` for stale tokens left behind by a refresh.
    pub(crate) fn expire(
        &mut self,
        tasks: &mut TaskQueue,
        target: EntityId,
        host: &mut impl EffectHost,
        kind: EffectKind,
        token: TaskToken,
    ) -> bool {
        let Some(effects) = self.active.get_mut(&target) else {
            return false;
        };
        let Some(index) = effects
            .iter()
            .position(|effect| effect.kind == kind && effect.expiry == token)
        else {
            return false;
        };
        let effect = effects.remove(index);
        revert(tasks, host, effect);
        true
    }

    /// Schedules the next pulse of a periodic effect and returns its damage.
    pub(crate) fn pulse(
        &mut self,
        tasks: &mut TaskQueue,
        target: EntityId,
        kind: EffectKind,
        token: TaskToken,
    ) -> Option<u32> {
        let effect = self
            .active
            .get_mut(&target)?
            .iter_mut()
            .find(|effect| effect.kind == kind && effect.pulse == Some(token))?;
        let pulse = kind.pulse()?;
        effect.pulse = Some(tasks.schedule(
            Some(target),
            pulse.interval,
            Task::EffectPulse {
                target,
                effect: kind,
            },
        ));
        Some(pulse.damage)
    }

    /// Ends every effect on `target`, reverting their modifiers.
    pub(crate) fn clear_all(
        &mut self,
        tasks: &mut TaskQueue,
        target: EntityId,
        host: &mut impl EffectHost,
    ) -> Vec<EffectKind> {
        let effects = self.active.remove(&target).unwrap_or_default();
        effects
            .into_iter()
            .map(|effect| {
                revert(tasks, host, effect);
                effect.kind
            })
            .collect()
    }

    /// Drops bookkeeping for a host that left the world.
    pub(crate) fn forget(&mut self, tasks: &mut TaskQueue, target: EntityId) {
        for effect in self.active.remove(&target).unwrap_or_default() {
            let _ = tasks.cancel(effect.expiry);
            if let Some(pulse) = effect.pulse {
                let _ = tasks.cancel(pulse);
            }
        }
    }

    /// Kinds currently active on `target`, in application order.
    pub(crate) fn active_on(&self, target: EntityId) -> Vec<EffectKind> {
        self.active
            .get(&target)
            .map(|effects| effects.iter().map(|effect| effect.kind).collect())
            .unwrap_or_default()
    }
}

fn schedule_expiry(tasks: &mut TaskQueue, target: EntityId, kind: EffectKind) -> TaskToken {
    tasks.schedule(
        Some(target),
        kind.duration(),
        Task::EffectExpired {
            target,
            effect: kind,
        },
    )
}

fn revert(tasks: &mut TaskQueue, host: &mut impl EffectHost, effect: ActiveEffect) {
    let _ = tasks.cancel(effect.expiry);
    if let Some(pulse) = effect.pulse {
        let _ = tasks.cancel(pulse);
    }
    if let Some(factor) = effect.kind.speed_multiplier() {
        host.divide_speed(factor);
    }
}
