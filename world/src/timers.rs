//! Scheduled-task queue and the cooldown primitive built on top of it.
//!
//! Every timed wait in the simulation is a [`Task`] with a deadline, an
//! optional owning entity and a cancel token. The world drains due tasks once
//! per tick before any entity updates.

use std::{collections::BTreeMap, time::Duration};

use lawn_defence_core::{EffectKind, EntityId};

/// Cancel token returned when a task is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TaskToken(u64);

/// Deferred work resumed by the world when its deadline passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    /// A plant or zombie may act again.
    CooldownElapsed { owner: EntityId },
    /// A status effect reached the end of its lifetime.
    EffectExpired { target: EntityId, effect: EffectKind },
    /// A periodic effect delivers its next pulse.
    EffectPulse { target: EntityId, effect: EffectKind },
    /// A potato mine finished arming.
    MineArmed { mine: EntityId },
    /// A dead zombie finished its dying period.
    CorpseCleared { zombie: EntityId },
    /// A sun pickup stopped falling.
    SunLanded { sun: EntityId },
    /// A sun pickup was left uncollected for too long.
    SunFaded { sun: EntityId },
    /// An activated lawnmower finished its run.
    MowerParked { mower: EntityId },
    /// The defeat delay elapsed.
    DefeatConfirmed,
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    owner: Option<EntityId>,
    task: Task,
}

/// Deadline-ordered queue of pending tasks.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    now: Duration,
    next_token: u64,
    pending: BTreeMap<(Duration, TaskToken), Scheduled>,
    deadlines: BTreeMap<TaskToken, Duration>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Simulation time accumulated through [`TaskQueue::advance`].
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Schedules `task` to run `delay` after the current time.
    ///
    /// Tasks with an owner are dropped when the owner leaves the world.
    pub(crate) fn schedule(
        &mut self,
        owner: Option<EntityId>,
        delay: Duration,
        task: Task,
    ) -> TaskToken {
        let token = TaskToken(self.next_token);
        self.next_token += 1;
        let deadline = self.now.saturating_add(delay);
        let _ = self
            .pending
            .insert((deadline, token), Scheduled { owner, task });
        let _ = self.deadlines.insert(token, deadline);
        token
    }

    /// Cancels a pending task. Returns `false` when it already ran or was cancelled.
    pub(crate) fn cancel(&mut self, token: TaskToken) -> bool {
        match self.deadlines.remove(&token) {
            Some(deadline) => self.pending.remove(&(deadline, token)).is_some(),
            None => false,
        }
    }

    /// Cancels every task owned by `owner`.
    pub(crate) fn cancel_owned_by(&mut self, owner: EntityId) {
        let doomed: Vec<(Duration, TaskToken)> = self
            .pending
            .iter()
            .filter(|(_, scheduled)| scheduled.owner == Some(owner))
            .map(|(key, _)| *key)
            .collect();
        for key in doomed {
            let _ = self.pending.remove(&key);
            let _ = self.deadlines.remove(&key.1);
        }
    }

    /// Pops the earliest task whose deadline has passed.
    ///
    /// Ties resolve in scheduling order.
    pub(crate) fn pop_due(&mut self) -> Option<(TaskToken, Task)> {
        let (&(deadline, token), _) = self.pending.first_key_value()?;
        if deadline > self.now {
            return None;
        }
        let scheduled = self.pending.remove(&(deadline, token))?;
        let _ = self.deadlines.remove(&token);
        Some((token, scheduled.task))
    }
}

/// Boolean-gated timer: acting is allowed only while the cooldown is ready.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cooldown {
    duration: Duration,
    ready: bool,
    pending: Option<TaskToken>,
}

impl Cooldown {
    /// Cooldown that allows acting immediately.
    pub(crate) fn ready(duration: Duration) -> Self {
        Self {
            duration,
            ready: true,
            pending: None,
        }
    }

    /// Cooldown that stays closed until explicitly armed.
    pub(crate) fn blocked(duration: Duration) -> Self {
        Self {
            duration,
            ready: false,
            pending: None,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready
    }

    /// Closes the cooldown and schedules it to reopen after its duration.
    pub(crate) fn trigger(&mut self, owner: EntityId, tasks: &mut TaskQueue) {
        self.cancel(tasks);
        self.ready = false;
        self.pending = Some(tasks.schedule(
            Some(owner),
            self.duration,
            Task::CooldownElapsed { owner },
        ));
    }

    /// Reopens the cooldown if `token` is its pending task.
    pub(crate) fn complete(&mut self, token: TaskToken) -> bool {
        if self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        self.ready = true;
        true
    }

    /// Opens the cooldown immediately.
    pub(crate) fn arm(&mut self, tasks: &mut TaskQueue) {
        self.cancel(tasks);
        self.ready = true;
    }

    /// Closes the cooldown without scheduling it to reopen.
    pub(crate) fn block(&mut self, tasks: &mut TaskQueue) {
        self.cancel(tasks);
        self.ready = false;
    }

    fn cancel(&mut self, tasks: &mut TaskQueue) {
        if let Some(token) = self.pending.take() {
            let _ = tasks.cancel(token);
        }
    }
}
