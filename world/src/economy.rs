//! Sun balance, the hand of plant cards and the current selection.

use std::time::Duration;

use lawn_defence_core::{CardSnapshot, HandError, PlantKind};

/// Card in the hand together with its recharge state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CardSlot {
    pub(crate) kind: PlantKind,
    remaining: Duration,
}

impl CardSlot {
    pub(crate) fn is_ready(&self) -> bool {
        self.remaining.is_zero()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Economy {
    balance: u32,
    collected_total: u64,
    hand: Vec<CardSlot>,
    hand_limit: usize,
    selected: Option<usize>,
}

impl Economy {
    pub(crate) fn new(starting_sun: u32, hand_limit: usize) -> Self {
        Self {
            balance: starting_sun,
            collected_total: 0,
            hand: Vec::new(),
            hand_limit,
            selected: None,
        }
    }

    pub(crate) fn balance(&self) -> u32 {
        self.balance
    }

    /// Sun gathered from pickups over the whole game.
    pub(crate) fn collected_total(&self) -> u64 {
        self.collected_total
    }

    pub(crate) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(crate) fn hand_is_empty(&self) -> bool {
        self.hand.is_empty()
    }

    pub(crate) fn card(&self, index: usize) -> Option<&CardSlot> {
        self.hand.get(index)
    }

    pub(crate) fn add_card(&mut self, kind: PlantKind) -> Result<usize, HandError> {
        if self.hand.len() >= self.hand_limit {
            return Err(HandError::HandFull);
        }
        if self.hand.iter().any(|card| card.kind == kind) {
            return Err(HandError::DuplicateCard);
        }
        self.hand.push(CardSlot {
            kind,
            remaining: Duration::ZERO,
        });
        Ok(self.hand.len() - 1)
    }

    pub(crate) fn remove_card(&mut self, index: usize) -> Result<PlantKind, HandError> {
        if index >= self.hand.len() {
            return Err(HandError::MissingCard);
        }
        let card = self.hand.remove(index);
        self.selected = None;
        Ok(card.kind)
    }

    /// Updates the selection and returns it.
    ///
    /// Requesting the card that is already selected, an unknown card, a card on
    /// cooldown or a card the balance cannot pay for clears the selection.
    pub(crate) fn select(&mut self, request: Option<usize>) -> Option<usize> {
        self.selected = match request {
            Some(index) if self.selected != Some(index) && self.affordable(index) => Some(index),
            _ => None,
        };
        self.selected
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn affordable(&self, index: usize) -> bool {
        self.hand
            .get(index)
            .is_some_and(|card| card.is_ready() && card.kind.card().cost() <= self.balance)
    }

    /// Charges the card's cost and starts its recharge.
    pub(crate) fn spend(&mut self, index: usize) -> bool {
        let balance = self.balance;
        let Some(card) = self.hand.get_mut(index) else {
            return false;
        };
        let definition = card.kind.card();
        if !card.is_ready() || definition.cost() > balance {
            return false;
        }
        card.remaining = definition.cooldown();
        self.balance = balance - definition.cost();
        true
    }

    pub(crate) fn collect(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
        self.collected_total += u64::from(amount);
    }

    pub(crate) fn refund(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    pub(crate) fn recharge(&mut self, dt: Duration) {
        for card in &mut self.hand {
            card.remaining = card.remaining.saturating_sub(dt);
        }
    }

    pub(crate) fn reset_cooldowns(&mut self) {
        for card in &mut self.hand {
            card.remaining = Duration::ZERO;
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<CardSnapshot> {
        self.hand
            .iter()
            .enumerate()
            .map(|(index, card)| CardSnapshot {
                index,
                kind: card.kind,
                cooldown_remaining: card.remaining,
            })
            .collect()
    }
}
