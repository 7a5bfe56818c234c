#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistent leaderboard of final scores with a small filter language.

pub mod filter;
pub mod store;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use filter::Query;
pub use store::{JsonFileStore, MemoryStore, PlayerStore, StoreError};

/// Maximum number of records kept on the leaderboard.
pub const CAPACITY: usize = 500;

/// Record of one finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Name entered by the player.
    pub nickname: String,
    /// Final score of the game.
    pub score: u64,
}

impl Player {
    /// Creates a new record.
    #[must_use]
    pub fn new(nickname: impl Into<String>, score: u64) -> Self {
        Self {
            nickname: nickname.into(),
            score,
        }
    }
}

/// Records installed when the store holds nothing usable.
#[must_use]
pub fn seed_players() -> Vec<Player> {
    vec![
        Player::new("Alice", 1500),
        Player::new("Bob", 2500),
        Player::new("Charlie", 1000),
        Player::new("David", 3000),
    ]
}

/// Failures surfaced while recording a score.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Records require a non-empty nickname.
    #[error("nickname must not be empty")]
    EmptyNickname,
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Leaderboard backed by a [`PlayerStore`].
#[derive(Debug)]
pub struct Leaderboard<S> {
    store: S,
    players: Vec<Player>,
    capacity: usize,
}

impl<S: PlayerStore> Leaderboard<S> {
    /// Loads the records held by `store`.
    ///
    /// An unreadable or empty store is replaced by [`seed_players`], which are
    /// persisted straight away.
    pub fn open(store: S) -> Result<Self, StoreError> {
        Self::with_capacity(store, CAPACITY)
    }

    /// Loads the records held by `store`, keeping at most `capacity` of them.
    pub fn with_capacity(mut store: S, capacity: usize) -> Result<Self, StoreError> {
        let players = match store.load_players() {
            Ok(players) if !players.is_empty() => players,
            Ok(_) => {
                warn!("leaderboard is empty, installing seed records");
                Vec::new()
            }
            Err(error) => {
                warn!("leaderboard could not be loaded ({error}), installing seed records");
                Vec::new()
            }
        };

        let mut leaderboard = Self {
            store,
            players,
            capacity,
        };
        if leaderboard.players.is_empty() {
            leaderboard.players = seed_players();
        } else {
            let _ = leaderboard.enforce_capacity(None);
        }
        leaderboard.store.save_players(&leaderboard.players)?;
        Ok(leaderboard)
    }

    /// Adds a record and persists the board.
    ///
    /// Returns `false` when the new record scored too low to stay on a full board.
    pub fn record(&mut self, player: Player) -> Result<bool, LeaderboardError> {
        if player.nickname.is_empty() {
            return Err(LeaderboardError::EmptyNickname);
        }
        info!("recording {} with {} points", player.nickname, player.score);
        self.players.push(player);
        let kept = self.enforce_capacity(Some(self.players.len() - 1));
        self.store.save_players(&self.players)?;
        Ok(kept)
    }

    /// Records in insertion order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Records matching `query`, best score first.
    #[must_use]
    pub fn search(&self, query: &Query) -> Vec<&Player> {
        let mut matches: Vec<&Player> = self
            .players
            .iter()
            .filter(|player| query.matches(player))
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evicts the lowest scores until the board fits, reporting whether `tracked` survived.
    fn enforce_capacity(&mut self, mut tracked: Option<usize>) -> bool {
        let mut kept = true;
        while self.players.len() > self.capacity {
            let Some((lowest, _)) = self
                .players
                .iter()
                .enumerate()
                .min_by_key(|(_, player)| player.score)
            else {
                break;
            };
            match tracked {
                Some(index) if index == lowest => {
                    kept = false;
                    tracked = None;
                }
                Some(index) if index > lowest => tracked = Some(index - 1),
                _ => {}
            }
            let evicted = self.players.remove(lowest);
            info!("evicted {} with {} points", evicted.nickname, evicted.score);
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_is_seeded_and_persisted() {
        let leaderboard = Leaderboard::open(MemoryStore::default()).expect("open");
        assert_eq!(leaderboard.players(), seed_players().as_slice());
        assert_eq!(leaderboard.store().players(), seed_players().as_slice());
    }

    #[test]
    fn failing_store_falls_back_to_seed() {
        let leaderboard = Leaderboard::open(MemoryStore::unreadable()).expect("open");
        assert_eq!(leaderboard.players().len(), 4);
    }

    #[test]
    fn empty_nickname_is_rejected() {
        let mut leaderboard = Leaderboard::open(MemoryStore::default()).expect("open");
        assert!(matches!(
            leaderboard.record(Player::new("", 10)),
            Err(LeaderboardError::EmptyNickname)
        ));
        assert_eq!(leaderboard.players().len(), 4);
    }

    #[test]
    fn overflow_evicts_the_first_lowest_score() {
        let store = MemoryStore::with_players(vec![
            Player::new("a", 5),
            Player::new("b", 1),
            Player::new("c", 1),
        ]);
        let mut leaderboard = Leaderboard::with_capacity(store, 3).expect("open");

        assert!(leaderboard.record(Player::new("d", 7)).expect("record"));
        let names: Vec<&str> = leaderboard
            .players()
            .iter()
            .map(|player| player.nickname.as_str())
            .collect();
        assert_eq!(names, ["a", "c", "d"]);

        assert!(!leaderboard.record(Player::new("e", 0)).expect("record"));
        assert_eq!(leaderboard.store().players(), leaderboard.players());
    }

    #[test]
    fn oversized_store_is_trimmed_on_open() {
        let players = (0..6).map(|i| Player::new(format!("p{i}"), i)).collect();
        let store = MemoryStore::with_players(players);
        let leaderboard = Leaderboard::with_capacity(store, 4).expect("open");
        let scores: Vec<u64> = leaderboard.players().iter().map(|p| p.score).collect();
        assert_eq!(scores, [2, 3, 4, 5]);
    }

    #[test]
    fn search_orders_by_score() {
        let leaderboard = Leaderboard::open(MemoryStore::default()).expect("open");
        let all: Vec<&str> = leaderboard
            .search(&Query::parse(""))
            .into_iter()
            .map(|player| player.nickname.as_str())
            .collect();
        assert_eq!(all, ["David", "Bob", "Alice", "Charlie"]);
    }
}
