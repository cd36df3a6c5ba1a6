use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;

pub use card::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use generator::*;
pub use types::*;

mod card;
mod engine;
mod error;
mod event;
mod generator;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub pairs: PairCount,
}

impl GameConfig {
    pub const fn new_unchecked(pairs: PairCount) -> Self {
        Self { pairs }
    }

    pub fn new(pairs: PairCount) -> Self {
        Self::new_unchecked(pairs.clamp(1, PairCount::MAX))
    }

    pub const fn total_cards(&self) -> CardCount {
        double(self.pairs)
    }
}

/// Ordered card sequence for one round, fixed once created.
///
/// Every face value present appears an even number of cards: exactly two for
/// boards of up to thirteen pairs, more once the rank list cycles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Rank>,
    pairs: PairCount,
}

impl Deck {
    /// Builds a deck from an explicit card sequence, keeping its order.
    pub fn from_ranks(cards: Vec<Rank>) -> Result<Self> {
        if cards.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        if cards.len() % 2 != 0 {
            return Err(GameError::UnpairedRank);
        }

        let pairs: PairCount = (cards.len() / 2)
            .try_into()
            .map_err(|_| GameError::TooManyCards)?;

        let mut copies: HashMap<Rank, usize> = HashMap::new();
        for &rank in &cards {
            *copies.entry(rank).or_default() += 1;
        }
        if copies.values().any(|&count| count % 2 != 0) {
            return Err(GameError::UnpairedRank);
        }

        Ok(Self { cards, pairs })
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.pairs)
    }

    pub fn validate_card(&self, card: CardId) -> Result<CardId> {
        if (card as usize) < self.cards.len() {
            Ok(card)
        } else {
            Err(GameError::UnknownCard)
        }
    }

    pub fn pair_count(&self) -> PairCount {
        self.pairs
    }

    pub fn total_cards(&self) -> CardCount {
        self.cards.len() as CardCount
    }

    pub fn rank_at(&self, card: CardId) -> Result<Rank> {
        self.validate_card(card).map(|card| self[card])
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }
}

impl Index<CardId> for Deck {
    type Output = Rank;

    fn index(&self, card: CardId) -> &Self::Output {
        &self.cards[card as usize]
    }
}

/// Outcome of a flip request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlipOutcome {
    NoChange,
    Revealed,
    PairPending,
}

impl FlipOutcome {
    /// Whether this outcome could have caused an update to the round
    pub const fn has_update(self) -> bool {
        use FlipOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            PairPending => true,
        }
    }
}

/// Outcome of cancelling a selection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UnflipOutcome {
    NoChange,
    Hidden,
}

impl UnflipOutcome {
    /// Whether this outcome could have caused an update to the round
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Hidden => true,
        }
    }
}

/// Outcome of firing the deferred pair resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResolveOutcome {
    NotReady,
    NoMatch,
    Matched,
    Won,
}

impl ResolveOutcome {
    /// Whether this outcome could have caused an update to the round
    pub const fn has_update(self) -> bool {
        use ResolveOutcome::*;
        match self {
            NotReady => false,
            NoMatch => true,
            Matched => true,
            Won => true,
        }
    }
}
