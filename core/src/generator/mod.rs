use crate::*;
pub use random::*;

mod random;

pub trait DeckGenerator {
    fn generate(self, config: GameConfig) -> Deck;
}

/// How face values are assigned to a board's pairs before the shuffle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RankAssignment {
    /// Pair `i` carries rank `i` of the canonical A, 2..10, J, Q, K order,
    /// cycling past thirteen pairs.
    Sequential,
    /// The rank order is shuffled once per board before assignment.
    Shuffled,
}
