use serde::{Deserialize, Serialize};
use std::fmt;

/// Face value a card is matched by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Every rank, in the canonical A, 2..10, J, Q, K order.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Rank::*;
        f.write_str(match self {
            Ace => "A",
            Two => "2",
            Three => "3",
            Four => "4",
            Five => "5",
            Six => "6",
            Seven => "7",
            Eight => "8",
            Nine => "9",
            Ten => "10",
            Jack => "J",
            Queen => "Q",
            King => "K",
        })
    }
}

/// Player-visible state the engine stores for each card.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CardState {
    FaceDown,
    FaceUp,
    Removed,
}

impl CardState {
    pub const fn is_face_down(self) -> bool {
        matches!(self, Self::FaceDown)
    }

    /// Whether the card has not been matched away yet.
    pub const fn is_in_play(self) -> bool {
        !matches!(self, Self::Removed)
    }
}

impl Default for CardState {
    fn default() -> Self {
        Self::FaceDown
    }
}
