use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Unknown card id")]
    UnknownCard,
    #[error("Deck contains an unpaired rank")]
    UnpairedRank,
    #[error("Deck has no cards")]
    EmptyDeck,
    #[error("Too many cards for one board")]
    TooManyCards,
}

pub type Result<T> = std::result::Result<T, GameError>;
