/// Number of distinct pairs on a board.
pub type PairCount = u8;

/// Count type used for card totals.
pub type CardCount = u16;

/// Identity of a card: its index within the board's ordered sequence.
pub type CardId = u16;

pub const fn double(pairs: PairCount) -> CardCount {
    let pairs = pairs as CardCount;
    pairs.saturating_mul(2)
}
