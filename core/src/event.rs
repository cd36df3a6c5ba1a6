use serde::{Deserialize, Serialize};

use crate::{CardId, Rank};

/// Notifications the engine queues for its presentation layer.
///
/// The engine holds card identities only; the subscriber maps ids onto its
/// own widgets and drives animation and audio cues from these.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A card was turned face up.
    CardRevealed { card: CardId, rank: Rank },
    /// A selection was cancelled and the card turned back down.
    CardHidden { card: CardId },
    /// A resolved pair matched and left play.
    MatchFound { first: CardId, second: CardId },
    /// A resolved pair did not match; turn both cards back down.
    CardRevertRequested { first: CardId, second: CardId },
    /// The final pair was matched.
    RoundWon { elapsed_secs: f64 },
}
