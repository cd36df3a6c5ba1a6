use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;

use crate::*;

/// Delay between the second flip of a pair and its resolution, sized to let
/// the presentation layer's flip animation play out.
pub const RESOLVE_DELAY_MS: i64 = 1000;

/// Valid transitions:
/// - Ready -> Active
/// - Active -> Won
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineState {
    /// Initial state, clock not running
    Ready,
    /// Round started by the first flip
    Active,
    /// Every pair found, no moves accepted until replay
    Won,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Ready
    }
}

/// Deferred comparison of a completed pair, kept as explicit state so a reset
/// can cancel it before it applies to a replaced board.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PendingResolution {
    first: CardId,
    second: CardId,
    due_at: DateTime<Utc>,
}

/// Represents a round from first flip to win.
///
/// The engine never reads a clock; callers pass `now` into the operations
/// that need one and fire [`GameEngine::resolve_due`] once
/// [`GameEngine::resolution_due_at`] has passed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEngine {
    deck: Deck,
    board: Vec<CardState>,
    selection: SmallVec<[CardId; 2]>,
    pending: Option<PendingResolution>,
    matches: PairCount,
    flips: u32,
    state: EngineState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    events: VecDeque<GameEvent>,
}

impl GameEngine {
    pub fn new(deck: Deck) -> Self {
        let board = vec![CardState::FaceDown; deck.total_cards() as usize];
        Self {
            deck,
            board,
            selection: SmallVec::new(),
            pending: None,
            matches: 0,
            flips: 0,
            state: Default::default(),
            started_at: None,
            ended_at: None,
            events: VecDeque::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Whether a resolution is pending; flips are ignored while true.
    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn pair_count(&self) -> PairCount {
        self.deck.pair_count()
    }

    pub fn total_cards(&self) -> CardCount {
        self.deck.total_cards()
    }

    pub fn card_at(&self, card: CardId) -> CardState {
        self.board[card as usize]
    }

    pub fn matches_found(&self) -> PairCount {
        self.matches
    }

    /// How many pairs are still on the board
    pub fn pairs_left(&self) -> PairCount {
        self.deck.pair_count() - self.matches
    }

    /// Successful flips made this round
    pub fn flip_count(&self) -> u32 {
        self.flips
    }

    /// Cards currently face up and awaiting resolution, in flip order.
    pub fn selection(&self) -> &[CardId] {
        &self.selection
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the pending resolution becomes due, for hosts scheduling their
    /// own timer.
    pub fn resolution_due_at(&self) -> Option<DateTime<Utc>> {
        self.pending.map(|pending| pending.due_at)
    }

    /// Whether a flip request for this card would currently be accepted.
    pub fn can_flip_at(&self, card: CardId) -> bool {
        !self.is_locked()
            && !self.state.is_finished()
            && self.deck.validate_card(card).is_ok()
            && self.board[card as usize].is_face_down()
    }

    /// How many seconds have passed since the round started, 0 if it hasn't,
    /// frozen once it is won.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        if let Some(started_at) = self.started_at {
            let end = self.ended_at.unwrap_or(now);
            (end - started_at).num_milliseconds().max(0) as f64 / 1000.0
        } else {
            0.0
        }
    }

    /// Queued notifications, in emission order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Turn a face-down card face up.
    ///
    /// Ignored while a resolution is pending, after the round is won, and for
    /// cards that are already face up or removed. The round clock starts on
    /// the first accepted flip.
    pub fn flip(&mut self, card: CardId, now: DateTime<Utc>) -> Result<FlipOutcome> {
        use FlipOutcome::*;

        let card = self.deck.validate_card(card)?;

        if self.is_locked() || self.state.is_finished() {
            return Ok(NoChange);
        }
        if !self.board[card as usize].is_face_down() {
            return Ok(NoChange);
        }

        self.board[card as usize] = CardState::FaceUp;
        let rank = self.deck[card];
        self.events.push_back(GameEvent::CardRevealed { card, rank });
        log::debug!("flip card {} ({})", card, rank);

        self.mark_started(now);
        self.flips += 1;
        self.selection.push(card);

        if self.selection.len() < 2 {
            return Ok(Revealed);
        }

        let due_at = now + Duration::milliseconds(RESOLVE_DELAY_MS);
        self.pending = Some(PendingResolution {
            first: self.selection[0],
            second: self.selection[1],
            due_at,
        });
        log::debug!("pair complete, resolution due at {}", due_at);
        Ok(PairPending)
    }

    /// Turn a selected card back down before its pair completes, clearing the
    /// most recent matching selection slot.
    pub fn unflip(&mut self, card: CardId) -> Result<UnflipOutcome> {
        use UnflipOutcome::*;

        let card = self.deck.validate_card(card)?;

        if self.is_locked() {
            return Ok(NoChange);
        }

        let Some(slot) = self.selection.iter().rposition(|&held| held == card) else {
            return Ok(NoChange);
        };

        self.selection.remove(slot);
        self.board[card as usize] = CardState::FaceDown;
        self.events.push_back(GameEvent::CardHidden { card });
        log::debug!("unflip card {}", card);
        Ok(Hidden)
    }

    /// Fire the pending resolution once its delay has elapsed.
    ///
    /// Returns `NotReady` before the due time and when nothing is pending.
    pub fn resolve_due(&mut self, now: DateTime<Utc>) -> ResolveOutcome {
        use ResolveOutcome::*;

        let Some(pending) = self.pending else {
            return NotReady;
        };
        if now < pending.due_at {
            return NotReady;
        }

        self.pending = None;
        self.selection.clear();
        let PendingResolution { first, second, .. } = pending;

        if self.deck[first] != self.deck[second] {
            self.board[first as usize] = CardState::FaceDown;
            self.board[second as usize] = CardState::FaceDown;
            self.events
                .push_back(GameEvent::CardRevertRequested { first, second });
            log::debug!("no match between cards {} and {}", first, second);
            return NoMatch;
        }

        self.board[first as usize] = CardState::Removed;
        self.board[second as usize] = CardState::Removed;
        self.events.push_back(GameEvent::MatchFound { first, second });
        self.matches += 1;
        log::debug!("matched {} of {} pairs", self.matches, self.deck.pair_count());

        if self.matches < self.deck.pair_count() {
            return Matched;
        }

        self.mark_ended(now);
        let elapsed_secs = (self.elapsed_secs(now) * 100.0).round() / 100.0;
        self.events.push_back(GameEvent::RoundWon { elapsed_secs });
        Won
    }

    /// Hard reset: replaces the board wholesale and cancels any pending
    /// resolution so a stale comparison cannot touch the new round.
    /// Undelivered notifications for the discarded round are dropped.
    pub fn replay(&mut self, deck: Deck) {
        if self.pending.is_some() {
            log::debug!("replay cancelled a pending resolution");
        }
        *self = Self::new(deck);
    }

    /// Checks if the state is initial and changes to in-progress recording
    /// the start time
    fn mark_started(&mut self, now: DateTime<Utc>) {
        if matches!(self.state, EngineState::Ready) {
            log::debug!("started at {}", now);
            self.started_at.replace(now);
            self.state = EngineState::Active;
        }
    }

    fn mark_ended(&mut self, now: DateTime<Utc>) {
        if self.state.is_finished() {
            return;
        }
        self.state = EngineState::Won;
        self.ended_at.replace(now);
        log::debug!("won at {}", now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Rank::*;

    fn t(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    fn deck(ranks: &[Rank]) -> Deck {
        Deck::from_ranks(ranks.to_vec()).unwrap()
    }

    fn drain(engine: &mut GameEngine) -> Vec<GameEvent> {
        engine.drain_events().collect()
    }

    #[test]
    fn flip_reveals_card_and_starts_clock() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.flip(0, t(0)).unwrap(), FlipOutcome::Revealed);
        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(engine.card_at(0), CardState::FaceUp);
        assert_eq!(engine.started_at(), Some(t(0)));
        assert_eq!(engine.selection(), [0]);
        assert_eq!(
            drain(&mut engine),
            vec![GameEvent::CardRevealed { card: 0, rank: Ace }]
        );
    }

    #[test]
    fn second_flip_locks_until_resolution() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));

        engine.flip(0, t(0)).unwrap();
        assert_eq!(engine.flip(1, t(100)).unwrap(), FlipOutcome::PairPending);
        assert!(engine.is_locked());
        assert_eq!(engine.resolution_due_at(), Some(t(1100)));

        // locked: a third flip must not touch anything
        assert!(!engine.can_flip_at(2));
        assert_eq!(engine.flip(2, t(200)).unwrap(), FlipOutcome::NoChange);
        assert_eq!(engine.card_at(2), CardState::FaceDown);

        assert_eq!(engine.resolve_due(t(1100)), ResolveOutcome::NoMatch);
        assert!(!engine.is_locked());
        assert!(engine.can_flip_at(2));
    }

    #[test]
    fn resolution_waits_for_the_full_delay() {
        let mut engine = GameEngine::new(deck(&[Ace, Ace, Two, Two]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();

        assert_eq!(engine.resolve_due(t(999)), ResolveOutcome::NotReady);
        assert!(engine.is_locked());
        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::Matched);
        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::NotReady);
    }

    #[test]
    fn matching_pair_is_removed() {
        let mut engine = GameEngine::new(deck(&[Ace, Ace, Two, Two]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();
        drain(&mut engine);

        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::Matched);
        assert_eq!(engine.card_at(0), CardState::Removed);
        assert_eq!(engine.card_at(1), CardState::Removed);
        assert_eq!(engine.matches_found(), 1);
        assert_eq!(engine.pairs_left(), 1);
        assert_eq!(
            drain(&mut engine),
            vec![GameEvent::MatchFound { first: 0, second: 1 }]
        );

        // removed cards ignore further flips
        assert_eq!(engine.flip(0, t(2000)).unwrap(), FlipOutcome::NoChange);
        assert_eq!(drain(&mut engine), vec![]);
    }

    #[test]
    fn mismatched_pair_reverts_face_down() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();
        drain(&mut engine);

        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::NoMatch);
        assert_eq!(engine.card_at(0), CardState::FaceDown);
        assert_eq!(engine.card_at(1), CardState::FaceDown);
        assert_eq!(engine.matches_found(), 0);
        assert_eq!(
            drain(&mut engine),
            vec![GameEvent::CardRevertRequested { first: 0, second: 1 }]
        );

        // both cards are available again
        assert_eq!(engine.flip(1, t(2000)).unwrap(), FlipOutcome::Revealed);
    }

    #[test]
    fn winning_round_reports_elapsed_time() {
        let mut engine = GameEngine::new(deck(&[Queen, Queen]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(500)).unwrap();

        assert_eq!(engine.resolve_due(t(1500)), ResolveOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);
        assert!(engine.is_finished());
        assert_eq!(
            drain(&mut engine),
            vec![
                GameEvent::CardRevealed { card: 0, rank: Queen },
                GameEvent::CardRevealed { card: 1, rank: Queen },
                GameEvent::MatchFound { first: 0, second: 1 },
                GameEvent::RoundWon { elapsed_secs: 1.5 },
            ]
        );

        // terminal: the board ignores flips until replay
        assert_eq!(engine.flip(0, t(2000)).unwrap(), FlipOutcome::NoChange);
        // clock frozen at the win
        assert_eq!(engine.elapsed_secs(t(60_000)), 1.5);
    }

    #[test]
    fn unflip_cancels_a_single_selection() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));

        engine.flip(0, t(0)).unwrap();
        drain(&mut engine);

        assert_eq!(engine.unflip(0).unwrap(), UnflipOutcome::Hidden);
        assert_eq!(engine.card_at(0), CardState::FaceDown);
        assert!(engine.selection().is_empty());
        assert_eq!(drain(&mut engine), vec![GameEvent::CardHidden { card: 0 }]);

        // the clock keeps running from the first flip
        assert_eq!(engine.started_at(), Some(t(0)));
    }

    #[test]
    fn unflip_is_ignored_while_locked_or_unselected() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));

        assert_eq!(engine.unflip(0).unwrap(), UnflipOutcome::NoChange);

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();
        assert_eq!(engine.unflip(1).unwrap(), UnflipOutcome::NoChange);
        assert_eq!(engine.card_at(1), CardState::FaceUp);
    }

    #[test]
    fn unknown_card_is_an_error() {
        let mut engine = GameEngine::new(deck(&[Ace, Ace]));

        assert_eq!(engine.flip(2, t(0)), Err(GameError::UnknownCard));
        assert_eq!(engine.unflip(9), Err(GameError::UnknownCard));
    }

    #[test]
    fn replay_cancels_a_pending_resolution() {
        let mut engine = GameEngine::new(deck(&[Ace, Ace, Two, Two]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();
        assert!(engine.is_locked());

        engine.replay(deck(&[King, King]));

        // the stale comparison must not touch the new board
        assert_eq!(engine.resolve_due(t(5000)), ResolveOutcome::NotReady);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.matches_found(), 0);
        assert_eq!(engine.card_at(0), CardState::FaceDown);
        assert!(engine.selection().is_empty());
        assert_eq!(drain(&mut engine), vec![]);
    }

    #[test]
    fn replay_resets_after_a_win() {
        let mut engine = GameEngine::new(deck(&[Ace, Ace]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(0)).unwrap();
        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::Won);

        engine.replay(deck(&[Ace, Two, Ace, Two]));

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.pair_count(), 2);
        assert_eq!(engine.flip_count(), 0);
        assert_eq!(engine.elapsed_secs(t(9000)), 0.0);
        assert_eq!(engine.flip(3, t(9000)).unwrap(), FlipOutcome::Revealed);
    }

    #[test]
    fn repeated_ranks_match_across_pairs() {
        // four aces: any two of them resolve as a pair
        let mut engine = GameEngine::new(deck(&[Ace, Ace, Ace, Ace]));

        engine.flip(0, t(0)).unwrap();
        engine.flip(3, t(0)).unwrap();
        assert_eq!(engine.resolve_due(t(1000)), ResolveOutcome::Matched);
        assert_eq!(engine.matches_found(), 1);
    }

    #[test]
    fn mid_round_snapshot_round_trips() {
        let mut engine = GameEngine::new(deck(&[Ace, Two, Ace, Two]));
        engine.flip(0, t(0)).unwrap();
        engine.flip(1, t(250)).unwrap();

        let json = serde_json::to_string(&engine).unwrap();
        let restored: GameEngine = serde_json::from_str(&json).unwrap();

        assert_eq!(engine, restored);
        assert_eq!(restored.resolution_due_at(), Some(t(1250)));
    }
}
