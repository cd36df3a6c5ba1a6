use super::*;

/// Builds a uniformly shuffled board from a seed, with a choice of rank
/// assignment policy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomDeckGenerator {
    seed: u64,
    assignment: RankAssignment,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64, assignment: RankAssignment) -> Self {
        Self { seed, assignment }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(self, config: GameConfig) -> Deck {
        use rand::prelude::*;

        let pairs = config.pairs as usize;
        if pairs > Rank::ALL.len() {
            log::warn!(
                "Face values repeat, requested {} pairs but only {} ranks are distinct",
                pairs,
                Rank::ALL.len()
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut base = Rank::ALL;
        if matches!(self.assignment, RankAssignment::Shuffled) {
            base.shuffle(&mut rng);
        }

        let mut cards = Vec::with_capacity(config.total_cards() as usize);
        for pair in 0..pairs {
            let rank = base[pair % base.len()];
            cards.push(rank);
            cards.push(rank);
        }
        cards.shuffle(&mut rng);
        log::debug!("generated {} card deck from seed {}", cards.len(), self.seed);

        Deck {
            cards,
            pairs: config.pairs,
        }
    }
}
