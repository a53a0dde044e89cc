//! The word bank: every word a card square or a call can hold.

use std::collections::HashSet;
use std::sync::Arc;

use bingo_protocol::CARD_CELLS;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::ConfigError;

/// Built-in vocabulary used when the server isn't given its own list.
const STANDARD_WORDS: &[&str] = &[
    "SUN", "MOON", "STAR", "SKY", "CLOUD", "AIR", "WIND", "WATER", "RIVER",
    "LAKE", "SEA", "OCEAN", "BEACH", "SAND", "MOUNTAIN", "FOREST", "TREE",
    "FLOWER", "LEAF", "GRASS", "FIRE", "ROCK", "EARTH", "SNOW", "ICE",
    "THUNDER", "LIGHTNING", "RAIN", "STORM", "MIST", "NIGHT", "DAY",
    "DOG", "CAT", "BIRD", "FISH", "HORSE", "COW", "SHEEP", "GOAT",
    "PIG", "TURTLE", "FROG", "FOX", "BEAR", "WOLF", "LION", "TIGER",
    "ELEPHANT", "DOLPHIN", "BUTTERFLY", "BEE",
    "HOUSE", "CITY", "VILLAGE", "FIELD", "ROAD", "BRIDGE", "ISLAND",
    "VALLEY", "DESERT", "WATERFALL", "VOLCANO", "GARDEN", "PARK",
    "TABLE", "CHAIR", "BED", "DOOR", "WINDOW", "BOOK", "PENCIL",
    "CLOCK", "KEY", "PHONE", "BAG", "SHOE", "HAT", "BALL",
    "BOX", "LANTERN", "BOTTLE", "GLASS", "PLATE", "FORK",
];

/// An immutable catalog of distinct words.
///
/// Cheap to clone: every room shares the same `Arc`'d list.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Arc<[String]>,
}

impl WordBank {
    /// Builds a bank from `words`, dropping blanks and duplicates (first
    /// occurrence wins).
    ///
    /// # Errors
    /// [`ConfigError::WordBankTooSmall`] if fewer than 25 distinct words
    /// remain, since no card could be dealt from it.
    pub fn new<I, S>(words: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.into().trim().to_string())
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();

        if words.len() < CARD_CELLS {
            return Err(ConfigError::WordBankTooSmall {
                size: words.len(),
                required: CARD_CELLS,
            });
        }

        Ok(Self {
            words: words.into(),
        })
    }

    /// The built-in vocabulary.
    pub fn standard() -> Self {
        Self {
            words: STANDARD_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`: construction rejects small banks.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` is in the bank.
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Draws `n` distinct words without replacement, in random order.
    /// Returns fewer than `n` only if the bank is smaller than `n`.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<String> {
        self.words.choose_multiple(rng, n).cloned().collect()
    }

    /// The whole bank in a fresh random order: a round's call sequence.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut order = self.words.to_vec();
        order.shuffle(rng);
        order
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("W{i}")).collect()
    }

    #[test]
    fn test_standard_bank_is_large_enough_and_distinct() {
        let bank = WordBank::standard();
        assert!(bank.len() >= CARD_CELLS);
        let distinct: HashSet<&str> = STANDARD_WORDS.iter().copied().collect();
        assert_eq!(distinct.len(), STANDARD_WORDS.len());
    }

    #[test]
    fn test_new_rejects_small_bank() {
        let err = WordBank::new(numbered(24)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::WordBankTooSmall { size: 24, required: 25 }
        ));
    }

    #[test]
    fn test_new_counts_distinct_words_only() {
        let mut words = numbered(24);
        words.push("W0".into());
        words.push("  ".into());
        assert!(WordBank::new(words).is_err());

        let mut words = numbered(25);
        words.push(" W3 ".into());
        let bank = WordBank::new(words).unwrap();
        assert_eq!(bank.len(), 25);
    }

    #[test]
    fn test_sample_is_distinct() {
        let bank = WordBank::new(numbered(30)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = bank.sample(25, &mut rng);
        assert_eq!(drawn.len(), 25);
        let set: HashSet<&String> = drawn.iter().collect();
        assert_eq!(set.len(), 25);
        assert!(drawn.iter().all(|w| bank.contains(w)));
    }

    #[test]
    fn test_shuffled_is_a_permutation() {
        let bank = WordBank::new(numbered(75)).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut order = bank.shuffled(&mut rng);
        assert_eq!(order.len(), 75);
        order.sort();
        let mut expected = numbered(75);
        expected.sort();
        assert_eq!(order, expected);
    }
}
