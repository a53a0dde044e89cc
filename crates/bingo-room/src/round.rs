//! One round of play: the call sequence, what has been called, and who won.

use std::collections::HashSet;

use bingo_protocol::{GameSnapshot, Pattern, PlayerId, RoomId, RoomStatus};

use crate::Card;

/// Per-room game state for a single round.
///
/// `called_words()` is always `words_order[..next_index]`, so the called
/// history is a prefix of the call order by construction and can neither
/// repeat nor skip a word.
#[derive(Debug, Clone)]
pub struct GameRound {
    number: u64,
    words_order: Vec<String>,
    next_index: usize,
    /// Mirrors `words_order[..next_index]` for O(1) membership checks.
    called: HashSet<String>,
    pattern: Pattern,
    winner: Option<PlayerId>,
}

impl GameRound {
    /// Starts round `number` with a shuffled call order and a pattern.
    /// Nothing is called yet.
    pub fn new(number: u64, words_order: Vec<String>, pattern: Pattern) -> Self {
        Self {
            number,
            called: HashSet::with_capacity(words_order.len()),
            words_order,
            next_index: 0,
            pattern,
            winner: None,
        }
    }

    /// Calls the next word. Returns `None`, without changing anything, once
    /// the order is exhausted.
    pub fn call_next(&mut self) -> Option<&str> {
        let word = self.words_order.get(self.next_index)?;
        self.called.insert(word.clone());
        self.next_index += 1;
        Some(word.as_str())
    }

    /// Whether `card` satisfies this round's pattern using only called
    /// words. An index outside the card counts as not satisfied.
    pub fn check_win(&self, card: &Card) -> bool {
        self.pattern
            .indices()
            .all(|idx| card.word(idx).is_some_and(|w| self.is_called(w)))
    }

    /// Records `player` as the winner.
    ///
    /// # Errors
    /// Returns the existing winner if one is already set; it is never
    /// overwritten.
    pub fn declare_winner(&mut self, player: PlayerId) -> Result<(), PlayerId> {
        match self.winner {
            Some(existing) => Err(existing),
            None => {
                self.winner = Some(player);
                Ok(())
            }
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// The full call sequence for this round.
    pub fn words_order(&self) -> &[String] {
        &self.words_order
    }

    /// Words called so far, oldest first.
    pub fn called_words(&self) -> &[String] {
        &self.words_order[..self.next_index]
    }

    pub fn last_word(&self) -> Option<&str> {
        self.called_words().last().map(String::as_str)
    }

    pub fn is_called(&self, word: &str) -> bool {
        self.called.contains(word)
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.words_order.len()
    }

    /// Game view of this round, tagged with the room's current status.
    pub fn snapshot(&self, room_id: RoomId, status: RoomStatus) -> GameSnapshot {
        GameSnapshot {
            room_id,
            round: self.number,
            status,
            last_word: self.last_word().map(str::to_string),
            called_words: self.called_words().to_vec(),
            pattern: Some(self.pattern),
            winner: self.winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("W{i}")).collect()
    }

    fn card(words: Vec<String>) -> Card {
        Card::from_words(PlayerId(1), RoomId(1), 1, words).unwrap()
    }

    /// A round whose call order is `W0..W{n}` in order.
    fn round(n: usize, pattern: Pattern) -> GameRound {
        GameRound::new(1, words(n), pattern)
    }

    #[test]
    fn test_call_next_walks_the_order() {
        let mut r = round(30, Pattern::Full);
        assert_eq!(r.call_next(), Some("W0"));
        assert_eq!(r.call_next(), Some("W1"));
        assert_eq!(r.called_words(), &["W0".to_string(), "W1".to_string()]);
        assert_eq!(r.next_index(), 2);
        assert_eq!(r.last_word(), Some("W1"));
    }

    #[test]
    fn test_call_next_exhaustion_does_not_mutate() {
        let mut r = round(25, Pattern::Full);
        for _ in 0..25 {
            assert!(r.call_next().is_some());
        }
        assert!(r.is_exhausted());
        assert_eq!(r.call_next(), None);
        assert_eq!(r.call_next(), None);
        assert_eq!(r.next_index(), 25);
        assert_eq!(r.called_words().len(), 25);
    }

    #[test]
    fn test_called_words_stay_a_prefix() {
        let mut r = round(40, Pattern::T);
        for i in 0..40 {
            r.call_next();
            assert_eq!(r.called_words(), &r.words_order()[..=i]);
            assert_eq!(r.called_words().len(), r.next_index());
        }
    }

    #[test]
    fn test_check_win_x_needs_exactly_the_diagonals() {
        // Card square i holds W{i}; the diagonals are called first.
        let card = card(words(25));
        let diagonal = [0, 6, 12, 18, 24, 4, 8, 16, 20];

        let mut order: Vec<String> = diagonal.iter().map(|i| format!("W{i}")).collect();
        let rest: Vec<String> = words(25)
            .into_iter()
            .filter(|w| !order.contains(w))
            .collect();
        order.extend(rest);
        let mut r = GameRound::new(1, order, Pattern::X);

        for _ in 0..diagonal.len() - 1 {
            r.call_next();
            assert!(!r.check_win(&card));
        }
        r.call_next();
        assert!(r.check_win(&card));
    }

    #[test]
    fn test_check_win_ignores_squares_outside_the_pattern() {
        let card = card(words(25));
        // Call everything except the top-right corner (index 4).
        let mut order: Vec<String> = words(25).into_iter().filter(|w| w != "W4").collect();
        order.push("W4".into());
        let mut r = GameRound::new(1, order, Pattern::L);
        for _ in 0..24 {
            r.call_next();
        }
        // L doesn't use (0,4).
        assert!(r.check_win(&card));

        let mut t = r.clone();
        t.pattern = Pattern::T;
        assert!(!t.check_win(&card));
    }

    #[test]
    fn test_check_win_with_nothing_called() {
        let r = round(25, Pattern::L);
        assert!(!r.check_win(&card(words(25))));
    }

    #[test]
    fn test_declare_winner_once() {
        let mut r = round(25, Pattern::Full);
        assert_eq!(r.declare_winner(PlayerId(3)), Ok(()));
        assert_eq!(r.declare_winner(PlayerId(4)), Err(PlayerId(3)));
        assert_eq!(r.winner(), Some(PlayerId(3)));
    }

    #[test]
    fn test_snapshot() {
        let mut r = GameRound::new(2, words(30), Pattern::X);
        r.call_next();
        let snap = r.snapshot(RoomId(5), RoomStatus::Running);
        assert_eq!(snap.round, 2);
        assert_eq!(snap.last_word.as_deref(), Some("W0"));
        assert_eq!(snap.pattern, Some(Pattern::X));
        assert_eq!(snap.winner, None);
    }
}
