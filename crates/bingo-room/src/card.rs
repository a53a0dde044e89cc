//! Player cards.

use bingo_protocol::{CardView, PlayerId, RoomId, CARD_CELLS, GRID_SIZE};
use rand::Rng;

use crate::WordBank;

/// A player's 5x5 grid for one round of one room.
///
/// Dealt once and never changed. Words are distinct and stored row-major,
/// so square `(r, c)` is `words[r * 5 + c]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    owner: PlayerId,
    room_id: RoomId,
    round: u64,
    words: Vec<String>,
}

impl Card {
    /// Deals a fresh card: 25 distinct words drawn from `bank`.
    pub fn deal<R: Rng + ?Sized>(
        owner: PlayerId,
        room_id: RoomId,
        round: u64,
        bank: &WordBank,
        rng: &mut R,
    ) -> Self {
        Self {
            owner,
            room_id,
            round,
            words: bank.sample(CARD_CELLS, rng),
        }
    }

    /// Builds a card from known words. Used to replay or inspect cards;
    /// returns `None` unless exactly 25 words are given.
    pub fn from_words(
        owner: PlayerId,
        room_id: RoomId,
        round: u64,
        words: Vec<String>,
    ) -> Option<Self> {
        (words.len() == CARD_CELLS).then_some(Self {
            owner,
            room_id,
            round,
            words,
        })
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// All 25 words, row-major.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The word at linear index `idx`, if on the card.
    pub fn word(&self, idx: usize) -> Option<&str> {
        self.words.get(idx).map(String::as_str)
    }

    /// The word at `(row, col)`, if on the card.
    pub fn word_at(&self, row: usize, col: usize) -> Option<&str> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.word(row * GRID_SIZE + col)
    }

    /// The grid one row at a time.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.words.chunks(GRID_SIZE)
    }

    /// The wire form shown to the owner.
    pub fn view(&self) -> CardView {
        CardView {
            owner: self.owner,
            room_id: self.room_id,
            round: self.round,
            words: self.words.clone(),
        }
    }
}
