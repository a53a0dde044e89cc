//! The room state machine.
//!
//! [`Room`] is plain data plus transitions: no channels, no clock reads,
//! no locking. A room actor owns one and feeds it commands one at a time,
//! which is what makes every transition here "first caller wins".
//!
//! ```text
//! waiting ──(deadline passed | host start)──▶ running ──(claim | finish)──▶ finished
//!    ▲                                                                         │
//!    └────────────────────────────(join)───────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bingo_protocol::{
    CallOutcome, CardView, GameSnapshot, Pattern, PlayerId, RoomId, RoomListEntry, RoomSnapshot,
    RoomStatus,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::{Card, GameRound, RoomError, WordBank};

/// One bingo room and, once started, its current round.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    host: Option<PlayerId>,
    status: RoomStatus,
    wait_window: Duration,
    wait_deadline: SystemTime,
    created_at: SystemTime,
    /// Insertion order, no duplicates.
    players: Vec<PlayerId>,
    bank: WordBank,
    rng: StdRng,
    rounds_started: u64,
    round: Option<GameRound>,
    /// Cards for the current round only.
    cards: HashMap<PlayerId, Card>,
}

impl Room {
    /// A waiting room whose countdown ends `wait_window` after `now`.
    /// The host, if any, is the first member.
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        host: Option<PlayerId>,
        wait_window: Duration,
        bank: WordBank,
        rng: StdRng,
        now: SystemTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            host,
            status: RoomStatus::Waiting,
            wait_window,
            wait_deadline: now + wait_window,
            created_at: now,
            players: host.into_iter().collect(),
            bank,
            rng,
            rounds_started: 0,
            round: None,
            cards: HashMap::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn wait_deadline(&self) -> SystemTime {
        self.wait_deadline
    }

    /// The current (or just-finished) round.
    pub fn round(&self) -> Option<&GameRound> {
        self.round.as_ref()
    }

    /// A player's card for the current round, without dealing one.
    pub fn existing_card(&self, player: PlayerId) -> Option<&Card> {
        self.cards.get(&player)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Adds `player` to the roster. Joining a finished room first resets it
    /// to a fresh waiting lobby.
    ///
    /// Returns `true` if anything changed (reset or new member).
    pub fn join(&mut self, player: PlayerId, now: SystemTime) -> bool {
        let reset = self.status == RoomStatus::Finished;
        if reset {
            self.reset(now);
        }

        if self.is_member(player) {
            return reset;
        }
        self.players.push(player);
        tracing::info!(
            room_id = %self.id,
            %player,
            players = self.players.len(),
            status = %self.status,
            "player joined"
        );
        true
    }

    /// Starts the round if the countdown has run out. Returns `true` only
    /// for the call that actually started it.
    pub fn try_auto_start(&mut self, now: SystemTime) -> bool {
        if self.status != RoomStatus::Waiting || now < self.wait_deadline {
            return false;
        }
        self.begin_round();
        true
    }

    /// Host-only early start, regardless of the countdown.
    ///
    /// # Errors
    /// - [`RoomError::NotHost`] if `requester` isn't the host.
    /// - [`RoomError::InvalidState`] if the room isn't waiting.
    pub fn start(&mut self, requester: PlayerId) -> Result<GameSnapshot, RoomError> {
        if self.host != Some(requester) {
            return Err(RoomError::NotHost(requester, self.id));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::InvalidState(format!(
                "cannot start a room that is {}",
                self.status
            )));
        }
        self.begin_round();
        Ok(self.game_snapshot())
    }

    /// Calls the next word of the running round.
    ///
    /// Once every word has been called this keeps answering
    /// `finished: true` and changes nothing.
    pub fn call_next(&mut self) -> Result<CallOutcome, RoomError> {
        let round = match self.round.as_mut() {
            Some(round) if self.status == RoomStatus::Running => round,
            _ => {
                return Err(RoomError::InvalidState(format!(
                    "cannot call words in a room that is {}",
                    self.status
                )));
            }
        };

        let word = round.call_next().map(str::to_string);
        Ok(CallOutcome {
            finished: word.is_none(),
            word,
            called_words: round.called_words().to_vec(),
        })
    }

    /// Arbitrates a claim. On success `player` is the round's one winner
    /// and the room is finished.
    ///
    /// The winner check comes first, so a claim that lost a race learns who
    /// beat it rather than that the room is no longer running.
    ///
    /// # Errors
    /// `AlreadyWon`, `InvalidState`, `NoCard` or `PatternNotMet`, checked in
    /// that order.
    pub fn claim_bingo(&mut self, player: PlayerId) -> Result<PlayerId, RoomError> {
        if let Some(winner) = self.round.as_ref().and_then(GameRound::winner) {
            return Err(RoomError::AlreadyWon(winner));
        }
        let round = match self.round.as_mut() {
            Some(round) if self.status == RoomStatus::Running => round,
            _ => {
                return Err(RoomError::InvalidState(format!(
                    "cannot claim in a room that is {}",
                    self.status
                )));
            }
        };
        let card = self.cards.get(&player).ok_or(RoomError::NoCard(player))?;
        if !round.check_win(card) {
            return Err(RoomError::PatternNotMet(player));
        }

        round
            .declare_winner(player)
            .map_err(RoomError::AlreadyWon)?;
        self.status = RoomStatus::Finished;
        tracing::info!(
            room_id = %self.id,
            winner = %player,
            round = round.number(),
            called = round.next_index(),
            "bingo"
        );
        Ok(player)
    }

    /// Ends the running round without a winner.
    ///
    /// Returns `true` if this call finished the room, `false` if it was
    /// already finished.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] if the room is still waiting.
    pub fn finish(&mut self) -> Result<bool, RoomError> {
        match self.status {
            RoomStatus::Waiting => Err(RoomError::InvalidState(
                "cannot finish a room that has not started".into(),
            )),
            RoomStatus::Finished => Ok(false),
            RoomStatus::Running => {
                self.status = RoomStatus::Finished;
                tracing::info!(room_id = %self.id, "round finished without a winner");
                Ok(true)
            }
        }
    }

    /// The member's card for the current round, dealt on first request for
    /// players who joined after the round began.
    ///
    /// # Errors
    /// [`RoomError::NoCard`] for non-members and when there is no round.
    pub fn card(&mut self, player: PlayerId) -> Result<CardView, RoomError> {
        let Some(round) = &self.round else {
            return Err(RoomError::NoCard(player));
        };
        if !self.is_member(player) {
            return Err(RoomError::NoCard(player));
        }

        let (id, number) = (self.id, round.number());
        let card = self
            .cards
            .entry(player)
            .or_insert_with(|| Card::deal(player, id, number, &self.bank, &mut self.rng));
        Ok(card.view())
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Whole seconds left on the countdown; zero once it ran out or the
    /// room is past waiting.
    pub fn remaining_seconds(&self, now: SystemTime) -> u64 {
        if self.status != RoomStatus::Waiting {
            return 0;
        }
        self.wait_deadline
            .duration_since(now)
            .map(|left| left.as_secs())
            .unwrap_or(0)
    }

    /// Lobby view. Does not evaluate the countdown; callers run
    /// [`Room::try_auto_start`] first.
    pub fn room_snapshot(&self, now: SystemTime) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id,
            name: self.name.clone(),
            host: self.host,
            status: self.status,
            remaining_seconds: self.remaining_seconds(now),
            wait_end_time: unix_millis(self.wait_deadline),
            players: self.players.clone(),
        }
    }

    /// Game view. Before the first round this is an empty snapshot.
    pub fn game_snapshot(&self) -> GameSnapshot {
        match &self.round {
            Some(round) => round.snapshot(self.id, self.status),
            None => GameSnapshot::empty(self.id, self.status),
        }
    }

    pub fn list_entry(&self, now: SystemTime) -> RoomListEntry {
        RoomListEntry {
            room_id: self.id,
            name: self.name.clone(),
            player_count: self.players.len(),
            remaining_seconds: self.remaining_seconds(now),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// waiting → running: shuffle the call order, pick a pattern, deal every
    /// member a card and call the first word.
    fn begin_round(&mut self) {
        self.rounds_started += 1;
        let number = self.rounds_started;
        let order = self.bank.shuffled(&mut self.rng);
        let pattern = Pattern::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Pattern::Full);

        let mut round = GameRound::new(number, order, pattern);
        round.call_next();

        self.cards = self
            .players
            .iter()
            .map(|&p| (p, Card::deal(p, self.id, number, &self.bank, &mut self.rng)))
            .collect();
        self.round = Some(round);
        self.status = RoomStatus::Running;

        tracing::info!(
            room_id = %self.id,
            round = number,
            pattern = pattern.key(),
            players = self.players.len(),
            "round started"
        );
    }

    /// finished → waiting with a fresh countdown. Roster, cards and round
    /// are all dropped.
    fn reset(&mut self, now: SystemTime) {
        self.status = RoomStatus::Waiting;
        self.wait_deadline = now + self.wait_window;
        self.players.clear();
        self.cards.clear();
        self.round = None;
        tracing::info!(room_id = %self.id, "room reset for another round");
    }
}

fn unix_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
