//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are applied one at a time, so two
//! claims (or two starts, or a start racing the countdown) can never
//! interleave. Whoever's command is dequeued first wins.

use std::time::{Duration, SystemTime};

use bingo_protocol::{
    CallOutcome, CardView, GameSnapshot, PlayerId, RoomEvent, RoomId, RoomListEntry,
    RoomSnapshot, RoomStatus,
};
use bingo_tick::TickScheduler;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use crate::{Broadcaster, Room, RoomConfig, RoomError};

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// Every variant but `Shutdown` carries a reply channel; the caller sends
/// the command and waits for the answer on it.
pub(crate) enum RoomCommand {
    Join {
        player: PlayerId,
        now: SystemTime,
        reply: Reply<RoomSnapshot>,
    },
    /// Lobby view. Evaluates the countdown first.
    RoomSnapshot {
        now: SystemTime,
        reply: Reply<RoomSnapshot>,
    },
    TryAutoStart {
        now: SystemTime,
        reply: Reply<bool>,
    },
    Start {
        requester: PlayerId,
        reply: Reply<GameSnapshot>,
    },
    GameSnapshot {
        reply: Reply<GameSnapshot>,
    },
    CallNext {
        reply: Reply<CallOutcome>,
    },
    Claim {
        player: PlayerId,
        reply: Reply<PlayerId>,
    },
    Finish {
        reply: Reply<GameSnapshot>,
    },
    Card {
        player: PlayerId,
        reply: Reply<CardView>,
    },
    Info {
        now: SystemTime,
        reply: Reply<RoomInfo>,
    },
    /// Stops the actor if nobody has used or watched the room for `ttl`.
    CloseIfIdle {
        ttl: Duration,
        reply: Reply<bool>,
    },
    Shutdown,
}

/// A snapshot of room metadata, used for listing.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub status: RoomStatus,
    pub created_at: SystemTime,
    pub entry: RoomListEntry,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// This is cheap to clone: an `mpsc::Sender` and a broadcast sender. The
/// registry holds one per room and hands out clones.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
    events: Broadcaster,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Join { .. } => "Join",
            Self::RoomSnapshot { .. } => "RoomSnapshot",
            Self::TryAutoStart { .. } => "TryAutoStart",
            Self::Start { .. } => "Start",
            Self::GameSnapshot { .. } => "GameSnapshot",
            Self::CallNext { .. } => "CallNext",
            Self::Claim { .. } => "Claim",
            Self::Finish { .. } => "Finish",
            Self::Card { .. } => "Card",
            Self::Info { .. } => "Info",
            Self::CloseIfIdle { .. } => "CloseIfIdle",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a command built around a fresh reply channel and waits for the
    /// answer. A stopped actor reads as [`RoomError::Unavailable`].
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Adds `player` to the roster (resetting a finished room first).
    /// Joining twice changes nothing.
    pub async fn join(&self, player: PlayerId) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player,
            now: SystemTime::now(),
            reply,
        })
        .await
    }

    /// Lobby view as of now. Starts the round if the countdown ran out.
    pub async fn room_snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.room_snapshot_at(SystemTime::now()).await
    }

    /// Lobby view as of `now`.
    pub async fn room_snapshot_at(&self, now: SystemTime) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::RoomSnapshot { now, reply })
            .await
    }

    /// Evaluates the countdown at `now`. `Ok(true)` only for the one call
    /// that started the round.
    pub async fn try_auto_start(&self, now: SystemTime) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::TryAutoStart { now, reply })
            .await
    }

    /// Host-only early start.
    pub async fn start(&self, requester: PlayerId) -> Result<GameSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await
    }

    pub async fn game_snapshot(&self) -> Result<GameSnapshot, RoomError> {
        self.request(|reply| RoomCommand::GameSnapshot { reply })
            .await
    }

    pub async fn call_next(&self) -> Result<CallOutcome, RoomError> {
        self.request(|reply| RoomCommand::CallNext { reply }).await
    }

    /// Claims the win for `player`. Returns the winner, which is `player`.
    pub async fn claim_bingo(&self, player: PlayerId) -> Result<PlayerId, RoomError> {
        self.request(|reply| RoomCommand::Claim { player, reply })
            .await
    }

    /// Ends the round without a winner. Returns the final game view.
    pub async fn finish(&self) -> Result<GameSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Finish { reply }).await
    }

    pub async fn card(&self, player: PlayerId) -> Result<CardView, RoomError> {
        self.request(|reply| RoomCommand::Card { player, reply })
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info {
            now: SystemTime::now(),
            reply,
        })
        .await
    }

    /// Starts observing the room. Only events published after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.events.observer_count()
    }

    /// Asks the room to stop if it has had no commands for `ttl` and no
    /// observers. `Ok(true)` means the actor has exited.
    pub async fn close_if_idle(&self, ttl: Duration) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::CloseIfIdle { ttl, reply })
            .await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    receiver: mpsc::Receiver<RoomCommand>,
    events: Broadcaster,
    /// Drives the countdown while the room is waiting. Paused otherwise.
    sweep: TickScheduler,
    /// When the last player-facing command arrived.
    last_activity: Instant,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let room_id = self.room.id();
        tracing::info!(room_id = %room_id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        tracing::info!(room_id = %room_id, "room shutting down");
                        break;
                    }
                }
                info = self.sweep.wait_for_tick() => {
                    tracing::trace!(room_id = %room_id, tick = info.tick, "sweep");
                    self.auto_start(SystemTime::now());
                }
            }
            self.sync_sweep();
        }

        tracing::info!(room_id = %room_id, "room actor stopped");
    }

    /// Applies one command. Returns `false` on shutdown.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        if !matches!(cmd, RoomCommand::Info { .. } | RoomCommand::CloseIfIdle { .. }) {
            self.last_activity = Instant::now();
        }
        match cmd {
            RoomCommand::Join { player, now, reply } => {
                if self.room.join(player, now) {
                    self.publish_room_state(now);
                }
                let _ = reply.send(Ok(self.room.room_snapshot(now)));
            }
            RoomCommand::RoomSnapshot { now, reply } => {
                self.auto_start(now);
                let _ = reply.send(Ok(self.room.room_snapshot(now)));
            }
            RoomCommand::TryAutoStart { now, reply } => {
                let _ = reply.send(Ok(self.auto_start(now)));
            }
            RoomCommand::Start { requester, reply } => {
                let result = self.room.start(requester);
                match &result {
                    Ok(game) => self.publish_started(game.clone()),
                    Err(e) => self.log_rejection("start", e),
                }
                let _ = reply.send(result);
            }
            RoomCommand::GameSnapshot { reply } => {
                let _ = reply.send(Ok(self.room.game_snapshot()));
            }
            RoomCommand::CallNext { reply } => {
                let result = self.room.call_next();
                match &result {
                    Ok(outcome) if !outcome.finished => {
                        self.events
                            .publish(RoomEvent::WordCalled(self.room.game_snapshot()));
                    }
                    Ok(_) => {}
                    Err(e) => self.log_rejection("call_next", e),
                }
                let _ = reply.send(result);
            }
            RoomCommand::Claim { player, reply } => {
                let result = self.room.claim_bingo(player);
                match &result {
                    Ok(_) => self
                        .events
                        .publish(RoomEvent::GameFinished(self.room.game_snapshot())),
                    Err(e) => self.log_rejection("claim", e),
                }
                let _ = reply.send(result);
            }
            RoomCommand::Finish { reply } => {
                let result = self.room.finish().map(|changed| {
                    let game = self.room.game_snapshot();
                    if changed {
                        self.events.publish(RoomEvent::GameFinished(game.clone()));
                    }
                    game
                });
                if let Err(e) = &result {
                    self.log_rejection("finish", e);
                }
                let _ = reply.send(result);
            }
            RoomCommand::Card { player, reply } => {
                let result = self.room.card(player);
                if let Err(e) = &result {
                    self.log_rejection("card", e);
                }
                let _ = reply.send(result);
            }
            RoomCommand::Info { now, reply } => {
                let _ = reply.send(Ok(RoomInfo {
                    status: self.room.status(),
                    created_at: self.room.created_at(),
                    entry: self.room.list_entry(now),
                }));
            }
            RoomCommand::CloseIfIdle { ttl, reply } => {
                let idle = self.events.observer_count() == 0
                    && self.last_activity.elapsed() >= ttl;
                let _ = reply.send(Ok(idle));
                if idle {
                    tracing::debug!(room_id = %self.room.id(), status = %self.room.status(), "room idle");
                    return false;
                }
            }
            RoomCommand::Shutdown => return false,
        }
        true
    }

    /// Runs the countdown check and announces the start if it fired.
    fn auto_start(&mut self, now: SystemTime) -> bool {
        if !self.room.try_auto_start(now) {
            return false;
        }
        let game = self.room.game_snapshot();
        self.publish_started(game);
        true
    }

    fn publish_started(&self, game: GameSnapshot) {
        self.events.publish(RoomEvent::GameStarted(game));
        self.publish_room_state(SystemTime::now());
    }

    fn publish_room_state(&self, now: SystemTime) {
        self.events
            .publish(RoomEvent::RoomState(self.room.room_snapshot(now)));
    }

    /// The sweep only has work to do while the room is waiting.
    fn sync_sweep(&mut self) {
        let waiting = self.room.status() == RoomStatus::Waiting;
        if waiting && self.sweep.is_paused() {
            self.sweep.resume();
        } else if !waiting && !self.sweep.is_paused() {
            self.sweep.pause();
        }
    }

    fn log_rejection(&self, op: &'static str, err: &RoomError) {
        tracing::debug!(room_id = %self.room.id(), op, error = %err, "request rejected");
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `config.channel_size` controls backpressure: once the inbox is full,
/// senders wait (bounded channel).
pub(crate) fn spawn_room(room: Room, config: &RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let events = Broadcaster::new(config.event_capacity);
    let room_id = room.id();

    let actor = RoomActor {
        room,
        receiver: rx,
        events: events.clone(),
        sweep: TickScheduler::new(config.tick_config()),
        last_activity: Instant::now(),
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
        events,
    }
}
