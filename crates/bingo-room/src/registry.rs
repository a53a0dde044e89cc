//! Room registry: creates rooms, finds them, and forwards operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use bingo_protocol::{
    CallOutcome, CardView, GameSnapshot, PlayerId, RoomEvent, RoomId, RoomListEntry,
    RoomSnapshot, RoomStatus,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{RwLock, broadcast};

use crate::actor::spawn_room;
use crate::{Room, RoomConfig, RoomError, RoomHandle, WordBank};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Every live room, keyed by id.
///
/// This is the entry point for room operations from the server layer. The
/// map lock is only held to look a room up or to insert one; the operation
/// itself runs on the room's actor.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    bank: WordBank,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(bank: WordBank, config: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            bank,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn bank(&self) -> &WordBank {
        &self.bank
    }

    /// Creates a waiting room with `host` already in it. A blank name
    /// becomes "`<host>`'s room".
    pub async fn create_room(
        &self,
        host: PlayerId,
        name: Option<&str>,
    ) -> Result<RoomSnapshot, RoomError> {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{host}'s room"),
        };

        let room = Room::new(
            room_id,
            name,
            Some(host),
            self.config.wait_window,
            self.bank.clone(),
            self.rng_for(room_id),
            SystemTime::now(),
        );
        let handle = spawn_room(room, &self.config);
        self.rooms.write().await.insert(room_id, handle.clone());
        tracing::info!(%room_id, %host, "room created");

        handle.room_snapshot().await
    }

    /// The handle for `room_id`.
    pub async fn handle(&self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))
    }

    pub async fn join_room(
        &self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id).await?.join(player).await
    }

    /// Lobby view. Starts the round if its countdown has run out.
    pub async fn room_snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id).await?.room_snapshot().await
    }

    pub async fn start_game(
        &self,
        room_id: RoomId,
        requester: PlayerId,
    ) -> Result<GameSnapshot, RoomError> {
        self.handle(room_id).await?.start(requester).await
    }

    pub async fn game_snapshot(&self, room_id: RoomId) -> Result<GameSnapshot, RoomError> {
        self.handle(room_id).await?.game_snapshot().await
    }

    pub async fn call_next_word(&self, room_id: RoomId) -> Result<CallOutcome, RoomError> {
        self.handle(room_id).await?.call_next().await
    }

    pub async fn claim_bingo(
        &self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<PlayerId, RoomError> {
        self.handle(room_id).await?.claim_bingo(player).await
    }

    pub async fn finish_game(&self, room_id: RoomId) -> Result<GameSnapshot, RoomError> {
        self.handle(room_id).await?.finish().await
    }

    pub async fn card(&self, room_id: RoomId, player: PlayerId) -> Result<CardView, RoomError> {
        self.handle(room_id).await?.card(player).await
    }

    pub async fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<broadcast::Receiver<RoomEvent>, RoomError> {
        Ok(self.handle(room_id).await?.subscribe())
    }

    /// Rooms still in their lobby, newest first.
    ///
    /// Rooms that stop answering while the list is built are left out.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut waiting = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.info().await {
                Ok(info) if info.status == RoomStatus::Waiting => waiting.push(info),
                Ok(_) => {}
                Err(e) => tracing::warn!(room_id = %handle.room_id(), error = %e, "skipping room"),
            }
        }

        waiting.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.entry.room_id.cmp(&a.entry.room_id))
        });
        waiting.into_iter().map(|info| info.entry).collect()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Shuts a room down and forgets it.
    pub async fn close_room(&self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .write()
            .await
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room closed");
        Ok(())
    }

    /// Closes every room that has gone `idle_ttl` without commands and has
    /// no observers, and forgets rooms whose actor already stopped. Returns
    /// the ids removed.
    pub async fn reap_idle(&self) -> Vec<RoomId> {
        let Some(ttl) = self.config.idle_ttl else {
            return Vec::new();
        };
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut reaped = Vec::new();
        for handle in handles {
            if handle.observer_count() > 0 {
                continue;
            }
            match handle.close_if_idle(ttl).await {
                Ok(false) => {}
                Ok(true) | Err(_) => reaped.push(handle.room_id()),
            }
        }

        if !reaped.is_empty() {
            let mut rooms = self.rooms.write().await;
            for room_id in &reaped {
                rooms.remove(room_id);
            }
            tracing::info!(reaped = reaped.len(), live = rooms.len(), "reaped idle rooms");
        }
        reaped
    }

    /// Shuts every room down.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }

    /// A room's RNG: seeded from the config (mixed with the room id) or
    /// from the thread RNG.
    fn rng_for(&self, room_id: RoomId) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(room_id.0)),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(WordBank::standard(), RoomConfig::default())
    }
}
