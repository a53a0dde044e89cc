//! Per-room event fan-out.

use bingo_protocol::RoomEvent;
use tokio::sync::broadcast;

/// Pushes [`RoomEvent`]s to everyone observing one room.
///
/// Publishing never blocks and never fails: with no observers the event is
/// simply dropped, and a slow observer lags instead of holding up the room.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<RoomEvent>,
}

impl Broadcaster {
    /// A broadcaster that buffers up to `capacity` events per observer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new observer that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current observers, ignoring delivery errors.
    pub fn publish(&self, event: RoomEvent) {
        let _ = self.sender.send(event);
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
