//! Per-connection handler: handshake, auth, commands and pushed events.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get PlayerId
//!   3. Send HandshakeAck → player is connected
//!   4. Loop: answer inbound commands, forward events from the observed room

use std::sync::Arc;
use std::time::Duration;

use bingo_protocol::{
    ClaimOutcome, Codec, Command, Envelope, Payload, PlayerId, ProtocolError, Reply, RoomEvent,
    RoomId, SystemMessage,
};
use bingo_room::RoomError;
use bingo_session::{Authenticator, SessionError};
use bingo_transport::{Connection, WebSocketConnection};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use crate::BingoError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a new connection has to send its handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that removes a player's session when the handler exits.
///
/// Since `Drop` is synchronous, we spawn a fire-and-forget task for the
/// async lock. Room rosters are not touched.
struct SessionGuard<A: Authenticator, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for SessionGuard<A, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut sessions = state.sessions.lock().await;
            let _ = sessions.disconnect(player_id);
        });
    }
}

/// Whether the message loop should keep going.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// One authenticated connection.
struct Client<A: Authenticator, C: Codec> {
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
    player_id: PlayerId,
    seq: u64,
    start: Instant,
    /// The room this connection observes. At most one.
    observing: Option<RoomId>,
    /// Events of `observing`.
    events: Option<broadcast::Receiver<RoomEvent>>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), BingoError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");
    let start = Instant::now();

    // --- Step 1: Handshake ---
    let player_id = perform_handshake(&conn, &state, start).await?;

    // Create the session before the guard. If creation fails there is
    // nothing to clean up.
    let created = {
        let mut sessions = state.sessions.lock().await;
        let created = sessions.create(player_id).map(|_| ());
        created.map(|()| sessions.len())
    };
    let live_sessions = match created {
        Ok(count) => count,
        Err(e) => {
            let code = match e {
                SessionError::CapacityReached(_) => 503,
                _ => 409,
            };
            send_error(&conn, &state.codec, code, &e.to_string(), 0, start).await?;
            return Err(BingoError::Session(e));
        }
    };
    let _guard = SessionGuard {
        player_id,
        state: Arc::clone(&state),
    };

    send_envelope(
        &conn,
        &state.codec,
        Envelope {
            seq: 0,
            timestamp: elapsed_ms(start),
            reply_to: None,
            payload: Payload::System(SystemMessage::HandshakeAck {
                player_id,
                server_time: elapsed_ms(start),
            }),
        },
    )
    .await?;
    tracing::info!(%conn_id, %player_id, sessions = live_sessions, "player connected");

    // --- Step 2: Message loop ---
    let mut client = Client {
        conn,
        state,
        player_id,
        seq: 1,
        start,
        observing: None,
        events: None,
    };
    client.run().await

    // _guard drops here → session removal fires.
}

impl<A: Authenticator, C: Codec> Client<A, C> {
    async fn run(&mut self) -> Result<(), BingoError> {
        let idle_timeout = self.state.idle_timeout;
        let idle = tokio::time::sleep(idle_timeout);
        tokio::pin!(idle);
        let player_id = self.player_id;

        loop {
            tokio::select! {
                incoming = self.conn.recv() => {
                    let data = match incoming {
                        Ok(Some(data)) => data,
                        Ok(None) => {
                            tracing::info!(%player_id, "connection closed cleanly");
                            break;
                        }
                        Err(e) => {
                            tracing::debug!(%player_id, error = %e, "recv error");
                            break;
                        }
                    };
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    if self.handle_frame(&data).await? == Flow::Close {
                        break;
                    }
                }
                event = next_event(&mut self.events) => {
                    self.forward_event(event).await?;
                }
                () = &mut idle => {
                    tracing::info!(%player_id, "connection timed out");
                    break;
                }
            }
        }
        let _ = self.conn.close().await;
        Ok(())
    }

    /// Decodes one inbound frame and answers it.
    async fn handle_frame(&mut self, data: &[u8]) -> Result<Flow, BingoError> {
        let envelope: Envelope = match self.state.codec.decode(data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(player_id = %self.player_id, error = %e, "failed to decode envelope");
                let seq = self.next_seq();
                send_error(
                    &self.conn,
                    &self.state.codec,
                    400,
                    &format!("malformed message: {e}"),
                    seq,
                    self.start,
                )
                .await?;
                return Ok(Flow::Continue);
            }
        };

        match envelope.payload {
            Payload::System(msg) => self.handle_system(msg).await,
            Payload::Command(cmd) => {
                let reply = self.dispatch(cmd).await;
                self.send(Payload::Reply(reply), Some(envelope.seq)).await?;
                Ok(Flow::Continue)
            }
            Payload::Reply(_) | Payload::Event(_) => {
                let seq = self.next_seq();
                send_error(
                    &self.conn,
                    &self.state.codec,
                    400,
                    "clients may only send commands and system messages",
                    seq,
                    self.start,
                )
                .await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_system(&mut self, msg: SystemMessage) -> Result<Flow, BingoError> {
        match msg {
            SystemMessage::Heartbeat { client_time } => {
                let server_time = elapsed_ms(self.start);
                self.send(
                    Payload::System(SystemMessage::HeartbeatAck {
                        client_time,
                        server_time,
                    }),
                    None,
                )
                .await?;
            }
            SystemMessage::Disconnect { reason } => {
                tracing::info!(player_id = %self.player_id, %reason, "client disconnected");
                return Ok(Flow::Close);
            }
            _ => {
                tracing::debug!(player_id = %self.player_id, "ignoring unexpected system message");
            }
        }
        Ok(Flow::Continue)
    }

    /// Runs one command against the room registry and shapes the reply.
    async fn dispatch(&mut self, cmd: Command) -> Reply {
        let state = Arc::clone(&self.state);
        let rooms = &state.rooms;
        let player = self.player_id;

        let result = match cmd {
            Command::CreateRoom { name } => match rooms.create_room(player, name.as_deref()).await {
                Ok(snapshot) => self.observe(snapshot.room_id).await.map(|()| Reply::Room(snapshot)),
                Err(e) => Err(e),
            },
            Command::JoinRoom { room_id } => match rooms.join_room(room_id, player).await {
                Ok(snapshot) => self.observe(room_id).await.map(|()| Reply::Room(snapshot)),
                Err(e) => Err(e),
            },
            Command::ListRooms => Ok(Reply::RoomList(rooms.list_rooms().await)),
            Command::RoomState { room_id } => rooms.room_snapshot(room_id).await.map(Reply::Room),
            Command::StartGame { room_id } => rooms.start_game(room_id, player).await.map(Reply::Game),
            Command::GameState { room_id } => rooms.game_snapshot(room_id).await.map(Reply::Game),
            Command::CallNext { room_id } => rooms.call_next_word(room_id).await.map(Reply::Called),
            Command::ClaimBingo { room_id } => {
                return match rooms.claim_bingo(room_id, player).await {
                    Ok(winner) => Reply::Claim(ClaimOutcome::won(winner)),
                    Err(e) => {
                        tracing::debug!(%player, %room_id, error = %e, "claim rejected");
                        Reply::Claim(ClaimOutcome::rejected(e.rejection(), e.to_string(), e.winner()))
                    }
                };
            }
            Command::FinishGame { room_id } => rooms.finish_game(room_id).await.map(Reply::Finished),
            Command::GetCard { room_id } => rooms.card(room_id, player).await.map(Reply::Card),
        };

        result.unwrap_or_else(|e| {
            tracing::debug!(%player, error = %e, "command rejected");
            Reply::Rejected {
                reason: e.rejection(),
                message: e.to_string(),
                winner: e.winner(),
            }
        })
    }

    /// Points this connection at `room_id`'s events. The receiver for any
    /// earlier room is dropped.
    async fn observe(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let events = self.state.rooms.subscribe(room_id).await?;
        if let Some(previous) = self.observing.replace(room_id).filter(|&p| p != room_id) {
            tracing::debug!(player_id = %self.player_id, from = %previous, to = %room_id, "switched rooms");
        }
        self.events = Some(events);
        Ok(())
    }

    async fn forward_event(&mut self, event: Result<RoomEvent, RecvError>) -> Result<(), BingoError> {
        match event {
            Ok(event) => self.send(Payload::Event(event), None).await,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(player_id = %self.player_id, skipped, "observer lagged, events dropped");
                Ok(())
            }
            Err(RecvError::Closed) => {
                self.events = None;
                Ok(())
            }
        }
    }

    async fn send(&mut self, payload: Payload, reply_to: Option<u64>) -> Result<(), BingoError> {
        let envelope = Envelope {
            seq: self.next_seq(),
            timestamp: elapsed_ms(self.start),
            reply_to,
            payload,
        };
        send_envelope(&self.conn, &self.state.codec, envelope).await
    }

    fn next_seq(&mut self) -> u64 {
        next_seq(&mut self.seq)
    }
}

/// Waits for the next event, or forever when nothing is observed.
async fn next_event(
    events: &mut Option<broadcast::Receiver<RoomEvent>>,
) -> Result<RoomEvent, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Performs the initial handshake: receive Handshake, validate, auth.
async fn perform_handshake<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    start: Instant,
) -> Result<PlayerId, BingoError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(BingoError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = match state.codec.decode(&data) {
        Ok(env) => env,
        Err(e) => {
            send_error(conn, &state.codec, 400, "malformed handshake", 0, start).await?;
            return Err(e.into());
        }
    };

    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => (version, token),
        _ => {
            send_error(conn, &state.codec, 400, "expected Handshake", 0, start).await?;
            return Err(ProtocolError::InvalidMessage("first message must be Handshake".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            0,
            start,
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let token = token.as_deref().unwrap_or("");
    match state.auth.authenticate(token).await {
        Ok(player_id) => Ok(player_id),
        Err(e) => {
            send_error(conn, &state.codec, 401, "unauthorized", 0, start).await?;
            Err(BingoError::Session(e))
        }
    }
}

async fn send_envelope(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    envelope: Envelope,
) -> Result<(), BingoError> {
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends a SystemMessage::Error envelope to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
    seq: u64,
    start: Instant,
) -> Result<(), BingoError> {
    let envelope = Envelope {
        seq,
        timestamp: elapsed_ms(start),
        reply_to: None,
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    send_envelope(conn, codec, envelope).await
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_counts_up() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }

    #[tokio::test]
    async fn test_next_event_pends_without_subscription() {
        let mut none = None;
        let waited = tokio::time::timeout(Duration::from_millis(20), next_event(&mut none)).await;
        assert!(waited.is_err());
    }
}
