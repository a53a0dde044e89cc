//! Runnable bingo hall configured from the environment.
//!
//! - `BINGO_BIND`: listen address (default `0.0.0.0:8080`)
//! - `BINGO_WAIT_SECS`: lobby countdown in seconds (default 30)
//! - `BINGO_WORDS_FILE`: one word per line, replaces the built-in vocabulary
//! - `RUST_LOG`: log filter (default `info`)

use std::env;
use std::time::Duration;

use bingo::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Numeric tokens become player ids. Good enough for local play.
struct TokenAuth;

impl Authenticator for TokenAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
        let id: u64 = token
            .trim()
            .parse()
            .map_err(|_| SessionError::AuthFailed("token must be a number".into()))?;
        Ok(PlayerId(id))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let bind = env::var("BINGO_BIND").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let mut room_config = RoomConfig::default();
    if let Some(window) = env::var("BINGO_WAIT_SECS").ok().and_then(|v| parse_wait_secs(&v)) {
        room_config.wait_window = window;
    }

    let mut builder = BingoServerBuilder::new()
        .bind(&bind)
        .room_config(room_config);
    if let Ok(path) = env::var("BINGO_WORDS_FILE") {
        let text = tokio::fs::read_to_string(&path).await?;
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        info!(%path, words = words.len(), "loaded vocabulary file");
        builder = builder.words(words);
    }

    let server = builder.build(TokenAuth).await?;
    info!(addr = ?server.local_addr().ok(), "starting bingo hall");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => warn!("ctrl-c received, shutting down"),
    }
    Ok(())
}

/// Reads `BINGO_WAIT_SECS`. A value that isn't a whole number of seconds
/// is reported and the default window is kept.
fn parse_wait_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!(value, error = %e, "ignoring unparsable BINGO_WAIT_SECS");
            None
        }
    }
}

/// Logs to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wait_secs() {
        assert_eq!(parse_wait_secs("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_wait_secs(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_wait_secs("half a minute"), None);
        assert_eq!(parse_wait_secs("-3"), None);
    }

    #[tokio::test]
    async fn test_token_auth_accepts_numbers() {
        assert_eq!(TokenAuth.authenticate(" 17 ").await.unwrap(), PlayerId(17));
        assert!(matches!(
            TokenAuth.authenticate("seventeen").await,
            Err(SessionError::AuthFailed(_))
        ));
    }
}
