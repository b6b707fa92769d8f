//! Runtime configuration for the siege-lane server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Settings {
    /// Bind address for HTTP + WS.
    pub server_addr: String,
    /// Wall-clock period of one simulation tick (ms).
    pub tick_ms: u64,
    /// Full-snapshot broadcast period (ms).
    pub broadcast_ms: u64,
    /// Seconds between "all ready" and match start.
    pub lobby_countdown: u32,
    /// Fixed RNG seed for every match; random per match when unset.
    pub match_seed: Option<u64>,
}

impl Settings {
    fn from_env() -> Self {
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

        let tick_ms = env::var("TICK_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(50);

        let broadcast_ms = env::var("BROADCAST_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(2000);

        let lobby_countdown = env::var("LOBBY_COUNTDOWN_SECS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(15);

        let match_seed = env::var("MATCH_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Settings {
            server_addr,
            tick_ms,
            broadcast_ms,
            lobby_countdown,
            match_seed,
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
