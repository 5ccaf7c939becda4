use std::time::Duration;

/// Relay configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the WebSocket server binds to. If taken, the server steps to the
    /// next port.
    pub port: u16,
    /// How often each connection is pushed the active room listing.
    pub room_list_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            room_list_interval: Duration::from_millis(
                std::env::var("ROOM_LIST_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
            ),
        }
    }
}
