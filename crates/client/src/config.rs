//! Client settings loaded from TOML.

use anyhow::Result;
use craftbot_protocol::{ProtocolError, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/client.toml";

/// Startup configuration of one client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Protocol number to speak; fixed for the lifetime of the client.
    pub protocol_version: u32,
    /// Offline-mode player name.
    pub username: String,
    /// Host name sent in the handshake.
    pub server_address: String,
    /// Port sent in the handshake.
    pub server_port: u16,
    /// Tick period in milliseconds.
    pub tick_period_ms: u64,
    /// Longest gap between two position packets while standing still.
    pub position_keepalive_ms: u64,
    /// Delay between login success and the first tick.
    pub sync_grace_ms: u64,
    /// Skip physics and world tracking; only keep the session alive.
    pub afk_only: bool,
    /// Respawn automatically when health drops to zero.
    pub auto_respawn: bool,
    /// Locale sent with the client settings.
    pub locale: String,
    /// View distance in chunks sent with the client settings.
    pub view_distance: i8,
    /// Forget unacknowledged transactions after this long. Disabled when unset.
    pub transaction_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::V1_18.number(),
            username: "craftbot".to_string(),
            server_address: "127.0.0.1".to_string(),
            server_port: 25565,
            tick_period_ms: 50,
            position_keepalive_ms: 1000,
            sync_grace_ms: 500,
            afk_only: false,
            auto_respawn: false,
            locale: "en_us".to_string(),
            view_distance: 10,
            transaction_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ClientConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ClientConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!("Client config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                ClientConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Validated protocol version.
    pub fn protocol(&self) -> Result<ProtocolVersion, ProtocolError> {
        ProtocolVersion::new(self.protocol_version)
    }

    /// Tick period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    /// Keep-alive interval for position packets.
    pub fn position_keepalive(&self) -> Duration {
        Duration::from_millis(self.position_keepalive_ms)
    }

    /// Grace delay before the first tick.
    pub fn sync_grace(&self) -> Duration {
        Duration::from_millis(self.sync_grace_ms)
    }

    /// Transaction expiry, if enabled.
    pub fn transaction_timeout(&self) -> Option<Duration> {
        self.transaction_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("craftbot-{name}-{nanos}.toml"))
    }

    #[test]
    fn defaults_match_the_game_cadence() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.tick_period(), Duration::from_millis(50));
        assert_eq!(cfg.position_keepalive(), Duration::from_millis(1000));
        assert_eq!(cfg.sync_grace(), Duration::from_millis(500));
        assert_eq!(cfg.protocol().unwrap(), ProtocolVersion::V1_18);
        assert!(cfg.transaction_timeout().is_none());
        assert!(!cfg.auto_respawn);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ClientConfig::load_from_path(&temp_path("missing"));
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "protocol_version = 340\nafk_only = true\n").unwrap();
        let cfg = ClientConfig::load_from_path(&path);
        assert_eq!(cfg.protocol().unwrap(), ProtocolVersion::V1_12_2);
        assert!(cfg.afk_only);
        assert_eq!(cfg.username, "craftbot");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let path = temp_path("invalid");
        fs::write(&path, "tick_period_ms = \"fast\"").unwrap();
        assert_eq!(ClientConfig::load_from_path(&path), ClientConfig::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = temp_path("saved");
        let cfg = ClientConfig {
            username: "miner".into(),
            transaction_timeout_ms: Some(5000),
            ..ClientConfig::default()
        };
        cfg.save_to_path(&path).unwrap();
        assert_eq!(ClientConfig::load_from_path(&path), cfg);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unsupported_version_is_reported() {
        let cfg = ClientConfig {
            protocol_version: 47,
            ..ClientConfig::default()
        };
        assert!(cfg.protocol().is_err());
    }
}
