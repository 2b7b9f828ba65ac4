//! Daemon configuration file

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use xbgw_xbee::{DdoConfig, ReactorConfig, XBeeConfig};

/// Root of the TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub reactor: ReactorConfig,
    #[serde(default)]
    pub xbee: XBeeConfig,
    #[serde(default)]
    pub ddo: DdoConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Bound on each wait for a deferred reply
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}

/// Debug helpers
#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    /// Register the `echo` command
    #[serde(default = "default_true")]
    pub echo: bool,
    /// Defer echo replies by this many milliseconds (0 = immediate)
    #[serde(default)]
    pub echo_delay_ms: u64,
    /// Log every telemetry event
    #[serde(default = "default_true")]
    pub log_telemetry: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            echo: true,
            echo_delay_ms: 0,
            log_telemetry: true,
        }
    }
}

fn default_port() -> u16 {
    18090
}

fn default_response_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use xbgw_xbee::TransportConfig;

    #[test]
    fn loads_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
port = 9000

[command]
response_timeout_secs = 5

[reactor]
poll_interval_ms = 20

[xbee]
minimum_analog_change = 4
filter_digital_duplicates = false

[xbee.transport]
type = "udp"
bind = "0.0.0.0:9750"
remote = "127.0.0.1:9751"

[ddo]
max_transmission_id = 16

[debug]
echo_delay_ms = 250
"#
        )
        .unwrap();

        let config = DaemonConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.command.response_timeout_secs, 5);
        assert_eq!(config.reactor.poll_interval_ms, 20);
        assert_eq!(config.xbee.minimum_analog_change, 4);
        assert!(config.xbee.filter_analog_duplicates);
        assert!(!config.xbee.filter_digital_duplicates);
        assert!(matches!(config.xbee.transport, TransportConfig::Udp(_)));
        assert_eq!(config.ddo.max_transmission_id, 16);
        assert!(matches!(config.ddo.transport, TransportConfig::Mock(_)));
        assert!(config.debug.echo);
        assert_eq!(config.debug.echo_delay_ms, 250);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = DaemonConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 18090);
        assert_eq!(config.command.response_timeout_secs, 30);
        assert_eq!(config.reactor.poll_interval_ms, 100);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DaemonConfig::load("/nonexistent/xbgwd.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
