use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Node settings, loadable from TOML. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Directory for post records. `None` keeps them in memory.
    pub data_dir: Option<PathBuf>,
    pub max_connections: usize,
}

impl NodeConfig {
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            data_dir: None,
            max_connections: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = NodeConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:7878".parse::<SocketAddr>().unwrap());
        assert!(c.data_dir.is_none());
        assert_eq!(c.max_connections, 256);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = NodeConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:9000"
            data_dir = "/var/lib/plume"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.data_dir, Some(PathBuf::from("/var/lib/plume")));
        assert_eq!(c.max_connections, 256);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(
            NodeConfig::from_toml("bind_addr = 7"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        let config = NodeConfig {
            max_connections: 8,
            data_dir: Some(dir.path().join("data")),
            ..NodeConfig::default()
        };
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(NodeConfig::from_file(&path).unwrap(), config);
    }
}
