use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use crate::http::HttpVersion;

static CONFIG: OnceCell<MessageConfig> = OnceCell::new();

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Protocol version given to requests built with
    /// [`HttpRequest::new`](crate::http::request::HttpRequest::new)
    pub protocol_version: HttpVersion,

    /// Link every derived instance to the instance it was derived from
    pub version_chain: bool,

    /// Well-known ports for schemes beyond http and https.
    /// Read once, by the first default-port lookup; later changes to the
    /// installed config are not seen by the port table
    pub default_ports: HashMap<String, u16>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            protocol_version: HttpVersion::V1_1,
            version_chain: true,
            default_ports: HashMap::new(),
        }
    }
}

impl MessageConfig {
    pub fn from_file(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path, %err, "failed to read config, falling back to defaults");
                return MessageConfig::default();
            }
        };

        Self::from_toml(&content).unwrap_or_else(|err| {
            warn!(path, %err, "failed to deserialize config, falling back to defaults");
            MessageConfig::default()
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<MessageConfig>(content)
    }
}

/// Installs the process-wide config. Returns `false` when one was already
/// installed, either explicitly or by an earlier call to [`config`].
///
/// Install it before the first URI port lookup: the default-port table copies
/// [`MessageConfig::default_ports`] when it is first used, and a lookup made
/// earlier has already installed the default config, so this call then
/// returns `false`.
pub fn set_config(cfg: MessageConfig) -> bool {
    CONFIG.set(cfg).is_ok()
}

pub fn config() -> &'static MessageConfig {
    CONFIG.get_or_init(MessageConfig::default)
}
