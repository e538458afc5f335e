use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::decode::RemoteEndpoint;

/// Placeholder shown for values the game does not expose in this role
pub const UNKNOWN_LABEL: &str = "?";
/// Server name shown when a client's server could not be identified
pub const UNKNOWN_SERVER_NAME: &str = "Unknown";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum ConnectionRole {
    #[default]
    Offline,
    Host,
    Client,
}

impl ConnectionRole {
    pub fn is_online(&self) -> bool {
        !matches!(self, Self::Offline)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Server identity resolved at a race-session transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    pub role: ConnectionRole,
    pub server_name: String,
    pub password: String,
    /// `None` when the role has no way to read it
    pub location: Option<String>,
    pub clients_max: Option<u8>,
    /// Remote server, clients only
    pub endpoint: Option<RemoteEndpoint>,
    /// Address of the server list entry the name was found in
    pub entry_address: Option<u64>,
}

impl ConnectionDescriptor {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn clients_max_label(&self) -> String {
        self.clients_max
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}
