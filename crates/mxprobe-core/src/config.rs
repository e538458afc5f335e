//! Probe configuration file.
//!
//! Every address the decoders touch comes from the `[offsets]` table so a
//! game update only needs a config edit:
//!
//! ```toml
//! [engine]
//! log_memory_values = false
//! scan_chunk_size = 0x100000
//!
//! [offsets]
//! local_server_name_offset = 0x9D6768
//! local_server_name_size = 64
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::scan::DEFAULT_CHUNK_SIZE;

/// Default config file name
pub const CONFIG_FILE: &str = "mxprobe.toml";

/// Offset table keys
pub mod keys {
    pub const CONNECTION_STRING_OFFSET: &str = "connection_string_offset";
    pub const CONNECTION_STRING_SIZE: &str = "connection_string_size";

    pub const LOCAL_SERVER_NAME_OFFSET: &str = "local_server_name_offset";
    pub const LOCAL_SERVER_NAME_SIZE: &str = "local_server_name_size";
    pub const LOCAL_SERVER_PASSWORD_OFFSET: &str = "local_server_password_offset";
    pub const LOCAL_SERVER_PASSWORD_SIZE: &str = "local_server_password_size";
    pub const LOCAL_SERVER_LOCATION_OFFSET: &str = "local_server_location_offset";
    pub const LOCAL_SERVER_LOCATION_SIZE: &str = "local_server_location_size";
    pub const LOCAL_SERVER_CLIENTS_MAX_OFFSET: &str = "local_server_clients_max_offset";
    pub const LOCAL_SERVER_REMAINING_TEAROFFS_OFFSET: &str =
        "local_server_remaining_tearoffs_offset";

    pub const REMOTE_SERVER_SOCKADDR_OFFSET: &str = "remote_server_sockaddr_offset";
    pub const REMOTE_SERVER_SOCKADDR_SIZE: &str = "remote_server_sockaddr_size";
    pub const REMOTE_SERVER_PASSWORD_OFFSET: &str = "remote_server_password_offset";
    pub const REMOTE_SERVER_PASSWORD_SIZE: &str = "remote_server_password_size";
    pub const REMOTE_SERVER_NAME_OFFSET: &str = "remote_server_name_offset";
    pub const REMOTE_SERVER_NAME_SIZE: &str = "remote_server_name_size";
    pub const REMOTE_SERVER_LOCATION_OFFSET: &str = "remote_server_location_offset";
    pub const REMOTE_SERVER_LOCATION_SIZE: &str = "remote_server_location_size";
    pub const REMOTE_SERVER_PING_OFFSET: &str = "remote_server_ping_offset";
    pub const REMOTE_SERVER_CLIENTS_MAX_OFFSET: &str = "remote_server_clients_max_offset";
    pub const REMOTE_SERVER_REMAINING_TEAROFFS_OFFSET: &str =
        "remote_server_remaining_tearoffs_offset";

    pub const SERVER_CATEGORIES_OFFSET: &str = "server_categories_offset";
    pub const SERVER_CATEGORIES_SIZE: &str = "server_categories_size";
    pub const SERVER_TRACK_ID_OFFSET: &str = "server_track_id_offset";
    pub const SERVER_TRACK_ID_SIZE: &str = "server_track_id_size";
    pub const SERVER_CLIENTS_OFFSET: &str = "server_clients_offset";
    pub const SERVER_CLIENTS_SIZE: &str = "server_clients_size";
    pub const SERVER_CLIENTS_SLOT_SIZE: &str = "server_clients_slot_size";
}

/// Built-in offsets for the current game build, in file order
const DEFAULT_OFFSETS: &[(&str, u64)] = &[
    (keys::CONNECTION_STRING_OFFSET, 0x559DC0),
    (keys::CONNECTION_STRING_SIZE, 256),
    (keys::LOCAL_SERVER_NAME_OFFSET, 0x9D6768),
    (keys::LOCAL_SERVER_NAME_SIZE, 64),
    (keys::LOCAL_SERVER_PASSWORD_OFFSET, 0x9D67AC),
    (keys::LOCAL_SERVER_PASSWORD_SIZE, 32),
    (keys::LOCAL_SERVER_LOCATION_OFFSET, 0x9D67CC),
    (keys::LOCAL_SERVER_LOCATION_SIZE, 32),
    (keys::LOCAL_SERVER_CLIENTS_MAX_OFFSET, 0x9D6820),
    (keys::LOCAL_SERVER_REMAINING_TEAROFFS_OFFSET, 0x9D78BC),
    (keys::REMOTE_SERVER_SOCKADDR_OFFSET, 0x58B2BC),
    (keys::REMOTE_SERVER_SOCKADDR_SIZE, 28),
    (keys::REMOTE_SERVER_PASSWORD_OFFSET, 0x9BDE04),
    (keys::REMOTE_SERVER_PASSWORD_SIZE, 32),
    (keys::REMOTE_SERVER_NAME_OFFSET, 0x1B),
    (keys::REMOTE_SERVER_NAME_SIZE, 64),
    (keys::REMOTE_SERVER_LOCATION_OFFSET, 0x75),
    (keys::REMOTE_SERVER_LOCATION_SIZE, 32),
    (keys::REMOTE_SERVER_PING_OFFSET, 0x58B534),
    (keys::REMOTE_SERVER_CLIENTS_MAX_OFFSET, 0x5D),
    (keys::REMOTE_SERVER_REMAINING_TEAROFFS_OFFSET, 0x108BE0C),
    (keys::SERVER_CATEGORIES_OFFSET, 0x58B634),
    (keys::SERVER_CATEGORIES_SIZE, 256),
    (keys::SERVER_TRACK_ID_OFFSET, 0x58B5D4),
    (keys::SERVER_TRACK_ID_SIZE, 64),
    (keys::SERVER_CLIENTS_OFFSET, 0xE49F28),
    (keys::SERVER_CLIENTS_SIZE, 0x1000),
    (keys::SERVER_CLIENTS_SLOT_SIZE, 64),
];

fn default_for(key: &str) -> Option<u64> {
    DEFAULT_OFFSETS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Accepts a non-negative TOML integer or a string holding a hex (`0x`) or
/// decimal number
fn parse_value(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(i) => u64::try_from(*i).ok(),
        toml::Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

/// Named offsets and sizes used by the decoders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OffsetTable {
    values: BTreeMap<String, u64>,
}

impl OffsetTable {
    /// A table with no entries; every lookup fails until set
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// A table holding every built-in default
    pub fn with_defaults() -> Self {
        Self {
            values: DEFAULT_OFFSETS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// Build from an `[offsets]` TOML table on top of the defaults.
    ///
    /// Unknown keys are ignored; unusable values keep their default. Both
    /// are logged.
    pub fn from_toml(table: &toml::Table) -> Self {
        let mut offsets = Self::with_defaults();
        for (key, value) in table {
            if default_for(key).is_none() {
                warn!("Ignoring unknown offset key: {}", key);
                continue;
            }
            match parse_value(value) {
                Some(v) => offsets.set(key, v),
                None => warn!(
                    "Invalid value for {}: {}, using default 0x{:X}",
                    key,
                    value,
                    offsets.values[key.as_str()]
                ),
            }
        }
        offsets
    }

    pub fn get(&self, key: &str) -> Result<u64> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| Error::MissingOffset(key.to_string()))
    }

    /// Lookup for size and distance keys
    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let value = self.get(key)?;
        usize::try_from(value)
            .map_err(|_| Error::InvalidConfig(format!("{} = 0x{:X} does not fit usize", key, value)))
    }

    pub fn set(&mut self, key: &str, value: u64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    /// Hex-dump every successful read at debug level
    pub log_memory_values: bool,
    /// Bytes per region read during a pattern scan
    pub scan_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_memory_values: false,
            scan_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EngineConfig {
    fn from_toml(table: &toml::Table) -> Self {
        let mut engine = Self::default();
        for (key, value) in table {
            match key.as_str() {
                "log_memory_values" => match value.as_bool() {
                    Some(b) => engine.log_memory_values = b,
                    None => warn!("Invalid value for log_memory_values: {}", value),
                },
                "scan_chunk_size" => match parse_value(value).and_then(|v| usize::try_from(v).ok()) {
                    Some(size) if size > 0 => engine.scan_chunk_size = size,
                    _ => warn!(
                        "Invalid value for scan_chunk_size: {}, using default 0x{:X}",
                        value, DEFAULT_CHUNK_SIZE
                    ),
                },
                other => warn!("Ignoring unknown engine key: {}", other),
            }
        }
        engine
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeConfig {
    pub engine: EngineConfig,
    pub offsets: OffsetTable,
}

impl ProbeConfig {
    /// Parse config text. Missing sections and keys take their defaults.
    pub fn parse(content: &str) -> Result<Self> {
        let root: toml::Table = content.parse()?;
        let mut config = Self::default();

        for (section, value) in &root {
            match (section.as_str(), value.as_table()) {
                ("engine", Some(table)) => config.engine = EngineConfig::from_toml(table),
                ("offsets", Some(table)) => config.offsets = OffsetTable::from_toml(table),
                ("engine" | "offsets", None) => {
                    return Err(Error::InvalidConfig(format!(
                        "[{}] must be a table",
                        section
                    )));
                }
                (other, _) => warn!("Ignoring unknown config section: {}", other),
            }
        }
        Ok(config)
    }

    /// Load config from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!(
            "Loaded config from {} ({} offsets)",
            path.display(),
            config.offsets.len()
        );
        Ok(config)
    }

    /// Load config from `path`, writing the defaults there first if the file
    /// does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(e) if e.is_not_found() => {
                info!("Config not found, writing defaults to {}", path.display());
                Self::write_default(path)?;
                Self::load(path)
            }
            other => other,
        }
    }

    /// Write the default config to `path` via a temporary file and rename
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        fs::write(&tmp, self.to_toml_string())?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Render as TOML with offsets in hex and sizes in decimal.
    ///
    /// Written line by line since `toml` serialises every integer in decimal.
    pub fn to_toml_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[engine]");
        let _ = writeln!(out, "log_memory_values = {}", self.engine.log_memory_values);
        let _ = writeln!(out, "scan_chunk_size = 0x{:X}", self.engine.scan_chunk_size);
        let _ = writeln!(out);
        let _ = writeln!(out, "[offsets]");

        // Built-in keys first, in table order
        let mut order: Vec<&str> = DEFAULT_OFFSETS.iter().map(|(k, _)| *k).collect();
        order.extend(
            self.offsets
                .iter()
                .map(|(k, _)| k)
                .filter(|k| default_for(k).is_none()),
        );
        for key in order {
            let Ok(value) = self.offsets.get(key) else {
                continue;
            };
            if key.ends_with("_size") {
                let _ = writeln!(out, "{} = {}", key, value);
            } else {
                let _ = writeln!(out, "{} = 0x{:X}", key, value);
            }
        }
        out
    }
}
