//! Typed views over game memory.
//!
//! Every accessor takes its location from the offset table and degrades to
//! an empty string or `None` when the read fails; callers render those as
//! placeholders.

mod connect;
mod socket;

pub use connect::{build_connect_command, server_name_from_connect_uri};
pub use socket::{RemoteEndpoint, SOCKADDR_SIZE, decode_sockaddr};

#[cfg(test)]
pub(crate) use socket::mapped_sockaddr;

use tracing::debug;

use crate::config::{OffsetTable, keys};
use crate::memory::hex::to_hex;
use crate::memory::{Address, MemoryReader, ReadMemory};
use crate::scan::{PatternMatch, PatternScanner, ScanOptions, truncate_at_nul};
use crate::session::{ConnectionDescriptor, ConnectionRole, UNKNOWN_SERVER_NAME};

/// Number of occupied slots in a block of fixed-size client slots.
///
/// A slot is occupied when its first byte is non-zero. A trailing partial
/// slot is ignored.
pub fn count_occupied_slots(block: &[u8], slot_size: usize) -> usize {
    if slot_size == 0 {
        return 0;
    }
    block
        .chunks_exact(slot_size)
        .filter(|slot| slot[0] != 0)
        .count()
}

pub struct Decoders<'a, M> {
    reader: &'a MemoryReader<M>,
    offsets: &'a OffsetTable,
    scan: ScanOptions,
}

impl<'a, M: ReadMemory> Decoders<'a, M> {
    pub fn new(reader: &'a MemoryReader<M>, offsets: &'a OffsetTable) -> Self {
        Self {
            reader,
            offsets,
            scan: ScanOptions::default(),
        }
    }

    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    fn offset(&self, key: &str) -> Option<u64> {
        self.offsets
            .get(key)
            .map_err(|e| debug!("{}", e))
            .ok()
    }

    fn size(&self, key: &str) -> Option<usize> {
        self.offsets
            .get_usize(key)
            .map_err(|e| debug!("{}", e))
            .ok()
    }

    /// Read `size` bytes and cut at the first NUL; empty on failure
    pub fn read_null_terminated(&self, address: Address, size: usize, label: &str) -> String {
        match self.reader.read_labeled(address, size, label) {
            Ok(bytes) => truncate_at_nul(&bytes),
            Err(e) => {
                debug!("{}() failed at {}: {}", label, address, e);
                String::new()
            }
        }
    }

    fn module_string(&self, offset_key: &str, size_key: &str, label: &str) -> String {
        let (Some(offset), Some(size)) = (self.offset(offset_key), self.size(size_key)) else {
            return String::new();
        };
        self.read_null_terminated(Address::ModuleRelative(offset), size, label)
    }

    fn byte_at(&self, address: Address, label: &str) -> Option<u8> {
        match self.reader.read_labeled(address, 1, label) {
            Ok(bytes) => bytes.first().copied(),
            Err(e) => {
                debug!("{}() failed at {}: {}", label, address, e);
                None
            }
        }
    }

    fn module_byte(&self, offset_key: &str, label: &str) -> Option<u8> {
        let offset = self.offset(offset_key)?;
        self.byte_at(Address::ModuleRelative(offset), label)
    }

    // Local (hosted) server

    /// Non-empty only while this instance hosts a server
    pub fn local_server_name(&self) -> String {
        self.module_string(
            keys::LOCAL_SERVER_NAME_OFFSET,
            keys::LOCAL_SERVER_NAME_SIZE,
            "local_server_name",
        )
    }

    pub fn local_server_password(&self) -> String {
        self.module_string(
            keys::LOCAL_SERVER_PASSWORD_OFFSET,
            keys::LOCAL_SERVER_PASSWORD_SIZE,
            "local_server_password",
        )
    }

    pub fn local_server_location(&self) -> String {
        self.module_string(
            keys::LOCAL_SERVER_LOCATION_OFFSET,
            keys::LOCAL_SERVER_LOCATION_SIZE,
            "local_server_location",
        )
    }

    pub fn local_server_clients_max(&self) -> Option<u8> {
        self.module_byte(keys::LOCAL_SERVER_CLIENTS_MAX_OFFSET, "local_server_clients_max")
    }

    // Remote server

    /// Socket of the server this client is connected to
    pub fn remote_socket(&self) -> Option<RemoteEndpoint> {
        let offset = self.offset(keys::REMOTE_SERVER_SOCKADDR_OFFSET)?;
        let size = self.size(keys::REMOTE_SERVER_SOCKADDR_SIZE)?;
        match self
            .reader
            .read_labeled(Address::ModuleRelative(offset), size, "remote_server_sockaddr")
        {
            Ok(raw) => decode_sockaddr(&raw),
            Err(e) => {
                debug!("remote_server_sockaddr() failed: {}", e);
                None
            }
        }
    }

    /// Find the server list entry for `endpoint` and the name stored in it
    pub fn remote_server_name_and_address(
        &self,
        endpoint: &RemoteEndpoint,
    ) -> Option<PatternMatch> {
        let offset = self.size(keys::REMOTE_SERVER_NAME_OFFSET)?;
        let size = self.size(keys::REMOTE_SERVER_NAME_SIZE)?;
        let pattern = endpoint.search_pattern();
        debug!("remote_server_name() pattern: {}", to_hex(&pattern));

        PatternScanner::new(self.reader.source())
            .with_options(self.scan)
            .with_value_logging(self.reader.logs_values())
            .with_label("remote_server_name")
            .search(&pattern, offset, size)
            .hit
    }

    /// Location stored next to a server list entry
    pub fn remote_server_location(&self, entry_address: u64) -> String {
        let (Some(offset), Some(size)) = (
            self.offset(keys::REMOTE_SERVER_LOCATION_OFFSET),
            self.size(keys::REMOTE_SERVER_LOCATION_SIZE),
        ) else {
            return String::new();
        };
        match entry_address.checked_add(offset) {
            Some(address) => {
                self.read_null_terminated(Address::Absolute(address), size, "remote_server_location")
            }
            None => String::new(),
        }
    }

    /// Client limit stored next to a server list entry
    pub fn remote_server_clients_max(&self, entry_address: u64) -> Option<u8> {
        let offset = self.offset(keys::REMOTE_SERVER_CLIENTS_MAX_OFFSET)?;
        let address = entry_address.checked_add(offset)?;
        self.byte_at(Address::Absolute(address), "remote_server_clients_max")
    }

    pub fn remote_server_password(&self) -> String {
        self.module_string(
            keys::REMOTE_SERVER_PASSWORD_OFFSET,
            keys::REMOTE_SERVER_PASSWORD_SIZE,
            "remote_server_password",
        )
    }

    /// Round-trip time in milliseconds
    pub fn remote_server_ping(&self) -> Option<u16> {
        let offset = self.offset(keys::REMOTE_SERVER_PING_OFFSET)?;
        match self
            .reader
            .read_labeled(Address::ModuleRelative(offset), 2, "remote_server_ping")
        {
            Ok(raw) => match raw.as_slice() {
                [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
                _ => None,
            },
            Err(e) => {
                debug!("remote_server_ping() failed: {}", e);
                None
            }
        }
    }

    // Shared

    /// Connected clients, the local player included
    pub fn server_clients_count(&self) -> Option<usize> {
        let offset = self.offset(keys::SERVER_CLIENTS_OFFSET)?;
        let size = self.size(keys::SERVER_CLIENTS_SIZE)?;
        let slot = self.size(keys::SERVER_CLIENTS_SLOT_SIZE)?;
        match self
            .reader
            .read_labeled(Address::ModuleRelative(offset), size, "server_clients")
        {
            Ok(block) => Some(count_occupied_slots(&block, slot) + 1),
            Err(e) => {
                debug!("server_clients() failed: {}", e);
                None
            }
        }
    }

    /// URI the client was launched with, if any
    pub fn connect_uri(&self) -> String {
        self.module_string(
            keys::CONNECTION_STRING_OFFSET,
            keys::CONNECTION_STRING_SIZE,
            "connect_uri",
        )
    }

    pub fn server_track_id(&self) -> String {
        self.module_string(
            keys::SERVER_TRACK_ID_OFFSET,
            keys::SERVER_TRACK_ID_SIZE,
            "server_track_id",
        )
    }

    pub fn server_categories(&self) -> String {
        self.module_string(
            keys::SERVER_CATEGORIES_OFFSET,
            keys::SERVER_CATEGORIES_SIZE,
            "server_categories",
        )
    }

    /// Tear-offs left; the counter lives in a different place for hosts
    /// and clients
    pub fn remaining_tearoffs(&self, role: ConnectionRole) -> Option<u8> {
        let key = match role {
            ConnectionRole::Host => keys::LOCAL_SERVER_REMAINING_TEAROFFS_OFFSET,
            ConnectionRole::Client => keys::REMOTE_SERVER_REMAINING_TEAROFFS_OFFSET,
            ConnectionRole::Offline => return None,
        };
        self.module_byte(key, "remaining_tearoffs")
    }

    /// Work out whether this instance hosts, is a client, or is offline,
    /// and read the server details visible in that role
    pub fn describe_connection(&self) -> ConnectionDescriptor {
        let local_name = self.local_server_name();
        if !local_name.is_empty() {
            return ConnectionDescriptor {
                role: ConnectionRole::Host,
                server_name: local_name,
                password: self.local_server_password(),
                location: Some(self.local_server_location()),
                clients_max: self.local_server_clients_max(),
                endpoint: None,
                entry_address: None,
            };
        }

        let Some(endpoint) = self.remote_socket() else {
            return ConnectionDescriptor::offline();
        };

        let mut descriptor = ConnectionDescriptor {
            role: ConnectionRole::Client,
            password: self.remote_server_password(),
            endpoint: Some(endpoint),
            ..Default::default()
        };

        // Joined through a connect URI: the server list was never loaded
        let uri_name = server_name_from_connect_uri(&self.connect_uri());
        if !uri_name.is_empty() {
            descriptor.server_name = uri_name;
            return descriptor;
        }

        match self.remote_server_name_and_address(&endpoint) {
            Some(entry) => {
                descriptor.location = Some(self.remote_server_location(entry.address));
                descriptor.clients_max = self.remote_server_clients_max(entry.address);
                descriptor.entry_address = Some(entry.address);
                descriptor.server_name = entry.value;
            }
            None => descriptor.server_name = UNKNOWN_SERVER_NAME.to_string(),
        }
        descriptor
    }

    /// Launch command that rejoins the described server; clients only
    pub fn connect_command(&self, descriptor: &ConnectionDescriptor, exe: &str) -> Option<String> {
        let endpoint = descriptor.endpoint.as_ref()?;
        Some(build_connect_command(
            exe,
            endpoint,
            &descriptor.server_name,
            &descriptor.password,
            &self.server_track_id(),
            &self.server_categories(),
        ))
    }
}
