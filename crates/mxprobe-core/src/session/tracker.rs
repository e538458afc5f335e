use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};

use super::role::{ConnectionDescriptor, ConnectionRole, UNKNOWN_LABEL};
use crate::decode::Decoders;
use crate::memory::ReadMemory;

/// Current server identity plus the values that change during a session.
///
/// The identity is resolved once per race session; only ping and client
/// count are refreshed afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionTracker {
    descriptor: ConnectionDescriptor,
    ping_ms: Option<u16>,
    clients: Option<usize>,
    connect_command: Option<String>,
    updated_at: Option<DateTime<Local>>,
    exe_path: String,
}

impl SessionTracker {
    /// `exe_path` goes into the rejoin command logged for clients
    pub fn new(exe_path: impl Into<String>) -> Self {
        Self {
            exe_path: exe_path.into(),
            ..Default::default()
        }
    }

    /// Tracker for the running executable
    pub fn for_current_exe() -> Self {
        let exe = std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        Self::new(exe)
    }

    /// Resolve the connection role for a new race session
    pub fn on_race_session<M: ReadMemory>(
        &mut self,
        decoders: &Decoders<'_, M>,
    ) -> &ConnectionDescriptor {
        let descriptor = decoders.describe_connection();
        info!("Connection: {} ({})", descriptor.role, descriptor.server_name);

        self.connect_command = decoders.connect_command(&descriptor, &self.exe_path);
        if let Some(command) = &self.connect_command {
            info!("Connect command:\n{}", command);
        }

        self.descriptor = descriptor;
        self.ping_ms = None;
        self.clients = None;
        self.updated_at = Some(Local::now());
        &self.descriptor
    }

    /// Forget everything when the event ends
    pub fn on_event_deinit(&mut self) {
        debug!("Session cleared");
        let exe_path = std::mem::take(&mut self.exe_path);
        *self = Self::new(exe_path);
    }

    /// Re-read the per-tick values for the current role
    pub fn refresh<M: ReadMemory>(&mut self, decoders: &Decoders<'_, M>) {
        let role = self.descriptor.role;
        if role == ConnectionRole::Client {
            self.ping_ms = decoders.remote_server_ping();
        }
        if role.is_online() {
            self.clients = decoders.server_clients_count();
            self.updated_at = Some(Local::now());
        }
    }

    pub fn role(&self) -> ConnectionRole {
        self.descriptor.role
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn ping_ms(&self) -> Option<u16> {
        self.ping_ms
    }

    pub fn clients(&self) -> Option<usize> {
        self.clients
    }

    pub fn connect_command(&self) -> Option<&str> {
        self.connect_command.as_deref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    /// e.g. `"120 ms"`, or `"?"` when unknown
    pub fn ping_label(&self) -> String {
        match self.ping_ms {
            Some(ms) => format!("{} ms", ms),
            None => UNKNOWN_LABEL.to_string(),
        }
    }

    /// e.g. `"5/20"`
    pub fn clients_label(&self) -> String {
        let current = self
            .clients
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        format!("{}/{}", current, self.descriptor.clients_max_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::{MODULE_BASE, module_memory, put_str, test_offsets};
    use crate::decode::{Decoders, mapped_sockaddr};
    use crate::memory::{MemoryReader, MockMemory};

    fn host_memory() -> MockMemory {
        let mut mock = module_memory();
        put_str(&mut mock, 0x100, "Host Server");
        mock.write(MODULE_BASE + 0x180, &[16]);
        mock.write(MODULE_BASE + 0x1000, &[1]);
        mock
    }

    fn uri_client_memory() -> MockMemory {
        let mut mock = module_memory();
        mock.write(MODULE_BASE + 0x200, &mapped_sockaddr([10, 0, 0, 5], 7000));
        put_str(
            &mut mock,
            0x000,
            "mxbikes://[::ffff:a00:5]:7000/[::1]:7000/Night Race/0/t/0/c",
        );
        mock.write(MODULE_BASE + 0x260, &[45, 0]);
        mock
    }

    #[test]
    fn test_new_tracker_is_offline() {
        let tracker = SessionTracker::new("mxbikes.exe");
        assert_eq!(tracker.role(), ConnectionRole::Offline);
        assert_eq!(tracker.ping_label(), "?");
        assert_eq!(tracker.clients_label(), "?/?");
        assert!(tracker.updated_at().is_none());
    }

    #[test]
    fn test_host_session() {
        let reader = MemoryReader::new(host_memory());
        let offsets = test_offsets();
        let decoders = Decoders::new(&reader, &offsets);

        let mut tracker = SessionTracker::new("mxbikes.exe");
        let descriptor = tracker.on_race_session(&decoders);
        assert_eq!(descriptor.role, ConnectionRole::Host);

        tracker.refresh(&decoders);
        assert_eq!(tracker.clients(), Some(2));
        assert_eq!(tracker.clients_label(), "2/16");
        // hosts have no ping
        assert_eq!(tracker.ping_ms(), None);
        assert!(tracker.connect_command().is_none());
    }

    #[test]
    fn test_client_session() {
        let reader = MemoryReader::new(uri_client_memory());
        let offsets = test_offsets();
        let decoders = Decoders::new(&reader, &offsets);

        let mut tracker = SessionTracker::new("mxbikes.exe");
        tracker.on_race_session(&decoders);
        assert_eq!(tracker.role(), ConnectionRole::Client);
        assert_eq!(tracker.descriptor().server_name, "Night Race");
        assert!(tracker.connect_command().unwrap().contains("/Night Race/0/"));

        tracker.refresh(&decoders);
        assert_eq!(tracker.ping_label(), "45 ms");
        assert_eq!(tracker.clients_label(), "1/?");
        assert!(tracker.updated_at().is_some());
    }

    #[test]
    fn test_offline_refresh_reads_nothing() {
        let reader = MemoryReader::new(module_memory());
        let offsets = test_offsets();
        let decoders = Decoders::new(&reader, &offsets);

        let mut tracker = SessionTracker::new("mxbikes.exe");
        tracker.on_race_session(&decoders);
        tracker.refresh(&decoders);
        assert_eq!(tracker.role(), ConnectionRole::Offline);
        assert_eq!(tracker.clients(), None);
    }

    #[test]
    fn test_event_deinit_clears() {
        let reader = MemoryReader::new(host_memory());
        let offsets = test_offsets();
        let decoders = Decoders::new(&reader, &offsets);

        let mut tracker = SessionTracker::new("mxbikes.exe");
        tracker.on_race_session(&decoders);
        tracker.refresh(&decoders);
        tracker.on_event_deinit();

        assert_eq!(tracker.role(), ConnectionRole::Offline);
        assert_eq!(tracker.clients(), None);
        assert_eq!(tracker.descriptor(), &ConnectionDescriptor::offline());

        // exe path survives for the next session
        let reader = MemoryReader::new(uri_client_memory());
        let decoders = Decoders::new(&reader, &offsets);
        tracker.on_race_session(&decoders);
        assert!(tracker.connect_command().unwrap().starts_with("\"mxbikes.exe\""));
    }
}
