//! # mxprobe-core
//!
//! In-process memory introspection for MX Bikes session data.
//!
//! This crate provides:
//! - Fault-isolated reads of the host process (module-relative or absolute)
//! - Enumeration of private read-write regions
//! - Chunked KMP pattern search with a validity check on extracted strings
//! - Decoders for server identity, connection role, ping and client counts
//! - A TOML offset table so game updates need no rebuild
//!
//! Reading the live process is Windows only; everything else runs on a
//! simulated address space in tests.

pub mod config;
pub mod decode;
pub mod error;
pub mod memory;
pub mod probe;
pub mod scan;
pub mod session;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CONFIG_FILE, EngineConfig, OffsetTable, ProbeConfig, keys};
pub use decode::{
    Decoders, RemoteEndpoint, build_connect_command, count_occupied_slots, decode_sockaddr,
    server_name_from_connect_uri,
};
pub use error::{Error, Result};
pub use memory::{
    Address, ByteBuffer, LocalProcess, MemoryReader, MemoryRegion, Protection, ReadMemory,
    RegionKind, RegionState,
};
pub use probe::Probe;
pub use scan::{
    PatternMatch, PatternScanner, RegionWalker, ScanOptions, ScanReport, ScanStats,
    is_valid_candidate,
};
pub use session::{ConnectionDescriptor, ConnectionRole, Poller, SessionTracker};
pub use shutdown::ShutdownSignal;
