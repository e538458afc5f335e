mod address;
pub mod hex;
mod process;
mod reader;
mod region;

#[cfg(test)]
pub mod mock;

pub use address::Address;
pub use process::LocalProcess;
pub use reader::{ByteBuffer, MemoryReader, ReadMemory};
pub(crate) use reader::trace_hex_dump;
pub use region::{MemoryRegion, Protection, RegionKind, RegionState};

#[cfg(test)]
pub use mock::MockMemory;
