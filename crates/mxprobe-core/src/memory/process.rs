//! Memory source for the process the engine runs inside.
//!
//! Reads go through `ReadProcessMemory` on the current-process pseudo
//! handle rather than dereferencing raw pointers: an unmapped page, a guard
//! page or a protection change mid-copy makes the call fail with
//! `ERROR_PARTIAL_COPY` / `ERROR_NOACCESS` instead of raising an access
//! violation in the host.
//!
//! Other targets get a shim whose every call returns `Error::Unsupported`.

use super::{ByteBuffer, MemoryRegion, ReadMemory};
use crate::error::{Error, Result};

/// The current process's own address space
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcess;

impl LocalProcess {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl ReadMemory for LocalProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<ByteBuffer> {
        use std::ffi::c_void;
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
        use windows::Win32::System::Threading::GetCurrentProcess;

        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; size];
        let mut bytes_read: usize = 0;
        // SAFETY: the destination is a live buffer of exactly `size` bytes.
        // The source is never dereferenced by us; the kernel validates it and
        // reports failure for inaccessible pages.
        let result = unsafe {
            ReadProcessMemory(
                GetCurrentProcess(),
                address as usize as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read as *mut usize),
            )
        };

        if result.is_err() || bytes_read != size {
            return Err(Error::AccessFault { address, size });
        }
        Ok(buffer)
    }

    fn module_base(&self) -> Result<u64> {
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::core::PCWSTR;

        // SAFETY: a null module name asks for the executable that created
        // the process; the returned handle is its load address.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|e| Error::ModuleBase(e.to_string()))?;
        Ok(module.0 as usize as u64)
    }

    fn address_range(&self) -> Result<(u64, u64)> {
        use windows::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

        let mut info = SYSTEM_INFO::default();
        // SAFETY: GetSystemInfo fills the provided struct and cannot fail.
        unsafe { GetSystemInfo(&mut info) };
        Ok((
            info.lpMinimumApplicationAddress as usize as u64,
            info.lpMaximumApplicationAddress as usize as u64,
        ))
    }

    fn query_region(&self, address: u64) -> Result<MemoryRegion> {
        use std::ffi::c_void;
        use windows::Win32::System::Memory::{
            MEM_COMMIT, MEM_IMAGE, MEM_MAPPED, MEM_PRIVATE, MEM_RESERVE,
            MEMORY_BASIC_INFORMATION, VirtualQuery,
        };

        use super::{Protection, RegionKind, RegionState};

        let mut mbi = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: VirtualQuery only inspects page tables for the address and
        // writes at most `dwlength` bytes into `mbi`.
        let written = unsafe {
            VirtualQuery(
                Some(address as usize as *const c_void),
                &mut mbi,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return Err(Error::RegionQuery { address });
        }

        let state = if mbi.State == MEM_COMMIT {
            RegionState::Commit
        } else if mbi.State == MEM_RESERVE {
            RegionState::Reserve
        } else {
            RegionState::Free
        };

        let kind = if mbi.Type == MEM_PRIVATE {
            RegionKind::Private
        } else if mbi.Type == MEM_MAPPED {
            RegionKind::Mapped
        } else if mbi.Type == MEM_IMAGE {
            RegionKind::Image
        } else {
            RegionKind::Unknown
        };

        Ok(MemoryRegion {
            base: mbi.BaseAddress as usize as u64,
            size: mbi.RegionSize as u64,
            state,
            protection: Protection(mbi.Protect.0),
            kind,
        })
    }
}

#[cfg(not(target_os = "windows"))]
const UNSUPPORTED: &str = "in-process memory access is only supported on Windows";

#[cfg(not(target_os = "windows"))]
impl ReadMemory for LocalProcess {
    fn read_bytes(&self, _address: u64, _size: usize) -> Result<ByteBuffer> {
        Err(Error::Unsupported(UNSUPPORTED))
    }

    fn module_base(&self) -> Result<u64> {
        Err(Error::Unsupported(UNSUPPORTED))
    }

    fn address_range(&self) -> Result<(u64, u64)> {
        Err(Error::Unsupported(UNSUPPORTED))
    }

    fn query_region(&self, _address: u64) -> Result<MemoryRegion> {
        Err(Error::Unsupported(UNSUPPORTED))
    }
}
