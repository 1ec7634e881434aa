//! Access to the current process's own address space.
//!
//! - Windows: probes walk every overlapping region with `VirtualQuery`. Reads
//!   go through `ReadProcessMemory` on the current process, which fails
//!   cleanly if a page is released between the probe and the copy.
//! - Linux: positional reads of `/proc/self/mem`. The kernel returns an error
//!   for unmapped or unreadable pages instead of raising a fault.
//! - Anything else: every probe fails, so scans end as exhausted.

use crate::error::Result;
use crate::memory::MemoryAccessor;

pub use platform::LocalMemory;

#[cfg(target_os = "windows")]
mod platform {
    use std::ffi::c_void;
    use std::mem::size_of;

    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Memory::{
        MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
        PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE,
        PAGE_WRITECOPY, VirtualQuery,
    };
    use windows::Win32::System::Threading::GetCurrentProcess;

    use super::*;
    use crate::error::Error;
    use crate::memory::accessor::range_end;

    const READABLE: u32 = PAGE_READONLY.0
        | PAGE_READWRITE.0
        | PAGE_WRITECOPY.0
        | PAGE_EXECUTE_READ.0
        | PAGE_EXECUTE_READWRITE.0
        | PAGE_EXECUTE_WRITECOPY.0;

    #[derive(Debug, Default)]
    pub struct LocalMemory;

    impl LocalMemory {
        pub fn open() -> Result<Self> {
            Ok(Self)
        }

        fn region_readable(info: &MEMORY_BASIC_INFORMATION) -> bool {
            info.State == MEM_COMMIT
                && info.Protect.0 & (PAGE_NOACCESS.0 | PAGE_GUARD.0) == 0
                && info.Protect.0 & READABLE != 0
        }
    }

    impl MemoryAccessor for LocalMemory {
        fn probe(&self, address: u64, len: usize) -> bool {
            let Ok(end) = range_end(address, len) else {
                return false;
            };
            if address == 0 {
                return false;
            }

            let mut cursor = address;
            while cursor < end {
                let mut info = MEMORY_BASIC_INFORMATION::default();
                // SAFETY: VirtualQuery only inspects the page tables for `cursor`
                // and writes into `info`, which is a valid, correctly sized buffer.
                let written = unsafe {
                    VirtualQuery(
                        Some(cursor as *const c_void),
                        &mut info,
                        size_of::<MEMORY_BASIC_INFORMATION>(),
                    )
                };
                if written == 0 || !Self::region_readable(&info) {
                    return false;
                }

                let region_end = (info.BaseAddress as u64).saturating_add(info.RegionSize as u64);
                if region_end <= cursor {
                    return false;
                }
                cursor = region_end;
            }
            true
        }

        fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
            let unmapped = Error::UnmappedMemory {
                address,
                len: buf.len(),
            };
            range_end(address, buf.len())?;
            if address == 0 {
                return Err(unmapped);
            }

            let mut read = 0usize;
            // SAFETY: `buf` is a valid, writable buffer of `buf.len()` bytes. The
            // source is only touched by the kernel, which reports unreadable
            // pages as an error instead of faulting.
            let copied = unsafe {
                ReadProcessMemory(
                    GetCurrentProcess(),
                    address as *const c_void,
                    buf.as_mut_ptr() as *mut c_void,
                    buf.len(),
                    Some(&mut read),
                )
            };
            match copied {
                Ok(()) if read == buf.len() => Ok(()),
                _ => Err(unmapped),
            }
        }
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use std::fs::File;
    use std::os::unix::fs::FileExt;

    use super::*;
    use crate::error::Error;
    use crate::memory::accessor::range_end;

    /// Largest probe served from the stack
    const PROBE_STACK_LEN: usize = 512;

    #[derive(Debug)]
    pub struct LocalMemory {
        mem: File,
    }

    impl LocalMemory {
        pub fn open() -> Result<Self> {
            let mem = File::open("/proc/self/mem")?;
            Ok(Self { mem })
        }

        fn read_at(&self, address: u64, buf: &mut [u8]) -> std::io::Result<()> {
            self.mem.read_exact_at(buf, address)
        }
    }

    impl MemoryAccessor for LocalMemory {
        fn probe(&self, address: u64, len: usize) -> bool {
            if range_end(address, len).is_err() || address == 0 {
                return false;
            }
            if len <= PROBE_STACK_LEN {
                let mut scratch = [0u8; PROBE_STACK_LEN];
                self.read_at(address, &mut scratch[..len]).is_ok()
            } else {
                let mut scratch = vec![0u8; len];
                self.read_at(address, &mut scratch).is_ok()
            }
        }

        fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
            range_end(address, buf.len())?;
            self.read_at(address, buf).map_err(|e| match e.raw_os_error() {
                // EIO / EFAULT: page not mapped or not readable
                Some(5) | Some(14) => Error::UnmappedMemory {
                    address,
                    len: buf.len(),
                },
                _ => Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                },
            })
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod platform {
    use super::*;
    use crate::error::Error;

    #[derive(Debug, Default)]
    pub struct LocalMemory;

    impl LocalMemory {
        pub fn open() -> Result<Self> {
            Ok(Self)
        }
    }

    impl MemoryAccessor for LocalMemory {
        fn probe(&self, _address: u64, _len: usize) -> bool {
            false
        }

        fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
            Err(Error::UnmappedMemory {
                address,
                len: buf.len(),
            })
        }
    }
}

#[cfg(all(test, any(target_os = "windows", target_os = "linux")))]
mod tests {
    use super::*;

    #[test]
    fn test_reads_own_heap() {
        let memory = LocalMemory::open().unwrap();
        let data: Box<[u64; 4]> = Box::new([1, 2, 0x7777_0000_1111, 4]);
        let address = data.as_ptr() as u64;

        assert!(memory.probe(address, 32));
        assert_eq!(memory.read_word(address + 16), Some(0x7777_0000_1111));
    }

    #[test]
    fn test_null_and_wrapping_ranges_unreadable() {
        let memory = LocalMemory::open().unwrap();
        assert!(!memory.probe(0, 8));
        assert!(!memory.probe(u64::MAX - 4, 8));
        assert_eq!(memory.read_word(8), None);
        assert!(memory.read_u64(0).is_err());
    }

    #[test]
    fn test_direct_read_reports_unmapped() {
        let memory = LocalMemory::open().unwrap();
        let data = vec![0xABu8; 64];
        let mut buf = [0u8; 64];
        memory.read_into(data.as_ptr() as u64, &mut buf).unwrap();
        assert_eq!(buf, [0xAB; 64]);

        // The first page is never mapped
        let err = memory.read_into(0x10, &mut buf).unwrap_err();
        assert!(err.is_unmapped());
        assert!(memory.read_u64(0).unwrap_err().is_unmapped());
    }
}
