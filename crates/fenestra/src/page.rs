// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SharedPage - one page with a writable producer view and a read-only
//! consumer view.
//!
//! On Linux the page is an anonymous memfd mapped twice: `PROT_READ |
//! PROT_WRITE` for the producer, `PROT_READ` for readers, so a stray write
//! through the reader view faults. Elsewhere a single zeroed allocation backs
//! both views.

use crate::error::PageError;

/// A zero-initialised page pinned for its owner's lifetime.
#[derive(Debug)]
pub(crate) struct SharedPage {
    rw: *mut u8,
    ro: *const u8,
    len: usize,
}

// SAFETY: the page is plain memory; callers only access it through atomics.
unsafe impl Send for SharedPage {}
unsafe impl Sync for SharedPage {}

impl SharedPage {
    pub(crate) fn writable(&self) -> *mut u8 {
        self.rw
    }

    pub(crate) fn readable(&self) -> *const u8 {
        self.ro
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(target_os = "linux")]
impl SharedPage {
    pub(crate) fn new() -> Result<Self, PageError> {
        use core::ptr;

        let len = page_size();

        // SAFETY: the name is a valid NUL-terminated string.
        let fd = unsafe { libc::memfd_create(c"fenestra-seed-version".as_ptr(), libc::MFD_CLOEXEC) };
        if fd < 0 {
            return Err(PageError::Create);
        }

        let map = |prot: libc::c_int| {
            // SAFETY: fd is a live memfd at least `len` bytes long.
            let ptr = unsafe { libc::mmap(ptr::null_mut(), len, prot, libc::MAP_SHARED, fd, 0) };
            if ptr == libc::MAP_FAILED {
                return Err(PageError::Map);
            }
            Ok(ptr)
        };

        let mapped = (|| {
            // SAFETY: fd is a live memfd.
            if unsafe { libc::ftruncate(fd, len as libc::off_t) } != 0 {
                return Err(PageError::Truncate);
            }

            let rw = map(libc::PROT_READ | libc::PROT_WRITE)?;
            match map(libc::PROT_READ) {
                Ok(ro) => Ok((rw, ro)),
                Err(e) => {
                    // SAFETY: rw was mapped above with this length.
                    unsafe { libc::munmap(rw, len) };
                    Err(e)
                }
            }
        })();

        // Mappings keep the memfd alive.
        // SAFETY: fd is owned here and closed exactly once.
        unsafe { libc::close(fd) };

        let (rw, ro) = mapped?;

        Ok(Self {
            rw: rw as *mut u8,
            ro: ro as *const u8,
            len,
        })
    }
}

#[cfg(target_os = "linux")]
impl Drop for SharedPage {
    fn drop(&mut self) {
        // SAFETY: both views were mapped in `new` with `len` bytes.
        unsafe {
            libc::munmap(self.ro as *mut libc::c_void, self.len);
            libc::munmap(self.rw as *mut libc::c_void, self.len);
        }
    }
}

#[cfg(target_os = "linux")]
fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as usize } else { 4096 }
}

#[cfg(not(target_os = "linux"))]
const FALLBACK_PAGE: usize = 4096;

#[cfg(not(target_os = "linux"))]
impl SharedPage {
    fn layout() -> std::alloc::Layout {
        // Size and alignment are both the same non-zero power of two.
        match std::alloc::Layout::from_size_align(FALLBACK_PAGE, FALLBACK_PAGE) {
            Ok(layout) => layout,
            Err(_) => unreachable!(),
        }
    }

    pub(crate) fn new() -> Result<Self, PageError> {
        // SAFETY: the layout has non-zero size.
        let ptr = unsafe { std::alloc::alloc_zeroed(Self::layout()) };
        if ptr.is_null() {
            return Err(PageError::Map);
        }

        Ok(Self {
            rw: ptr,
            ro: ptr,
            len: FALLBACK_PAGE,
        })
    }
}

#[cfg(not(target_os = "linux"))]
impl Drop for SharedPage {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { std::alloc::dealloc(self.rw, Self::layout()) };
    }
}
