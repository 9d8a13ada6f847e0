//! Page Locking for Session Secrets
//!
//! While the vault is unlocked, the derived encryption key and the decrypted
//! mnemonic are pinned in RAM so they are never written to swap.
//!
//! - **Unix**: `mlock()` / `munlock()`
//! - **Windows**: `VirtualLock()` / `VirtualUnlock()`
//! - **Other**: nothing is locked, a warning is logged
//!
//! Locking is best effort. It can fail under `RLIMIT_MEMLOCK` or without
//! privileges; the vault keeps working and relies on `zeroize` alone.

use std::ptr::NonNull;

/// Outcome of a lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockResult {
    Locked,
    Failed,
    Unsupported,
}

/// Pin `len` bytes starting at `ptr`.
///
/// # Safety
/// `ptr` must point to valid memory of at least `len` bytes.
pub unsafe fn mlock(ptr: NonNull<u8>, len: usize) -> LockResult {
    if len == 0 {
        return LockResult::Locked;
    }

    #[cfg(unix)]
    {
        mlock_unix(ptr, len)
    }

    #[cfg(windows)]
    {
        mlock_windows(ptr, len)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = ptr;
        tracing::warn!("Memory locking not supported on this platform; vault secrets may reach swap");
        LockResult::Unsupported
    }
}

/// Release a region pinned by [`mlock`].
///
/// # Safety
/// `ptr` must point to valid memory of at least `len` bytes that was
/// previously locked.
pub unsafe fn munlock(ptr: NonNull<u8>, len: usize) {
    if len == 0 {
        return;
    }

    #[cfg(unix)]
    {
        if libc::munlock(ptr.as_ptr() as *const libc::c_void, len) != 0 {
            tracing::debug!("munlock returned non-zero for {} bytes", len);
        }
    }

    #[cfg(windows)]
    {
        use windows::Win32::System::Memory::VirtualUnlock;
        if VirtualUnlock(ptr.as_ptr() as *const std::ffi::c_void, len).is_err() {
            tracing::debug!("VirtualUnlock failed for {} bytes", len);
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = ptr;
    }
}

#[cfg(unix)]
unsafe fn mlock_unix(ptr: NonNull<u8>, len: usize) -> LockResult {
    if libc::mlock(ptr.as_ptr() as *const libc::c_void, len) == 0 {
        tracing::debug!("Locked {} bytes of vault memory", len);
        return LockResult::Locked;
    }

    let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
    let reason = match errno {
        libc::ENOMEM => "exceeds RLIMIT_MEMLOCK",
        libc::EPERM => "missing CAP_IPC_LOCK",
        libc::EINVAL => "invalid address range",
        _ => "unknown error",
    };
    tracing::warn!(
        "Failed to lock vault memory: {} (errno {}); secrets may reach swap",
        reason,
        errno
    );
    LockResult::Failed
}

#[cfg(windows)]
unsafe fn mlock_windows(ptr: NonNull<u8>, len: usize) -> LockResult {
    use windows::Win32::System::Memory::VirtualLock;

    if VirtualLock(ptr.as_ptr() as *const std::ffi::c_void, len).is_ok() {
        tracing::debug!("Locked {} bytes of vault memory", len);
        LockResult::Locked
    } else {
        let error = windows::core::Error::from_win32();
        tracing::warn!("Failed to lock vault memory: {}; secrets may reach swap", error);
        LockResult::Failed
    }
}

/// RAII guard: pins a region on creation and releases it on drop.
///
/// Must be dropped before the memory it covers is freed.
#[derive(Debug)]
pub struct LockedRegion {
    ptr: NonNull<u8>,
    len: usize,
    was_locked: bool,
}

impl LockedRegion {
    /// # Safety
    /// `ptr` must point to `len` valid bytes that stay allocated, and do not
    /// move, for the lifetime of the region.
    pub unsafe fn new(ptr: NonNull<u8>, len: usize) -> Self {
        let was_locked = mlock(ptr, len) == LockResult::Locked;
        Self {
            ptr,
            len,
            was_locked,
        }
    }

    fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            was_locked: true,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.was_locked
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.was_locked {
            // SAFETY: only regions we locked are unlocked, and the owner drops
            // the region before the backing memory.
            unsafe { munlock(self.ptr, self.len) }
        }
    }
}

// SAFETY: the pointer is only handed to the OS page-locking calls, never
// dereferenced.
unsafe impl Send for LockedRegion {}
unsafe impl Sync for LockedRegion {}

/// Pin the heap buffer behind a string.
///
/// # Safety
/// The string must not be reallocated or freed while the region lives.
pub unsafe fn lock_string(s: &str) -> LockedRegion {
    lock_bytes(s.as_bytes())
}

/// Pin a byte buffer.
///
/// # Safety
/// The buffer must not move or be freed while the region lives.
pub unsafe fn lock_bytes(bytes: &[u8]) -> LockedRegion {
    match NonNull::new(bytes.as_ptr() as *mut u8) {
        Some(ptr) if !bytes.is_empty() => LockedRegion::new(ptr, bytes.len()),
        _ => LockedRegion::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_unlock_basic() {
        let data = vec![0u8; 4096];
        let ptr = NonNull::new(data.as_ptr() as *mut u8).unwrap();

        // SAFETY: data is valid for the duration of this test
        unsafe {
            let result = mlock(ptr, data.len());
            assert!(matches!(
                result,
                LockResult::Locked | LockResult::Failed | LockResult::Unsupported
            ));
            if result == LockResult::Locked {
                munlock(ptr, data.len());
            }
        }
    }

    #[test]
    fn test_lock_bytes_region() {
        let key = Box::new([7u8; 32]);

        // SAFETY: the box outlives the region
        let region = unsafe { lock_bytes(&key[..]) };
        assert_eq!(region.len(), 32);
        let _ = region.is_locked();
        drop(region);
    }

    #[test]
    fn test_lock_string_region() {
        let phrase = String::from("abandon ability able");

        // SAFETY: phrase outlives the region
        let region = unsafe { lock_string(&phrase) };
        assert_eq!(region.len(), phrase.len());
        drop(region);
    }

    #[test]
    fn test_empty_regions() {
        // SAFETY: zero-length regions touch no memory
        let region = unsafe { lock_string("") };
        assert!(region.is_empty());
        assert!(region.is_locked());

        unsafe {
            assert_eq!(mlock(NonNull::dangling(), 0), LockResult::Locked);
            munlock(NonNull::dangling(), 0);
        }
    }
}
