//! Service-owned buffer storage behind [`Handle`]s.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{Handle, ServiceError};

/// First address handed out. Zero is reserved so a handle never looks null.
const BASE_ADDR: u32 = 0x1000;

/// Byte buffers owned by a service, addressed by [`Handle`].
///
/// Addresses are never reused, so a stale address always fails to resolve
/// instead of aliasing a newer buffer.
#[derive(Debug)]
pub struct BufferArena {
    next_addr: Cell<u32>,
    live: RefCell<HashMap<u32, Box<[u8]>>>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self {
            next_addr: Cell::new(BASE_ADDR),
            live: RefCell::new(HashMap::new()),
        }
    }

    /// Take ownership of `bytes` and return a handle to them.
    pub fn alloc(&self, bytes: impl Into<Box<[u8]>>) -> Handle {
        let bytes = bytes.into();
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        let addr = self.next_addr.get();
        // Keep the next address past this buffer, plus a guard byte.
        self.next_addr
            .set(addr.wrapping_add(len).wrapping_add(1).max(BASE_ADDR));
        self.live.borrow_mut().insert(addr, bytes);
        crate::perf::log_event("arena.alloc", format!("addr={addr:#x} len={len}"));
        Handle::new(addr, len)
    }

    /// Copy a live buffer out as text.
    ///
    /// Decoding is lossy and stops at the first NUL, the way C strings read.
    ///
    /// # Errors
    /// Returns [`ServiceError::InvalidHandle`] if the handle is not live.
    pub fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
        let live = self.live.borrow();
        let bytes = live
            .get(&handle.addr())
            .ok_or(ServiceError::InvalidHandle(handle.addr()))?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Free a buffer.
    ///
    /// # Errors
    /// Returns [`ServiceError::InvalidHandle`] if the handle was never
    /// allocated here or was already freed.
    pub fn free(&self, handle: Handle) -> Result<(), ServiceError> {
        let addr = handle.addr();
        if self.live.borrow_mut().remove(&addr).is_none() {
            return Err(ServiceError::InvalidHandle(addr));
        }
        crate::perf::log_event("arena.free", format!("addr={addr:#x}"));
        Ok(())
    }

    /// Number of buffers allocated and not yet freed.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}

impl Default for BufferArena {
    fn default() -> Self {
        Self::new()
    }
}
