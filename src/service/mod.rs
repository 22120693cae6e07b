//! The boundary to the external formatting engine.
//!
//! The engine is opaque. The pipeline reaches it only through
//! [`FormatService`], whose calls hand back [`Handle`]s to buffers the
//! engine owns. Callers never juggle handles themselves: [`take_text`]
//! acquires, copies and releases in one place.

pub mod arena;
pub mod command;
mod ready;
mod scoped;

pub use arena::BufferArena;
pub use command::{CommandService, CommandSpec};
pub use ready::ReadySignal;
pub use scoped::{BoundaryError, take_text};

use std::fmt;

/// A buffer allocated by the service and returned across the boundary.
///
/// An address/length pair into service-owned memory. Not `Clone` or `Copy`:
/// the only way to give a handle back is [`FormatService::release`], which
/// consumes it, so a handle cannot be released twice or read afterwards.
#[derive(PartialEq, Eq)]
pub struct Handle {
    addr: u32,
    len: u32,
}

impl Handle {
    /// Wrap an address/length pair produced by a service implementation.
    pub const fn new(addr: u32, len: u32) -> Self {
        Self { addr, len }
    }

    pub const fn addr(&self) -> u32 {
        self.addr
    }

    pub const fn len(&self) -> u32 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x}+{})", self.addr, self.len)
    }
}

/// Structural failures of a boundary call.
///
/// A call that completes but produces nothing is not an error; it returns
/// `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error in formatter workspace: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid or already released handle {0:#x}")]
    InvalidHandle(u32),
    #[error("{0}")]
    Other(String),
}

/// The call contract of the foreign formatting engine.
///
/// Every `Some(handle)` returned by [`default_config`](Self::default_config)
/// or [`format`](Self::format) must be passed to [`release`](Self::release)
/// exactly once, after its text has been copied out with
/// [`read`](Self::read).
pub trait FormatService {
    /// Produce the engine's default configuration text.
    ///
    /// # Errors
    /// Returns an error when the boundary itself fails.
    fn default_config(&self) -> Result<Option<Handle>, ServiceError>;

    /// Format `source` using the options in `config`.
    ///
    /// # Errors
    /// Returns an error when the boundary itself fails.
    fn format(&self, source: &str, config: &str) -> Result<Option<Handle>, ServiceError>;

    /// Copy the contents of a live handle into an owned string.
    ///
    /// # Errors
    /// Returns an error if the handle is not live.
    fn read(&self, handle: &Handle) -> Result<String, ServiceError>;

    /// Give a handle back to the service.
    fn release(&self, handle: Handle);
}

impl<T: FormatService + ?Sized> FormatService for Box<T> {
    fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
        (**self).default_config()
    }

    fn format(&self, source: &str, config: &str) -> Result<Option<Handle>, ServiceError> {
        (**self).format(source, config)
    }

    fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
        (**self).read(handle)
    }

    fn release(&self, handle: Handle) {
        (**self).release(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_debug_shows_address_and_length() {
        let handle = Handle::new(0x40, 12);
        assert_eq!(format!("{handle:?}"), "Handle(0x40+12)");
    }

    #[test]
    fn test_service_error_messages_name_the_failure() {
        let err = ServiceError::InvalidHandle(0x10);
        assert_eq!(err.to_string(), "invalid or already released handle 0x10");

        let err = ServiceError::Spawn {
            program: "fmt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("failed to start `fmt`"));
    }
}
