//! Scoped acquisition of boundary buffers.

use super::{FormatService, Handle, ServiceError};

/// Why a boundary call produced no text.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// The call itself failed: the service threw or could not be reached.
    #[error(transparent)]
    Unreachable(#[from] ServiceError),
    /// The call completed but returned a null handle.
    #[error("service returned no result")]
    Declined,
}

/// Releases its handle when dropped, whichever way the caller leaves.
struct Lease<'a, S: FormatService + ?Sized> {
    service: &'a S,
    handle: Option<Handle>,
}

impl<S: FormatService + ?Sized> Lease<'_, S> {
    fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}

impl<S: FormatService + ?Sized> Drop for Lease<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.service.release(handle);
        }
    }
}

/// Run one boundary call and turn its handle into an owned string.
///
/// `call` performs the allocation (for example `|s| s.format(src, cfg)`).
/// A returned handle is copied out and then released exactly once, also when
/// the copy fails. A null handle becomes [`BoundaryError::Declined`].
///
/// # Errors
/// Returns [`BoundaryError::Unreachable`] if `call` or the copy fails and
/// [`BoundaryError::Declined`] if there was nothing to copy.
pub fn take_text<S, F>(service: &S, call: F) -> Result<String, BoundaryError>
where
    S: FormatService + ?Sized,
    F: FnOnce(&S) -> Result<Option<Handle>, ServiceError>,
{
    let lease = Lease {
        service,
        handle: call(service)?,
    };
    let handle = lease.handle().ok_or(BoundaryError::Declined)?;
    let text = service.read(handle)?;
    drop(lease);
    Ok(text)
}
