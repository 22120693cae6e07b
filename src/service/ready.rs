//! One-shot delivery of a service started on a background thread.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use super::ServiceError;

/// One-shot notification that a service finished initializing.
///
/// The initializer runs on a background thread. Its result (the ready
/// service, or why it failed to start) is delivered exactly once; after
/// that the signal is spent and never yields again.
#[derive(Debug)]
pub struct ReadySignal<S> {
    rx: Option<Receiver<Result<S, ServiceError>>>,
}

impl<S: Send + 'static> ReadySignal<S> {
    /// Start initializing a service in the background.
    pub fn spawn<F>(init: F) -> Self
    where
        F: FnOnce() -> Result<S, ServiceError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(init());
        });
        Self { rx: Some(rx) }
    }
}

impl<S> ReadySignal<S> {
    /// A signal that has already fired with `result`.
    pub fn ready(result: Result<S, ServiceError>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self { rx: Some(rx) }
    }

    /// Take the result if initialization has finished.
    pub fn try_take(&mut self) -> Option<Result<S, ServiceError>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(ServiceError::Other(
                    "service initializer exited without signalling".to_string(),
                )))
            }
        }
    }

    /// Block up to `timeout` for the result.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<S, ServiceError>> {
        let rx = self.rx.take()?;
        match rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.rx = Some(rx);
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(ServiceError::Other(
                "service initializer exited without signalling".to_string(),
            ))),
        }
    }

    /// Whether the result is still to be delivered.
    pub const fn is_pending(&self) -> bool {
        self.rx.is_some()
    }
}
