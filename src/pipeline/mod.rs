//! The live reformatting pipeline.
//!
//! - [`debounce`]: coalesces edits into a single delayed trigger
//! - [`orchestrator`]: one format run, from inputs to output
//! - [`bootstrap`]: seeding and first run when the service becomes ready
//! - [`session`]: the context object that owns all of the above

pub mod bootstrap;
pub mod debounce;
pub mod orchestrator;
mod session;

pub use bootstrap::{BootstrapReport, ConfigSeed, FALLBACK_CONFIG, LoadingIndicator};
pub use debounce::{Clock, DEFAULT_DELAY_MS, Debouncer, ManualClock, SystemClock};
pub use orchestrator::{FATAL_PREFIX, FormatOrchestrator, NO_RESULT_MESSAGE, RunOutcome, RunRecord};
pub use session::{Phase, Session, SessionError, SessionOptions};
