//! Coalesced recomputation for incremental search.
//!
//! A [`RefreshTimer`] owns at most one pending refresh cycle. Starting a cycle
//! cancels the previous one, so bursts of change notifications collapse into a
//! single pass over the latest input. Cancellation is cooperative via
//! [`CancellationToken`]: a job must check its token before publishing
//! anything.

mod timer;

pub use timer::{RefreshTimer, Tick, DEFAULT_CADENCE};
pub use tokio_util::sync::CancellationToken;

/// Returned by a refresh job that observed its cycle being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("refresh cancelled")]
pub struct Cancelled;

pub(crate) fn panic_payload_to_str(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
