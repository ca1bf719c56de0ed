//! Incremental search-suggestion controller.
//!
//! [`SuggestSession`] turns raw input events into ranked, navigable result
//! lists. Ranking is coalesced through a [`upstatic_scheduler::RefreshTimer`];
//! navigation state lives in a [`Navigator`]. Renderers never get mutable access:
//! they read [`SessionSnapshot`]s and subscribe to [`SuggestEvent`]s.

mod event;
mod key;
mod navigator;
mod session;

pub use event::{EventReceiver, SuggestEvent};
pub use key::Key;
pub use navigator::{Navigator, NavigatorState, Submission};
pub use session::{SessionSnapshot, SuggestSession};
