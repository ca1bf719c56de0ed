use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use upstatic_config::SuggestConfig;
use upstatic_rank::{filter, CandidateStore, OrderedResultList};
use upstatic_scheduler::{CancellationToken, Cancelled, RefreshTimer, Tick};

use crate::event::{EventReceiver, EventSender, SuggestEvent};
use crate::key::Key;
use crate::navigator::{Navigator, NavigatorState, Submission};

/// Plain-data view of a session for renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub query: String,
    pub results: Arc<OrderedResultList>,
    pub navigator: NavigatorState,
    pub focused: bool,
    pub list_open: bool,
    pub loading: bool,
    /// A recomputation is scheduled but has not published yet.
    pub pending: bool,
}

struct SessionState {
    store: Arc<CandidateStore>,
    query: String,
    dirty: bool,
    results: Arc<OrderedResultList>,
    navigator: Navigator,
    focused: bool,
    list_open: bool,
    loading: bool,
}

struct SessionInner {
    state: Mutex<SessionState>,
    timer: RefreshTimer,
    events: EventSender,
}

/// One search-suggestion session over a fixed candidate list.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SuggestSession {
    inner: Arc<SessionInner>,
}

impl SuggestSession {
    /// Create a session whose refresh timer runs on `handle`.
    ///
    /// The session starts with an empty query: every candidate is visible and
    /// nothing is active.
    pub fn new(
        handle: tokio::runtime::Handle,
        store: CandidateStore,
        config: &SuggestConfig,
    ) -> Self {
        let store = Arc::new(store);
        let results = filter(&store, "");
        let mut navigator = Navigator::new();
        navigator.apply(&results);

        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState {
                    store,
                    query: String::new(),
                    dirty: false,
                    results: Arc::new(results),
                    navigator,
                    focused: false,
                    list_open: false,
                    loading: false,
                }),
                timer: RefreshTimer::new(handle, config.cadence()),
                events: EventSender::new(config.event_capacity),
            }),
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        SessionSnapshot {
            query: state.query.clone(),
            results: Arc::clone(&state.results),
            navigator: state.navigator.state().clone(),
            focused: state.focused,
            list_open: state.list_open,
            loading: state.loading,
            pending: self.inner.timer.is_pending(),
        }
    }

    /// The most recently published result list.
    pub fn results(&self) -> Arc<OrderedResultList> {
        Arc::clone(&self.inner.state.lock().results)
    }

    pub fn navigator_state(&self) -> NavigatorState {
        self.inner.state.lock().navigator.state().clone()
    }

    pub fn store(&self) -> Arc<CandidateStore> {
        Arc::clone(&self.inner.state.lock().store)
    }

    /// Accept a new raw input value.
    ///
    /// An empty query is applied immediately. Anything else marks the session
    /// dirty and restarts the refresh timer, so a burst of changes produces a
    /// single pass over the latest value.
    pub fn on_query_changed(&self, query: impl Into<String>) {
        let query = query.into();
        let mut state = self.inner.state.lock();

        if query.is_empty() {
            self.inner.timer.stop();
            state.query = query;
            state.dirty = false;
            let results = filter(&state.store, "");
            self.inner.publish(&mut state, results);
            self.inner.set_loading(&mut state, false);
            return;
        }

        tracing::trace!(target: "upstatic.suggest", query = %query, "query changed");
        state.query = query;
        state.dirty = true;
        if state.focused {
            self.inner.set_loading(&mut state, true);
        }
        self.inner.set_list_open(&mut state, true);
        self.schedule();
    }

    /// Dispatch a key event.
    pub fn on_key(&self, key: Key) -> Option<Submission> {
        match key {
            Key::Escape => {
                self.blur();
                None
            }
            Key::ArrowDown => {
                self.navigate(Navigator::move_next);
                None
            }
            Key::ArrowUp => {
                self.navigate(Navigator::move_previous);
                None
            }
            Key::Enter => Some(self.submit()),
            Key::Tab => {
                let mut state = self.inner.state.lock();
                self.inner.set_list_open(&mut state, false);
                None
            }
            Key::Input(query) => {
                self.on_query_changed(query);
                None
            }
            Key::Shift | Key::Alt | Key::ArrowLeft | Key::ArrowRight => None,
        }
    }

    pub fn on_focus(&self) {
        self.inner.state.lock().focused = true;
    }

    /// Input lost focus: any pending pass is abandoned.
    pub fn on_blur(&self) {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        state.focused = false;
    }

    /// Escape: abandon pending work, close the list, drop focus.
    pub fn blur(&self) {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        state.focused = false;
        self.inner.set_list_open(&mut state, false);
    }

    pub fn move_next(&self) -> NavigatorState {
        self.navigate(Navigator::move_next)
    }

    pub fn move_previous(&self) -> NavigatorState {
        self.navigate(Navigator::move_previous)
    }

    /// Drop the active result; visibility is untouched.
    pub fn clear(&self) -> NavigatorState {
        let mut state = self.inner.state.lock();
        let before = state.navigator.active();
        let after = state.navigator.clear().clone();
        self.inner.notify_active(&state, before);
        after
    }

    /// Submit the active result. Emits [`SuggestEvent::Selected`] when
    /// something was active; always clears the loading indication.
    pub fn submit(&self) -> Submission {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        let submission = state.navigator.submit();
        self.inner.finish_submission(&mut state, submission);
        submission
    }

    /// Pointer entered a result.
    pub fn hover(&self, index: usize) -> bool {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        let before = state.navigator.active();
        let changed = state.navigator.hover(index);
        self.inner.notify_active(&state, before);
        changed
    }

    /// Pointer left a result.
    pub fn unhover(&self, index: usize) -> bool {
        let mut state = self.inner.state.lock();
        let before = state.navigator.active();
        let changed = state.navigator.unhover(index);
        self.inner.notify_active(&state, before);
        changed
    }

    /// A result was clicked.
    pub fn click(&self, index: usize) -> Submission {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        let before = state.navigator.active();
        let submission = state.navigator.select(index);
        self.inner.notify_active(&state, before);
        self.inner.finish_submission(&mut state, submission);
        submission
    }

    /// Replace the candidate list.
    ///
    /// Any pending pass is cancelled (it would score a stale snapshot) and the
    /// current query is re-applied against the new store right away.
    pub fn rebuild<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace_store(CandidateStore::build(texts));
    }

    pub fn replace_store(&self, store: CandidateStore) {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state);
        state.store = Arc::new(store);
        let results = filter(&state.store, &state.query);
        tracing::debug!(
            target: "upstatic.suggest",
            revision = state.store.revision(),
            candidates = state.store.len(),
            "candidate store replaced"
        );
        self.inner.publish(&mut state, results);
    }

    /// Cancel any pending recomputation. Idempotent.
    pub fn stop(&self) -> bool {
        let mut state = self.inner.state.lock();
        self.inner.stop_locked(&mut state)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.timer.is_pending()
    }

    fn navigate(&self, step: impl FnOnce(&mut Navigator) -> &NavigatorState) -> NavigatorState {
        let mut state = self.inner.state.lock();
        // Navigation must not race with a re-score.
        self.inner.stop_locked(&mut state);
        let before = state.navigator.active();
        let after = step(&mut state.navigator).clone();
        self.inner.notify_active(&state, before);
        after
    }

    fn schedule(&self) {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        self.inner.timer.start(move |token| {
            let Some(inner) = weak.upgrade() else {
                return Err(Cancelled);
            };
            inner.refresh(token)
        });
    }
}

impl SessionInner {
    /// One tick of the refresh cycle.
    ///
    /// Scoring runs outside the lock against a snapshot of the store; the
    /// result is published only if the cycle is still live and the store has
    /// not been replaced meanwhile.
    fn refresh(&self, token: &CancellationToken) -> Result<Tick, Cancelled> {
        let (store, query) = {
            let state = self.state.lock();
            if token.is_cancelled() {
                return Err(Cancelled);
            }
            if !state.dirty {
                return Ok(Tick::Idle);
            }
            (Arc::clone(&state.store), state.query.clone())
        };

        let results = filter(&store, &query);

        let mut state = self.state.lock();
        if token.is_cancelled() || state.store.revision() != results.revision() {
            tracing::trace!(target: "upstatic.suggest", query = %query, "discarding stale pass");
            return Err(Cancelled);
        }
        if state.query != query {
            return Ok(Tick::Continue);
        }

        state.dirty = false;
        self.publish(&mut state, results);
        self.set_loading(&mut state, false);
        Ok(Tick::Idle)
    }

    fn publish(&self, state: &mut SessionState, results: OrderedResultList) {
        let before = state.navigator.active();
        state.navigator.apply(&results);

        tracing::debug!(
            target: "upstatic.suggest",
            query = %results.query(),
            matches = results.len(),
            "results published"
        );
        self.events.send(SuggestEvent::ResultsChanged {
            query: results.query().to_owned(),
            kind: results.kind(),
            ordering: state.navigator.ordering().to_vec(),
        });
        state.results = Arc::new(results);
        self.notify_active(state, before);
    }

    fn stop_locked(&self, state: &mut SessionState) -> bool {
        let stopped = self.timer.stop();
        state.dirty = false;
        self.set_loading(state, false);
        stopped
    }

    fn finish_submission(&self, state: &mut SessionState, submission: Submission) {
        self.set_loading(state, false);
        if let Some(candidate_index) = submission.selected {
            tracing::debug!(target: "upstatic.suggest", candidate_index, "candidate selected");
            self.events.send(SuggestEvent::Selected { candidate_index });
            state.focused = false;
            self.set_list_open(state, false);
        }
    }

    fn notify_active(&self, state: &SessionState, before: Option<usize>) {
        let active = state.navigator.active();
        if active != before {
            self.events.send(SuggestEvent::ActiveChanged { active });
        }
    }

    fn set_loading(&self, state: &mut SessionState, loading: bool) {
        if state.loading != loading {
            state.loading = loading;
            self.events.send(SuggestEvent::LoadingChanged { loading });
        }
    }

    fn set_list_open(&self, state: &mut SessionState, open: bool) {
        if state.list_open != open {
            state.list_open = open;
            self.events.send(SuggestEvent::ListToggled { open });
        }
    }
}

impl std::fmt::Debug for SuggestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SuggestSession")
            .field("query", &state.query)
            .field("results", &state.results.len())
            .field("active", &state.navigator.active())
            .field("timer", &self.inner.timer)
            .finish()
    }
}
