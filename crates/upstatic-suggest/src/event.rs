use tokio::sync::broadcast;
use upstatic_rank::ResultKind;

/// State transitions published to renderers.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestEvent {
    /// A filter pass completed and its list replaced the previous one.
    ResultsChanged {
        query: String,
        kind: ResultKind,
        ordering: Vec<usize>,
    },
    ActiveChanged {
        active: Option<usize>,
    },
    /// A candidate was submitted; renderers scroll to / highlight it.
    Selected {
        candidate_index: usize,
    },
    LoadingChanged {
        loading: bool,
    },
    ListToggled {
        open: bool,
    },
}

pub type EventReceiver = broadcast::Receiver<SuggestEvent>;

#[derive(Clone)]
pub(crate) struct EventSender {
    tx: broadcast::Sender<SuggestEvent>,
}

impl EventSender {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }

    pub(crate) fn send(&self, event: SuggestEvent) {
        // No subscribers is fine; renderers may poll snapshots instead.
        let _ = self.tx.send(event);
    }
}
