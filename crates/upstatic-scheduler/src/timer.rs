use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;

use crate::{panic_payload_to_str, CancellationToken, Cancelled};

/// Cadence used when the caller does not configure one.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(200);

/// What a refresh job wants after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still dirty; run again on the next tick.
    Continue,
    /// Clean; end the cycle.
    Idle,
}

struct Cycle {
    id: u64,
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Cycle {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

struct TimerInner {
    handle: tokio::runtime::Handle,
    cadence: Duration,
    next_id: AtomicU64,
    current: Mutex<Option<Cycle>>,
}

impl Drop for TimerInner {
    fn drop(&mut self) {
        if let Some(cycle) = self.current.get_mut().take() {
            cycle.cancel();
        }
    }
}

/// Repeating, restartable refresh timer.
///
/// Each [`RefreshTimer::start`] replaces the pending cycle (if any). The new
/// cycle first fires one cadence after the call and keeps firing until the job
/// returns [`Tick::Idle`], the job reports [`Cancelled`], or [`RefreshTimer::stop`]
/// is called.
#[derive(Clone)]
pub struct RefreshTimer {
    inner: Arc<TimerInner>,
}

impl RefreshTimer {
    pub fn new(handle: tokio::runtime::Handle, cadence: Duration) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                handle,
                cadence: cadence.max(Duration::from_millis(1)),
                next_id: AtomicU64::new(1),
                current: Mutex::new(None),
            }),
        }
    }

    pub fn cadence(&self) -> Duration {
        self.inner.cadence
    }

    /// Whether a cycle is scheduled and has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.inner.current.lock().is_some()
    }

    /// Start a new cycle running `job` on every tick, cancelling the previous
    /// cycle first. Returns the new cycle's token.
    pub fn start<F>(&self, mut job: F) -> CancellationToken
    where
        F: FnMut(&CancellationToken) -> Result<Tick, Cancelled> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let cadence = self.inner.cadence;

        // Hold the slot for the whole swap so the new cycle cannot finish and
        // clear itself before it has been registered.
        let mut current = self.inner.current.lock();
        if let Some(previous) = current.take() {
            tracing::trace!(target: "upstatic.scheduler", cycle = previous.id, "replacing refresh cycle");
            previous.cancel();
        }

        let weak: Weak<TimerInner> = Arc::downgrade(&self.inner);
        let token_for_task = token.clone();
        let handle = self.inner.handle.spawn(async move {
            let mut ticks =
                tokio::time::interval_at(tokio::time::Instant::now() + cadence, cadence);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token_for_task.cancelled() => break,
                    _ = ticks.tick() => {
                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            job(&token_for_task)
                        }));
                        match outcome {
                            Ok(Ok(Tick::Continue)) => {}
                            Ok(Ok(Tick::Idle)) | Ok(Err(Cancelled)) => break,
                            Err(panic) => {
                                tracing::error!(
                                    target: "upstatic.scheduler",
                                    cycle = id,
                                    panic = %panic_payload_to_str(&*panic),
                                    "refresh job panicked"
                                );
                                break;
                            }
                        }
                    }
                }
            }

            if let Some(inner) = weak.upgrade() {
                let mut current = inner.current.lock();
                if current.as_ref().is_some_and(|cycle| cycle.id == id) {
                    *current = None;
                }
            }
        });

        *current = Some(Cycle {
            id,
            token: token.clone(),
            handle,
        });
        tracing::trace!(target: "upstatic.scheduler", cycle = id, cadence_ms = cadence.as_millis() as u64, "refresh cycle started");

        token
    }

    /// Cancel the pending cycle, if any. Safe to call any number of times.
    ///
    /// Returns `true` if a cycle was pending.
    pub fn stop(&self) -> bool {
        let Some(cycle) = self.inner.current.lock().take() else {
            return false;
        };
        tracing::trace!(target: "upstatic.scheduler", cycle = cycle.id, "refresh cycle stopped");
        cycle.cancel();
        true
    }
}

impl std::fmt::Debug for RefreshTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTimer")
            .field("cadence", &self.inner.cadence)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn timer() -> RefreshTimer {
        RefreshTimer::new(tokio::runtime::Handle::current(), Duration::from_millis(200))
    }

    fn counting_job(
        runs: &Arc<AtomicUsize>,
        until: usize,
    ) -> impl FnMut(&CancellationToken) -> Result<Tick, Cancelled> + Send + 'static {
        let runs = Arc::clone(runs);
        move |_token| {
            let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(if n >= until { Tick::Idle } else { Tick::Continue })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_one_cadence_then_goes_idle() {
        let timer = timer();
        let runs = Arc::new(AtomicUsize::new(0));
        timer.start(counting_job(&runs, 1));
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_ticking_while_dirty() {
        let timer = timer();
        let runs = Arc::new(AtomicUsize::new(0));
        timer.start(counting_job(&runs, 3));

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_previous_cycle() {
        let timer = timer();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_token = timer.start(counting_job(&first, 1));
        tokio::time::sleep(Duration::from_millis(150)).await;
        timer.start(counting_job(&second, 1));
        assert!(first_token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_prevents_the_pass() {
        let timer = timer();
        let runs = Arc::new(AtomicUsize::new(0));
        let token = timer.start(counting_job(&runs, 1));

        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(token.is_cancelled());
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_job_ends_the_cycle() {
        let timer = timer();
        timer.start(|_token| Err(Cancelled));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_job_ends_the_cycle() {
        let timer = timer();
        timer.start(|_token| panic!("boom"));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!timer.is_pending());
    }
}
