//! Polling state machine
//!
//! Runs a fetch once immediately and then on every interval tick, exposing
//! the latest `Validation<T>` through a cloneable [`PollerHandle`].
//!
//! - Ticks are skipped (the timer keeps running) while fetching is disabled.
//! - Fetches are not cancelled when the next tick fires, so they may overlap.
//!   With [`OverlapPolicy::LastCompletionWins`] whichever completes last is
//!   shown, even if it was issued first. [`OverlapPolicy::LastIssuedWins`]
//!   drops results older than the newest applied one instead.
//! - Observers registered with `on_next_fetch` run after the state has been
//!   replaced and stay registered until they return `true`.
//! - After `stop`, results of in-flight fetches are discarded.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::core::{FetchError, Validated, Validation};

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Validated<T>> + Send + Sync>;
type Observer<T> = Box<dyn FnMut(&Validated<T>) -> bool + Send>;

/// Shortest tick period; `tokio::time::interval` rejects zero
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Which result is kept when fetches overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every completion replaces the state, stale ones included
    #[default]
    LastCompletionWins,
    /// A completion older than the newest applied fetch is dropped
    LastIssuedWins,
}

/// What consumers see while a refresh is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshStyle {
    /// Previous result stays visible until the new one lands
    #[default]
    KeepStale,
    /// State becomes `Loading` when each fetch is issued
    ResetToLoading,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PollerConfig {
    pub overlap: OverlapPolicy,
    pub refresh: RefreshStyle,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Fetches started
    pub issued: u64,
    /// Results applied to the state
    pub completed: u64,
    /// Results dropped (after stop, or stale under `LastIssuedWins`)
    pub discarded: u64,
    /// Ticks skipped because fetching was disabled
    pub skipped: u64,
}

struct PollState<T> {
    current: Arc<Validation<T>>,
    should_fetch: bool,
    running: bool,
    /// Bumped on every start/stop; completions from another run are dropped
    run_id: u64,
    next_seq: u64,
    applied_seq: Option<u64>,
    observers: Vec<Observer<T>>,
    /// Set when the owning `Poller` is dropped; no observer is kept after that
    closed: bool,
    stats: PollStats,
}

/// Shared, cloneable view of a poller
pub struct PollerHandle<T> {
    shared: Arc<Mutex<PollState<T>>>,
}

impl<T> Clone for PollerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> PollerHandle<T> {
    fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(PollState {
                current: Arc::new(Validation::Loading),
                should_fetch: true,
                running: false,
                run_id: 0,
                next_seq: 0,
                applied_seq: None,
                observers: Vec::new(),
                closed: false,
                stats: PollStats::default(),
            })),
        }
    }

    /// Latest state; replaced wholesale, never mutated in place
    pub fn current_state(&self) -> Arc<Validation<T>> {
        self.shared.lock().current.clone()
    }

    /// Enable or disable fetching on subsequent ticks
    ///
    /// Re-enabling does not fetch immediately; the next tick does.
    pub fn set_should_fetch(&self, enabled: bool) {
        let mut state = self.shared.lock();
        if state.should_fetch != enabled {
            info!(enabled, "Polling toggled");
        }
        state.should_fetch = enabled;
    }

    pub fn should_fetch(&self) -> bool {
        self.shared.lock().should_fetch
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn stats(&self) -> PollStats {
        self.shared.lock().stats
    }

    /// Observe the result of the next completed fetch
    ///
    /// The callback runs after the state has been updated. Returning `false`
    /// keeps it registered for the fetch after that; `true` removes it.
    pub fn on_next_fetch<F>(&self, callback: F)
    where
        F: FnMut(&Validated<T>) -> bool + Send + 'static,
    {
        let mut state = self.shared.lock();
        if state.closed {
            debug!("Poller dropped, observer ignored");
            return;
        }
        state.observers.push(Box::new(callback));
    }

    /// Resolve with the first successful refresh whose value satisfies
    /// `predicate`, e.g. to confirm a mutation is visible in polled data.
    ///
    /// Registration happens immediately. Yields `None` if the [`Poller`] is
    /// dropped first, even while other handles are still alive.
    pub fn wait_for<P>(&self, predicate: P) -> impl Future<Output = Option<T>> + Send + 'static
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut tx = Some(tx);
        self.on_next_fetch(move |result| {
            // caller stopped waiting
            if tx.as_ref().map_or(true, |tx| tx.is_closed()) {
                return true;
            }
            match result {
                Validated::Success(value) if predicate(value) => {
                    if let Some(tx) = tx.take() {
                        let _ = tx.send(value.clone());
                    }
                    true
                }
                _ => false,
            }
        });
        async move { rx.await.ok() }
    }

    /// Allocate a sequence number for a new fetch, or `None` to skip the tick
    fn begin_fetch(&self, run_id: u64, refresh: RefreshStyle) -> Option<u64> {
        let mut state = self.shared.lock();
        if !state.running || state.run_id != run_id {
            return None;
        }
        if !state.should_fetch {
            state.stats.skipped += 1;
            debug!(skipped = state.stats.skipped, "Fetching disabled, tick skipped");
            return None;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.stats.issued += 1;
        if refresh == RefreshStyle::ResetToLoading {
            state.current = Arc::new(Validation::Loading);
        }
        debug!(seq, "Fetch issued");
        Some(seq)
    }

    fn complete(&self, run_id: u64, seq: u64, result: Validated<T>, overlap: OverlapPolicy) {
        let mut observers = {
            let mut state = self.shared.lock();
            if !state.running || state.run_id != run_id {
                state.stats.discarded += 1;
                warn!(seq, "Fetch completed after stop, result discarded");
                return;
            }
            if overlap == OverlapPolicy::LastIssuedWins
                && state.applied_seq.is_some_and(|applied| applied > seq)
            {
                state.stats.discarded += 1;
                warn!(seq, applied = ?state.applied_seq, "Stale fetch result discarded");
                return;
            }

            match &result {
                Validated::Success(_) => debug!(seq, "Fetch succeeded"),
                Validated::Failure(e) => warn!(seq, kind = e.kind(), error = %e, "Fetch failed"),
            }

            state.applied_seq = Some(seq);
            state.stats.completed += 1;
            state.current = Arc::new(result.clone().into());
            std::mem::take(&mut state.observers)
        };

        // state is already replaced, observers may read it
        trace!(seq, observers = observers.len(), "Notifying observers");
        observers.retain_mut(|observer| !observer(&result));

        let mut state = self.shared.lock();
        if state.closed {
            // dropped while notifying; release senders outside the lock
            drop(state);
            return;
        }
        observers.append(&mut state.observers);
        state.observers = observers;
    }
}

/// Owns the tick loop; dropping it stops polling
pub struct Poller<T: Clone + Send + Sync + 'static> {
    handle: PollerHandle<T>,
    config: PollerConfig,
    ticker: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            handle: PollerHandle::new(),
            config,
            ticker: None,
        }
    }

    pub fn handle(&self) -> PollerHandle<T> {
        self.handle.clone()
    }

    pub fn current_state(&self) -> Arc<Validation<T>> {
        self.handle.current_state()
    }

    /// Fetch now and then every `interval` (at least 1ms)
    ///
    /// Must be called within a tokio runtime. Restarting replaces the
    /// previous loop; its in-flight results are discarded.
    pub fn start<F, Fut>(&mut self, fetch: F, interval: Duration)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Validated<T>> + Send + 'static,
    {
        self.stop();

        let interval = if interval < MIN_INTERVAL {
            warn!(interval_ms = interval.as_millis() as u64, "Poll interval too short, clamped to 1ms");
            MIN_INTERVAL
        } else {
            interval
        };

        let run_id = {
            let mut state = self.handle.shared.lock();
            state.run_id += 1;
            state.running = true;
            state.run_id
        };
        info!(interval_ms = interval.as_millis() as u64, config = ?self.config, "Poller started");

        let fetch: FetchFn<T> = Arc::new(move || fetch().boxed());
        let handle = self.handle.clone();
        let config = self.config;

        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let Some(seq) = handle.begin_fetch(run_id, config.refresh) else {
                    continue;
                };

                let fetch = fetch.clone();
                let handle = handle.clone();
                tokio::spawn(async move {
                    let result = match AssertUnwindSafe(async move { fetch().await })
                        .catch_unwind()
                        .await
                    {
                        Ok(result) => result,
                        Err(panic) => Validated::Failure(FetchError::Internal(panic_message(&*panic))),
                    };
                    handle.complete(run_id, seq, result, config.overlap);
                });
            }
        }));
    }

    /// Stop future ticks; results still in flight will be dropped
    pub fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        ticker.abort();

        let mut state = self.handle.shared.lock();
        state.running = false;
        state.run_id += 1;
        info!(stats = ?state.stats, "Poller stopped");
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Poller<T> {
    fn drop(&mut self) {
        self.stop();
        let observers = {
            let mut state = self.handle.shared.lock();
            state.closed = true;
            std::mem::take(&mut state.observers)
        };
        // pending `wait_for` futures resolve to `None` once their senders go
        drop(observers);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("fetch panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("fetch panicked: {msg}")
    } else {
        "fetch panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    const INTERVAL: Duration = Duration::from_secs(10);
    const EPS: Duration = Duration::from_millis(1);

    fn counting_fetch(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, Validated<Vec<u32>>> + Send + Sync + 'static {
        move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Validated::success(Vec::new())
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_fetch_per_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller: Poller<Vec<u32>> = Poller::new(PollerConfig::default());
        poller.start(counting_fetch(calls.clone()), INTERVAL);

        sleep(EPS).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(INTERVAL - EPS * 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(EPS * 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.handle().stats().issued, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_fetch_keeps_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller: Poller<Vec<u32>> = Poller::new(PollerConfig::default());
        assert!(poller.current_state().is_loading());

        poller.start(counting_fetch(calls.clone()), INTERVAL);
        sleep(INTERVAL + EPS).await;
        assert_eq!(*poller.current_state(), Validation::Success(vec![]));

        let handle = poller.handle();
        handle.set_should_fetch(false);
        sleep(INTERVAL).await;
        assert_eq!(*poller.current_state(), Validation::Success(vec![]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.stats().skipped, 1);

        // resumes on the next tick, not immediately
        handle.set_should_fetch(true);
        sleep(EPS).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        sleep(INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_next_fetch_called_once_when_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut poller: Poller<Vec<u32>> = Poller::new(PollerConfig::default());
        let handle = poller.handle();

        let seen_clone = seen.clone();
        let handle_clone = handle.clone();
        handle.on_next_fetch(move |result| {
            // state is already updated when observers run
            let state = handle_clone.current_state();
            seen_clone.lock().push((result.clone(), state.is_loading()));
            true
        });

        poller.start(counting_fetch(calls), INTERVAL);
        sleep(INTERVAL * 3 + EPS).await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (Validated::Success(vec![]), false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_stays_until_true() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch_counter = counter.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        poller.handle().on_next_fetch(move |result| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            matches!(result, Validated::Success(n) if *n >= 3)
        });
        poller.start(
            move || {
                let n = fetch_counter.fetch_add(1, Ordering::SeqCst) as u32 + 1;
                async move { Validated::success(n) }
            },
            INTERVAL,
        );

        sleep(INTERVAL * 5 + EPS).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*poller.current_state(), Validation::Success(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_recovery() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        poller.start(
            move || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Validated::failure(FetchError::network("GET returned 502"))
                    } else {
                        Validated::success(7)
                    }
                }
            },
            INTERVAL,
        );

        sleep(EPS).await;
        assert_eq!(
            *poller.current_state(),
            Validation::Failure(FetchError::network("GET returned 502"))
        );
        sleep(INTERVAL).await;
        assert_eq!(*poller.current_state(), Validation::Success(7));
    }

    async fn exploding() -> Validated<u32> {
        panic!("backend client bug")
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_becomes_failure() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        poller.start(exploding, INTERVAL);
        sleep(EPS).await;

        match &*poller.current_state() {
            Validation::Failure(FetchError::Internal(msg)) => assert!(msg.contains("backend client bug")),
            other => panic!("unexpected state {other:?}"),
        }
        // the tick loop survives
        sleep(INTERVAL).await;
        assert_eq!(poller.handle().stats().issued, 2);
    }

    /// First fetch takes 2.5 intervals, later ones are instant
    fn slow_first(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, Validated<String>> + Send + Sync + 'static {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    sleep(INTERVAL * 5 / 2).await;
                    Validated::success("slow".to_string())
                } else {
                    Validated::success(format!("fast{n}"))
                }
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_last_completion_wins() {
        let mut poller: Poller<String> = Poller::new(PollerConfig::default());
        poller.start(slow_first(Arc::new(AtomicUsize::new(0))), INTERVAL);

        sleep(INTERVAL * 2 + EPS).await;
        assert_eq!(*poller.current_state(), Validation::Success("fast2".to_string()));

        // the stale response lands last and overwrites fresher data
        sleep(INTERVAL / 2).await;
        assert_eq!(*poller.current_state(), Validation::Success("slow".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_last_issued_wins() {
        let config = PollerConfig {
            overlap: OverlapPolicy::LastIssuedWins,
            ..Default::default()
        };
        let mut poller: Poller<String> = Poller::new(config);
        poller.start(slow_first(Arc::new(AtomicUsize::new(0))), INTERVAL);

        sleep(INTERVAL * 5 / 2 + EPS).await;
        assert_eq!(*poller.current_state(), Validation::Success("fast2".to_string()));
        assert_eq!(poller.handle().stats().discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_after_stop_discarded() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        let observed = Arc::new(AtomicUsize::new(0));
        let observed_clone = observed.clone();
        poller.handle().on_next_fetch(move |_| {
            observed_clone.fetch_add(1, Ordering::SeqCst);
            true
        });
        poller.start(
            || async {
                sleep(Duration::from_secs(5)).await;
                Validated::success(1)
            },
            INTERVAL,
        );

        sleep(Duration::from_secs(1)).await;
        poller.stop();
        sleep(INTERVAL * 2).await;

        let handle = poller.handle();
        assert!(poller.current_state().is_loading());
        assert!(!handle.is_running());
        assert_eq!(handle.stats().discarded, 1);
        assert_eq!(handle.stats().issued, 1);
        assert_eq!(observed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_to_loading_on_each_fetch() {
        let config = PollerConfig {
            refresh: RefreshStyle::ResetToLoading,
            ..Default::default()
        };
        let mut poller: Poller<u32> = Poller::new(config);
        poller.start(
            || async {
                sleep(Duration::from_secs(5)).await;
                Validated::success(1)
            },
            INTERVAL,
        );

        sleep(Duration::from_secs(6)).await;
        assert_eq!(*poller.current_state(), Validation::Success(1));
        sleep(Duration::from_secs(5)).await;
        assert!(poller.current_state().is_loading());
        sleep(Duration::from_secs(5)).await;
        assert_eq!(*poller.current_state(), Validation::Success(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_stale_while_refreshing() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        poller.start(
            || async {
                sleep(Duration::from_secs(5)).await;
                Validated::success(1)
            },
            INTERVAL,
        );

        sleep(Duration::from_secs(11)).await;
        assert_eq!(*poller.current_state(), Validation::Success(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_matching_refresh() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch_counter = counter.clone();
        let waiter = poller.handle().wait_for(|n| *n == 3);

        poller.start(
            move || {
                let n = fetch_counter.fetch_add(1, Ordering::SeqCst) as u32 + 1;
                async move { Validated::success(n) }
            },
            INTERVAL,
        );

        assert_eq!(waiter.await, Some(3));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resolves_none_while_handle_alive() {
        let mut poller: Poller<u32> = Poller::new(PollerConfig::default());
        let handle = poller.handle();
        let waiter = handle.wait_for(|n| *n > 100);
        poller.start(|| async { Validated::success(1) }, INTERVAL);
        sleep(INTERVAL + EPS).await;

        drop(poller);
        let resolved = tokio::time::timeout(Duration::from_secs(3600), waiter).await;
        assert_eq!(resolved, Ok(None));
        // the surviving handle still reads the last state
        assert_eq!(*handle.current_state(), Validation::Success(1));
        assert_eq!(handle.wait_for(|_| true).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller: Poller<Vec<u32>> = Poller::new(PollerConfig::default());
        poller.start(counting_fetch(calls.clone()), Duration::ZERO);

        sleep(Duration::from_millis(10)).await;
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(*poller.current_state(), Validation::Success(vec![]));
        assert!(poller.handle().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_resolves_none_when_dropped() {
        let poller: Poller<u32> = Poller::new(PollerConfig::default());
        let waiter = poller.handle().wait_for(|_| true);
        drop(poller);
        assert_eq!(waiter.await, None);
    }
}
