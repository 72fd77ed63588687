//! Batching and delivery: accumulates events, flushes on size or a timer,
//! and tries transmitters in priority order until one succeeds.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use beaconkit_core::time::Clock;
use beaconkit_protocol::{Batch, Event};
use beaconkit_transport::{BeaconTransmitter, Result as TransportResult, Transmitter};

/// Wraps [`BeaconTransmitter`]'s synchronous `send` so it can sit in the same
/// priority-ordered transmitter list as the async [`beaconkit_transport::HttpTransmitter`].
///
/// `BeaconTransmitter` never implements [`Transmitter`] directly in the
/// transport crate, since its `send_beacon` contract is deliberately
/// synchronous (it must complete before a `pagehide` handler returns); this
/// adapter is the queue's problem to solve, not the transport layer's.
pub struct BeaconTransmitterAdapter {
    inner: BeaconTransmitter,
}

impl BeaconTransmitterAdapter {
    /// Wrap `inner` for use as a last-resort transmitter.
    #[must_use]
    pub fn new(inner: BeaconTransmitter) -> Self {
        Self { inner }
    }
}

#[async_trait(?Send)]
impl Transmitter for BeaconTransmitterAdapter {
    async fn send(&self, batch: &Batch) -> TransportResult<()> {
        self.inner.send(batch)
    }

    fn name(&self) -> &'static str {
        "beacon"
    }
}

/// A transmitter entry with its priority: higher values are tried first.
struct RankedTransmitter {
    transmitter: Box<dyn Transmitter>,
    priority: i32,
}

/// Accumulates events into batches and hands each batch to the
/// highest-priority transmitter, falling through to the next one on failure.
///
/// Holds its state in `Rc<RefCell<_>>` rather than `Arc<Mutex<_>>`: every
/// caller runs on the page's single JS thread, so there is no real
/// concurrency to guard against, only the aliasing discipline `RefCell`
/// already enforces.
pub struct BatchingQueue {
    pending: Rc<RefCell<VecDeque<Event>>>,
    transmitters: Vec<RankedTransmitter>,
    batch_size: usize,
    clock: Rc<dyn Clock>,
    flush_timer: RefCell<Option<FlushTimer>>,
    batch_timeout_ms: u32,
}

impl BatchingQueue {
    /// Build a queue over `transmitters` (priority, transmitter pairs,
    /// highest priority first after sorting), flushing eagerly at
    /// `batch_size` events or after `batch_timeout_ms` of inactivity.
    #[must_use]
    pub fn new(
        mut transmitters: Vec<(Box<dyn Transmitter>, i32)>,
        batch_size: usize,
        batch_timeout_ms: u32,
        clock: Rc<dyn Clock>,
    ) -> Self {
        transmitters.sort_by(|a, b| b.1.cmp(&a.1));
        let transmitters = transmitters
            .into_iter()
            .map(|(transmitter, priority)| RankedTransmitter {
                transmitter,
                priority,
            })
            .collect();

        Self {
            pending: Rc::new(RefCell::new(VecDeque::new())),
            transmitters,
            batch_size,
            clock,
            flush_timer: RefCell::new(None),
            batch_timeout_ms,
        }
    }

    /// Number of events currently buffered, not yet sent.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Enqueue `event`. Flushes immediately once `batch_size` is reached;
    /// otherwise (re)arms the flush timer.
    pub fn enqueue(self: &Rc<Self>, event: Event) {
        self.pending.borrow_mut().push_back(event);

        if self.pending.borrow().len() >= self.batch_size {
            *self.flush_timer.borrow_mut() = None;
            self.spawn_flush();
        } else if self.flush_timer.borrow().is_none() {
            self.arm_flush_timer();
        }
    }

    fn arm_flush_timer(self: &Rc<Self>) {
        let queue = Rc::clone(self);
        let timer = FlushTimer::schedule(self.batch_timeout_ms, move || {
            queue.spawn_flush();
        });
        *self.flush_timer.borrow_mut() = Some(timer);
    }

    fn drain_batch(&self) -> Option<Batch> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            return None;
        }
        let events: Vec<Event> = pending.drain(..).collect();
        Some(Batch::new(events, self.clock.now_ms()))
    }

    /// Flush whatever is buffered now, asynchronously, without blocking the
    /// caller. Intended for the timer and size-threshold paths.
    pub fn spawn_flush(self: &Rc<Self>) {
        *self.flush_timer.borrow_mut() = None;
        let Some(batch) = self.drain_batch() else {
            return;
        };
        let queue = Rc::clone(self);
        spawn_local_send(async move {
            queue.send_with_fallback(&batch).await;
        });
    }

    /// Flush synchronously using only the first transmitter that reports
    /// itself as `"beacon"`, for use from an unload handler where there is no
    /// time left for retries or a fallback chain.
    pub fn flush_via_beacon(&self) {
        let Some(batch) = self.drain_batch() else {
            return;
        };
        for ranked in &self.transmitters {
            if ranked.transmitter.name() == "beacon" {
                let _ = futures_block_on(ranked.transmitter.send(&batch));
                return;
            }
        }
    }

    async fn send_with_fallback(&self, batch: &Batch) {
        for ranked in &self.transmitters {
            match ranked.transmitter.send(batch).await {
                Ok(()) => return,
                Err(err) => {
                    tracing::warn!(
                        transmitter = ranked.transmitter.name(),
                        priority = ranked.priority,
                        error = %err,
                        "transmitter failed, trying next"
                    );
                }
            }
        }
        tracing::error!(batch_id = %batch.batch_id, "all transmitters failed to deliver batch");
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_local_send<F: std::future::Future<Output = ()> + 'static>(fut: F) {
    wasm_bindgen_futures::spawn_local(fut);
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_local_send<F: std::future::Future<Output = ()> + 'static>(fut: F) {
    tokio::task::spawn_local(fut);
}

/// Drives a future to completion without an async runtime, for the
/// synchronous unload path where `spawn_local` cannot be awaited.
///
/// `BeaconTransmitter::send` never actually awaits (it's a synchronous
/// `sendBeacon` call wrapped in an async fn to satisfy the trait), so a
/// single poll always completes it; this just avoids pulling in a full
/// executor for that one guaranteed-ready poll.
fn futures_block_on<F: std::future::Future<Output = TransportResult<()>>>(
    fut: F,
) -> TransportResult<()> {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    fn noop(_: *const ()) {}
    fn clone(_: *const ()) -> RawWaker {
        RawWaker::new(std::ptr::null(), &VTABLE)
    }
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
    let waker = unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) };
    let mut cx = Context::from_waker(&waker);
    let mut fut = Box::pin(fut);
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => Ok(()),
    }
}

/// A pending flush, cancelled by dropping it.
enum FlushTimer {
    #[cfg(target_arch = "wasm32")]
    Wasm(gloo_timers::callback::Timeout),
    #[cfg(not(target_arch = "wasm32"))]
    Native(NativeTimer),
}

#[cfg(not(target_arch = "wasm32"))]
struct NativeTimer {
    handle: tokio::task::JoinHandle<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for NativeTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FlushTimer {
    #[cfg(target_arch = "wasm32")]
    fn schedule(delay_ms: u32, callback: impl FnOnce() + 'static) -> Self {
        Self::Wasm(gloo_timers::callback::Timeout::new(delay_ms, callback))
    }

    /// Uses `spawn_local` rather than `spawn`: the queue's `Rc`-based state
    /// is not `Send`, and every caller of this crate (the page's JS thread,
    /// or a test wrapped in a `LocalSet`) is single-threaded anyway.
    #[cfg(not(target_arch = "wasm32"))]
    fn schedule(delay_ms: u32, callback: impl FnOnce() + 'static) -> Self {
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(std::time::Duration::from_millis(u64::from(delay_ms))).await;
            callback();
        });
        Self::Native(NativeTimer { handle })
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use beaconkit_protocol::{EventContext, EventPayload, PageDimensions, ViewportDimensions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClock;
    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            0
        }
    }

    struct CountingTransmitter {
        name: &'static str,
        calls: Rc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl Transmitter for CountingTransmitter {
        async fn send(&self, _batch: &Batch) -> TransportResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(beaconkit_transport::TransportError::Http("boom".into()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn sample_event() -> Event {
        Event::new(
            EventContext {
                project_id: "p1".into(),
                client_id: "anon-1".into(),
                session_id: "s1".into(),
                user_id: None,
                url: "https://example.com/".into(),
                referrer: String::new(),
                page: PageDimensions {
                    scroll_width: 100,
                    scroll_height: 100,
                },
                viewport: ViewportDimensions {
                    inner_width: 100,
                    inner_height: 100,
                },
            },
            0,
            None,
            EventPayload::Custom { name: "x".into() },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn flushes_eagerly_once_batch_size_is_reached() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let calls = Rc::new(AtomicUsize::new(0));
                let transmitter = Box::new(CountingTransmitter {
                    name: "http",
                    calls: Rc::clone(&calls),
                    fail: false,
                });
                let queue = Rc::new(BatchingQueue::new(
                    vec![(transmitter, 10)],
                    2,
                    10_000,
                    Rc::new(FixedClock),
                ));

                queue.enqueue(sample_event());
                assert_eq!(queue.pending_len(), 1);
                queue.enqueue(sample_event());

                tokio::task::yield_now().await;
                assert_eq!(queue.pending_len(), 0);
                assert_eq!(calls.load(Ordering::SeqCst), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn falls_through_to_the_next_transmitter_on_failure() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let primary_calls = Rc::new(AtomicUsize::new(0));
                let fallback_calls = Rc::new(AtomicUsize::new(0));
                let primary = Box::new(CountingTransmitter {
                    name: "http",
                    calls: Rc::clone(&primary_calls),
                    fail: true,
                });
                let fallback = Box::new(CountingTransmitter {
                    name: "beacon",
                    calls: Rc::clone(&fallback_calls),
                    fail: false,
                });
                let queue = Rc::new(BatchingQueue::new(
                    vec![(fallback, 0), (primary, 10)],
                    1,
                    10_000,
                    Rc::new(FixedClock),
                ));

                queue.enqueue(sample_event());
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;

                assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
                assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
            })
            .await;
    }

    /// A second sub-threshold `enqueue` while a flush timer is already
    /// pending must not push the deadline back, or continuous low-rate
    /// traffic would starve the timer path forever.
    #[tokio::test]
    async fn a_second_enqueue_does_not_postpone_the_pending_flush() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let calls = Rc::new(AtomicUsize::new(0));
                let transmitter = Box::new(CountingTransmitter {
                    name: "http",
                    calls: Rc::clone(&calls),
                    fail: false,
                });
                let queue = Rc::new(BatchingQueue::new(
                    vec![(transmitter, 10)],
                    100,
                    30,
                    Rc::new(FixedClock),
                ));

                queue.enqueue(sample_event());
                tokio::time::sleep(std::time::Duration::from_millis(15)).await;
                queue.enqueue(sample_event());

                tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                tokio::task::yield_now().await;

                assert_eq!(queue.pending_len(), 0);
                assert_eq!(calls.load(Ordering::SeqCst), 1);
            })
            .await;
    }
}
