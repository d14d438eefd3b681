//! Request batcher: coalesces concurrent requests into dispatches.
//!
//! Triggers: the pending set reaching `max_batch_size`, a single armed timer of
//! `max_wait_time` started by the first request of a window, or an explicit
//! [`flush`](RequestBatcher::flush). At most one dispatch is in flight; work
//! that arrives meanwhile is scheduled once the dispatch settles.

use super::collector::{BatchConfig, PendingRequest, PendingSet, Responder};
use super::executor::{BatchExecutor, BatchRequest};
use crate::{Error, ErrorContext, Result};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Slot<E> = (
    String,
    PendingRequest<<E as BatchExecutor>::Request, <E as BatchExecutor>::Output>,
);

struct State<Req, Out> {
    pending: PendingSet<Req, Out>,
    /// Keys of the dispatch in flight, with waiters that attached after it left.
    in_flight: HashMap<String, Vec<Responder<Out>>>,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
    dispatching: bool,
    flush_requested: bool,
    sequence: u64,
}

impl<Req, Out: Clone> State<Req, Out> {
    fn disarm_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
        self.timer_generation += 1;
    }
}

struct Shared<E: BatchExecutor> {
    config: BatchConfig,
    executor: E,
    state: Mutex<State<E::Request, E::Output>>,
    idle: Notify,
}

impl<E: BatchExecutor> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, State<E::Request, E::Output>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deduplicating request batcher over an injected [`BatchExecutor`].
pub struct RequestBatcher<E: BatchExecutor> {
    shared: Arc<Shared<E>>,
}

impl<E: BatchExecutor> Clone for RequestBatcher<E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<E: BatchExecutor> RequestBatcher<E> {
    /// A `max_batch_size` of 0 is treated as 1.
    pub fn new(executor: E, mut config: BatchConfig) -> Self {
        config.max_batch_size = config.max_batch_size.max(1);
        Self {
            shared: Arc::new(Shared {
                config,
                executor,
                state: Mutex::new(State {
                    pending: PendingSet::new(),
                    in_flight: HashMap::new(),
                    timer: None,
                    timer_generation: 0,
                    dispatching: false,
                    flush_requested: false,
                    sequence: 0,
                }),
                idle: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.shared.config
    }

    /// Queues one request and resolves with its own result.
    ///
    /// A request whose dedup key matches a pending or in-flight request shares
    /// that request's outcome instead of being sent again.
    pub async fn enqueue(&self, request: E::Request) -> Result<E::Output> {
        let rx = self.submit(request);
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::cancelled("batcher dropped before the request settled")),
        }
    }

    /// Queues several requests and resolves with one result per request, in order.
    pub async fn enqueue_many(&self, requests: Vec<E::Request>) -> Vec<Result<E::Output>> {
        let receivers: Vec<_> = requests.into_iter().map(|r| self.submit(r)).collect();
        futures::future::join_all(receivers.into_iter().map(|rx| async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::cancelled("batcher dropped before the request settled")),
            }
        }))
        .await
    }

    /// Dispatches everything pending now and returns once the batcher is idle.
    pub async fn flush(&self) {
        let start = {
            let mut state = self.shared.lock();
            state.disarm_timer();
            if state.dispatching {
                state.flush_requested = true;
                false
            } else if state.pending.is_empty() {
                false
            } else {
                state.flush_requested = true;
                state.dispatching = true;
                true
            }
        };
        if start {
            spawn_dispatch(&self.shared);
        }
        loop {
            let notified = self.shared.idle.notified();
            let busy = self.shared.lock().dispatching;
            if !busy {
                return;
            }
            notified.await;
        }
    }

    /// Number of queued requests not yet handed to the executor.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Rejects every queued request and every waiter attached to the in-flight
    /// dispatch with a cancellation error. The in-flight dispatch still settles
    /// for the callers it carried.
    pub fn cancel_all(&self) {
        let (pending, late) = {
            let mut state = self.shared.lock();
            state.disarm_timer();
            state.flush_requested = false;
            let pending = state.pending.drain_all();
            let late: Vec<Responder<E::Output>> = state
                .in_flight
                .values_mut()
                .flat_map(|waiters| waiters.drain(..))
                .collect();
            (pending, late)
        };
        if pending.is_empty() && late.is_empty() {
            return;
        }
        debug!(
            pending = pending.len(),
            late_waiters = late.len(),
            "cancelling batched requests"
        );
        for (_, request) in pending {
            request.settle(Err(cancelled_error()), Vec::new());
        }
        for waiter in late {
            let _ = waiter.send(Err(cancelled_error()));
        }
    }

    fn submit(&self, request: E::Request) -> oneshot::Receiver<Result<E::Output>> {
        let (tx, rx) = oneshot::channel();
        let key = request.dedup_key();
        let dedup = self.shared.config.dedup;

        let start = {
            let mut state = self.shared.lock();
            if dedup {
                if let Some(existing) = state.pending.get_mut(&key) {
                    existing.attach(tx);
                    debug!(key = %key, "joined pending request");
                    return rx;
                }
                if let Some(waiters) = state.in_flight.get_mut(&key) {
                    waiters.push(tx);
                    debug!(key = %key, "joined in-flight request");
                    return rx;
                }
            }
            let slot = if dedup {
                key
            } else {
                state.sequence += 1;
                format!("{}#{}", key, state.sequence)
            };
            state.pending.push(slot, PendingRequest::new(request, tx));
            schedule(&self.shared, &mut state)
        };
        if start {
            spawn_dispatch(&self.shared);
        }
        rx
    }
}

fn cancelled_error() -> Error {
    Error::cancelled("batch request cancelled")
}

/// Decides what the new pending state triggers. Returns `true` when the caller
/// must start a dispatch run; `dispatching` is already set in that case.
fn schedule<E: BatchExecutor>(
    shared: &Arc<Shared<E>>,
    state: &mut State<E::Request, E::Output>,
) -> bool {
    if state.dispatching || state.pending.is_empty() {
        return false;
    }
    if state.flush_requested || state.pending.len() >= shared.config.max_batch_size {
        state.disarm_timer();
        state.dispatching = true;
        return true;
    }
    if state.timer.is_none() {
        arm_timer(shared, state);
    }
    false
}

fn arm_timer<E: BatchExecutor>(shared: &Arc<Shared<E>>, state: &mut State<E::Request, E::Output>) {
    state.disarm_timer();
    let generation = state.timer_generation;
    let wait = shared.config.max_wait_time;
    let weak: Weak<Shared<E>> = Arc::downgrade(shared);
    state.timer = Some(tokio::spawn(async move {
        tokio::time::sleep(wait).await;
        if let Some(shared) = weak.upgrade() {
            on_timer(&shared, generation);
        }
    }));
}

fn on_timer<E: BatchExecutor>(shared: &Arc<Shared<E>>, generation: u64) {
    let start = {
        let mut state = shared.lock();
        if state.timer_generation != generation {
            return;
        }
        // the handle belongs to this task; dropping it detaches
        state.timer = None;
        if state.dispatching || state.pending.is_empty() {
            false
        } else {
            state.dispatching = true;
            true
        }
    };
    if start {
        spawn_dispatch(shared);
    }
}

fn spawn_dispatch<E: BatchExecutor>(shared: &Arc<Shared<E>>) {
    tokio::spawn(run_dispatches(shared.clone()));
}

/// Sends dispatches back to back while a flush or a full batch asks for it,
/// then hands remaining work back to the timer.
async fn run_dispatches<E: BatchExecutor>(shared: Arc<Shared<E>>) {
    loop {
        let batch: Vec<Slot<E>> = {
            let mut state = shared.lock();
            let batch = state.pending.drain(shared.config.max_batch_size);
            for (key, _) in &batch {
                state.in_flight.insert(key.clone(), Vec::new());
            }
            batch
        };

        if !batch.is_empty() {
            dispatch_one(&shared, batch).await;
        }

        let more = {
            let mut state = shared.lock();
            if state.pending.is_empty() {
                state.dispatching = false;
                state.flush_requested = false;
                false
            } else if state.flush_requested
                || state.pending.len() >= shared.config.max_batch_size
            {
                true
            } else {
                state.dispatching = false;
                if state.timer.is_none() {
                    arm_timer(&shared, &mut state);
                }
                false
            }
        };
        if !more {
            shared.idle.notify_waiters();
            return;
        }
    }
}

async fn dispatch_one<E: BatchExecutor>(shared: &Arc<Shared<E>>, batch: Vec<Slot<E>>) {
    let requests: Vec<E::Request> = batch.iter().map(|(_, p)| p.request.clone()).collect();
    let size = requests.len();
    let oldest_wait_ms = batch
        .iter()
        .map(|(_, p)| p.enqueued_at.elapsed().as_millis() as u64)
        .max()
        .unwrap_or(0);
    debug!(size, oldest_wait_ms, "dispatching batch");

    let outcome = match AssertUnwindSafe(shared.executor.execute(requests))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => Err(Error::unknown(
            None,
            format!("batch executor panicked: {}", panic_message(&*panic)),
            ErrorContext::new().with_source("request_batcher"),
        )),
    };

    let late: Vec<Vec<Responder<E::Output>>> = {
        let mut state = shared.lock();
        batch
            .iter()
            .map(|(key, _)| state.in_flight.remove(key).unwrap_or_default())
            .collect()
    };

    match outcome {
        Ok(results) => {
            if results.len() < size {
                warn!(
                    expected = size,
                    received = results.len(),
                    "batch returned fewer results than requests"
                );
            }
            let mut results = results.into_iter();
            for (position, ((key, pending), late)) in batch.into_iter().zip(late).enumerate() {
                let item = results.next().unwrap_or_else(|| {
                    Err(Error::unknown(
                        None,
                        format!("no result for batched request {} at position {}", key, position),
                        ErrorContext::new().with_source("request_batcher"),
                    ))
                });
                pending.settle(item, late);
            }
        }
        Err(err) => {
            warn!(size, error_code = err.code().code(), "batch dispatch failed");
            for ((_, pending), late) in batch.into_iter().zip(late) {
                pending.settle(Err(err.clone()), late);
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
