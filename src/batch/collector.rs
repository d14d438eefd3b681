//! Batch collector: configuration and the ordered set of pending requests.

use crate::Result;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub enabled: bool,
    pub max_batch_size: usize,
    pub max_wait_time: Duration,
    pub dedup: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_batch_size: 50,
            max_wait_time: Duration::from_millis(10),
            dedup: true,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_batch_size(mut self, s: usize) -> Self {
        self.max_batch_size = s.max(1);
        self
    }
    pub fn with_max_wait_time(mut self, d: Duration) -> Self {
        self.max_wait_time = d;
        self
    }
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

pub(crate) type Responder<T> = oneshot::Sender<Result<T>>;

/// One caller's queued unit of work plus the duplicates folded into it.
pub(crate) struct PendingRequest<Req, Out> {
    pub request: Req,
    responder: Responder<Out>,
    waiters: Vec<Responder<Out>>,
    pub enqueued_at: Instant,
}

impl<Req, Out: Clone> PendingRequest<Req, Out> {
    pub fn new(request: Req, responder: Responder<Out>) -> Self {
        Self {
            request,
            responder,
            waiters: Vec::new(),
            enqueued_at: Instant::now(),
        }
    }

    pub fn attach(&mut self, waiter: Responder<Out>) {
        self.waiters.push(waiter);
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Delivers `outcome` to the original caller, then to every waiter in
    /// attachment order, then to `late` waiters.
    pub fn settle(self, outcome: Result<Out>, late: Vec<Responder<Out>>) {
        for waiter in self.waiters.into_iter().chain(late) {
            // receiver gone means the caller stopped waiting
            let _ = waiter.send(outcome.clone());
        }
        let _ = self.responder.send(outcome);
    }
}

/// Pending requests keyed by slot, iterated in enqueue order.
pub(crate) struct PendingSet<Req, Out> {
    order: VecDeque<String>,
    entries: HashMap<String, PendingRequest<Req, Out>>,
}

impl<Req, Out: Clone> PendingSet<Req, Out> {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PendingRequest<Req, Out>> {
        self.entries.get_mut(key)
    }

    pub fn push(&mut self, key: String, pending: PendingRequest<Req, Out>) {
        self.order.push_back(key.clone());
        self.entries.insert(key, pending);
    }

    /// Removes up to `max` entries from the front, preserving enqueue order.
    pub fn drain(&mut self, max: usize) -> Vec<(String, PendingRequest<Req, Out>)> {
        let mut out = Vec::with_capacity(max.min(self.order.len()));
        while out.len() < max {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            if let Some(pending) = self.entries.remove(&key) {
                out.push((key, pending));
            }
        }
        out
    }

    pub fn drain_all(&mut self) -> Vec<(String, PendingRequest<Req, Out>)> {
        self.drain(usize::MAX)
    }
}
