//! Bounded blocking FIFO shared between the planner, the workers and the
//! result collector.
//!
//! One mutex guards the circular buffer. Two counting semaphores carry the
//! blocking: `space` starts at the capacity, `items` at zero. Both `put` and
//! `get` wait on their semaphore first, then lock, mutate, unlock, and only
//! then post the complementary semaphore. Neither path can return between
//! the mutation and the post.
//!
//! The queue has no closed state. Completion is signalled by the callers
//! (the worker pool uses one shutdown job per worker).

mod semaphore;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::control::CancelToken;
use semaphore::Semaphore;

/// Queue construction error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue capacity must be at least 1")]
    Capacity,
}

/// Fixed-size ring buffer. Only touched under the queue mutex.
#[derive(Debug)]
struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    fn push(&mut self, item: T) {
        debug_assert!(self.len < self.slots.len());
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        self.len += 1;
    }

    fn pop(&mut self) -> T {
        let item = self.slots[self.head]
            .take()
            .expect("items permit guarantees a filled head slot");
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        item
    }
}

/// Multi-producer multi-consumer FIFO of fixed capacity.
///
/// Items are returned in the order their `put` calls took the lock.
/// Ownership of an item moves to whoever `get`s it.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    space: Semaphore,
    items: Semaphore,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::Capacity);
        }
        Ok(Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            space: Semaphore::new(capacity),
            items: Semaphore::new(0),
            capacity,
        })
    }

    // Ring mutations cannot panic halfway, so a poisoned lock still guards
    // a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts at the tail, blocking while the queue is full.
    pub fn put(&self, item: T) {
        self.space.acquire();
        self.lock().push(item);
        self.items.release();
    }

    /// Removes the head item, blocking while the queue is empty.
    pub fn get(&self) -> T {
        self.items.acquire();
        self.take_head()
    }

    /// Like [`get`](Self::get) but returns `None` if nothing arrives within `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        if !self.items.acquire_timeout(timeout) {
            return None;
        }
        Some(self.take_head())
    }

    /// Like [`get`](Self::get) but returns `None` once `cancel` is triggered
    /// while the queue is empty.
    pub fn get_cancellable(&self, cancel: &CancelToken) -> Option<T> {
        if !self.items.acquire_cancellable(cancel) {
            return None;
        }
        Some(self.take_head())
    }

    // Caller holds an `items` permit.
    fn take_head(&self) -> T {
        let item = self.lock().pop();
        self.space.release();
        item
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items held at the moment of the call.
    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
