//! Fixed-capacity blocking FIFO shared by producers and consumers.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;

/// Termination state of a queue's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Producers are still feeding records.
    Running,
    /// The source is exhausted; sentinels are queued or being queued.
    Draining,
    /// Every worker has exited.
    Joined,
}

enum Slot<T> {
    Item(T),
    Sentinel,
}

struct State<T> {
    slots: VecDeque<Slot<T>>,
    phase: Phase,
    peak_len: usize,
    sentinels_pushed: usize,
    sentinels_popped: usize,
}

impl<T> State<T> {
    fn enqueue(&mut self, slot: Slot<T>) {
        self.slots.push_back(slot);
        self.peak_len = self.peak_len.max(self.slots.len());
    }
}

/// A bounded FIFO guarded by one mutex and two condition variables.
///
/// `push` blocks while the queue is full and `pop` blocks while it is empty.
/// Waiting releases the lock. Neither call times out.
///
/// The end of input is announced once with [`announce_exhaustion`], which
/// queues one sentinel per consumer. A consumer sees its sentinel as
/// `pop() == None`.
///
/// [`announce_exhaustion`]: BoundedQueue::announce_exhaustion
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    has_space: Condvar,
    has_task: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero; such a queue could never accept a push.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            state: Mutex::new(State {
                slots: VecDeque::with_capacity(capacity),
                phase: Phase::Running,
                peak_len: 0,
                sentinels_pushed: 0,
                sentinels_popped: 0,
            }),
            has_space: Condvar::new(),
            has_task: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest length observed so far. Never exceeds `capacity`.
    pub fn peak_len(&self) -> usize {
        self.state.lock().peak_len
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn sentinels_pushed(&self) -> usize {
        self.state.lock().sentinels_pushed
    }

    pub fn sentinels_popped(&self) -> usize {
        self.state.lock().sentinels_popped
    }

    /// Blocks until at least one slot is free, without claiming it.
    pub fn wait_for_space(&self) {
        let mut state = self.state.lock();
        self.wait_until_space(&mut state);
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock();
        debug_assert_eq!(state.phase, Phase::Running, "push after exhaustion");
        self.wait_until_space(&mut state);
        state.enqueue(Slot::Item(item));
        self.has_task.notify_all();
    }

    /// Removes the front entry, blocking while the queue is empty.
    ///
    /// Returns `None` when the entry was a sentinel: the caller has been told
    /// to stop and must not pop again.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        let slot = loop {
            if let Some(slot) = state.slots.pop_front() {
                break slot;
            }
            self.has_task.wait(&mut state);
        };
        // Sentinel pops free space too; a drain into a full queue depends on it.
        self.has_space.notify_all();
        match slot {
            Slot::Item(item) => Some(item),
            Slot::Sentinel => {
                state.sentinels_popped += 1;
                None
            }
        }
    }

    /// Moves the queue from `Running` to `Draining` and queues one sentinel
    /// per consumer.
    ///
    /// Returns `true` for the single caller that performed the drain sequence.
    /// Later calls return `false` and push nothing.
    pub fn announce_exhaustion(&self, consumers: usize) -> bool {
        let mut state = self.state.lock();
        if state.phase != Phase::Running {
            return false;
        }
        state.phase = Phase::Draining;
        for _ in 0..consumers {
            self.wait_until_space(&mut state);
            state.enqueue(Slot::Sentinel);
            state.sentinels_pushed += 1;
            self.has_task.notify_all();
        }
        true
    }

    /// Records that every worker has exited.
    pub fn mark_joined(&self) {
        self.state.lock().phase = Phase::Joined;
    }

    fn wait_until_space(&self, state: &mut MutexGuard<'_, State<T>>) {
        while state.slots.len() >= self.capacity {
            self.has_space.wait(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let q = BoundedQueue::new(4);
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert!(q.is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn zero_capacity_panics() {
        let _ = BoundedQueue::<u8>::new(0);
    }

    #[test]
    fn push_blocks_while_full() {
        let q = Arc::new(BoundedQueue::new(1));
        q.push(1);

        let q2 = Arc::clone(&q);
        let producer = thread::spawn(move || q2.push(2));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(q.len(), 1, "second push must wait for space");

        assert_eq!(q.pop(), Some(1));
        producer.join().unwrap();
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.peak_len(), 1);
    }

    #[test]
    fn pop_blocks_while_empty() {
        let q = Arc::new(BoundedQueue::new(2));
        let q2 = Arc::clone(&q);
        let consumer = thread::spawn(move || q2.pop());

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        q.push(7);
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn exhaustion_is_announced_once() {
        let q = BoundedQueue::<u32>::new(8);
        assert!(q.announce_exhaustion(3));
        assert!(!q.announce_exhaustion(3));
        assert!(!q.announce_exhaustion(5));
        assert_eq!(q.phase(), Phase::Draining);
        assert_eq!(q.sentinels_pushed(), 3);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn sentinels_follow_data() {
        let q = BoundedQueue::new(8);
        q.push(10);
        q.push(11);
        q.announce_exhaustion(2);
        assert_eq!(q.pop(), Some(10));
        assert_eq!(q.pop(), Some(11));
        assert_eq!(q.pop(), None);
        assert_eq!(q.pop(), None);
        assert_eq!(q.sentinels_popped(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn drain_into_small_queue_completes() {
        // Four sentinels through a single slot: the drain must wait on
        // consumers popping sentinels.
        let q = Arc::new(BoundedQueue::<u32>::new(1));
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || q.pop())
            })
            .collect();

        assert!(q.announce_exhaustion(4));
        for c in consumers {
            assert_eq!(c.join().unwrap(), None);
        }
        assert_eq!(q.sentinels_pushed(), 4);
        assert_eq!(q.sentinels_popped(), 4);
        assert_eq!(q.peak_len(), 1);
    }

    #[test]
    fn mark_joined_ends_phase() {
        let q = BoundedQueue::<u32>::new(1);
        q.mark_joined();
        assert_eq!(q.phase(), Phase::Joined);
        assert!(!q.announce_exhaustion(1));
    }
}
