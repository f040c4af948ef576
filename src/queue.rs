use crate::record::QueuedRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// What a bounded queue does with a record that arrives while full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Reject the incoming record.
    #[default]
    DropNewest,
    /// Evict the oldest queued record to make room.
    DropOldest,
}

/// Capacity of a [`LogQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueCapacity {
    #[default]
    Unbounded,
    Bounded {
        capacity: usize,
        policy: OverflowPolicy,
    },
}

/// Result of [`LogQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Enqueued,
    /// Queue was full; the pushed record was discarded.
    DroppedNewest,
    /// Queue was full; the oldest record was discarded and the pushed one
    /// enqueued.
    DroppedOldest,
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
}

/// FIFO buffer between log producers and the forwarder.
///
/// `push` may be called from any number of threads and never blocks on
/// anything but the internal lock, which is only held for a `VecDeque`
/// operation. Popping is meant for a single consumer; a record handed
/// out by `try_pop`/`pop` is gone from the queue for good.
pub struct LogQueue {
    items: Mutex<VecDeque<QueuedRecord>>,
    capacity: QueueCapacity,
    available: Notify,
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
}

impl LogQueue {
    pub fn new(capacity: QueueCapacity) -> Self {
        let initial = match capacity {
            QueueCapacity::Unbounded => 0,
            QueueCapacity::Bounded { capacity, .. } => capacity.min(4096),
        };
        LogQueue {
            items: Mutex::new(VecDeque::with_capacity(initial)),
            capacity,
            available: Notify::new(),
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(QueueCapacity::Unbounded)
    }

    /// Bounded queue; a zero capacity is raised to one.
    pub fn bounded(capacity: usize, policy: OverflowPolicy) -> Self {
        Self::new(QueueCapacity::Bounded {
            capacity: capacity.max(1),
            policy,
        })
    }

    pub fn capacity(&self) -> QueueCapacity {
        self.capacity
    }

    /// Append a record at the tail.
    pub fn push(&self, record: QueuedRecord) -> PushOutcome {
        let outcome = {
            let mut items = self.items.lock();
            match self.capacity {
                QueueCapacity::Bounded { capacity, policy } if items.len() >= capacity => {
                    match policy {
                        OverflowPolicy::DropNewest => PushOutcome::DroppedNewest,
                        OverflowPolicy::DropOldest => {
                            items.pop_front();
                            items.push_back(record);
                            PushOutcome::DroppedOldest
                        }
                    }
                }
                _ => {
                    items.push_back(record);
                    PushOutcome::Enqueued
                }
            }
        };

        match outcome {
            PushOutcome::Enqueued => {
                self.pushed.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::DroppedOldest => {
                self.pushed.fetch_add(1, Ordering::Relaxed);
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::DroppedNewest => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return outcome;
            }
        }
        self.available.notify_one();
        outcome
    }

    /// Remove the head record, if any, without waiting.
    pub fn try_pop(&self) -> Option<QueuedRecord> {
        let record = self.items.lock().pop_front();
        if record.is_some() {
            self.popped.fetch_add(1, Ordering::Relaxed);
        }
        record
    }

    /// Wait until a record is available and remove it.
    ///
    /// Cancel-safe: dropping the future never loses a record.
    pub async fn pop(&self) -> QueuedRecord {
        loop {
            if let Some(record) = self.try_pop() {
                return record;
            }
            self.available.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for LogQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for LogQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::JsonFormatter;
    use crate::record::{Level, LogRecord};
    use std::sync::Arc;
    use std::time::Duration;

    fn queued(message: &str) -> QueuedRecord {
        JsonFormatter::new().queued(LogRecord::new(Level::Info, "test", message))
    }

    fn drain(queue: &LogQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.try_pop())
            .map(|r| r.record.message)
            .collect()
    }

    #[test]
    fn pops_in_push_order() {
        let queue = LogQueue::unbounded();
        for i in 0..100 {
            assert_eq!(queue.push(queued(&i.to_string())), PushOutcome::Enqueued);
        }

        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(drain(&queue), expected);
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn popped_record_is_never_seen_again() {
        let queue = LogQueue::unbounded();
        queue.push(queued("once"));

        let first = queue.try_pop().expect("record present");
        drop(first);
        assert!(queue.try_pop().is_none());
        assert_eq!(queue.stats(), QueueStats { pushed: 1, popped: 1, dropped: 0 });
    }

    #[test]
    fn concurrent_producers_keep_per_thread_order() {
        let queue = Arc::new(LogQueue::unbounded());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(queued(&format!("{}:{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let messages = drain(&queue);
        assert_eq!(messages.len(), 1000);
        for t in 0..4 {
            let seq: Vec<usize> = messages
                .iter()
                .filter_map(|m| m.strip_prefix(&format!("{}:", t)))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn bounded_drop_newest_rejects_incoming() {
        let queue = LogQueue::bounded(2, OverflowPolicy::DropNewest);
        queue.push(queued("a"));
        queue.push(queued("b"));
        assert_eq!(queue.push(queued("c")), PushOutcome::DroppedNewest);

        assert_eq!(drain(&queue), vec!["a", "b"]);
        assert_eq!(queue.stats().dropped, 1);
    }

    #[test]
    fn bounded_drop_oldest_evicts_head() {
        let queue = LogQueue::bounded(2, OverflowPolicy::DropOldest);
        queue.push(queued("a"));
        queue.push(queued("b"));
        assert_eq!(queue.push(queued("c")), PushOutcome::DroppedOldest);

        assert_eq!(drain(&queue), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn pop_wakes_on_push_from_another_thread() {
        let queue = Arc::new(LogQueue::unbounded());
        let producer = Arc::clone(&queue);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(queued("late"));
        });

        let record = tokio::time::timeout(Duration::from_secs(2), queue.pop())
            .await
            .expect("pop completes once a record arrives");
        assert_eq!(record.record.message, "late");
    }
}
