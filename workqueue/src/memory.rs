//! In-memory `WorkQueue` used by `broker`/`worker` integration tests so a
//! full AMQP broker isn't required to exercise the dispatch loop.

use crate::{Delivery, QueueError, WorkQueue};
use async_trait::async_trait;
use domain::WorkItem;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

struct Inner {
    queue: VecDeque<WorkItem>,
    in_flight: HashMap<u64, WorkItem>,
}

pub struct InMemoryWorkQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    next_tag: AtomicU64,
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                in_flight: HashMap::new(),
            }),
            notify: Notify::new(),
            next_tag: AtomicU64::new(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn publish(&self, item: &WorkItem) -> Result<(), QueueError> {
        self.inner.lock().unwrap().queue.push_back(item.clone());
        self.notify.notify_one();
        Ok(())
    }

    async fn recv(&self) -> Result<Delivery, QueueError> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if let Some(item) = inner.queue.pop_front() {
                    let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
                    inner.in_flight.insert(tag, item.clone());
                    return Ok(Delivery { tag, item });
                }
            }
            self.notify.notified().await;
        }
    }

    async fn ack(&self, tag: u64) -> Result<(), QueueError> {
        self.inner.lock().unwrap().in_flight.remove(&tag);
        Ok(())
    }

    async fn nack_requeue(&self, tag: u64) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(item) = inner.in_flight.remove(&tag) {
            inner.queue.push_front(item);
            self.notify.notify_one();
            Ok(())
        } else {
            Err(QueueError::Ack(format!("unknown delivery tag {tag}")))
        }
    }
}
