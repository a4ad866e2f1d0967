//! Durable work-queue abstraction (spec.md §6 wire format, §4.4 steps 1–2).
//! `worker` depends only on [`WorkQueue`] so its dispatch loop is testable
//! against [`InMemoryWorkQueue`] without a running broker.

mod amqp;
mod memory;

pub use amqp::AmqpWorkQueue;
pub use memory::InMemoryWorkQueue;

use async_trait::async_trait;
use domain::WorkItem;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("connect: {0}")]
    Connect(String),
    #[error("publish: {0}")]
    Publish(String),
    #[error("receive: {0}")]
    Receive(String),
    #[error("ack: {0}")]
    Ack(String),
    #[error("decode: {0}")]
    Decode(String),
}

/// One message handed to the consumer, carrying whatever handle the
/// implementation needs to ack/nack it later.
pub struct Delivery {
    pub tag: u64,
    pub item: WorkItem,
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn publish(&self, item: &WorkItem) -> Result<(), QueueError>;

    /// Blocks until a message is available. Consumers ack immediately after
    /// receiving (spec.md §4.4 step 2 — early-ack, before any business
    /// logic), so `recv` never redelivers a message it has already handed
    /// out unless `nack_requeue` is called explicitly.
    async fn recv(&self) -> Result<Delivery, QueueError>;

    async fn ack(&self, tag: u64) -> Result<(), QueueError>;

    async fn nack_requeue(&self, tag: u64) -> Result<(), QueueError>;
}
