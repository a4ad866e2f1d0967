//! AMQP-backed `WorkQueue` (spec.md §6's `QUEUE_*` env vars are unambiguously
//! RabbitMQ-shaped: host/port/vhost/credentials plus queue/exchange/routing
//! key). Prefetch is fixed at 1 and acks are manual, matching worker's
//! one-message-at-a-time dispatch loop (spec.md §5).

use crate::{Delivery, QueueError, WorkQueue};
use async_trait::async_trait;
use domain::WorkItem;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;

pub struct AmqpWorkQueue {
    channel: Channel,
    queue_name: String,
    exchange: String,
    routing_key: String,
    consumer: AsyncMutex<Option<lapin::Consumer>>,
    in_flight: Mutex<HashMap<u64, lapin::acker::Acker>>,
    next_tag: AtomicU64,
}

impl AmqpWorkQueue {
    pub async fn connect(
        amqp_uri: &str,
        queue_name: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<Self, QueueError> {
        let properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);
        let connection = Connection::connect(amqp_uri, properties)
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        Ok(Self {
            channel,
            queue_name: queue_name.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            consumer: AsyncMutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
            next_tag: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl WorkQueue for AmqpWorkQueue {
    async fn publish(&self, item: &WorkItem) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(item).map_err(|e| QueueError::Publish(e.to_string()))?;
        self.channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn recv(&self) -> Result<Delivery, QueueError> {
        let mut guard = self.consumer.lock().await;
        if guard.is_none() {
            let consumer = self
                .channel
                .basic_consume(
                    &self.queue_name,
                    "worker",
                    BasicConsumeOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| QueueError::Receive(e.to_string()))?;
            *guard = Some(consumer);
        }
        let consumer = guard.as_mut().expect("just populated");
        let delivery = consumer
            .next()
            .await
            .ok_or_else(|| QueueError::Receive("consumer stream closed".into()))?
            .map_err(|e| QueueError::Receive(e.to_string()))?;

        let item: WorkItem =
            serde_json::from_slice(&delivery.data).map_err(|e| QueueError::Decode(e.to_string()))?;
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst);
        self.in_flight.lock().unwrap().insert(tag, delivery.acker);
        Ok(Delivery { tag, item })
    }

    async fn ack(&self, tag: u64) -> Result<(), QueueError> {
        let acker = self.in_flight.lock().unwrap().remove(&tag);
        match acker {
            Some(acker) => acker
                .ack(BasicAckOptions::default())
                .await
                .map_err(|e| QueueError::Ack(e.to_string())),
            None => Err(QueueError::Ack(format!("unknown delivery tag {tag}"))),
        }
    }

    async fn nack_requeue(&self, tag: u64) -> Result<(), QueueError> {
        let acker = self.in_flight.lock().unwrap().remove(&tag);
        match acker {
            Some(acker) => acker
                .nack(BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                })
                .await
                .map_err(|e| QueueError::Ack(e.to_string())),
            None => Err(QueueError::Ack(format!("unknown delivery tag {tag}"))),
        }
    }
}
