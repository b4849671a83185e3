//! Asynchronous in-process message bus.
//!
//! Topic-based publish/subscribe plus a correlated request/reply channel.
//! Publishing fans out to a snapshot of the topic's handlers on spawned
//! tasks, so a publisher is never blocked on (or failed by) subscriber
//! execution. Requests park a oneshot sender in a correlation-id-keyed
//! table; the first published envelope carrying that correlation id resolves
//! the request, and a timer fails it otherwise. Either path removes the
//! table entry exactly once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::{CorrelationId, Envelope};
use crate::error::BusError;

/// Default deadline for a `request` awaiting its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A subscriber callback. Errors are logged by the bus, never propagated to
/// the publisher.
pub type Handler =
    Arc<dyn Fn(Envelope) -> BoxFuture<'static, Result<(), BusError>> + Send + Sync>;

/// Identifies one subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub struct MessageBus {
    /// Topic -> handler list. Fan-out order is not guaranteed.
    subscribers: DashMap<String, Vec<(SubscriptionId, Handler)>>,
    /// In-flight requests awaiting a correlated reply.
    pending: DashMap<CorrelationId, oneshot::Sender<Envelope>>,
    next_subscription: AtomicU64,
    closed: AtomicBool,
    request_timeout: Duration,
}

impl MessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    #[must_use]
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            subscribers: DashMap::new(),
            pending: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            request_timeout,
        }
    }

    /// Register a handler for a topic. Multiple handlers per topic fan out.
    pub fn subscribe<F, Fut>(&self, topic: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let handler: Handler = Arc::new(move |envelope| Box::pin(handler(envelope)));
        self.subscribers
            .entry(topic.into())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove one subscription from a topic.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) {
        if let Some(mut handlers) = self.subscribers.get_mut(topic) {
            handlers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Fire-and-forget delivery to all subscribers of the envelope's topic.
    ///
    /// Returns the transport outcome only; handler execution happens on
    /// spawned tasks and its failures are logged, never surfaced here. An
    /// envelope carrying the correlation id of an in-flight request resolves
    /// that request first and is still fanned out to ordinary subscribers.
    pub fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closing);
        }

        if let Some(correlation_id) = envelope.correlation_id.clone() {
            if let Some((_, reply_tx)) = self.pending.remove(&correlation_id) {
                debug!(
                    topic = envelope.topic(),
                    correlation_id = %correlation_id,
                    "Resolving pending request"
                );
                // Receiver may have timed out between removal and send.
                let _ = reply_tx.send(envelope.clone());
            }
        }

        self.fan_out(envelope);
        Ok(())
    }

    /// Send a request and await the first reply carrying its correlation id.
    ///
    /// A correlation id is generated when the envelope has none. The request
    /// is delivered to topic subscribers over a path that skips
    /// reply-matching, so a request can never resolve itself. Fails with
    /// [`BusError::RequestTimeout`] after `timeout` (bus default when
    /// `None`), releasing the pending-request slot.
    pub async fn request(
        &self,
        mut envelope: Envelope,
        timeout: Option<Duration>,
    ) -> Result<Envelope, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closing);
        }

        let correlation_id = envelope
            .correlation_id
            .get_or_insert_with(CorrelationId::generate)
            .clone();
        let topic = envelope.topic().to_string();
        let timeout = timeout.unwrap_or(self.request_timeout);

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(correlation_id.clone(), reply_tx);

        // close() may drain the map between the first check and the insert;
        // re-check so shutdown fails the caller fast instead of timing out.
        if self.closed.load(Ordering::SeqCst) {
            self.pending.remove(&correlation_id);
            return Err(BusError::Closing);
        }

        self.fan_out(envelope);

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Sender dropped without a reply: the bus is shutting down.
            Ok(Err(_)) => Err(BusError::Closing),
            Err(_) => {
                self.pending.remove(&correlation_id);
                warn!(
                    topic = %topic,
                    correlation_id = %correlation_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Request timed out"
                );
                Err(BusError::RequestTimeout {
                    topic,
                    correlation_id: correlation_id.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Close the bus: reject new traffic and fail all pending requests.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let correlation_ids: Vec<CorrelationId> = self
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for correlation_id in correlation_ids {
            // Dropping the sender fails the waiting caller with `Closing`.
            self.pending.remove(&correlation_id);
        }
    }

    /// Number of requests still awaiting a reply.
    #[must_use]
    pub fn pending_request_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a given correlation id is still awaiting a reply.
    #[must_use]
    pub fn has_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Deliver to a snapshot of the topic's handlers on spawned tasks.
    fn fan_out(&self, envelope: Envelope) {
        let handlers: Vec<Handler> = self
            .subscribers
            .get(envelope.topic())
            .map(|entry| entry.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in handlers {
            let envelope = envelope.clone();
            tokio::spawn(async move {
                let topic = envelope.topic();
                if let Err(err) = handler(envelope).await {
                    warn!(topic, error = %err, "Subscriber handler failed");
                }
            });
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Payload, StrategyId};
    use std::sync::atomic::AtomicUsize;

    fn status_envelope(detail: &str) -> Envelope {
        Envelope::new(
            "test",
            Payload::SystemStatus {
                component: "test".into(),
                detail: detail.into(),
            },
        )
    }

    #[tokio::test]
    async fn test_publish_fans_out_to_all_subscribers() {
        let bus = Arc::new(MessageBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let seen = seen.clone();
            bus.subscribe("system_status", move |_envelope| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        bus.publish(status_envelope("hello")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_handler_error_not_propagated_to_publisher() {
        let bus = MessageBus::new();
        bus.subscribe("system_status", |_envelope| async {
            Err(BusError::Handler("boom".into()))
        });

        assert!(bus.publish(status_envelope("hello")).is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = MessageBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let id = bus.subscribe("system_status", move |_envelope| {
            let seen = seen_clone.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        bus.unsubscribe("system_status", id);

        bus.publish(status_envelope("hello")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_times_out_and_releases_slot() {
        let bus = MessageBus::new();
        let envelope = Envelope::new(
            "trader",
            Payload::FundRequest {
                strategy_id: StrategyId::from("strat-1"),
                amount: rust_decimal_macros::dec!(100),
                purpose: None,
            },
        )
        .with_correlation(CorrelationId::new("corr-1"));

        let err = bus
            .request(envelope, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();

        assert!(matches!(err, BusError::RequestTimeout { .. }));
        assert!(!bus.has_pending(&CorrelationId::new("corr-1")));
        assert_eq!(bus.pending_request_count(), 0);
    }

    #[tokio::test]
    async fn test_request_resolved_by_correlated_reply() {
        let bus = Arc::new(MessageBus::new());

        // Responder: replies on the same topic with the request's correlation id.
        let responder_bus = bus.clone();
        bus.subscribe("fund_request", move |envelope| {
            let bus = responder_bus.clone();
            async move {
                let reply = envelope.reply(
                    "finance",
                    Payload::FundResponse {
                        strategy_id: StrategyId::from("strat-1"),
                        approved: true,
                        allocated: rust_decimal_macros::dec!(100),
                        reason: None,
                    },
                );
                bus.publish(reply).map_err(|e| BusError::Handler(e.to_string()))
            }
        });

        let request = Envelope::new(
            "trader",
            Payload::FundRequest {
                strategy_id: StrategyId::from("strat-1"),
                amount: rust_decimal_macros::dec!(100),
                purpose: None,
            },
        );

        let reply = bus
            .request(request, Some(Duration::from_secs(1)))
            .await
            .unwrap();

        assert!(matches!(
            reply.payload,
            Payload::FundResponse { approved: true, .. }
        ));
        assert_eq!(bus.pending_request_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_also_reaches_ordinary_subscribers() {
        let bus = Arc::new(MessageBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        bus.subscribe("fund_response", move |_envelope| {
            let seen = seen_clone.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let reply = Envelope::new(
            "finance",
            Payload::FundResponse {
                strategy_id: StrategyId::from("strat-1"),
                approved: false,
                allocated: rust_decimal::Decimal::ZERO,
                reason: Some("budget exhausted".into()),
            },
        )
        .with_correlation(CorrelationId::generate());

        bus.publish(reply).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_bus_rejects_traffic_and_pending_requests() {
        let bus = Arc::new(MessageBus::new());

        let request_bus = bus.clone();
        let in_flight = tokio::spawn(async move {
            let envelope = Envelope::new(
                "trader",
                Payload::FundRequest {
                    strategy_id: StrategyId::from("strat-1"),
                    amount: rust_decimal_macros::dec!(100),
                    purpose: None,
                },
            );
            request_bus.request(envelope, Some(Duration::from_secs(5))).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        bus.close();

        let err = in_flight.await.unwrap().unwrap_err();
        assert!(matches!(err, BusError::Closing));
        assert_eq!(bus.pending_request_count(), 0);
        assert!(matches!(
            bus.publish(status_envelope("late")).unwrap_err(),
            BusError::Closing
        ));

        let late_request = Envelope::new(
            "trader",
            Payload::FundRequest {
                strategy_id: StrategyId::from("strat-2"),
                amount: rust_decimal_macros::dec!(50),
                purpose: None,
            },
        );
        assert!(matches!(
            bus.request(late_request, Some(Duration::from_secs(1)))
                .await
                .unwrap_err(),
            BusError::Closing
        ));
        assert_eq!(bus.pending_request_count(), 0);
    }
}
