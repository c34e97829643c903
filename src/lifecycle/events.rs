//! # Lifecycle Events
//!
//! The orchestrator publishes one [`LifecycleEvent`] per service right after that service's
//! start (or stop) completes successfully. Nothing is published for a failing service.
//!
//! Publishing goes through the [`EventPublisher`] trait so the sink can be swapped or
//! observed in tests. The default sink is [`EventChannel`]: every subscriber owns an
//! unbounded queue, so publishing never blocks and no subscriber ever misses an event,
//! however far behind it reads. Subscribers only see events sent after they subscribed,
//! there is no replay.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// The topics a subscriber can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Start,
    Stop,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Start, Topic::Stop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Start => "start",
            Topic::Stop => "stop",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service finished a lifecycle transition. The payload is the service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started(String),
    Stopped(String),
}

impl LifecycleEvent {
    pub fn topic(&self) -> Topic {
        match self {
            LifecycleEvent::Started(_) => Topic::Start,
            LifecycleEvent::Stopped(_) => Topic::Stop,
        }
    }

    pub fn service(&self) -> &str {
        match self {
            LifecycleEvent::Started(name) | LifecycleEvent::Stopped(name) => name,
        }
    }
}

/// Sink for lifecycle events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LifecycleEvent);
}

struct Subscriber {
    topics: Vec<Topic>,
    sender: mpsc::UnboundedSender<LifecycleEvent>,
}

/// Publish/subscribe channel for lifecycle events with one lossless queue per subscriber.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone, Default)]
pub struct EventChannel {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the given topics.
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(Subscriber {
            topics: topics.to_vec(),
            sender,
        });
        Subscription {
            receiver,
            topics: topics.to_vec(),
        }
    }

    pub fn subscribe_all(&self) -> Subscription {
        self.subscribe(&Topic::ALL)
    }

    /// Subscriptions that have not been dropped yet.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| !subscriber.sender.is_closed());
        subscribers.len()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl EventPublisher for EventChannel {
    fn publish(&self, event: LifecycleEvent) {
        trace!(topic = %event.topic(), service = event.service(), "Publishing");
        let topic = event.topic();
        // A failed send means the subscription was dropped.
        self.subscribers.lock().retain(|subscriber| {
            if !subscriber.topics.contains(&topic) {
                return !subscriber.sender.is_closed();
            }
            subscriber.sender.send(event.clone()).is_ok()
        });
    }
}

/// Receiving side of an [`EventChannel`], filtered by topic.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<LifecycleEvent>,
    topics: Vec<Topic>,
}

impl Subscription {
    /// Wait for the next event on a subscribed topic.
    ///
    /// Returns `None` once every handle to the channel has been dropped and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.receiver.recv().await
    }

    /// Take the next already-published event, if any.
    pub fn try_recv(&mut self) -> Option<LifecycleEvent> {
        self.receiver.try_recv().ok()
    }

    /// Take every already-published event.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_only_see_their_topics() {
        let channel = EventChannel::new();
        let mut starts = channel.subscribe(&[Topic::Start]);
        let mut everything = channel.subscribe_all();
        assert_eq!(channel.subscriber_count(), 2);

        channel.publish(LifecycleEvent::Started("a".into()));
        channel.publish(LifecycleEvent::Stopped("a".into()));

        assert_eq!(starts.drain(), vec![LifecycleEvent::Started("a".into())]);
        assert_eq!(
            everything.drain(),
            vec![
                LifecycleEvent::Started("a".into()),
                LifecycleEvent::Stopped("a".into()),
            ]
        );
    }

    #[test]
    fn late_subscribers_get_no_replay() {
        let channel = EventChannel::default();
        channel.publish(LifecycleEvent::Started("early".into()));

        let mut late = channel.subscribe_all();
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn recv_ends_when_channel_is_dropped() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(&[Topic::Stop]);
        channel.publish(LifecycleEvent::Stopped("db".into()));
        drop(channel);

        assert_eq!(sub.recv().await, Some(LifecycleEvent::Stopped("db".into())));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn slow_subscribers_miss_nothing() {
        let channel = EventChannel::new();
        let mut starts = channel.subscribe(&[Topic::Start]);

        for i in 0..500 {
            channel.publish(LifecycleEvent::Started(format!("s{i}")));
            channel.publish(LifecycleEvent::Stopped(format!("s{i}")));
        }

        let received = starts.drain();
        assert_eq!(received.len(), 500);
        assert_eq!(received[0], LifecycleEvent::Started("s0".into()));
        assert_eq!(received[499], LifecycleEvent::Started("s499".into()));
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let channel = EventChannel::new();
        let kept = channel.subscribe_all();
        let dropped = channel.subscribe(&[Topic::Stop]);
        assert_eq!(channel.subscriber_count(), 2);

        drop(dropped);
        channel.publish(LifecycleEvent::Stopped("db".into()));
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(kept.topics(), &Topic::ALL);
    }

    #[test]
    fn event_accessors() {
        let event = LifecycleEvent::Stopped("cache".into());
        assert_eq!(event.topic(), Topic::Stop);
        assert_eq!(event.service(), "cache");
        assert_eq!(Topic::Start.to_string(), "start");
    }
}
