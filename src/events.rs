//! Typed in-process event hub.
//!
//! One [`Event`] value serves both capabilities an application wires
//! up: publishing through [`EventSource`] and subscribing through
//! [`EventStream`].  Delivery is broadcast; every live subscriber gets
//! its own copy.

use tokio::sync::broadcast;

/// Publish capability of an event hub.
pub trait EventSource<T>: Send + Sync {
    /// Publish `event`, returning the number of live subscribers it
    /// reached (zero when nobody is listening).
    fn publish(&self, event: T) -> usize;
}

/// Subscribe capability of an event hub.
pub trait EventStream<T>: Send + Sync {
    /// Open a new subscription receiving every event published after
    /// this call.
    fn subscribe(&self) -> broadcast::Receiver<T>;
}

/// Broadcast-backed event hub.
#[derive(Debug, Clone)]
pub struct Event<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Event<T> {
    /// Create a hub buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl<T: Clone + Send + 'static> EventSource<T> for Event<T> {
    fn publish(&self, event: T) -> usize {
        // Send only errors when there are no subscribers; that is a
        // valid steady state, not a failure.
        self.sender.send(event).unwrap_or(0)
    }
}

impl<T: Clone + Send + 'static> EventStream<T> for Event<T> {
    fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Uploaded {
        key: String,
    }

    #[tokio::test]
    async fn test_published_events_reach_every_subscriber() {
        let hub: Event<Uploaded> = Event::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let reached = hub.publish(Uploaded {
            key: "a/b".to_string(),
        });
        assert_eq!(reached, 2);

        assert_eq!(first.recv().await.unwrap().key, "a/b");
        assert_eq!(second.recv().await.unwrap().key, "a/b");
    }

    #[test]
    fn test_publish_without_subscribers_reaches_nobody() {
        let hub: Event<Uploaded> = Event::new(8);
        assert_eq!(
            hub.publish(Uploaded {
                key: "orphan".to_string()
            }),
            0
        );
    }

    #[tokio::test]
    async fn test_late_subscribers_miss_earlier_events() {
        let hub: Event<Uploaded> = Event::new(8);
        hub.publish(Uploaded {
            key: "early".to_string(),
        });

        let mut late = hub.subscribe();
        hub.publish(Uploaded {
            key: "later".to_string(),
        });

        assert_eq!(late.recv().await.unwrap().key, "later");
    }
}
