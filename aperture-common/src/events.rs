//! Event types for the Aperture event system
//!
//! Provides the shared event definitions and the EventBus used to fan
//! engagement and content-change events out to SSE subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Gallery events
///
/// Events are broadcast via [`EventBus`] and serialized for SSE
/// transmission. Every variant carries the guid of the photo it
/// concerns so subscribers can scope their stream to specific photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GalleryEvent {
    /// A photo's like counter was incremented.
    ///
    /// `like_count` is the stored value produced by the increment, so
    /// clients can reconcile their local count without a re-fetch.
    PhotoLiked {
        /// Photo that was liked
        photo_id: Uuid,
        /// Like count after the increment
        like_count: i64,
        /// When the increment was recorded
        timestamp: DateTime<Utc>,
    },

    /// A photo's view counter was incremented.
    PhotoViewed {
        /// Photo that was viewed
        photo_id: Uuid,
        /// View count after the increment
        view_count: i64,
        /// When the increment was recorded
        timestamp: DateTime<Utc>,
    },

    /// A photo was added to the gallery.
    PhotoCreated {
        photo_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A photo's metadata changed (title, description, category, ...).
    ///
    /// Counter changes are NOT announced through this variant; they
    /// have their own events above.
    PhotoUpdated {
        photo_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A photo was removed from the gallery.
    PhotoDeleted {
        photo_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl GalleryEvent {
    /// The photo this event concerns, used for subscription scoping.
    pub fn photo_id(&self) -> Uuid {
        match self {
            GalleryEvent::PhotoLiked { photo_id, .. }
            | GalleryEvent::PhotoViewed { photo_id, .. }
            | GalleryEvent::PhotoCreated { photo_id, .. }
            | GalleryEvent::PhotoUpdated { photo_id, .. }
            | GalleryEvent::PhotoDeleted { photo_id, .. } => *photo_id,
        }
    }

    /// Event name used for the SSE `event:` field.
    pub fn event_name(&self) -> &'static str {
        match self {
            GalleryEvent::PhotoLiked { .. } => "PhotoLiked",
            GalleryEvent::PhotoViewed { .. } => "PhotoViewed",
            GalleryEvent::PhotoCreated { .. } => "PhotoCreated",
            GalleryEvent::PhotoUpdated { .. } => "PhotoUpdated",
            GalleryEvent::PhotoDeleted { .. } => "PhotoDeleted",
        }
    }
}

/// Central event distribution bus
///
/// Wraps a tokio broadcast channel:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use aperture_common::events::{EventBus, GalleryEvent};
/// use uuid::Uuid;
///
/// let bus = EventBus::new(256);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(GalleryEvent::PhotoViewed {
///     photo_id: Uuid::new_v4(),
///     view_count: 1,
///     timestamp: chrono::Utc::now(),
/// });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GalleryEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events before
    /// old events are dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber
    /// exists, `Err` if no one is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GalleryEvent,
    ) -> Result<usize, broadcast::error::SendError<GalleryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case.
    ///
    /// Counter updates fall in this category: a gallery with no open
    /// browser tabs has no one to notify, and that is fine.
    pub fn emit_lossy(&self, event: GalleryEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn liked(photo_id: Uuid, like_count: i64) -> GalleryEvent {
        GalleryEvent::PhotoLiked {
            photo_id,
            like_count,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        bus.emit(liked(id, 3)).expect("one subscriber");

        let event = rx.recv().await.expect("event delivered");
        match event {
            GalleryEvent::PhotoLiked {
                photo_id,
                like_count,
                ..
            } => {
                assert_eq!(photo_id, id);
                assert_eq!(like_count, 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(16);
        assert!(bus.emit(liked(Uuid::new_v4(), 1)).is_err());
        // emit_lossy swallows the same condition
        bus.emit_lossy(liked(Uuid::new_v4(), 1));
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_photo_id_accessor_covers_all_variants() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let events = vec![
            GalleryEvent::PhotoLiked {
                photo_id: id,
                like_count: 1,
                timestamp: now,
            },
            GalleryEvent::PhotoViewed {
                photo_id: id,
                view_count: 1,
                timestamp: now,
            },
            GalleryEvent::PhotoCreated {
                photo_id: id,
                timestamp: now,
            },
            GalleryEvent::PhotoUpdated {
                photo_id: id,
                timestamp: now,
            },
            GalleryEvent::PhotoDeleted {
                photo_id: id,
                timestamp: now,
            },
        ];
        for event in events {
            assert_eq!(event.photo_id(), id);
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = liked(Uuid::new_v4(), 7);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhotoLiked");
        assert_eq!(json["like_count"], 7);
    }
}
