//! Pending-event buffer
//!
//! Holds events for satellites that have been requested but have not yet
//! finished starting up. A name has an entry exactly while it is buffering.

use std::collections::HashMap;

use tracing::debug;

use super::messages::ClientEvent;

#[derive(Debug, Default)]
pub struct PendingEventBuffer {
    queues: HashMap<String, Vec<ClientEvent>>,
}

impl PendingEventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start buffering for `name`; an existing queue is kept as is
    pub fn begin_buffering(&mut self, name: &str) {
        debug!(%name, "PendingEventBuffer::begin_buffering: called");
        self.queues.entry(name.to_string()).or_default();
    }

    pub fn is_buffering(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    /// Append to the queue for `name`; ignored when not buffering
    pub fn enqueue(&mut self, name: &str, event: ClientEvent) -> bool {
        match self.queues.get_mut(name) {
            Some(queue) => {
                queue.push(event);
                true
            }
            None => false,
        }
    }

    /// Append to every buffering queue, returning how many received it
    pub fn enqueue_all(&mut self, event: &ClientEvent) -> usize {
        for queue in self.queues.values_mut() {
            queue.push(event.clone());
        }
        self.queues.len()
    }

    /// Take the queue for `name` in FIFO order and stop buffering
    pub fn drain_and_stop(&mut self, name: &str) -> Vec<ClientEvent> {
        let events = self.queues.remove(name).unwrap_or_default();
        debug!(%name, count = events.len(), "PendingEventBuffer::drain_and_stop: drained");
        events
    }

    /// Stop buffering for `name`, discarding anything queued
    pub fn discard(&mut self, name: &str) -> usize {
        self.queues.remove(name).map(|queue| queue.len()).unwrap_or(0)
    }

    /// Discard every queue
    pub fn clear(&mut self) {
        self.queues.clear();
    }

    pub fn buffering_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn pending_count(&self, name: &str) -> usize {
        self.queues.get(name).map(Vec::len).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn event(i: usize) -> ClientEvent {
        ClientEvent::new("console_output", json!({ "seq": i }))
    }

    #[test]
    fn test_enqueue_without_buffering_is_ignored() {
        let mut buffer = PendingEventBuffer::new();
        assert!(!buffer.enqueue("plots", event(0)));
        assert!(!buffer.is_buffering("plots"));
    }

    #[test]
    fn test_begin_buffering_keeps_existing_queue() {
        let mut buffer = PendingEventBuffer::new();
        buffer.begin_buffering("plots");
        buffer.enqueue("plots", event(0));
        buffer.begin_buffering("plots");

        assert_eq!(buffer.pending_count("plots"), 1);
    }

    #[test]
    fn test_drain_and_stop_removes_empty_entry() {
        let mut buffer = PendingEventBuffer::new();
        buffer.begin_buffering("plots");

        assert!(buffer.drain_and_stop("plots").is_empty());
        assert!(!buffer.is_buffering("plots"));
    }

    #[test]
    fn test_enqueue_all_reaches_every_buffering_name() {
        let mut buffer = PendingEventBuffer::new();
        buffer.begin_buffering("plots");
        buffer.begin_buffering("viewer");

        assert_eq!(buffer.enqueue_all(&event(1)), 2);
        assert_eq!(buffer.pending_count("plots"), 1);
        assert_eq!(buffer.pending_count("viewer"), 1);
        assert_eq!(buffer.buffering_names(), vec!["plots".to_string(), "viewer".to_string()]);
    }

    #[test]
    fn test_clear_discards_queues() {
        let mut buffer = PendingEventBuffer::new();
        buffer.begin_buffering("plots");
        buffer.enqueue("plots", event(0));

        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.drain_and_stop("plots").is_empty());
    }

    proptest! {
        #[test]
        fn prop_drain_preserves_fifo_order(count in 0usize..64) {
            let mut buffer = PendingEventBuffer::new();
            buffer.begin_buffering("plots");
            for i in 0..count {
                buffer.enqueue("plots", event(i));
            }

            let drained = buffer.drain_and_stop("plots");
            let expected: Vec<ClientEvent> = (0..count).map(event).collect();
            prop_assert_eq!(drained, expected);
            prop_assert!(!buffer.is_buffering("plots"));
        }
    }
}
