//! Double-buffered event delivery.
//!
//! `Publish<T>` appends to the write buffer for `T`; `Consume<T>` reads the
//! read buffer, valid until the next `SwapBuffers` promotes write→read and
//! clears the new write buffer. Delivery is at-least-once, in publication
//! order, per type.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use fdp_component::Component;

trait ErasedQueue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn swap(&mut self);
}

struct TypedQueue<T> {
    read: Vec<T>,
    write: Vec<T>,
}

impl<T: 'static> Default for TypedQueue<T> {
    fn default() -> Self {
        Self {
            read: Vec::new(),
            write: Vec::new(),
        }
    }
}

impl<T: Send + Sync + 'static> ErasedQueue for TypedQueue<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
        self.write.clear();
    }
}

/// Per-process event channel. One [`EventBus`] is owned by the world; the
/// scheduler calls [`Self::swap_all`] at the phase boundaries that demand
/// visibility (§4.5: always at `BeforeSync`/`AfterSync`).
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn ErasedQueue>>,
    /// Types currently being consumed, to forbid re-entrant publish of the
    /// same type during their own consume phase (§4.3).
    consuming: std::collections::HashSet<TypeId>,
}

/// Returned by [`EventBus::publish`] when the caller is mid-`consume` of the
/// same event type — re-entrant publication is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrantPublish;

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_mut<T: Component>(&mut self) -> &mut TypedQueue<T> {
        self.queues
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(TypedQueue::<T>::default()))
            .as_any_mut()
            .downcast_mut()
            .expect("event queue type mismatch")
    }

    /// Enqueue `value` onto `T`'s write buffer.
    pub fn publish<T: Component>(&mut self, value: T) -> Result<(), ReentrantPublish> {
        if self.consuming.contains(&TypeId::of::<T>()) {
            return Err(ReentrantPublish);
        }
        self.queue_mut::<T>().write.push(value);
        Ok(())
    }

    /// Borrow `T`'s read buffer. Valid until the next [`Self::swap_all`].
    ///
    /// Marks `T` as "being consumed" for the duration of the returned
    /// borrow's lifetime is not tracked here (callers are expected to have
    /// finished reading before calling `publish` again within the same
    /// phase); [`Self::begin_consume`]/[`Self::end_consume`] bracket a
    /// consume pass explicitly when re-entrancy must be enforced.
    #[must_use]
    pub fn consume<T: Component>(&self) -> &[T] {
        self.queues
            .get(&TypeId::of::<T>())
            .and_then(|q| q.as_any().downcast_ref::<TypedQueue<T>>())
            .map_or(&[], |q| q.read.as_slice())
    }

    /// Mark `T` as being consumed; publications of `T` fail until
    /// [`Self::end_consume`].
    pub fn begin_consume<T: Component>(&mut self) {
        self.consuming.insert(TypeId::of::<T>());
    }

    pub fn end_consume<T: Component>(&mut self) {
        self.consuming.remove(&TypeId::of::<T>());
    }

    /// Promote every type's write buffer to its read buffer and clear the
    /// new write buffer.
    pub fn swap_all(&mut self) {
        for queue in self.queues.values_mut() {
            queue.swap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct DetonationEvent {
        radius: f32,
    }
    impl Component for DetonationEvent {
        fn type_name() -> &'static str {
            "DetonationEvent"
        }
    }

    #[test]
    fn test_publish_not_visible_until_swap() {
        let mut bus = EventBus::new();
        bus.publish(DetonationEvent { radius: 1.0 }).unwrap();
        assert!(bus.consume::<DetonationEvent>().is_empty());
        bus.swap_all();
        assert_eq!(bus.consume::<DetonationEvent>().len(), 1);
    }

    #[test]
    fn test_swap_clears_new_write_buffer() {
        let mut bus = EventBus::new();
        bus.publish(DetonationEvent { radius: 1.0 }).unwrap();
        bus.swap_all();
        bus.swap_all();
        assert!(bus.consume::<DetonationEvent>().is_empty());
    }

    #[test]
    fn test_publish_order_preserved() {
        let mut bus = EventBus::new();
        bus.publish(DetonationEvent { radius: 1.0 }).unwrap();
        bus.publish(DetonationEvent { radius: 2.0 }).unwrap();
        bus.swap_all();
        let got: Vec<f32> = bus.consume::<DetonationEvent>().iter().map(|e| e.radius).collect();
        assert_eq!(got, vec![1.0, 2.0]);
    }

    #[test]
    fn test_reentrant_publish_during_consume_is_rejected() {
        let mut bus = EventBus::new();
        bus.begin_consume::<DetonationEvent>();
        let err = bus.publish(DetonationEvent { radius: 1.0 }).unwrap_err();
        assert_eq!(err, ReentrantPublish);
        bus.end_consume::<DetonationEvent>();
        assert!(bus.publish(DetonationEvent { radius: 1.0 }).is_ok());
    }

    #[test]
    fn test_swap_with_no_publications_is_noop() {
        let mut bus = EventBus::new();
        bus.swap_all();
        assert!(bus.consume::<DetonationEvent>().is_empty());
    }
}
