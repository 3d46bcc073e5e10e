//! Growable circular buffer
//!
//! Slots are `Option<T>` so a dequeued slot is cleared immediately and the
//! buffer never retains a value it has handed out. `size` is tracked
//! explicitly: when `head == tail` the buffer is either empty or full, and
//! only `size` tells the two apart.

use crate::observability::{log_event, Event};

/// Fixed-capacity FIFO that doubles its backing store when full.
///
/// The buffer has no lock of its own. Every mutating operation takes
/// `&mut self`, so the owner (a topic, behind its mutex) provides the
/// serialization.
#[derive(Debug)]
pub struct CircularBuffer<T> {
    storage: Vec<Option<T>>,
    head: usize,
    tail: usize,
    size: usize,
}

impl<T> CircularBuffer<T> {
    /// Creates a buffer with the given initial capacity.
    ///
    /// A capacity of zero is raised to one so the doubling rule always
    /// makes progress.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut storage = Vec::with_capacity(capacity);
        storage.resize_with(capacity, || None);
        Self {
            storage,
            head: 0,
            tail: 0,
            size: 0,
        }
    }

    /// Appends an item at the tail and returns the new size.
    ///
    /// Never fails: a full buffer is resized to twice its capacity first.
    pub fn enqueue(&mut self, item: T) -> usize {
        if self.size == self.capacity() {
            self.grow();
        }

        self.storage[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.size += 1;
        self.size
    }

    /// Removes and returns the item at the head, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        let item = self.storage[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.size -= 1;
        item
    }

    /// Number of items currently stored.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of slots in the backing store.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Iterates over stored items from head to tail without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        (0..self.size).filter_map(move |i| self.storage[(self.head + i) % capacity].as_ref())
    }

    /// Doubles the backing store, moving the logical contents to `0..size`.
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity * 2;

        let mut storage: Vec<Option<T>> = Vec::with_capacity(new_capacity);
        for i in 0..self.size {
            storage.push(self.storage[(self.head + i) % old_capacity].take());
        }
        storage.resize_with(new_capacity, || None);

        self.storage = storage;
        self.head = 0;
        self.tail = self.size;

        log_event(
            Event::BufferResized,
            &[
                ("old_capacity", &old_capacity.to_string()),
                ("new_capacity", &new_capacity.to_string()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_dequeue_returns_none() {
        let mut buffer: CircularBuffer<u32> = CircularBuffer::new(4);
        assert!(buffer.dequeue().is_none());
        assert_eq!(buffer.size(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer = CircularBuffer::new(8);
        for i in 0..5 {
            buffer.enqueue(i);
        }
        for i in 0..5 {
            assert_eq!(buffer.dequeue(), Some(i));
        }
        assert!(buffer.dequeue().is_none());
    }

    #[test]
    fn test_enqueue_returns_new_size() {
        let mut buffer = CircularBuffer::new(2);
        assert_eq!(buffer.enqueue("a"), 1);
        assert_eq!(buffer.enqueue("b"), 2);
        assert_eq!(buffer.enqueue("c"), 3);
    }

    #[test]
    fn test_full_buffer_doubles_capacity() {
        let mut buffer = CircularBuffer::new(3);
        for i in 0..3 {
            buffer.enqueue(i);
        }
        assert_eq!(buffer.capacity(), 3);

        buffer.enqueue(3);
        assert_eq!(buffer.capacity(), 6);
        assert_eq!(buffer.size(), 4);
    }

    #[test]
    fn test_resize_preserves_order_when_wrapped() {
        let mut buffer = CircularBuffer::new(4);
        for i in 0..4 {
            buffer.enqueue(i);
        }
        // Move head forward so the live region wraps around the end
        assert_eq!(buffer.dequeue(), Some(0));
        assert_eq!(buffer.dequeue(), Some(1));
        buffer.enqueue(4);
        buffer.enqueue(5);

        // Full and wrapped; the next insert forces a resize
        buffer.enqueue(6);
        assert_eq!(buffer.capacity(), 8);

        let drained: Vec<_> = std::iter::from_fn(|| buffer.dequeue()).collect();
        assert_eq!(drained, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_growth_never_loses_or_duplicates() {
        let mut buffer = CircularBuffer::new(1);
        let mut expected = Vec::new();
        let mut next = 0u64;

        // Interleave inserts and removals across several resizes
        for round in 0..50 {
            for _ in 0..(round % 7 + 1) {
                buffer.enqueue(next);
                expected.push(next);
                next += 1;
            }
            if round % 3 == 0 {
                let got = buffer.dequeue();
                assert_eq!(got, Some(expected.remove(0)));
            }
        }

        assert_eq!(buffer.size(), expected.len());
        let drained: Vec<_> = std::iter::from_fn(|| buffer.dequeue()).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_dequeue_clears_slot() {
        use std::rc::Rc;

        let value = Rc::new(42);
        let mut buffer = CircularBuffer::new(2);
        buffer.enqueue(Rc::clone(&value));
        assert_eq!(Rc::strong_count(&value), 2);

        let taken = buffer.dequeue();
        drop(taken);
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_zero_capacity_is_usable() {
        let mut buffer = CircularBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.enqueue('x');
        buffer.enqueue('y');
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.dequeue(), Some('x'));
        assert_eq!(buffer.dequeue(), Some('y'));
    }

    #[test]
    fn test_iter_walks_head_to_tail() {
        let mut buffer = CircularBuffer::new(3);
        buffer.enqueue(1);
        buffer.enqueue(2);
        buffer.enqueue(3);
        buffer.dequeue();
        buffer.enqueue(4);

        let items: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(items, vec![2, 3, 4]);
        assert_eq!(buffer.size(), 3);
    }
}
