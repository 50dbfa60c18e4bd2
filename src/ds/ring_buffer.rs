#![allow(clippy::len_without_is_empty)]
use std::ops::Index;

/// A bounded FIFO buffer
///
/// Grows until it reaches its capacity, after which every push overwrites the oldest element.
#[derive(Debug, Default, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    ix: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be non-zero");
        Self {
            buffer: Vec::<T>::with_capacity(capacity),
            ix: 0,
            capacity,
        }
    }

    /// Returns the number of stored elements
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Insert an element into the buffer, overwriting the oldest element, and return the write index
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.ix;
        if ix >= self.len() {
            self.buffer.push(item);
        } else {
            self.buffer[ix] = item;
        }
        self.ix = (ix + 1) % self.capacity;
        ix
    }

    /// Get a slice view of the internal buffer
    ///
    /// The slice is in storage order, not insertion order, once the buffer has wrapped.
    pub fn view(&self) -> &[T] {
        &self.buffer
    }

    /// Iterate over the elements in insertion order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.is_full() { self.ix } else { 0 };
        let (newest, oldest) = self.buffer.split_at(split);
        oldest.iter().chain(newest)
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buffer[index]
    }
}
