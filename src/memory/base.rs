use rand::{seq::SliceRandom, Rng};

use crate::ds::RingBuffer;

use super::{Transition, TransitionBatch};

/// A fixed-capacity store of past [transitions](Transition)
///
/// Backed by a ring buffer: once `capacity` transitions are stored, every push evicts the oldest one.
/// Sampling is uniform and without replacement.
///
/// ### Generics
/// - `S`: The processed state
#[derive(Debug, Clone)]
pub struct ReplayMemory<S> {
    memory: RingBuffer<Transition<S>>,
}

impl<S> ReplayMemory<S> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
        }
    }

    /// Add a new transition to the memory
    pub fn push(&mut self, transition: Transition<S>) {
        self.memory.push(transition);
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Sample a random batch of transitions from the memory
    ///
    /// ### Returns
    /// - `Some(transitions)` if `batch_size` is less than or equal to the number of stored transitions
    /// - `None` otherwise
    pub fn sample(&self, batch_size: usize, rng: &mut impl Rng) -> Option<Vec<&Transition<S>>> {
        (batch_size <= self.len()).then(|| {
            self.memory
                .view()
                .choose_multiple(rng, batch_size)
                .collect()
        })
    }
}

impl<S: Clone> ReplayMemory<S> {
    /// Sample a random batch of transitions from the memory and zip the vector of structs into a struct of vectors
    ///
    /// ### Returns
    /// - `Some(batch)` if `batch_size` is less than or equal to the number of stored transitions
    /// - `None` otherwise
    pub fn sample_zipped(&self, batch_size: usize, rng: &mut impl Rng) -> Option<TransitionBatch<S>> {
        let transitions = self.sample(batch_size, rng)?;
        Some(TransitionBatch::from_iter(transitions, batch_size))
    }
}
