#![allow(clippy::len_without_is_empty)]
/// Represents a single experience or transition in the environment
///
/// ### Generics
/// - `S`: The processed state
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// The state of the environment before taking the action
    pub state: S,
    /// The index of the action taken in the given state
    pub action: usize,
    /// The reward received after taking the action
    pub reward: f32,
    /// The state of the environment after the action is taken
    pub next_state: S,
    /// Whether `next_state` is terminal, in which case its value is never bootstrapped from
    pub done: bool,
}

/// A zipped batch of [transitions](Transition)
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch<S> {
    pub states: Vec<S>,
    pub actions: Vec<usize>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<S>,
    pub dones: Vec<bool>,
}

impl<S: Clone> TransitionBatch<S> {
    /// Construct a `TransitionBatch` from an iterator of [transition](Transition) references and a specified batch size
    pub fn from_iter<'a>(
        iter: impl IntoIterator<Item = &'a Transition<S>>,
        batch_size: usize,
    ) -> Self
    where
        S: 'a,
    {
        let batch = Self {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            dones: Vec::with_capacity(batch_size),
        };

        iter.into_iter().fold(batch, |mut b, t| {
            b.states.push(t.state.clone());
            b.actions.push(t.action);
            b.rewards.push(t.reward);
            b.next_states.push(t.next_state.clone());
            b.dones.push(t.done);
            b
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}
