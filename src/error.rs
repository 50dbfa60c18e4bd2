use thiserror::Error;

use crate::algo::sync::SyncError;

/// Errors raised by the estimator, the exploration policy and the agent configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An action index outside of `0..num_actions`
    #[error("action {action} is out of range for {num_actions} actions")]
    ActionOutOfRange { action: usize, num_actions: usize },

    /// The policy was handed an empty value vector
    #[error("cannot select an action from an empty set of action values")]
    NoActions,

    #[error("epsilon must be in the interval [0, 1], got {0}")]
    InvalidEpsilon(f32),

    /// States, actions and targets of an update batch disagree in length
    #[error("batch mismatch: {states} states, {actions} actions, {targets} targets")]
    BatchMismatch {
        states: usize,
        actions: usize,
        targets: usize,
    },

    /// An update or prediction was handed a batch of zero states
    #[error("batch must contain at least one state")]
    EmptyBatch,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
