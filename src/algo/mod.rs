/// Deep Q-learning agent and training loop
pub mod dqn;

/// Action-value estimator
pub mod estimator;

/// Target network synchronization
pub mod sync;

pub use dqn::{DQNAgent, DQNConfig, EpisodeReport};
pub use estimator::{Estimator, EstimatorConfig};
