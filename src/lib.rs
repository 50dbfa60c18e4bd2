/// Deep Q-learning algorithm components
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Crate error type
pub mod error;

/// Exploration policies
pub mod exploration;

/// Experience replay
pub mod memory;

/// Action-value networks
pub mod model;

/// Observation preprocessing
pub mod processor;

mod util;

pub use error::{Error, Result};
