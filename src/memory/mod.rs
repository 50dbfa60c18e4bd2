mod base;
mod transition;

pub use base::ReplayMemory;
pub use transition::*;
