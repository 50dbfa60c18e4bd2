mod epsilon_greedy;

pub use epsilon_greedy::{epsilon_greedy, EpsilonGreedy};
