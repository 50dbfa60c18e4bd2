use burn::{optim::Optimizer, prelude::*, tensor::backend::AutodiffBackend};
use log::{debug, info};
use rand::Rng;

use crate::{
    algo::{
        estimator::Estimator,
        sync::{self, soft_update},
    },
    env::{Environment, ToTensor},
    error::{Error, Result},
    exploration::EpsilonGreedy,
    memory::{ReplayMemory, Transition, TransitionBatch},
    model::QModel,
    processor::StateProcessor,
};

/// Hyperparameters for a [`DQNAgent`]
#[derive(Config, Debug)]
pub struct DQNConfig {
    /// Maximum number of transitions retained by the replay memory
    #[config(default = 500000)]
    pub replay_memory_size: usize,
    /// Number of transitions collected by [`populate_memory`](DQNAgent::populate_memory)
    #[config(default = 50000)]
    pub replay_memory_init_size: usize,
    /// Steps between target network synchronizations
    #[config(default = 10000)]
    pub update_target_every: u32,
    #[config(default = 1.0)]
    pub epsilon_start: f32,
    #[config(default = 0.1)]
    pub epsilon_end: f32,
    /// Steps over which epsilon decays linearly from start to end
    #[config(default = 500000)]
    pub epsilon_decay_steps: usize,
    /// The discount factor
    #[config(default = 0.99)]
    pub discount_factor: f32,
    #[config(default = 32)]
    pub batch_size: usize,
    /// Weight of the online parameters at each synchronization, `1.0` copies them outright
    #[config(default = 1.0)]
    pub tau: f32,
    /// Truncate episodes after this many steps
    pub max_episode_steps: Option<usize>,
}

impl DQNConfig {
    /// Check that every hyperparameter is usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.batch_size == 0 {
            return invalid("`batch_size` must be positive");
        }
        if self.replay_memory_size == 0 {
            return invalid("`replay_memory_size` must be positive");
        }
        if self.replay_memory_init_size > self.replay_memory_size {
            return invalid("`replay_memory_init_size` cannot exceed `replay_memory_size`");
        }
        if self.update_target_every == 0 {
            return invalid("`update_target_every` must be positive");
        }
        if self.epsilon_decay_steps == 0 {
            return invalid("`epsilon_decay_steps` must be positive");
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_end) {
            return invalid("epsilon bounds must be in the interval [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid("`discount_factor` must be in the interval [0, 1]");
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return invalid("`tau` must be in the interval (0, 1]");
        }
        if self.max_episode_steps == Some(0) {
            return invalid("`max_episode_steps` must be positive");
        }
        Ok(())
    }
}

/// Summary of one episode played by [`DQNAgent::go`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeReport {
    pub steps: usize,
    /// Undiscounted sum of rewards
    pub reward: f32,
    /// Mean training loss, `None` if the replay memory never held a full batch
    pub mean_loss: Option<f32>,
    /// Exploration rate at the last step of the episode
    pub epsilon: f32,
}

/// A Deep Q Network agent
///
/// Holds an online [`Estimator`] that is trained every step and a target network, synchronized from
/// the online network every `update_target_every` steps, that produces the regression targets.
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`QModel`] used for the online and target networks
/// - `O`: An [`Optimizer`] for the online network
/// - `P`: A [`StateProcessor`] turning observations into network input
/// - `S`: The processed state; `Vec<S>` converts to the network input tensor
/// - `D`: The dimension of the network input
pub struct DQNAgent<B, M, O, P, S, const D: usize>
where
    B: AutodiffBackend,
{
    online: Estimator<B, M, O, D>,
    target: Option<M>,
    processor: P,
    memory: ReplayMemory<S>,
    exploration: EpsilonGreedy,
    config: DQNConfig,
    device: B::Device,
    total_steps: u64,
}

impl<B, M, O, P, S, const D: usize> DQNAgent<B, M, O, P, S, D>
where
    B: AutodiffBackend,
    M: QModel<B, D>,
    O: Optimizer<M, B>,
    S: Clone,
    Vec<S>: ToTensor<B, D, Float>,
{
    /// Initialize a new `DQNAgent`
    ///
    /// ### Arguments
    /// - `online` The [`Estimator`] to train
    /// - `target` A model with the same architecture as the online model
    /// - `processor` Converts raw observations into states
    /// - `config` A [`DQNConfig`] containing hyperparameters for the agent
    /// - `device` The device of both models
    ///
    /// ### Errors
    /// - [`Error::InvalidConfig`] if `config` fails validation
    /// - [`Error::Sync`] if `target` does not share the online model's architecture
    pub fn new(
        online: Estimator<B, M, O, D>,
        target: M,
        processor: P,
        config: DQNConfig,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;
        sync::check_compatible(online.model(), &target)?;

        Ok(Self {
            online,
            target: Some(target),
            processor,
            memory: ReplayMemory::new(config.replay_memory_size),
            exploration: EpsilonGreedy::linear(
                config.epsilon_start,
                config.epsilon_end,
                config.epsilon_decay_steps,
            ),
            config,
            device,
            total_steps: 0,
        })
    }

    /// Number of environment steps taken while training
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn estimator(&self) -> &Estimator<B, M, O, D> {
        &self.online
    }

    pub fn target(&self) -> &M {
        self.target
            .as_ref()
            .expect("target network is only taken during synchronization")
    }

    pub fn memory(&self) -> &ReplayMemory<S> {
        &self.memory
    }

    pub fn config(&self) -> &DQNConfig {
        &self.config
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.total_steps)
    }

    /// Synchronize the target network with the online network
    pub fn sync_target(&mut self) {
        let target = self
            .target
            .take()
            .expect("target network is only taken during synchronization");
        let target = soft_update(self.online.model(), target, self.config.tau)
            .expect("architectures are checked when the agent is built");
        self.target = Some(target);
        debug!("synchronized target network at step {}", self.total_steps);
    }

    /// Invoke the online network along with the exploration policy to choose an action index
    pub fn act(&self, state: &S, rng: &mut impl Rng) -> Result<usize> {
        let input = vec![state.clone()].to_tensor(&self.device);
        let q_values = self.online.predict_values(input)?;
        let q_values = q_values.first().ok_or(Error::NoActions)?;
        self.exploration.choose(q_values, self.total_steps, rng)
    }

    fn check_env<E: Environment>(&self, env: &E) -> Result<()> {
        let (env_actions, model_actions) = (env.num_actions(), self.online.num_actions());
        if env_actions != model_actions {
            return Err(Error::InvalidConfig(format!(
                "environment has {env_actions} actions but the network estimates {model_actions}"
            )));
        }
        Ok(())
    }

    /// Fill the replay memory with `replay_memory_init_size` transitions collected by the current policy
    ///
    /// No training happens and the step counter is left untouched.
    pub fn populate_memory<E>(&mut self, env: &mut E, rng: &mut impl Rng) -> Result<()>
    where
        E: Environment,
        P: StateProcessor<E::State, State = S>,
    {
        self.check_env(env)?;

        let mut state = self.processor.process(&env.reset());
        for _ in 0..self.config.replay_memory_init_size {
            let action = self.act(&state, rng)?;
            let (next, reward, done) = env.step(E::Action::from(action));
            let next_state = self.processor.process(&next);

            self.memory.push(Transition {
                state,
                action,
                reward,
                next_state: next_state.clone(),
                done,
            });

            state = if done {
                self.processor.process(&env.reset())
            } else {
                next_state
            };
        }

        info!("replay memory populated with {} transitions", self.memory.len());
        Ok(())
    }

    /// Regression targets for `batch`, bootstrapped from the target network
    fn targets(&self, batch: &TransitionBatch<S>) -> Vec<f32> {
        let next_states = batch.next_states.clone().to_tensor(&self.device);
        let max_next_q = self
            .target()
            .forward(next_states)
            .detach()
            .max_dim(1)
            .squeeze::<1>(1)
            .into_data()
            .convert::<f32>()
            .value;

        let targets = td_targets(
            &batch.rewards,
            &batch.dones,
            &max_next_q,
            self.config.discount_factor,
        );
        debug_assert_eq!(targets.len(), batch.len());
        targets
    }

    /// Perform one DQN learning step on a batch sampled from the replay memory
    ///
    /// **Returns** the loss, or `None` if the memory does not hold a full batch yet
    fn learn(&mut self, rng: &mut impl Rng) -> Result<Option<f32>> {
        let Some(batch) = self.memory.sample_zipped(self.config.batch_size, rng) else {
            return Ok(None);
        };

        let targets = self.targets(&batch);
        let states = batch.states.to_tensor(&self.device);
        let loss = self.online.update(states, &batch.actions, &targets)?;
        Ok(Some(loss))
    }

    /// Take one training step from `state`: sync the target if due, act, store the transition, learn
    fn step<E>(&mut self, env: &mut E, state: S, rng: &mut impl Rng) -> Result<StepOutcome<S>>
    where
        E: Environment,
        P: StateProcessor<E::State, State = S>,
    {
        if self.total_steps % u64::from(self.config.update_target_every) == 0 {
            self.sync_target();
        }

        let action = self.act(&state, rng)?;
        let (next, reward, done) = env.step(E::Action::from(action));
        let next_state = self.processor.process(&next);

        self.memory.push(Transition {
            state,
            action,
            reward,
            next_state: next_state.clone(),
            done,
        });

        let loss = self.learn(rng)?;
        self.total_steps = self.total_steps.saturating_add(1);

        Ok(StepOutcome {
            next_state,
            reward,
            done,
            loss,
        })
    }

    /// Deploy the `DQNAgent` into the environment for one episode, training after every step
    pub fn go<E>(&mut self, env: &mut E, rng: &mut impl Rng) -> Result<EpisodeReport>
    where
        E: Environment,
        P: StateProcessor<E::State, State = S>,
    {
        self.check_env(env)?;

        let mut report = EpisodeReport::default();
        let mut loss_sum = 0.0;
        let mut loss_count = 0usize;
        let mut state = self.processor.process(&env.reset());

        loop {
            report.epsilon = self.epsilon();
            let outcome = self.step(env, state, rng)?;

            if let Some(loss) = outcome.loss {
                loss_sum += loss;
                loss_count += 1;
            }
            report.steps += 1;
            report.reward += outcome.reward;

            let truncated = self
                .config
                .max_episode_steps
                .is_some_and(|max| report.steps >= max);
            if outcome.done || truncated {
                break;
            }
            state = outcome.next_state;
        }

        report.mean_loss = (loss_count > 0).then(|| loss_sum / loss_count as f32);
        info!(
            "episode finished after {} steps: reward {:.3}, epsilon {:.3}, loss {:?}",
            report.steps, report.reward, report.epsilon, report.mean_loss
        );
        Ok(report)
    }
}

struct StepOutcome<S> {
    next_state: S,
    reward: f32,
    done: bool,
    loss: Option<f32>,
}

/// One-step Q-learning targets
///
/// `r` for terminal transitions, `r + gamma * max_next_q` otherwise
fn td_targets(rewards: &[f32], dones: &[bool], max_next_q: &[f32], gamma: f32) -> Vec<f32> {
    rewards
        .iter()
        .zip(dones)
        .zip(max_next_q)
        .map(|((&reward, &done), &q)| if done { reward } else { reward + gamma * q })
        .collect()
}
