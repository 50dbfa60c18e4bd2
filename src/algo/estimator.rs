use std::marker::PhantomData;

use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, GradientsParams, Optimizer, RmsProp, RmsPropConfig},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::debug;

use crate::{
    ds::RingBuffer,
    env::ToTensor,
    error::{Error, Result},
    model::QModel,
};

/// Optimizer hyperparameters for an [`Estimator`]
///
/// Defaults follow the RMSProp setup of the original DQN paper.
#[derive(Config, Debug)]
pub struct EstimatorConfig {
    #[config(default = 0.00025)]
    pub learning_rate: f64,
    /// Decay of the running average of squared gradients
    #[config(default = 0.99)]
    pub decay: f32,
    #[config(default = 0.0)]
    pub momentum: f32,
    #[config(default = 1e-6)]
    pub epsilon: f32,
}

impl EstimatorConfig {
    /// Build an RMSProp optimizer for model `M`
    pub fn optimizer<B, M>(&self) -> RmsPropOptimizer<M, B>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        RmsPropConfig::new()
            .with_alpha(self.decay)
            .with_momentum(self.momentum)
            .with_epsilon(self.epsilon)
            .init()
    }

    /// Wrap `model` into an [`Estimator`] trained with RMSProp
    pub fn init<B, M, const D: usize>(&self, model: M) -> Estimator<B, M, RmsPropOptimizer<M, B>, D>
    where
        B: AutodiffBackend,
        M: QModel<B, D>,
    {
        Estimator::new(model, self.optimizer(), self.learning_rate)
    }
}

pub type RmsPropOptimizer<M, B> = OptimizerAdaptor<RmsProp<<B as AutodiffBackend>::InnerBackend>, M, B>;

/// A monitoring record written on every [`update`](Estimator::update) when summaries are enabled
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    /// Number of updates performed before this one
    pub step: u64,
    /// Batch loss before the optimizer step
    pub loss: f32,
    /// Largest predicted action value in the batch
    pub max_q: f32,
}

/// An action-value estimator: a [`QModel`] together with the optimizer that trains it
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`QModel`]
/// - `O`: An [`Optimizer`] for `M`
/// - `D`: The dimension of the model input
pub struct Estimator<B, M, O, const D: usize>
where
    B: AutodiffBackend,
{
    model: Option<M>,
    optimizer: O,
    loss: MseLoss<B>,
    lr: f64,
    updates: u64,
    summaries: Option<RingBuffer<UpdateSummary>>,
    _backend: PhantomData<B>,
}

impl<B, M, O, const D: usize> Estimator<B, M, O, D>
where
    B: AutodiffBackend,
    M: QModel<B, D>,
    O: Optimizer<M, B>,
{
    pub fn new(model: M, optimizer: O, lr: f64) -> Self {
        Self {
            model: Some(model),
            optimizer,
            loss: MseLoss::new(),
            lr,
            updates: 0,
            summaries: None,
            _backend: PhantomData,
        }
    }

    /// Record an [`UpdateSummary`] for every subsequent update, keeping the latest `capacity` of them
    ///
    /// **Panics** if `capacity` is zero
    pub fn with_summaries(mut self, capacity: usize) -> Self {
        self.summaries = Some(RingBuffer::new(capacity));
        self
    }

    pub fn model(&self) -> &M {
        self.model
            .as_ref()
            .expect("model is only taken for the duration of an update")
    }

    pub fn num_actions(&self) -> usize {
        self.model().num_actions()
    }

    /// Number of optimizer steps taken so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Recorded summaries if enabled; iterate with [`RingBuffer::iter`] for oldest first
    pub fn summaries(&self) -> Option<&RingBuffer<UpdateSummary>> {
        self.summaries.as_ref()
    }

    /// Action values for a batch of states, `[batch, num_actions]`
    ///
    /// **Errors** with [`Error::EmptyBatch`] if `states` holds no state
    pub fn predict(&self, states: Tensor<B, D>) -> Result<Tensor<B, 2>> {
        if states.dims()[0] == 0 {
            return Err(Error::EmptyBatch);
        }
        Ok(self.model().forward(states))
    }

    /// Action values for a batch of states, one row per state
    pub fn predict_values(&self, states: Tensor<B, D>) -> Result<Vec<Vec<f32>>> {
        let values = self.predict(states.detach())?;
        let [_, num_actions] = values.dims();
        let flat = values.into_data().convert::<f32>().value;
        Ok(flat.chunks(num_actions.max(1)).map(<[f32]>::to_vec).collect())
    }

    /// Take one optimizer step towards `targets` for the chosen `actions`
    ///
    /// The loss is the mean squared error between each target and the predicted value of the action
    /// taken in that state; values of other actions are not penalized.
    ///
    /// **Returns** the batch loss measured before the step
    pub fn update(&mut self, states: Tensor<B, D>, actions: &[usize], targets: &[f32]) -> Result<f32> {
        let batch_size = states.dims()[0];
        if batch_size == 0 {
            return Err(Error::EmptyBatch);
        }
        if actions.len() != batch_size || targets.len() != batch_size {
            return Err(Error::BatchMismatch {
                states: batch_size,
                actions: actions.len(),
                targets: targets.len(),
            });
        }
        let num_actions = self.num_actions();
        if let Some(&action) = actions.iter().find(|&&a| a >= num_actions) {
            return Err(Error::ActionOutOfRange {
                action,
                num_actions,
            });
        }

        let device = states.device();
        let actions: Tensor<B, 1, Int> = actions.to_vec().to_tensor(&device);
        let targets: Tensor<B, 1> = targets.to_vec().to_tensor(&device);

        let model = self
            .model
            .take()
            .expect("model is only taken for the duration of an update");

        let q_values = model.forward(states);
        let max_q = q_values.clone().max().detach().into_scalar().elem::<f32>();
        let action_values = q_values.gather(1, actions.unsqueeze_dim(1)).squeeze(1);

        let loss = self.loss.forward(action_values, targets, Reduction::Mean);
        let loss_value = loss.clone().detach().into_scalar().elem::<f32>();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        self.model = Some(self.optimizer.step(self.lr, model, grads));

        debug!(
            "update {}: loss {:.6}, max q {:.4}",
            self.updates, loss_value, max_q
        );
        if let Some(summaries) = self.summaries.as_mut() {
            summaries.push(UpdateSummary {
                step: self.updates,
                loss: loss_value,
                max_q,
            });
        }
        self.updates += 1;

        Ok(loss_value)
    }
}
