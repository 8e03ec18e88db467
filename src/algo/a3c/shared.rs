use std::{
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, Tensor},
    LearningRate,
};
use parking_lot::Mutex;

use crate::error::A3CError;

/// The global copy of the model parameters that every worker pushes gradients to and pulls parameters from
///
/// Burn modules are `Send` but not `Sync`, so the model lives in a single mutex-guarded slot.
/// Each individual read ([`snapshot`](Self::snapshot)) or write (an optimizer step) is atomic,
/// but nothing orders the push/step/pull sequences of different workers relative to each other.
#[derive(Debug)]
pub struct SharedModel<M> {
    slot: Mutex<Option<M>>,
}

impl<M: Clone> SharedModel<M> {
    pub fn new(model: M) -> Self {
        Self {
            slot: Mutex::new(Some(model)),
        }
    }

    /// Copy of the current parameters
    pub fn snapshot(&self) -> Result<M, A3CError> {
        self.slot
            .lock()
            .clone()
            .ok_or(A3CError::SharedModelUnavailable)
    }

    /// Replace the model with `f(model)` while holding the lock
    ///
    /// If `f` panics the slot stays empty and every later access fails with
    /// [`A3CError::SharedModelUnavailable`].
    pub(crate) fn update(&self, f: impl FnOnce(M) -> M) -> Result<(), A3CError> {
        let mut slot = self.slot.lock();
        let model = slot.take().ok_or(A3CError::SharedModelUnavailable)?;
        *slot = Some(f(model));
        Ok(())
    }

    pub fn into_inner(self) -> Result<M, A3CError> {
        self.slot
            .into_inner()
            .ok_or(A3CError::SharedModelUnavailable)
    }
}

/// A single optimizer, and therefore a single set of moment accumulators, used by every worker
///
/// Alongside the optimizer it holds the gradient slot of the shared parameters. A worker
/// [zeroes](Self::zero_grad) the slot, [overwrites](Self::set_grads) it with the gradients of its
/// local loss and then [steps](Self::step), which applies whatever gradients are in the slot at that
/// moment. Concurrent workers may clobber each other's gradients in between; the most recent writer wins.
/// Stepping does not clear the slot, so a step that follows another step without a
/// [`zero_grad`](Self::zero_grad) applies the same gradients again.
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The module being optimized
/// - `O`: An [`Optimizer`], e.g. the one built by [`adam`](SharedOptimizer::adam)
pub struct SharedOptimizer<B, M, O> {
    optimizer: Mutex<O>,
    grads: Mutex<Option<GradientsParams>>,
    lr: LearningRate,
    steps: AtomicUsize,
    _marker: PhantomData<fn() -> (B, M)>,
}

impl<B, M> SharedOptimizer<B, M, ()>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    /// Initialize a shared Adam whose moment estimates all start at zero
    ///
    /// Burn's Adam can only be named as `impl Optimizer`, so this constructor lives on the
    /// placeholder `O = ()` and returns the concrete type.
    pub fn adam(
        config: &AdamConfig,
        lr: LearningRate,
    ) -> SharedOptimizer<B, M, impl Optimizer<M, B>> {
        SharedOptimizer::new(config.init::<B, M>(), lr)
    }
}

impl<B, M, O> SharedOptimizer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    pub fn new(optimizer: O, lr: LearningRate) -> Self {
        Self {
            optimizer: Mutex::new(optimizer),
            grads: Mutex::new(None),
            lr,
            steps: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    pub fn lr(&self) -> LearningRate {
        self.lr
    }

    /// Clear the gradients of the shared parameters
    pub fn zero_grad(&self) {
        *self.grads.lock() = None;
    }

    /// Overwrite the gradients of the shared parameters
    ///
    /// The gradients must be keyed by the shared module's parameter ids, which holds for any
    /// module obtained from [`SharedModel::snapshot`].
    ///
    /// **Returns** `true` if gradients from another writer were clobbered
    pub fn set_grads(&self, grads: GradientsParams) -> bool {
        self.grads.lock().replace(grads).is_some()
    }

    /// Whether the slot currently holds gradients
    pub fn has_grads(&self) -> bool {
        self.grads.lock().is_some()
    }

    /// Apply the gradients currently in the slot to `model`
    ///
    /// The slot keeps its gradients; only [`zero_grad`](Self::zero_grad) and
    /// [`set_grads`](Self::set_grads) change it.
    ///
    /// **Returns** `false` without touching the model if the slot is empty, e.g. because another
    /// worker zeroed it in the meantime
    pub fn step(&self, model: &SharedModel<M>) -> Result<bool, A3CError> {
        let mut optimizer = self.optimizer.lock();
        let mut applied = false;
        model.update(|m| match self.current_grads(&m) {
            Some(grads) => {
                applied = true;
                optimizer.step(self.lr, m, grads)
            }
            None => m,
        })?;

        if applied {
            self.steps.fetch_add(1, Ordering::Relaxed);
        }
        Ok(applied)
    }

    /// A fresh copy of the slot's gradients for the parameters of `module`
    fn current_grads(&self, module: &M) -> Option<GradientsParams> {
        let slot = self.grads.lock();
        let mut copier = GradientsCopier {
            source: slot.as_ref()?,
            copy: GradientsParams::new(),
        };
        module.visit(&mut copier);
        Some(copier.copy)
    }

    /// Number of updates applied so far
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

/// Copies the gradients of every visited parameter into a new [`GradientsParams`]
struct GradientsCopier<'a> {
    source: &'a GradientsParams,
    copy: GradientsParams,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradientsCopier<'_> {
    fn visit_float<const D: usize>(&mut self, id: &ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.source.get::<B::InnerBackend, D>(id) {
            self.copy.register::<B::InnerBackend, D>(id.clone(), grad);
        }
    }
}
