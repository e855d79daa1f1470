//! Execution engine
//!
//! [`FunctionPassManager`] drives the frozen schedule: initialize once, run
//! per function any number of times, finalize once. Transforms execute and
//! then invalidate the cache according to their declared preserved set;
//! analyses consult the cache first and are skipped entirely on a hit,
//! which is the principal optimization this engine exists to provide.
//!
//! Execution is strictly single-threaded and synchronous. For a fixed
//! schedule and a fixed sequence of `run` calls, pass execution order is
//! fully deterministic.

use super::cache::AnalysisCache;
use super::error::{ExecutionError, LifecycleError};
use super::resolver::{self, Durability, PassContext};
use super::{AnalysisId, AnalysisPass, FunctionPass, ModuleContext, PassArena, PassId};
use crate::ir::IrFunction;
use fxhash::FxHashMap;
use log::{debug, info, trace};

/// Lifecycle state of a [`FunctionPassManager`]. Transitions are owned
/// solely by the engine; exactly one Initialized→Finalized cycle exists per
/// schedule instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Built,
    Initialized,
    Running,
    Finalized,
}

/// One nesting level of the schedule: a contiguous run of passes that share
/// analysis lifetimes without an intervening invalidating transform.
#[derive(Debug, Default)]
pub struct LevelManager {
    passes: Vec<PassId>,
    names: Vec<String>,
}

impl LevelManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: PassId, name: String) {
        self.passes.push(id);
        self.names.push(name);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_ids(&self) -> &[PassId] {
        &self.passes
    }

    /// Pass names in schedule order, for diagnostic tooling
    pub fn pass_names(&self) -> &[String] {
        &self.names
    }
}

/// Drives the frozen schedule over functions, owning the pass arena and the
/// analysis cache.
#[derive(Debug)]
pub struct FunctionPassManager {
    arena: PassArena,
    levels: Vec<LevelManager>,
    registry: FxHashMap<AnalysisId, PassId>,
    cache: AnalysisCache,
    state: ManagerState,
}

impl FunctionPassManager {
    pub(crate) fn from_parts(
        arena: PassArena,
        levels: Vec<LevelManager>,
        registry: FxHashMap<AnalysisId, PassId>,
    ) -> Self {
        Self {
            arena,
            levels,
            registry,
            cache: AnalysisCache::new(),
            state: ManagerState::Built,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Read-only view of the analysis cache, for diagnostic tooling
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Number of nesting levels in the frozen schedule
    pub fn num_contained_managers(&self) -> usize {
        self.levels.len()
    }

    /// The nested sub-schedule at nesting level `n`.
    ///
    /// An out-of-range index is a contract bug in the caller.
    pub fn get_contained_manager(&self, n: usize) -> &LevelManager {
        assert!(
            n < self.levels.len(),
            "level index {} out of range ({} levels)",
            n,
            self.levels.len()
        );
        &self.levels[n]
    }

    /// Make an analysis producer known to the on-the-fly resolver without
    /// touching the frozen schedule. Results it produces are transient.
    pub fn register_analysis(&mut self, producer: impl AnalysisPass + 'static) {
        let analysis = producer.id();
        let id = self.arena.push(FunctionPass::Analysis(Box::new(producer)));
        debug!("registered on-the-fly producer '{}' as {}", analysis, id);
        self.registry.insert(analysis, id);
    }

    /// Invoke each scheduled pass's one-time setup hook in schedule order.
    /// Returns whether any pass reports it altered module-level state.
    pub fn do_initialization(
        &mut self,
        cx: &mut ModuleContext<'_>,
    ) -> Result<bool, LifecycleError> {
        if self.state != ManagerState::Built {
            return Err(LifecycleError {
                operation: "do_initialization",
                state: self.state,
            });
        }
        self.state = ManagerState::Initialized;
        info!("initializing pass pipeline for module '{}'", cx.module.name);

        let mut changed = false;
        for level in &self.levels {
            for &pass_id in level.pass_ids() {
                if let Some(pass) = self.arena.get_mut(pass_id) {
                    changed |= pass.initialize(cx);
                }
            }
        }
        Ok(changed)
    }

    /// Execute the schedule against one function. May be invoked any number
    /// of times, for different functions, between initialization and
    /// finalization; invocations for different functions are independent.
    ///
    /// Returns the logical OR of all transform "modified" reports.
    pub fn run(&mut self, function: &mut IrFunction) -> Result<bool, ExecutionError> {
        match self.state {
            ManagerState::Initialized | ManagerState::Running => {}
            state => {
                return Err(LifecycleError {
                    operation: "run",
                    state,
                }
                .into())
            }
        }
        self.state = ManagerState::Running;
        debug!("running schedule over '{}' ({})", function.name, function.id);

        let mut modified = false;
        for level_index in 0..self.levels.len() {
            for pass_index in 0..self.levels[level_index].len() {
                let pass_id = self.levels[level_index].pass_ids()[pass_index];
                modified |= self.run_pass(pass_id, function)?;
                // on-the-fly results never survive past the pass that
                // requested them
                self.cache.sweep_transient(function.id);
            }
        }
        Ok(modified)
    }

    /// Invoke each scheduled pass's one-time teardown hook in schedule
    /// order; after this no further `run` calls are permitted. Returns
    /// whether any pass reports it altered module-level state.
    pub fn do_finalization(&mut self, cx: &mut ModuleContext<'_>) -> Result<bool, LifecycleError> {
        match self.state {
            ManagerState::Initialized | ManagerState::Running => {}
            state => {
                return Err(LifecycleError {
                    operation: "do_finalization",
                    state,
                })
            }
        }
        self.state = ManagerState::Finalized;
        info!("finalizing pass pipeline for module '{}'", cx.module.name);

        let mut changed = false;
        for level in &self.levels {
            for &pass_id in level.pass_ids() {
                if let Some(pass) = self.arena.get_mut(pass_id) {
                    changed |= pass.finalize(cx);
                }
            }
        }
        self.cache.clear();
        Ok(changed)
    }

    fn run_pass(
        &mut self,
        pass_id: PassId,
        function: &mut IrFunction,
    ) -> Result<bool, ExecutionError> {
        let produced = self.arena.get(pass_id).and_then(FunctionPass::produces);
        match produced {
            Some(analysis) => {
                if self.cache.contains(analysis, function.id) {
                    trace!(
                        "cache hit: '{}' for {}, skipping execution",
                        analysis,
                        function.id
                    );
                    return Ok(false);
                }
                let name = self.arena.name(pass_id).to_owned();
                resolver::ensure_analysis(
                    analysis,
                    Some(pass_id),
                    Durability::Durable,
                    function,
                    &mut self.arena,
                    &self.registry,
                    &mut self.cache,
                    &name,
                )?;
                Ok(false)
            }
            None => {
                let mut pass = self
                    .arena
                    .take(pass_id)
                    .expect("scheduled transform is not re-entrant");
                let FunctionPass::Transform(transform) = &mut pass else {
                    unreachable!("non-analysis schedule slots hold transforms")
                };
                let usage = transform.usage();
                let name = transform.name();
                let result = {
                    let mut cx = PassContext::new(
                        function.id,
                        name,
                        &mut self.arena,
                        &self.registry,
                        &mut self.cache,
                    );
                    transform.run(function, &mut cx)
                };
                self.arena.restore(pass_id, pass);
                let modified = result?;
                self.cache.invalidate(function.id, &usage);
                if modified {
                    debug!("transform '{}' modified '{}'", name, function.name);
                } else {
                    trace!("transform '{}' left '{}' unchanged", name, function.name);
                }
                Ok(modified)
            }
        }
    }
}
