//! Pass scheduling and execution for the Refract transformer
//!
//! This module is the function-level pass engine: it decides in what order
//! registered analysis and transform passes run, which previously computed
//! analysis results can be reused, when cached results become stale, and
//! how an analysis requested mid-execution but absent from the frozen
//! schedule gets satisfied.
//!
//! The moving parts:
//! - [`PipelineBuilder`] consumes registered passes and freezes a schedule
//!   partitioned into nesting levels
//! - [`FunctionPassManager`] drives the initialize/run/finalize lifecycle
//!   and owns the [`AnalysisCache`]
//! - the on-the-fly resolver (exposed through [`PassContext::require`])
//!   computes unscheduled analyses transiently, recursing through their own
//!   unmet requirements
//!
//! No pass ever observes a stale or absent analysis it declared as
//! required; that invariant is enforced at build time for scheduled passes
//! and at run time for on-the-fly requests.

pub mod builder;
pub mod cache;
pub mod engine;
pub mod error;
pub mod library;
pub mod printer;
mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::PipelineBuilder;
pub use cache::AnalysisCache;
pub use engine::{FunctionPassManager, LevelManager, ManagerState};
pub use error::{BuildError, ExecutionError, LifecycleError};
pub use printer::create_printer_pass;
pub use resolver::PassContext;

use crate::ir::{IrFunction, IrModule};
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;

/// Identity of an analysis. Two passes producing the same `AnalysisId`
/// produce interchangeable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisId(pub &'static str);

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable arena index of a registered pass, assigned at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(u32);

impl PassId {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass#{}", self.0)
    }
}

/// Declared usage contract of a pass: which analyses it requires and which
/// it guarantees to leave valid.
#[derive(Debug, Clone, Default)]
pub struct PassUsage {
    /// Analyses that must be valid before the pass runs
    pub required: SmallVec<[AnalysisId; 4]>,

    /// Analyses the pass guarantees not to invalidate
    pub preserved: SmallVec<[AnalysisId; 4]>,

    /// The pass invalidates nothing at all
    pub preserves_all: bool,
}

impl PassUsage {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn requires(mut self, id: AnalysisId) -> Self {
        self.required.push(id);
        self
    }

    pub fn preserves(mut self, id: AnalysisId) -> Self {
        self.preserved.push(id);
        self
    }

    pub fn preserves_all(mut self) -> Self {
        self.preserves_all = true;
        self
    }

    /// Whether `id` survives this pass. Declaring an analysis as both
    /// required and preserved is legal; the invalidation is simply a no-op
    /// for it.
    pub fn is_preserved(&self, id: AnalysisId) -> bool {
        self.preserves_all || self.preserved.contains(&id)
    }
}

/// Module-wide state threaded into the one-time initialize/finalize hooks.
/// Lifecycle is bounded by the engine's own state machine; there is no
/// ambient or static module state.
pub struct ModuleContext<'m> {
    pub module: &'m mut IrModule,
}

impl<'m> ModuleContext<'m> {
    pub fn new(module: &'m mut IrModule) -> Self {
        Self { module }
    }
}

/// An analysis pass: computes a cacheable, read-only result for one
/// function. Side-effect-free on the unit.
pub trait AnalysisPass {
    /// Stable identity of the produced analysis
    fn id(&self) -> AnalysisId;

    /// Usage contract; analyses may themselves require other analyses
    fn usage(&self) -> PassUsage {
        PassUsage::none()
    }

    /// One-time module-level setup; returns true if module state changed
    fn initialize(&mut self, _cx: &mut ModuleContext<'_>) -> bool {
        false
    }

    /// One-time module-level teardown; returns true if module state changed
    fn finalize(&mut self, _cx: &mut ModuleContext<'_>) -> bool {
        false
    }

    /// Compute the analysis result for `function`
    fn run(
        &self,
        function: &IrFunction,
        cx: &mut PassContext<'_>,
    ) -> Result<Box<dyn Any>, ExecutionError>;
}

/// A transform pass: mutates the function in place and reports whether it
/// changed anything.
pub trait TransformPass {
    /// Human-readable name, used in diagnostics and error attribution
    fn name(&self) -> &'static str;

    /// Usage contract
    fn usage(&self) -> PassUsage {
        PassUsage::none()
    }

    /// One-time module-level setup; returns true if module state changed
    fn initialize(&mut self, _cx: &mut ModuleContext<'_>) -> bool {
        false
    }

    /// One-time module-level teardown; returns true if module state changed
    fn finalize(&mut self, _cx: &mut ModuleContext<'_>) -> bool {
        false
    }

    /// Run the pass; returns true if the function was modified
    fn run(
        &mut self,
        function: &mut IrFunction,
        cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError>;
}

/// A registered pass. The two kinds are a closed set; per-pass behavior
/// lives behind the trait objects.
pub enum FunctionPass {
    Analysis(Box<dyn AnalysisPass>),
    Transform(Box<dyn TransformPass>),
}

impl FunctionPass {
    pub fn analysis(pass: impl AnalysisPass + 'static) -> Self {
        FunctionPass::Analysis(Box::new(pass))
    }

    pub fn transform(pass: impl TransformPass + 'static) -> Self {
        FunctionPass::Transform(Box::new(pass))
    }

    pub fn name(&self) -> &str {
        match self {
            FunctionPass::Analysis(a) => a.id().0,
            FunctionPass::Transform(t) => t.name(),
        }
    }

    pub fn usage(&self) -> PassUsage {
        match self {
            FunctionPass::Analysis(a) => a.usage(),
            FunctionPass::Transform(t) => t.usage(),
        }
    }

    /// The analysis this pass produces, if it is an analysis pass
    pub fn produces(&self) -> Option<AnalysisId> {
        match self {
            FunctionPass::Analysis(a) => Some(a.id()),
            FunctionPass::Transform(_) => None,
        }
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, FunctionPass::Transform(_))
    }

    pub(crate) fn initialize(&mut self, cx: &mut ModuleContext<'_>) -> bool {
        match self {
            FunctionPass::Analysis(a) => a.initialize(cx),
            FunctionPass::Transform(t) => t.initialize(cx),
        }
    }

    pub(crate) fn finalize(&mut self, cx: &mut ModuleContext<'_>) -> bool {
        match self {
            FunctionPass::Analysis(a) => a.finalize(cx),
            FunctionPass::Transform(t) => t.finalize(cx),
        }
    }
}

/// Arena of pass objects. Passes are exclusively owned here for their
/// entire lifetime and addressed by [`PassId`].
///
/// A slot is emptied only while its pass is executing; a recursive attempt
/// to take the same slot is how requirement cycles surface.
pub(crate) struct PassArena {
    slots: Vec<Option<FunctionPass>>,
    names: Vec<String>,
}

impl std::fmt::Debug for PassArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassArena")
            .field("names", &self.names)
            .finish()
    }
}

impl PassArena {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            names: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, pass: FunctionPass) -> PassId {
        let id = PassId(self.slots.len() as u32);
        self.names.push(pass.name().to_owned());
        self.slots.push(Some(pass));
        id
    }

    /// Name recorded at registration; valid even while the pass is running
    pub(crate) fn name(&self, id: PassId) -> &str {
        &self.names[id.as_usize()]
    }

    /// Take the pass out of its slot for execution, or `None` if it is
    /// already running further up the call stack.
    pub(crate) fn take(&mut self, id: PassId) -> Option<FunctionPass> {
        self.slots[id.as_usize()].take()
    }

    pub(crate) fn restore(&mut self, id: PassId, pass: FunctionPass) {
        debug_assert!(self.slots[id.as_usize()].is_none());
        self.slots[id.as_usize()] = Some(pass);
    }

    pub(crate) fn get(&self, id: PassId) -> Option<&FunctionPass> {
        self.slots[id.as_usize()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: PassId) -> Option<&mut FunctionPass> {
        self.slots[id.as_usize()].as_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
