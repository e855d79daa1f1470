//! Shared pass stubs for scheduler tests

use super::error::ExecutionError;
use super::{
    AnalysisId, AnalysisPass, FunctionPass, ModuleContext, PassContext, PassUsage, TransformPass,
};
use crate::ir::IrFunction;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

pub(crate) const DOM: AnalysisId = AnalysisId("dominators");
pub(crate) const LIVENESS: AnalysisId = AnalysisId("liveness");

/// Analysis stub: counts executions and caches the running count
pub(crate) struct StubAnalysis {
    pub id: AnalysisId,
    pub usage: PassUsage,
    pub runs: Rc<Cell<usize>>,
}

impl AnalysisPass for StubAnalysis {
    fn id(&self) -> AnalysisId {
        self.id
    }

    fn usage(&self) -> PassUsage {
        self.usage.clone()
    }

    fn run(
        &self,
        _function: &IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<Box<dyn Any>, ExecutionError> {
        self.runs.set(self.runs.get() + 1);
        Ok(Box::new(self.runs.get()))
    }
}

pub(crate) fn analysis(id: AnalysisId) -> FunctionPass {
    counting_analysis(id, Rc::new(Cell::new(0)))
}

pub(crate) fn counting_analysis(id: AnalysisId, runs: Rc<Cell<usize>>) -> FunctionPass {
    FunctionPass::analysis(StubAnalysis {
        id,
        usage: PassUsage::none(),
        runs,
    })
}

/// Transform stub: counts run/initialize/finalize invocations
pub(crate) struct StubTransform {
    pub name: &'static str,
    pub usage: PassUsage,
    pub modifies: bool,
    pub init_reports_change: bool,
    pub runs: Rc<Cell<usize>>,
    pub init_calls: Rc<Cell<usize>>,
    pub final_calls: Rc<Cell<usize>>,
}

impl StubTransform {
    pub(crate) fn new(name: &'static str, usage: PassUsage) -> Self {
        Self {
            name,
            usage,
            modifies: false,
            init_reports_change: false,
            runs: Rc::new(Cell::new(0)),
            init_calls: Rc::new(Cell::new(0)),
            final_calls: Rc::new(Cell::new(0)),
        }
    }
}

impl TransformPass for StubTransform {
    fn name(&self) -> &'static str {
        self.name
    }

    fn usage(&self) -> PassUsage {
        self.usage.clone()
    }

    fn initialize(&mut self, cx: &mut ModuleContext<'_>) -> bool {
        self.init_calls.set(self.init_calls.get() + 1);
        if self.init_reports_change {
            cx.module.notes.push(format!("{} initialized", self.name));
        }
        self.init_reports_change
    }

    fn finalize(&mut self, _cx: &mut ModuleContext<'_>) -> bool {
        self.final_calls.set(self.final_calls.get() + 1);
        false
    }

    fn run(
        &mut self,
        _function: &mut IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError> {
        self.runs.set(self.runs.get() + 1);
        Ok(self.modifies)
    }
}

pub(crate) fn transform(name: &'static str, usage: PassUsage) -> FunctionPass {
    FunctionPass::transform(StubTransform::new(name, usage))
}

pub(crate) fn modifying_transform(name: &'static str, usage: PassUsage) -> FunctionPass {
    let mut stub = StubTransform::new(name, usage);
    stub.modifies = true;
    FunctionPass::transform(stub)
}
