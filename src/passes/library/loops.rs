//! Natural loop detection
//!
//! Finds back edges (an edge whose target dominates its source) and the
//! loop headers they define. Requires dominators; when scheduled without
//! them the resolver computes the dominator tree on the fly.

use super::dominators::{Dominators, DOMINATORS};
use crate::ir::{IrBlockId, IrFunction};
use crate::passes::error::ExecutionError;
use crate::passes::{AnalysisId, AnalysisPass, PassContext, PassUsage};
use std::any::Any;

pub const LOOPS: AnalysisId = AnalysisId("loops");

/// Back edges and loop headers for one function
#[derive(Debug, Clone, Default)]
pub struct LoopInfo {
    /// (latch, header) pairs
    pub back_edges: Vec<(IrBlockId, IrBlockId)>,

    /// Distinct loop headers in discovery order
    pub headers: Vec<IrBlockId>,
}

impl LoopInfo {
    pub fn is_header(&self, block: IrBlockId) -> bool {
        self.headers.contains(&block)
    }

    pub fn loop_count(&self) -> usize {
        self.headers.len()
    }
}

/// Produces [`LoopInfo`]
pub struct LoopAnalysis;

impl AnalysisPass for LoopAnalysis {
    fn id(&self) -> AnalysisId {
        LOOPS
    }

    fn usage(&self) -> PassUsage {
        PassUsage::none().requires(DOMINATORS)
    }

    fn run(
        &self,
        function: &IrFunction,
        cx: &mut PassContext<'_>,
    ) -> Result<Box<dyn Any>, ExecutionError> {
        let dominators: &Dominators = cx.require(DOMINATORS, function)?;

        let mut info = LoopInfo::default();
        for block in &function.blocks {
            if !dominators.is_reachable(block.id) {
                continue;
            }
            for succ in block.successors() {
                if dominators.dominates(succ, block.id) {
                    info.back_edges.push((block.id, succ));
                    if !info.headers.contains(&succ) {
                        info.headers.push(succ);
                    }
                }
            }
        }
        Ok(Box::new(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CompareOp, IrFunctionBuilder, IrTerminator};
    use crate::passes::PipelineBuilder;
    use crate::passes::library::DominatorsAnalysis;
    use crate::ir::IrModule;
    use crate::passes::ModuleContext;

    /// entry -> header <-> body, header -> exit
    fn single_loop() -> IrFunction {
        let mut b = IrFunctionBuilder::new("looped");
        let entry = b.create_block(Some("entry"));
        let header = b.create_block(Some("header"));
        let body = b.create_block(Some("body"));
        let exit = b.create_block(Some("exit"));

        b.set_current_block(entry);
        b.terminate(IrTerminator::Branch { target: header });
        b.set_current_block(header);
        let i = b.push_const(0);
        let n = b.push_const(10);
        let cond = b.push_cmp(CompareOp::Lt, i, n);
        b.terminate(IrTerminator::CondBranch {
            condition: cond,
            true_target: body,
            false_target: exit,
        });
        b.set_current_block(body);
        b.terminate(IrTerminator::Branch { target: header });
        b.set_current_block(exit);
        b.terminate(IrTerminator::Return { value: None });
        b.build()
    }

    #[test]
    fn test_detects_back_edge() {
        let mut module = IrModule::new("m");
        let id = module.add_function(single_loop());

        let mut builder = PipelineBuilder::new();
        builder.add_analysis(DominatorsAnalysis).unwrap();
        builder.add_analysis(LoopAnalysis).unwrap();
        let mut manager = builder.build().unwrap();

        let mut function = module.function(id).unwrap().clone();
        let ids = function.block_ids();
        let (header, body) = (ids[1], ids[2]);

        manager
            .do_initialization(&mut ModuleContext::new(&mut module))
            .unwrap();
        manager.run(&mut function).unwrap();

        let info: &LoopInfo = manager
            .cache()
            .get(LOOPS, function.id)
            .and_then(|r| r.downcast_ref())
            .unwrap();
        assert_eq!(info.back_edges, vec![(body, header)]);
        assert!(info.is_header(header));
        assert_eq!(info.loop_count(), 1);
    }
}
