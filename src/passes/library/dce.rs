//! Dead instruction elimination
//!
//! Removes instructions whose results are never read, keeping anything
//! with side effects. Operates on instructions only; control flow is left
//! intact, so shape analyses survive it.

use super::dominators::DOMINATORS;
use super::loops::LOOPS;
use crate::ir::{IrFunction, IrId};
use crate::passes::error::ExecutionError;
use crate::passes::{PassContext, PassUsage, TransformPass};
use fxhash::FxHashSet;
use log::debug;

pub struct DeadCodeEliminationPass;

impl DeadCodeEliminationPass {
    pub fn new() -> Self {
        Self
    }

    fn find_used_registers(function: &IrFunction) -> FxHashSet<IrId> {
        let mut used = FxHashSet::default();
        for block in &function.blocks {
            for inst in &block.instructions {
                used.extend(inst.uses());
            }
            used.extend(block.terminator.uses());
        }
        used
    }
}

impl Default for DeadCodeEliminationPass {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPass for DeadCodeEliminationPass {
    fn name(&self) -> &'static str {
        "dead-code-elimination"
    }

    fn usage(&self) -> PassUsage {
        PassUsage::none().preserves(DOMINATORS).preserves(LOOPS)
    }

    fn run(
        &mut self,
        function: &mut IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError> {
        let used = Self::find_used_registers(function);

        let mut eliminated = 0usize;
        for block in &mut function.blocks {
            let original_len = block.instructions.len();
            block.instructions.retain(|inst| {
                inst.has_side_effects()
                    || match inst.dest() {
                        Some(dest) => used.contains(&dest),
                        None => true,
                    }
            });
            eliminated += original_len - block.instructions.len();
        }

        if eliminated > 0 {
            debug!(
                "dead-code-elimination: removed {} instructions from '{}'",
                eliminated, function.name
            );
        }
        Ok(eliminated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, IrFunctionBuilder, IrInstruction, IrTerminator};

    fn run_on(function: &mut IrFunction) -> bool {
        let mut builder = crate::passes::PipelineBuilder::new();
        builder
            .add_transform(DeadCodeEliminationPass::new())
            .unwrap();
        let mut manager = builder.build().unwrap();
        let mut module = crate::ir::IrModule::new("m");
        manager
            .do_initialization(&mut crate::passes::ModuleContext::new(&mut module))
            .unwrap();
        manager.run(function).unwrap()
    }

    #[test]
    fn test_removes_unused_instruction() {
        let mut b = IrFunctionBuilder::new("f");
        b.create_block(Some("entry"));
        let x = b.push_const(1);
        let y = b.push_const(2);
        let _dead = b.push_binop(BinaryOp::Add, x, y);
        b.terminate(IrTerminator::Return { value: Some(x) });
        let mut f = b.build();

        assert!(run_on(&mut f));
        // a single sweep removes the add; its operands become dead for a
        // later sweep
        assert!(f.blocks[0]
            .instructions
            .iter()
            .all(|i| !matches!(i, IrInstruction::BinOp { .. })));
    }

    #[test]
    fn test_keeps_side_effecting_calls() {
        let mut b = IrFunctionBuilder::new("f");
        b.create_block(Some("entry"));
        let unused = b.push_call("log", vec![], true);
        b.terminate(IrTerminator::Return { value: None });
        let mut f = b.build();
        assert!(unused.is_some());

        assert!(!run_on(&mut f));
        assert_eq!(f.instruction_count(), 1);
    }
}
