//! Control flow simplification
//!
//! Folds conditional branches on known constants into unconditional
//! branches, then removes blocks unreachable from the entry. Rewrites the
//! graph, so it declares nothing preserved.

use crate::ir::{IrBlockId, IrFunction, IrId, IrInstruction, IrTerminator};
use crate::passes::error::ExecutionError;
use crate::passes::{PassContext, PassUsage, TransformPass};
use fxhash::{FxHashMap, FxHashSet};
use log::debug;

pub struct SimplifyCfgPass;

impl SimplifyCfgPass {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite conditional branches whose condition is a known constant
    fn simplify_conditional_branches(function: &mut IrFunction) -> bool {
        let mut constants: FxHashMap<IrId, i64> = FxHashMap::default();
        for block in &function.blocks {
            for inst in &block.instructions {
                if let IrInstruction::Const { dest, value } = inst {
                    constants.insert(*dest, *value);
                }
            }
        }

        let mut modified = false;
        for block in &mut function.blocks {
            if let IrTerminator::CondBranch {
                condition,
                true_target,
                false_target,
            } = &block.terminator
            {
                if let Some(&value) = constants.get(condition) {
                    let target = if value != 0 {
                        *true_target
                    } else {
                        *false_target
                    };
                    block.terminator = IrTerminator::Branch { target };
                    modified = true;
                }
            }
        }
        modified
    }

    fn find_reachable(function: &IrFunction) -> FxHashSet<IrBlockId> {
        let mut reachable = FxHashSet::default();
        let mut worklist = vec![function.entry_block()];
        while let Some(block_id) = worklist.pop() {
            if reachable.insert(block_id) {
                worklist.extend(function.successors(block_id));
            }
        }
        reachable
    }
}

impl Default for SimplifyCfgPass {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPass for SimplifyCfgPass {
    fn name(&self) -> &'static str {
        "simplify-cfg"
    }

    fn usage(&self) -> PassUsage {
        PassUsage::none()
    }

    fn run(
        &mut self,
        function: &mut IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError> {
        let mut modified = Self::simplify_conditional_branches(function);

        let reachable = Self::find_reachable(function);
        let original_count = function.blocks.len();
        function.blocks.retain(|block| reachable.contains(&block.id));
        let eliminated = original_count - function.blocks.len();
        if eliminated > 0 {
            debug!(
                "simplify-cfg: removed {} unreachable blocks from '{}'",
                eliminated, function.name
            );
            modified = true;
        }

        Ok(modified)
    }
}
