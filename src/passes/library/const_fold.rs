//! Constant folding
//!
//! Replaces binary operations and comparisons whose operands are known
//! constants with materialized constants. Works register-by-register in a
//! single forward sweep; folded results feed later folds in the same sweep.
//! Leaves the CFG untouched, so shape analyses survive it.

use super::dominators::DOMINATORS;
use super::loops::LOOPS;
use crate::ir::{BinaryOp, CompareOp, IrFunction, IrId, IrInstruction};
use crate::passes::error::ExecutionError;
use crate::passes::{PassContext, PassUsage, TransformPass};
use fxhash::FxHashMap;
use log::debug;

pub struct ConstantFoldingPass;

impl ConstantFoldingPass {
    pub fn new() -> Self {
        Self
    }

    fn fold_binary_op(op: BinaryOp, left: i64, right: i64) -> Option<i64> {
        use BinaryOp::*;
        match op {
            Add => Some(left.wrapping_add(right)),
            Sub => Some(left.wrapping_sub(right)),
            Mul => Some(left.wrapping_mul(right)),
            Div if right != 0 => Some(left.wrapping_div(right)),
            Rem if right != 0 => Some(left.wrapping_rem(right)),
            Div | Rem => None,
            And => Some(left & right),
            Or => Some(left | right),
            Xor => Some(left ^ right),
        }
    }

    fn fold_comparison(op: CompareOp, left: i64, right: i64) -> i64 {
        use CompareOp::*;
        let result = match op {
            Eq => left == right,
            Ne => left != right,
            Lt => left < right,
            Le => left <= right,
            Gt => left > right,
            Ge => left >= right,
        };
        result as i64
    }
}

impl Default for ConstantFoldingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPass for ConstantFoldingPass {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn usage(&self) -> PassUsage {
        PassUsage::none().preserves(DOMINATORS).preserves(LOOPS)
    }

    fn run(
        &mut self,
        function: &mut IrFunction,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, ExecutionError> {
        let mut constants: FxHashMap<IrId, i64> = FxHashMap::default();

        // first pass: collect materialized constants
        for block in &function.blocks {
            for inst in &block.instructions {
                if let IrInstruction::Const { dest, value } = inst {
                    constants.insert(*dest, *value);
                }
            }
        }

        // second pass: fold operations, feeding results forward
        let mut folded = 0usize;
        for block in &mut function.blocks {
            for inst in &mut block.instructions {
                match inst {
                    IrInstruction::BinOp {
                        dest,
                        op,
                        left,
                        right,
                    } => {
                        if let (Some(&l), Some(&r)) = (constants.get(left), constants.get(right)) {
                            if let Some(value) = Self::fold_binary_op(*op, l, r) {
                                let dest = *dest;
                                *inst = IrInstruction::Const { dest, value };
                                constants.insert(dest, value);
                                folded += 1;
                            }
                        }
                    }
                    IrInstruction::Cmp {
                        dest,
                        op,
                        left,
                        right,
                    } => {
                        if let (Some(&l), Some(&r)) = (constants.get(left), constants.get(right)) {
                            let value = Self::fold_comparison(*op, l, r);
                            let dest = *dest;
                            *inst = IrInstruction::Const { dest, value };
                            constants.insert(dest, value);
                            folded += 1;
                        }
                    }
                    IrInstruction::Copy { dest, src } => {
                        if let Some(&value) = constants.get(src) {
                            let dest = *dest;
                            *inst = IrInstruction::Const { dest, value };
                            constants.insert(dest, value);
                            folded += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        if folded > 0 {
            debug!("constant-folding: folded {} instructions in '{}'", folded, function.name);
        }
        Ok(folded > 0)
    }
}
