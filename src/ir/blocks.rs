//! IR Basic Blocks
//!
//! Basic blocks are sequences of instructions with a single entry point and
//! a single terminator. They form the nodes of the per-function control
//! flow graph.

use super::{IrId, IrInstruction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for basic blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrBlockId(pub u32);

impl IrBlockId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn entry() -> Self {
        Self(0)
    }

    pub fn is_entry(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Terminator instructions that end a basic block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrTerminator {
    /// Return from the function
    Return { value: Option<IrId> },

    /// Unconditional branch
    Branch { target: IrBlockId },

    /// Conditional branch on a register (non-zero takes `true_target`)
    CondBranch {
        condition: IrId,
        true_target: IrBlockId,
        false_target: IrBlockId,
    },

    /// Control never reaches the end of this block
    Unreachable,
}

impl IrTerminator {
    /// Successor blocks of this terminator
    pub fn successors(&self) -> Vec<IrBlockId> {
        match self {
            IrTerminator::Return { .. } | IrTerminator::Unreachable => Vec::new(),
            IrTerminator::Branch { target } => vec![*target],
            IrTerminator::CondBranch {
                true_target,
                false_target,
                ..
            } => vec![*true_target, *false_target],
        }
    }

    /// Registers read by this terminator
    pub fn uses(&self) -> Vec<IrId> {
        match self {
            IrTerminator::Return { value: Some(val) } => vec![*val],
            IrTerminator::CondBranch { condition, .. } => vec![*condition],
            _ => Vec::new(),
        }
    }
}

/// A basic block in the IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrBasicBlock {
    /// Unique identifier for this block
    pub id: IrBlockId,

    /// Human-readable label (for debugging)
    pub label: Option<String>,

    /// Instructions in this block (executed sequentially)
    pub instructions: Vec<IrInstruction>,

    /// Terminator instruction (branch, return, etc.)
    pub terminator: IrTerminator,
}

impl IrBasicBlock {
    pub fn new(id: IrBlockId, label: Option<String>) -> Self {
        Self {
            id,
            label,
            instructions: Vec::new(),
            terminator: IrTerminator::Unreachable,
        }
    }

    pub fn successors(&self) -> Vec<IrBlockId> {
        self.terminator.successors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successors() {
        let mut block = IrBasicBlock::new(IrBlockId::new(0), None);
        assert!(block.successors().is_empty());

        block.terminator = IrTerminator::CondBranch {
            condition: IrId::new(1),
            true_target: IrBlockId::new(1),
            false_target: IrBlockId::new(2),
        };
        assert_eq!(
            block.successors(),
            vec![IrBlockId::new(1), IrBlockId::new(2)]
        );
    }
}
