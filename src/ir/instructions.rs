//! IR Instructions
//!
//! Non-terminator instructions. Every instruction that produces a value
//! writes a fresh register; constants are materialized explicitly so that
//! folding passes have a uniform representation to work against.

use super::IrId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Binary arithmetic and bitwise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
}

/// Comparison operations (produce 0 or 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A non-terminator instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrInstruction {
    /// Materialize an integer constant
    Const { dest: IrId, value: i64 },

    /// Binary operation on two registers
    BinOp {
        dest: IrId,
        op: BinaryOp,
        left: IrId,
        right: IrId,
    },

    /// Comparison of two registers
    Cmp {
        dest: IrId,
        op: CompareOp,
        left: IrId,
        right: IrId,
    },

    /// Register-to-register copy
    Copy { dest: IrId, src: IrId },

    /// Call to an external function; calls are assumed to have side effects
    Call {
        dest: Option<IrId>,
        callee: String,
        args: Vec<IrId>,
    },
}

impl IrInstruction {
    /// Register written by this instruction, if any
    pub fn dest(&self) -> Option<IrId> {
        match self {
            IrInstruction::Const { dest, .. }
            | IrInstruction::BinOp { dest, .. }
            | IrInstruction::Cmp { dest, .. }
            | IrInstruction::Copy { dest, .. } => Some(*dest),
            IrInstruction::Call { dest, .. } => *dest,
        }
    }

    /// Registers read by this instruction
    pub fn uses(&self) -> Vec<IrId> {
        match self {
            IrInstruction::Const { .. } => Vec::new(),
            IrInstruction::BinOp { left, right, .. } | IrInstruction::Cmp { left, right, .. } => {
                vec![*left, *right]
            }
            IrInstruction::Copy { src, .. } => vec![*src],
            IrInstruction::Call { args, .. } => args.clone(),
        }
    }

    /// Whether this instruction must be kept even when its result is unused
    pub fn has_side_effects(&self) -> bool {
        matches!(self, IrInstruction::Call { .. })
    }

    /// Replace register uses according to `replacements`
    pub fn replace_uses(&mut self, replacements: &HashMap<IrId, IrId>) {
        let replace = |reg: &mut IrId| {
            if let Some(&new_reg) = replacements.get(reg) {
                *reg = new_reg;
            }
        };

        match self {
            IrInstruction::Const { .. } => {}
            IrInstruction::BinOp { left, right, .. } | IrInstruction::Cmp { left, right, .. } => {
                replace(left);
                replace(right);
            }
            IrInstruction::Copy { src, .. } => replace(src),
            IrInstruction::Call { args, .. } => args.iter_mut().for_each(replace),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_and_dest() {
        let inst = IrInstruction::BinOp {
            dest: IrId::new(3),
            op: BinaryOp::Add,
            left: IrId::new(1),
            right: IrId::new(2),
        };
        assert_eq!(inst.dest(), Some(IrId::new(3)));
        assert_eq!(inst.uses(), vec![IrId::new(1), IrId::new(2)]);
        assert!(!inst.has_side_effects());
    }

    #[test]
    fn test_replace_uses() {
        let mut inst = IrInstruction::Copy {
            dest: IrId::new(5),
            src: IrId::new(1),
        };
        let mut map = HashMap::new();
        map.insert(IrId::new(1), IrId::new(9));
        inst.replace_uses(&map);
        assert_eq!(inst.uses(), vec![IrId::new(9)]);
    }
}
