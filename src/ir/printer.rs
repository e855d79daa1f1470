//! Textual and JSON forms of IR entities
//!
//! The textual form is what the diagnostic printer pass writes to its sink;
//! the JSON form is consumed by external tooling.

use super::{IrFunction, IrInstruction, IrModule, IrTerminator};
use std::fmt;

impl fmt::Display for IrInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrInstruction::Const { dest, value } => write!(f, "{} = const {}", dest, value),
            IrInstruction::BinOp {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = {} {}, {}", dest, op, left, right),
            IrInstruction::Cmp {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = cmp.{} {}, {}", dest, op, left, right),
            IrInstruction::Copy { dest, src } => write!(f, "{} = copy {}", dest, src),
            IrInstruction::Call { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{} = call @{}(", dest, callee)?;
                } else {
                    write!(f, "call @{}(", callee)?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for IrTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrTerminator::Return { value: Some(val) } => write!(f, "ret {}", val),
            IrTerminator::Return { value: None } => write!(f, "ret"),
            IrTerminator::Branch { target } => write!(f, "br {}", target),
            IrTerminator::CondBranch {
                condition,
                true_target,
                false_target,
            } => write!(f, "br_if {}, {}, {}", condition, true_target, false_target),
            IrTerminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn @{} ({})", self.name, self.id)?;
        if !self.params.is_empty() {
            write!(f, " params")?;
            for p in &self.params {
                write!(f, " {}", p)?;
            }
        }
        writeln!(f, " {{")?;
        for block in &self.blocks {
            match &block.label {
                Some(label) => writeln!(f, "{}: ; {}", block.id, label)?,
                None => writeln!(f, "{}:", block.id)?,
            }
            for inst in &block.instructions {
                writeln!(f, "  {}", inst)?;
            }
            writeln!(f, "  {}", block.terminator)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module @{}", self.name)?;
        for function in &self.functions {
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}

/// Serialize a function to JSON for external tooling
pub fn dump_json(function: &IrFunction) -> serde_json::Result<String> {
    serde_json::to_string_pretty(function)
}
