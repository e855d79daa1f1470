//! IR Function Builder
//!
//! Convenience API for constructing functions block by block. Used by tests
//! and benchmarks; the production frontend lowers into the same structures
//! directly.

use super::{
    BinaryOp, CompareOp, IrBasicBlock, IrBlockId, IrFunction, IrFunctionId, IrId, IrInstruction,
    IrTerminator,
};

/// Builds an [`IrFunction`] incrementally
pub struct IrFunctionBuilder {
    name: String,
    params: Vec<IrId>,
    blocks: Vec<IrBasicBlock>,
    current_block: Option<IrBlockId>,
    next_block_id: u32,
    next_reg_id: u32,
}

impl IrFunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            blocks: Vec::new(),
            current_block: None,
            next_block_id: 0,
            next_reg_id: 0,
        }
    }

    /// Declare a parameter register
    pub fn add_param(&mut self) -> IrId {
        let reg = self.fresh_reg();
        self.params.push(reg);
        reg
    }

    /// Create a new block; the first block created is the entry block
    pub fn create_block(&mut self, label: Option<&str>) -> IrBlockId {
        let id = IrBlockId::new(self.next_block_id);
        self.next_block_id += 1;
        self.blocks
            .push(IrBasicBlock::new(id, label.map(str::to_owned)));
        if self.current_block.is_none() {
            self.current_block = Some(id);
        }
        id
    }

    pub fn set_current_block(&mut self, id: IrBlockId) {
        assert!(
            self.blocks.iter().any(|b| b.id == id),
            "unknown block {}",
            id
        );
        self.current_block = Some(id);
    }

    pub fn fresh_reg(&mut self) -> IrId {
        let reg = IrId::new(self.next_reg_id);
        self.next_reg_id += 1;
        reg
    }

    fn push(&mut self, inst: IrInstruction) {
        let current = self.current_block.expect("no current block");
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == current)
            .expect("current block missing");
        block.instructions.push(inst);
    }

    pub fn push_const(&mut self, value: i64) -> IrId {
        let dest = self.fresh_reg();
        self.push(IrInstruction::Const { dest, value });
        dest
    }

    pub fn push_binop(&mut self, op: BinaryOp, left: IrId, right: IrId) -> IrId {
        let dest = self.fresh_reg();
        self.push(IrInstruction::BinOp {
            dest,
            op,
            left,
            right,
        });
        dest
    }

    pub fn push_cmp(&mut self, op: CompareOp, left: IrId, right: IrId) -> IrId {
        let dest = self.fresh_reg();
        self.push(IrInstruction::Cmp {
            dest,
            op,
            left,
            right,
        });
        dest
    }

    pub fn push_copy(&mut self, src: IrId) -> IrId {
        let dest = self.fresh_reg();
        self.push(IrInstruction::Copy { dest, src });
        dest
    }

    pub fn push_call(&mut self, callee: impl Into<String>, args: Vec<IrId>, returns: bool) -> Option<IrId> {
        let dest = returns.then(|| self.fresh_reg());
        self.push(IrInstruction::Call {
            dest,
            callee: callee.into(),
            args,
        });
        dest
    }

    /// Set the terminator of the current block
    pub fn terminate(&mut self, terminator: IrTerminator) {
        let current = self.current_block.expect("no current block");
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == current)
            .expect("current block missing");
        block.terminator = terminator;
    }

    /// Finish the function. The identity is assigned when the function is
    /// added to a module.
    pub fn build(self) -> IrFunction {
        IrFunction {
            id: IrFunctionId(u32::MAX),
            name: self.name,
            params: self.params,
            blocks: self.blocks,
            next_reg_id: self.next_reg_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_straight_line_function() {
        let mut b = IrFunctionBuilder::new("f");
        let entry = b.create_block(Some("entry"));
        let x = b.push_const(2);
        let y = b.push_const(3);
        let sum = b.push_binop(BinaryOp::Add, x, y);
        b.terminate(IrTerminator::Return { value: Some(sum) });

        let f = b.build();
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].id, entry);
        assert_eq!(f.instruction_count(), 3);
    }
}
