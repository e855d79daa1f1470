//! IR Functions
//!
//! A function is the program unit the pass engine schedules over: a named,
//! identity-stable collection of basic blocks. Blocks are stored in layout
//! order with the entry block first.

use super::{IrBasicBlock, IrBlockId, IrId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrFunctionId(pub u32);

impl IrFunctionId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// IR function representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrFunction {
    /// Unique identifier for this function; stable across a scheduling run
    pub id: IrFunctionId,

    /// Function name
    pub name: String,

    /// Parameter registers
    pub params: Vec<IrId>,

    /// Basic blocks in layout order, entry block first
    pub blocks: Vec<IrBasicBlock>,

    /// Next available register ID
    pub next_reg_id: u32,
}

impl IrFunction {
    /// Entry block of the function.
    ///
    /// A function with no blocks is malformed; passes may assume an entry
    /// block exists.
    pub fn entry_block(&self) -> IrBlockId {
        assert!(!self.blocks.is_empty(), "function {} has no blocks", self.name);
        self.blocks[0].id
    }

    pub fn block(&self, id: IrBlockId) -> Option<&IrBasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: IrBlockId) -> Option<&mut IrBasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn block_ids(&self) -> Vec<IrBlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    /// Successors of a block, empty if the block does not exist
    pub fn successors(&self, id: IrBlockId) -> Vec<IrBlockId> {
        self.block(id).map(|b| b.successors()).unwrap_or_default()
    }

    /// Total instruction count across all blocks
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}
